mod config;
mod editor;
mod error;
mod jekyll;
mod latex;
mod merge;
mod metrics;
mod model;
mod parser;
mod pipeline;
mod render;
mod sitemap;
mod store;
mod utils;
mod validate;
mod watch;

use std::process::ExitCode;
use std::time::Instant;

use anyhow::Context;
use chrono::Local;
use clap::{Parser, Subcommand};
use tracing::{error, warn};

use config::SiteConfig;
use error::Error;
use latex::CompileOutcome;
use pipeline::Site;

#[derive(Parser)]
#[command(
    name = "sitesync",
    about = "Keeps an academic website's JSON data, generated pages and CV in sync"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render HTML fragments, structured data, sitemap and cv.tex
    Generate,
    /// Regenerate whenever data or templates change
    Watch,
    /// Extract records from the configured HTML/BibTeX sources and merge them
    Update,
    /// Check every document and list the issues found
    Validate,
    /// Recompute publication statistics
    Metrics,
    /// backup, update, metrics, validate, generate and cv in one run
    Full,
    /// Interactive editor for the data documents
    Edit,
    /// Copy the data documents into a timestamped backup directory
    Backup,
    /// Write cv.tex and compile it with LaTeX
    Cv,
    /// Convert the en/ and fr/ pages to Jekyll pages
    Jekyll,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = run(cli.command).await;

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", utils::format_duration(elapsed));
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            let code = e
                .chain()
                .find_map(|c| c.downcast_ref::<Error>())
                .map(Error::exit_code)
                .unwrap_or(1);
            ExitCode::from(code)
        }
    }
}

async fn run(command: Commands) -> anyhow::Result<()> {
    let config = SiteConfig::load().context("Failed to load configuration")?;
    let site = Site::new(config);
    let now = Local::now().naive_local();
    let today = now.date();

    match command {
        Commands::Generate => {
            let report = site.generate(today)?;
            report.print();
            report.into_result()?;
        }
        Commands::Watch => {
            let report = site.generate(today)?;
            report.print();
            let mut dirs = vec![site.config.data_dir.as_path()];
            if let Some(t) = &site.config.template_dir {
                dirs.push(t.as_path());
            }
            watch::watch(&dirs, site.config.watch_interval(), || {
                let report = site.generate(Local::now().date_naive())?;
                report.print();
                Ok(())
            })
            .await?;
        }
        Commands::Update => {
            let report = site.update(today)?;
            report.print();
            report.into_result()?;
        }
        Commands::Validate => {
            let (issues, report) = site.validate(today);
            for issue in &issues {
                println!("  - {}", issue);
            }
            if issues.is_empty() {
                println!("No issues found.");
            } else {
                println!("\n{} issue(s) found.", issues.len());
            }
            // An unreadable document outranks issues in the readable ones.
            if report.failures() > 0 {
                report.print();
                report.into_result()?;
            }
            if !issues.is_empty() {
                return Err(Error::Invalid(issues.len()).into());
            }
        }
        Commands::Metrics => {
            let stats = site.metrics(now)?;
            println!("Total:         {}", stats.total);
            for (year, n) in stats.by_year.iter().rev() {
                println!("  {}:        {}", year, n);
            }
            for (status, n) in &stats.by_status {
                println!("{:<14} {}", format!("{}:", status), n);
            }
            if let Some(latest) = &stats.latest_publication {
                println!("Latest:        {} ({})", utils::truncate(&latest.title, 60), latest.year);
            }
            println!("Collaborators: {}", stats.collaborators.len());
        }
        Commands::Full => {
            let report = site.full(now).await?;
            report.print();
            report.into_result()?;
        }
        Commands::Edit => editor::run(&site)?,
        Commands::Backup => {
            let backup = site.backup(now)?;
            println!(
                "Backed up {} document(s) to {}",
                backup.documents.len(),
                backup.dir.display()
            );
        }
        Commands::Cv => match site.cv().await? {
            CompileOutcome::Built(pdf) => println!("CV written to {}", pdf.display()),
            CompileOutcome::Skipped(reason) => warn!("CV not compiled: {}", reason),
        },
        Commands::Jekyll => {
            let report = jekyll::convert_all(&site.config.pages_dir)?;
            report.print();
        }
    }
    Ok(())
}
