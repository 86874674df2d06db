//! The batch commands behind the CLI. Each document is handled on its own so
//! one broken file shows up as one failed entry instead of aborting the run.

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::{debug, error, info, warn};

use crate::config::SiteConfig;
use crate::error::Error;
use crate::latex::{self, CompileOutcome};
use crate::merge::{merge_profile, merge_records, Keyed, MergeStats};
use crate::metrics::{apply_statistics, compute_metrics, PublicationStatistics};
use crate::model::*;
use crate::parser::extract::{self, publications::extract_bibtex, Candidate, ExtractedData};
use crate::render::html::{self, RenderContext};
use crate::render::template::Templates;
use crate::render::{cv, jsonld};
use crate::sitemap;
use crate::store::{write_atomic, Backup, DataStore};
use crate::validate::{self, Issue};

#[derive(Debug)]
pub enum Outcome {
    Ok(String),
    Skipped(String),
    Failed(String),
}

/// One line per document, source or artifact touched by a command.
#[derive(Debug)]
pub struct Report {
    pub title: &'static str,
    pub entries: Vec<(String, Outcome)>,
}

impl Report {
    pub fn new(title: &'static str) -> Self {
        Report {
            title,
            entries: Vec::new(),
        }
    }

    pub fn ok(&mut self, name: impl Into<String>, detail: impl Into<String>) {
        self.entries.push((name.into(), Outcome::Ok(detail.into())));
    }

    pub fn skipped(&mut self, name: impl Into<String>, reason: impl Into<String>) {
        self.entries.push((name.into(), Outcome::Skipped(reason.into())));
    }

    pub fn fail(&mut self, name: impl Into<String>, err: impl fmt::Display) {
        let name = name.into();
        let message = format!("{:#}", err);
        error!("{}: {}", name, message);
        self.entries.push((name, Outcome::Failed(message)));
    }

    /// Pull another report's entries in, prefixed with `step`.
    pub fn absorb(&mut self, step: &str, other: Report) {
        for (name, outcome) in other.entries {
            self.entries.push((format!("{}: {}", step, name), outcome));
        }
    }

    pub fn failures(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, o)| matches!(o, Outcome::Failed(_)))
            .count()
    }

    pub fn print(&self) {
        println!("{}:", self.title);
        for (name, outcome) in &self.entries {
            match outcome {
                Outcome::Ok(detail) => println!("  ✅ {:<28} {}", name, detail),
                Outcome::Skipped(reason) => println!("  ⚠️  {:<28} {}", name, reason),
                Outcome::Failed(message) => println!("  ❌ {:<28} {}", name, message),
            }
        }
    }

    pub fn into_result(self) -> std::result::Result<Self, Error> {
        match self.failures() {
            0 => Ok(self),
            failed => Err(Error::Partial {
                failed,
                total: self.entries.len(),
            }),
        }
    }
}

/// Everything `generate` writes into the output directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    Publications,
    News,
    Resources,
    Activities,
    StructuredData,
    Sitemap,
    Cv,
}

impl Artifact {
    pub const ALL: [Artifact; 7] = [
        Artifact::Publications,
        Artifact::News,
        Artifact::Resources,
        Artifact::Activities,
        Artifact::StructuredData,
        Artifact::Sitemap,
        Artifact::Cv,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            Artifact::Publications => "publications.html",
            Artifact::News => "news.html",
            Artifact::Resources => "resources.html",
            Artifact::Activities => "activities.html",
            Artifact::StructuredData => "structured-data.json",
            Artifact::Sitemap => "sitemap.xml",
            Artifact::Cv => "cv.tex",
        }
    }
}

/// Whatever loaded; `None` marks a document that failed to parse.
struct Documents {
    profile: Option<PersonalProfile>,
    publications: Option<PublicationsDocument>,
    news: Option<NewsDocument>,
    resources: Option<ResourcesDocument>,
    activities: Option<ActivitiesDocument>,
}

pub struct Site {
    pub config: SiteConfig,
    pub store: DataStore,
}

impl Site {
    pub fn new(config: SiteConfig) -> Self {
        let store = DataStore::new(config.data_dir.clone());
        Site { config, store }
    }

    fn owner<'a>(&'a self, profile: Option<&'a PersonalProfile>) -> &'a str {
        if !self.config.owner_name.is_empty() {
            self.config.owner_name.as_str()
        } else {
            profile.map(|p| p.name.as_str()).unwrap_or("")
        }
    }

    fn load_into<D: Document>(&self, report: &mut Report) -> Option<D> {
        match self.store.load_or_default::<D>() {
            Ok(doc) => Some(doc),
            Err(e) => {
                report.fail(format!("{}.json", D::NAME), e);
                None
            }
        }
    }

    fn load_documents(&self, report: &mut Report) -> Documents {
        Documents {
            profile: self.load_into(report),
            publications: self.load_into(report),
            news: self.load_into(report),
            resources: self.load_into(report),
            activities: self.load_into(report),
        }
    }

    // ── generate ──

    /// Render every artifact in parallel. An artifact whose source document
    /// failed to load is skipped; the rest are still written.
    pub fn generate(&self, today: NaiveDate) -> Result<Report> {
        let templates = Templates::load(self.config.template_dir.as_deref())
            .context("Failed to load templates")?;
        let mut report = Report::new("generate");
        let docs = self.load_documents(&mut report);

        let results: Vec<(Artifact, Result<Option<PathBuf>>)> = Artifact::ALL
            .par_iter()
            .map(|&a| (a, self.write_artifact(a, &docs, &templates, today)))
            .collect();

        for (artifact, result) in results {
            match result {
                Ok(Some(path)) => report.ok(artifact.file_name(), path.display().to_string()),
                Ok(None) => report.skipped(artifact.file_name(), "source document failed to load"),
                Err(e) => report.fail(artifact.file_name(), e),
            }
        }
        Ok(report)
    }

    fn write_artifact(
        &self,
        artifact: Artifact,
        docs: &Documents,
        templates: &Templates,
        today: NaiveDate,
    ) -> Result<Option<PathBuf>> {
        let Some(text) = self.render_artifact(artifact, docs, templates, today)? else {
            return Ok(None);
        };
        let path = self.config.output_dir.join(artifact.file_name());
        write_atomic(&path, &text)?;
        debug!("wrote {}", path.display());
        Ok(Some(path))
    }

    fn render_artifact(
        &self,
        artifact: Artifact,
        docs: &Documents,
        templates: &Templates,
        today: NaiveDate,
    ) -> Result<Option<String>> {
        let include = self.config.include_unreviewed;
        let ctx = RenderContext {
            owner: self.owner(docs.profile.as_ref()),
            include_unreviewed: include,
        };
        let text = match artifact {
            Artifact::Publications => docs
                .publications
                .as_ref()
                .map(|d| html::render_publications(d, templates, ctx)),
            Artifact::News => docs.news.as_ref().map(|d| html::render_news(d, templates, ctx)),
            Artifact::Resources => docs
                .resources
                .as_ref()
                .map(|d| html::render_resources(d, templates)),
            Artifact::Activities => docs
                .activities
                .as_ref()
                .map(|d| html::render_activities(d, templates)),
            Artifact::StructuredData => match (&docs.profile, &docs.publications) {
                (Some(profile), Some(pubs)) => Some(jsonld::render_person(
                    profile,
                    pubs,
                    self.config.site_root(),
                    include,
                )?),
                _ => None,
            },
            Artifact::Sitemap => Some(sitemap::render_sitemap(self.config.site_root(), today)?),
            Artifact::Cv => match (&docs.profile, &docs.publications, &docs.news) {
                (Some(profile), Some(pubs), Some(news)) => {
                    Some(cv::render_cv(profile, pubs, news, include))
                }
                _ => None,
            },
        };
        Ok(text)
    }

    // ── update ──

    /// Extract candidates from the configured HTML and BibTeX sources and
    /// merge them into the store. Existing records are never modified.
    pub fn update(&self, today: NaiveDate) -> Result<Report> {
        let mut report = Report::new("update");
        let mut extracted = ExtractedData::default();

        for source in &self.config.html_sources {
            let name = source.display().to_string();
            match fs::read_to_string(source) {
                Ok(page) => {
                    let data = extract::extract_page(&page, &self.config.author_marker, today);
                    report.ok(
                        name,
                        format!(
                            "{} publication(s), {} news item(s)",
                            data.publications.len(),
                            data.news.len()
                        ),
                    );
                    extracted.extend(data);
                }
                Err(e) if e.kind() == ErrorKind::NotFound => report.skipped(name, "not found"),
                Err(e) => report.fail(name, e),
            }
        }

        if let Some(bib) = &self.config.bibtex_source {
            let name = bib.display().to_string();
            match fs::read_to_string(bib) {
                Ok(src) => {
                    let (candidates, errors) = extract_bibtex(&src, today);
                    for e in &errors {
                        warn!("{}: {}", name, e);
                    }
                    report.ok(
                        name,
                        format!("{} article(s), {} broken entr(ies)", candidates.len(), errors.len()),
                    );
                    extracted.publications.extend(candidates);
                }
                Err(e) if e.kind() == ErrorKind::NotFound => report.skipped(name, "not found"),
                Err(e) => report.fail(name, e),
            }
        }

        log_defaulted(&extracted.publications);
        log_defaulted(&extracted.news);

        if let Some(incoming) = &extracted.profile {
            match self.merge_profile_into(incoming) {
                Ok(0) => report.ok(PersonalProfile::NAME, "unchanged"),
                Ok(n) => report.ok(PersonalProfile::NAME, format!("{} field(s) filled", n)),
                Err(e) => report.fail(PersonalProfile::NAME, e),
            }
        }

        let publications: Vec<Publication> =
            extracted.publications.into_iter().map(|c| c.record).collect();
        let merged = self.merge_into(publications, |d: &mut PublicationsDocument| &mut d.publications);
        record_merge(&mut report, PublicationsDocument::NAME, merged);

        let news: Vec<NewsItem> = extracted.news.into_iter().map(|c| c.record).collect();
        let merged = self.merge_into(news, |d: &mut NewsDocument| &mut d.news);
        record_merge(&mut report, NewsDocument::NAME, merged);

        Ok(report)
    }

    fn merge_profile_into(&self, incoming: &PersonalProfile) -> Result<usize> {
        let mut profile: PersonalProfile = self.store.load_or_default()?;
        let filled = merge_profile(&mut profile, incoming);
        if filled > 0 {
            self.store.save(&profile)?;
        }
        Ok(filled)
    }

    fn merge_into<D, T>(
        &self,
        incoming: Vec<T>,
        items: impl FnOnce(&mut D) -> &mut Vec<T>,
    ) -> Result<MergeStats>
    where
        D: Document,
        T: Keyed,
    {
        let mut doc: D = self.store.load_or_default()?;
        let stats = merge_records(items(&mut doc), incoming);
        if stats.changed() {
            self.store.save(&doc)?;
            info!("{}: {} record(s) added", D::NAME, stats.added);
        }
        Ok(stats)
    }

    // ── metrics / validate / backup ──

    /// Recompute statistics over reviewed publications and store them.
    pub fn metrics(&self, now: NaiveDateTime) -> Result<PublicationStatistics> {
        let mut doc: PublicationsDocument = self.store.load_or_default()?;
        let profile: PersonalProfile = self.store.load_or_default()?;
        let reviewed: Vec<Publication> = doc
            .publications
            .iter()
            .filter(|p| !p.needs_review)
            .cloned()
            .collect();

        let stats = compute_metrics(&reviewed, self.owner(Some(&profile)));
        apply_statistics(&mut doc, &stats, now)?;
        self.store.save(&doc)?;
        info!(
            "{} publication(s), {} collaborator(s)",
            stats.total,
            stats.collaborators.len()
        );
        Ok(stats)
    }

    /// Check every document that loads. A document that does not parse is a
    /// failed entry in the report; the others are still checked.
    pub fn validate(&self, today: NaiveDate) -> (Vec<Issue>, Report) {
        let mut report = Report::new("validate");
        let docs = self.load_documents(&mut report);
        let mut issues = Vec::new();

        let mut check = |name: &str, found: Option<Vec<Issue>>| {
            if let Some(found) = found {
                report.ok(format!("{}.json", name), format!("{} issue(s)", found.len()));
                issues.extend(found);
            }
        };
        check(
            PersonalProfile::NAME,
            docs.profile.as_ref().map(validate::validate_profile),
        );
        check(
            PublicationsDocument::NAME,
            docs.publications
                .as_ref()
                .map(|d| validate::validate_publications(d, today)),
        );
        check(NewsDocument::NAME, docs.news.as_ref().map(validate::validate_news));
        check(
            ResourcesDocument::NAME,
            docs.resources.as_ref().map(validate::validate_resources),
        );
        check(
            ActivitiesDocument::NAME,
            docs.activities.as_ref().map(validate::validate_activities),
        );

        (issues, report)
    }

    pub fn backup(&self, now: NaiveDateTime) -> Result<Backup> {
        Ok(self.store.backup(&self.config.backup_dir, now)?)
    }

    // ── cv / full ──

    /// Write `cv.tex` and compile it with the configured LaTeX command.
    pub async fn cv(&self) -> Result<CompileOutcome> {
        let profile: PersonalProfile = self.store.load_or_default()?;
        let publications: PublicationsDocument = self.store.load_or_default()?;
        let news: NewsDocument = self.store.load_or_default()?;

        let tex = cv::render_cv(&profile, &publications, &news, self.config.include_unreviewed);
        let path = self.config.output_dir.join(Artifact::Cv.file_name());
        write_atomic(&path, &tex)?;

        let outcome = latex::compile(
            &path,
            &self.config.latex_command,
            &self.config.latex_args,
            self.config.latex_timeout(),
        )
        .await?;
        Ok(outcome)
    }

    /// backup → update → metrics → validate → generate → cv.
    ///
    /// A failed backup stops the run before any document is touched; every
    /// later step is recorded and the run continues.
    pub async fn full(&self, now: NaiveDateTime) -> Result<Report> {
        let today = now.date();
        let mut report = Report::new("full");

        let pb = ProgressBar::new(6);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("#>-"),
        );

        pb.set_message("backup");
        let backup = self
            .backup(now)
            .context("Backup failed; leaving the data untouched")?;
        report.ok("backup", backup.dir.display().to_string());
        pb.inc(1);

        pb.set_message("update");
        match self.update(today) {
            Ok(sub) => report.absorb("update", sub),
            Err(e) => report.fail("update", e),
        }
        pb.inc(1);

        pb.set_message("metrics");
        match self.metrics(now) {
            Ok(stats) => report.ok("metrics", format!("{} publication(s)", stats.total)),
            Err(e) => report.fail("metrics", e),
        }
        pb.inc(1);

        pb.set_message("validate");
        let (issues, checked) = self.validate(today);
        for issue in &issues {
            warn!("{}", issue);
        }
        report.absorb("validate", checked);
        pb.inc(1);

        pb.set_message("generate");
        match self.generate(today) {
            Ok(sub) => report.absorb("generate", sub),
            Err(e) => report.fail("generate", e),
        }
        pb.inc(1);

        pb.set_message("cv");
        match self.cv().await {
            Ok(CompileOutcome::Built(pdf)) => report.ok("cv", pdf.display().to_string()),
            Ok(CompileOutcome::Skipped(reason)) => report.skipped("cv", reason),
            Err(e) => report.fail("cv", e),
        }
        pb.inc(1);

        pb.finish_and_clear();
        Ok(report)
    }
}

fn log_defaulted<T: Keyed>(candidates: &[Candidate<T>]) {
    for c in candidates.iter().filter(|c| !c.defaulted.is_empty()) {
        debug!("{}: defaulted {}", c.record.key(), c.defaulted.join(", "));
    }
}

fn record_merge(report: &mut Report, name: &str, merged: Result<MergeStats>) {
    match merged {
        Ok(stats) if stats.changed() => report.ok(
            name,
            format!("{} added, {} already present", stats.added, stats.kept),
        ),
        Ok(stats) => report.ok(name, format!("unchanged ({} already present)", stats.kept)),
        Err(e) => report.fail(name, e),
    }
}
