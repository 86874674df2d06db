//! Prompt-driven editing of the data documents. Every change is saved as a
//! whole document and followed by a regenerate.

use std::collections::HashSet;

use anyhow::Result;
use chrono::{Datelike, Local};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, MultiSelect, Select};
use tracing::warn;

use crate::model::*;
use crate::pipeline::Site;
use crate::utils::{slugify, split_list, unique_id};
use crate::validate::{self, Issue};

const MENU: [&str; 6] = [
    "Add publication",
    "Add news item",
    "Edit profile basics",
    "Review extracted records",
    "Regenerate",
    "Exit",
];

pub fn run(site: &Site) -> Result<()> {
    let theme = ColorfulTheme::default();
    loop {
        let choice = Select::with_theme(&theme)
            .with_prompt("What would you like to do?")
            .items(&MENU)
            .default(0)
            .interact()?;

        let changed = match choice {
            0 => add_publication(site, &theme)?,
            1 => add_news(site, &theme)?,
            2 => edit_profile(site, &theme)?,
            3 => review_extracted(site, &theme)?,
            4 => true,
            _ => return Ok(()),
        };
        if changed {
            regenerate(site)?;
        }
    }
}

fn regenerate(site: &Site) -> Result<()> {
    let report = site.generate(Local::now().date_naive())?;
    report.print();
    Ok(())
}

/// Entries are saved as typed; problems with the new record are only reported.
fn warn_about(issues: Vec<Issue>, id: &str) -> usize {
    let mine: Vec<Issue> = issues.into_iter().filter(|i| i.record == id).collect();
    for issue in &mine {
        warn!("{}", issue);
    }
    mine.len()
}

fn prompt(theme: &ColorfulTheme, label: &str) -> Result<String> {
    Ok(Input::<String>::with_theme(theme).with_prompt(label).interact_text()?)
}

fn prompt_optional(theme: &ColorfulTheme, label: &str) -> Result<String> {
    Ok(Input::<String>::with_theme(theme)
        .with_prompt(label)
        .allow_empty(true)
        .interact_text()?)
}

fn add_publication(site: &Site, theme: &ColorfulTheme) -> Result<bool> {
    let mut doc: PublicationsDocument = site.store.load_or_default()?;

    let title = prompt(theme, "Title")?;
    let authors = split_list(&prompt(theme, "Authors (comma-separated)")?);
    let journal = prompt(theme, "Journal")?;
    let year: i32 = Input::with_theme(theme)
        .with_prompt("Year")
        .default(Local::now().year())
        .interact_text()?;
    let doi = prompt_optional(theme, "DOI (optional)")?;
    let kind = PublicationType::ALL[Select::with_theme(theme)
        .with_prompt("Type")
        .items(&PublicationType::ALL)
        .default(0)
        .interact()?];
    let status = PublicationStatus::ALL[Select::with_theme(theme)
        .with_prompt("Status")
        .items(&PublicationStatus::ALL)
        .default(0)
        .interact()?];
    let abstract_text = prompt_optional(theme, "Abstract")?;
    let image = prompt_optional(theme, "Image path")?;

    let id = publication_id(&doc, &title, &authors, year);
    let publication = Publication {
        id: id.clone(),
        title,
        authors,
        journal,
        year,
        doi: Some(doi.trim().to_string()).filter(|d| !d.is_empty()),
        abstract_text,
        image,
        kind,
        status,
        ..Publication::default()
    };
    doc.publications.insert(0, publication);

    warn_about(
        validate::validate_publications(&doc, Local::now().date_naive()),
        &id,
    );

    site.store.save(&doc)?;
    println!("Added publication {}", id);
    Ok(true)
}

fn add_news(site: &Site, theme: &ColorfulTheme) -> Result<bool> {
    let mut doc: NewsDocument = site.store.load_or_default()?;

    let title = prompt(theme, "Title")?;
    let date = Input::<String>::with_theme(theme)
        .with_prompt("Date (YYYY-MM-DD)")
        .default(Local::now().date_naive().format("%Y-%m-%d").to_string())
        .interact_text()?;
    let category = NewsCategory::ALL[Select::with_theme(theme)
        .with_prompt("Category")
        .items(&NewsCategory::ALL)
        .default(0)
        .interact()?];
    let summary = prompt(theme, "Summary")?;
    let content = prompt_optional(theme, "Content")?;
    let images = split_list(&prompt_optional(theme, "Images (comma-separated)")?);
    let tags = split_list(&prompt_optional(theme, "Tags (comma-separated)")?);
    let featured = Confirm::with_theme(theme)
        .with_prompt("Featured?")
        .default(false)
        .interact()?;

    let id = news_id(&doc, &date, &title);
    doc.news.insert(
        0,
        NewsItem {
            id: id.clone(),
            title,
            date,
            category,
            summary,
            content,
            images,
            featured,
            tags,
            ..NewsItem::default()
        },
    );
    warn_about(validate::validate_news(&doc), &id);

    site.store.save(&doc)?;
    println!("Added news item {}", id);
    Ok(true)
}

fn edit_profile(site: &Site, theme: &ColorfulTheme) -> Result<bool> {
    let mut profile: PersonalProfile = site.store.load_or_default()?;
    let before = profile.clone();

    let edit = |label: &str, current: &str| -> Result<String> {
        Ok(Input::<String>::with_theme(theme)
            .with_prompt(label)
            .with_initial_text(current)
            .allow_empty(true)
            .interact_text()?)
    };
    profile.name = edit("Name", &profile.name)?;
    profile.title = edit("Title", &profile.title)?;
    profile.institution.name = edit("Institution", &profile.institution.name)?;
    profile.institution.department = edit("Department", &profile.institution.department)?;
    profile.research.focus = edit("Research focus", &profile.research.focus)?;

    if profile == before {
        println!("Profile unchanged.");
        return Ok(false);
    }
    site.store.save(&profile)?;
    println!("Profile saved.");
    Ok(true)
}

fn review_extracted(site: &Site, theme: &ColorfulTheme) -> Result<bool> {
    let mut pubs: PublicationsDocument = site.store.load_or_default()?;
    let mut news: NewsDocument = site.store.load_or_default()?;

    let pending: Vec<(String, String)> = pubs
        .publications
        .iter()
        .filter(|p| p.needs_review)
        .map(|p| (p.id.clone(), format!("publication: {} ({})", p.title, p.year)))
        .chain(
            news.news
                .iter()
                .filter(|n| n.needs_review)
                .map(|n| (n.id.clone(), format!("news: {} ({})", n.title, n.date))),
        )
        .collect();
    if pending.is_empty() {
        println!("Nothing is waiting for review.");
        return Ok(false);
    }

    let labels: Vec<&str> = pending.iter().map(|(_, l)| l.as_str()).collect();
    let picked = MultiSelect::with_theme(theme)
        .with_prompt("Mark as reviewed (space to toggle)")
        .items(&labels)
        .interact()?;
    let ids: HashSet<&str> = picked.iter().map(|&i| pending[i].0.as_str()).collect();

    let marked = mark_reviewed(&mut pubs, &mut news, &ids);
    if marked == 0 {
        return Ok(false);
    }
    site.store.save(&pubs)?;
    site.store.save(&news)?;
    println!("Marked {} record(s) as reviewed.", marked);
    Ok(true)
}

/// `<surname>-<year>-<first long title word>`, unique within the document.
pub fn publication_id(doc: &PublicationsDocument, title: &str, authors: &[String], year: i32) -> String {
    let surname = authors
        .first()
        .and_then(|a| a.split_whitespace().last())
        .unwrap_or("pub");
    let word = title
        .split_whitespace()
        .find(|w| w.chars().count() > 3)
        .unwrap_or("untitled");
    let base = slugify(&format!("{} {} {}", surname, year, word));
    let taken: HashSet<&str> = doc.publications.iter().map(|p| p.id.as_str()).collect();
    unique_id(&base, &taken)
}

pub fn news_id(doc: &NewsDocument, date: &str, title: &str) -> String {
    let base = format!("{}-{}", slugify(date), slugify(title));
    let taken: HashSet<&str> = doc.news.iter().map(|n| n.id.as_str()).collect();
    unique_id(&base, &taken)
}

/// Clear `needs_review` on the records whose id is in `ids`.
pub fn mark_reviewed(
    pubs: &mut PublicationsDocument,
    news: &mut NewsDocument,
    ids: &HashSet<&str>,
) -> usize {
    let mut marked = 0;
    for p in pubs.publications.iter_mut().filter(|p| p.needs_review) {
        if ids.contains(p.id.as_str()) {
            p.needs_review = false;
            marked += 1;
        }
    }
    for n in news.news.iter_mut().filter(|n| n.needs_review) {
        if ids.contains(n.id.as_str()) {
            n.needs_review = false;
            marked += 1;
        }
    }
    marked
}
