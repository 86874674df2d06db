use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, warn};

use super::Candidate;
use crate::model::{Publication, PublicationStatus, PublicationType};
use crate::parser::bibtex::{self, BibEntry, BibError};
use crate::parser::html;
use crate::utils::{slugify, truncate, unique_id};

static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(20\d{2})\b").unwrap());
static DIGITS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{4}").unwrap());

const ABSTRACT_CHARS: usize = 200;
const ID_WORDS: usize = 6;

/// One placeholder publication per `.publication` / `[data-publication]`
/// element that mentions the author. Elements nested inside another match
/// belong to it and are not counted again.
pub fn extract_html(
    document: &Html,
    author_marker: &str,
    today: NaiveDate,
) -> Vec<Candidate<Publication>> {
    if author_marker.trim().is_empty() {
        warn!("author marker is empty, skipping HTML publication extraction");
        return Vec::new();
    }
    let publication_selector = Selector::parse(".publication, [data-publication]").unwrap();

    let mut taken: HashSet<String> = HashSet::new();
    let mut out = Vec::new();

    for e in document.select(&publication_selector) {
        if html::has_matching_ancestor(e, &publication_selector) {
            continue;
        }
        let text = html::text(e);
        if !text.contains(author_marker) {
            continue;
        }

        let mut candidate = Candidate::new(Publication::default());
        let year = match YEAR_RE.captures(&text).and_then(|c| c[1].parse().ok()) {
            Some(y) => y,
            None => {
                candidate.defaulted.push("year");
                today.year()
            }
        };

        // Only the element's own text goes into the id, so re-extraction
        // yields the same id whatever the date.
        let words: Vec<&str> = text.split_whitespace().take(ID_WORDS).collect();
        let base = format!("extracted-{}", slugify(&words.join(" ")));
        let id = {
            let refs: HashSet<&str> = taken.iter().map(String::as_str).collect();
            unique_id(&base, &refs)
        };
        taken.insert(id.clone());

        candidate.record = Publication {
            id,
            title: format!("Publication {}", out.len() + 1),
            year,
            abstract_text: truncate(&text, ABSTRACT_CHARS),
            needs_review: true,
            ..Publication::default()
        };
        candidate
            .defaulted
            .extend(["title", "authors", "journal", "image"]);
        out.push(candidate);
    }

    debug!("{} publication candidate(s) from HTML", out.len());
    out
}

/// Parse a `.bib` file; `article` entries become candidates, broken entries
/// are returned separately.
pub fn extract_bibtex(src: &str, today: NaiveDate) -> (Vec<Candidate<Publication>>, Vec<BibError>) {
    let mut candidates = Vec::new();
    let mut errors = Vec::new();
    for result in bibtex::parse(src) {
        match result {
            Ok(entry) => {
                if let Some(c) = from_bibtex(&entry, today) {
                    candidates.push(c);
                } else {
                    debug!("ignoring @{} entry {}", entry.kind, entry.key);
                }
            }
            Err(e) => errors.push(e),
        }
    }
    (candidates, errors)
}

pub fn from_bibtex(entry: &BibEntry, today: NaiveDate) -> Option<Candidate<Publication>> {
    if entry.kind != "article" {
        return None;
    }
    let mut defaulted = Vec::new();
    let mut or_default = |field: &'static str, fallback: &str| -> String {
        match entry.field(field) {
            Some(v) => v.to_string(),
            None => {
                defaulted.push(field);
                fallback.to_string()
            }
        }
    };

    let title = or_default("title", "Untitled");
    let journal = or_default("journal", "Unknown Journal");
    let abstract_text = or_default("abstract", "");

    let authors = match entry.field("author") {
        Some(raw) => bibtex::split_authors(raw),
        None => {
            defaulted.push("author");
            Vec::new()
        }
    };

    let year = match entry
        .field("year")
        .and_then(|y| DIGITS_RE.find(y))
        .and_then(|m| m.as_str().parse().ok())
    {
        Some(y) => y,
        None => {
            defaulted.push("year");
            today.year()
        }
    };

    let record = Publication {
        id: entry.key.clone(),
        title,
        authors,
        journal,
        year,
        doi: entry.field("doi").map(str::to_string),
        abstract_text,
        image: String::new(),
        kind: PublicationType::Journal,
        status: PublicationStatus::Published,
        needs_review: true,
        ..Publication::default()
    };
    Some(Candidate { record, defaulted })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    #[test]
    fn missing_author_gives_empty_list() {
        let (pubs, errors) = extract_bibtex("@article{k1, title={T}, year={2022}}", today());
        assert!(errors.is_empty());
        assert_eq!(pubs.len(), 1);
        let c = &pubs[0];
        assert_eq!(c.record.id, "k1");
        assert_eq!(c.record.title, "T");
        assert!(c.record.authors.is_empty());
        assert_eq!(c.record.year, 2022);
        assert_eq!(c.record.journal, "Unknown Journal");
        assert!(c.record.needs_review);
        assert!(c.defaulted.contains(&"author"));
        assert!(c.defaulted.contains(&"journal"));

        // Serialized as an explicit empty list, not omitted.
        let v = serde_json::to_value(&c.record).unwrap();
        assert_eq!(v["authors"], serde_json::json!([]));
    }

    #[test]
    fn only_articles_become_publications() {
        let src = std::fs::read_to_string("tests/fixtures/publications.bib").unwrap();
        let (pubs, errors) = extract_bibtex(&src, today());
        let ids: Vec<&str> = pubs.iter().map(|c| c.record.id.as_str()).collect();
        assert_eq!(ids, vec!["korol2023spin", "doe2021notes"]);
        assert_eq!(errors.len(), 1);

        let spin = &pubs[0].record;
        assert_eq!(spin.authors, vec!["Ada Korol", "Bob Smith"]);
        assert_eq!(spin.doi.as_deref(), Some("10.1103/PhysRevB.108.014401"));
        assert!(pubs[0].defaulted.is_empty());

        // No year field → current year.
        assert_eq!(pubs[1].record.year, 2025);
    }

    #[test]
    fn html_extraction_requires_marker() {
        let page = Html::parse_document(r#"<li class="publication">Someone else, 2020</li>"#);
        assert!(extract_html(&page, "Korol", today()).is_empty());
        assert!(extract_html(&page, "", today()).is_empty());
        assert_eq!(extract_html(&page, "Someone", today()).len(), 1);
    }

    #[test]
    fn duplicate_leading_text_gets_distinct_ids() {
        let page = Html::parse_document(
            r#"<p data-publication>Korol et al. 2020 part one</p>
               <p data-publication>Korol et al. 2020 part one</p>"#,
        );
        let pubs = extract_html(&page, "Korol", today());
        assert_eq!(pubs.len(), 2);
        assert_eq!(pubs[0].record.id, "extracted-korol-et-al-2020-part-one");
        assert_eq!(pubs[1].record.id, "extracted-korol-et-al-2020-part-one-2");
        assert_eq!(pubs[1].record.title, "Publication 2");
    }

    #[test]
    fn nested_markup_is_one_publication() {
        let page = Html::parse_document(
            r#"<article class="publication">
                 <div class="publication-body">A. Korol, B. Smith. Spin waves. 2023</div>
               </article>
               <div data-publication><p class="publication">A. Korol. Magnons. 2022</p></div>"#,
        );
        let pubs = extract_html(&page, "Korol", today());
        assert_eq!(pubs.len(), 2);
        assert_eq!(pubs[0].record.year, 2023);
        assert_eq!(pubs[1].record.year, 2022);
    }

    #[test]
    fn ids_do_not_depend_on_the_date() {
        let page = Html::parse_document(r#"<li class="publication">C. Doe, A. Korol. Notes.</li>"#);
        let now = extract_html(&page, "Korol", today());
        let later = extract_html(&page, "Korol", NaiveDate::from_ymd_opt(2031, 1, 1).unwrap());
        assert_eq!(now[0].record.id, later[0].record.id);
        assert_ne!(now[0].record.year, later[0].record.year);
        assert!(now[0].defaulted.contains(&"year"));
    }
}
