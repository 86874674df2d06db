pub mod links;
pub mod news;
pub mod profile;
pub mod publications;

use chrono::NaiveDate;
use scraper::Html;

use crate::model::{NewsItem, PersonalProfile, Publication};

/// A record produced by heuristics, not yet checked by a person.
#[derive(Debug, Clone)]
pub struct Candidate<T> {
    pub record: T,
    /// Fields that were absent from the source and got a default value.
    pub defaulted: Vec<&'static str>,
}

impl<T> Candidate<T> {
    pub fn new(record: T) -> Self {
        Candidate {
            record,
            defaulted: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
pub struct ExtractedData {
    pub profile: Option<PersonalProfile>,
    pub publications: Vec<Candidate<Publication>>,
    pub news: Vec<Candidate<NewsItem>>,
}

impl ExtractedData {
    pub fn extend(&mut self, other: ExtractedData) {
        if self.profile.is_none() {
            self.profile = other.profile;
        } else if let (Some(mine), Some(theirs)) = (self.profile.as_mut(), other.profile) {
            crate::merge::merge_profile(mine, &theirs);
        }
        self.publications.extend(other.publications);
        self.news.extend(other.news);
    }
}

/// Run every HTML extractor over one page.
pub fn extract_page(page: &str, author_marker: &str, today: NaiveDate) -> ExtractedData {
    let document = Html::parse_document(page);
    ExtractedData {
        profile: profile::extract(&document),
        publications: publications::extract_html(&document, author_marker, today),
        news: news::extract(&document, today),
    }
}

// ── Tests ──
