//! Advisory checks over the documents. Nothing here mutates state or blocks
//! rendering; the caller decides what to do with the issues.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use crate::merge::Keyed;
use crate::model::*;

static DOI_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^10\.\S+$").unwrap());

pub const MIN_YEAR: i32 = 1900;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueKind {
    MissingField,
    DoiFormat,
    YearRange,
    InvalidDate,
    InvalidUrl,
    DuplicateTitle,
    DuplicateId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    pub document: &'static str,
    /// Identity key of the offending record (empty for document-level issues).
    pub record: String,
    pub kind: IssueKind,
    pub message: String,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.record.is_empty() {
            write!(f, "{}: {}", self.document, self.message)
        } else {
            write!(f, "{}[{}]: {}", self.document, self.record, self.message)
        }
    }
}

struct Collector {
    document: &'static str,
    issues: Vec<Issue>,
}

impl Collector {
    fn new(document: &'static str) -> Self {
        Collector {
            document,
            issues: Vec::new(),
        }
    }

    fn push(&mut self, record: &str, kind: IssueKind, message: impl Into<String>) {
        self.issues.push(Issue {
            document: self.document,
            record: record.to_string(),
            kind,
            message: message.into(),
        });
    }

    fn require(&mut self, record: &str, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.push(record, IssueKind::MissingField, format!("missing {}", field));
        }
    }

    fn unique_keys<'a, T: Keyed + 'a>(&mut self, records: impl IntoIterator<Item = &'a T>) {
        let mut seen = HashSet::new();
        for key in records.into_iter().map(Keyed::key) {
            if key.trim().is_empty() {
                self.push(key, IssueKind::MissingField, "missing identity key");
            } else if !seen.insert(key) {
                self.push(key, IssueKind::DuplicateId, format!("duplicate id {:?}", key));
            }
        }
    }
}

pub fn validate_profile(p: &PersonalProfile) -> Vec<Issue> {
    let mut c = Collector::new(PersonalProfile::NAME);
    c.require("", "name", &p.name);
    for (platform, url) in &p.social {
        if !url.is_empty() && !url.starts_with("http") {
            c.push(platform, IssueKind::InvalidUrl, format!("{} link is not an absolute URL", platform));
        }
    }
    c.issues
}

pub fn validate_publications(doc: &PublicationsDocument, today: NaiveDate) -> Vec<Issue> {
    let mut c = Collector::new(PublicationsDocument::NAME);
    let max_year = today.year() + 2;

    c.unique_keys(&doc.publications);

    let mut titles: HashMap<String, &str> = HashMap::new();
    for p in &doc.publications {
        c.require(&p.id, "title", &p.title);
        if p.authors.iter().all(|a| a.trim().is_empty()) {
            c.push(&p.id, IssueKind::MissingField, "authors list is empty");
        }
        if let Some(doi) = &p.doi {
            if !DOI_RE.is_match(doi.trim()) {
                c.push(&p.id, IssueKind::DoiFormat, format!("DOI {:?} does not start with \"10.\"", doi));
            }
        }
        if !(MIN_YEAR..=max_year).contains(&p.year) {
            c.push(
                &p.id,
                IssueKind::YearRange,
                format!("year {} outside {}..={}", p.year, MIN_YEAR, max_year),
            );
        }

        let title_key = p.title.trim().to_lowercase();
        if title_key.is_empty() {
            continue;
        }
        if let Some(first) = titles.get(&title_key) {
            c.push(
                &p.id,
                IssueKind::DuplicateTitle,
                format!("title duplicates publication {:?}", first),
            );
        } else {
            titles.insert(title_key, &p.id);
        }
    }
    c.issues
}

pub fn validate_news(doc: &NewsDocument) -> Vec<Issue> {
    let mut c = Collector::new(NewsDocument::NAME);
    c.unique_keys(&doc.news);
    for n in &doc.news {
        c.require(&n.id, "title", &n.title);
        if NaiveDate::parse_from_str(&n.date, "%Y-%m-%d").is_err() {
            c.push(&n.id, IssueKind::InvalidDate, format!("date {:?} is not YYYY-MM-DD", n.date));
        }
    }
    c.issues
}

pub fn validate_resources(doc: &ResourcesDocument) -> Vec<Issue> {
    let mut c = Collector::new(ResourcesDocument::NAME);
    c.unique_keys(&doc.sections);
    for s in &doc.sections {
        c.require(&s.key, "title", &s.title);
        for r in &s.resources {
            c.require(&s.key, "resource title", &r.title);
            for link in &r.links {
                if link.url.trim().is_empty() {
                    c.push(
                        &s.key,
                        IssueKind::MissingField,
                        format!("link {:?} in {:?} has no URL", link.title, r.title),
                    );
                }
            }
        }
    }
    c.issues
}

pub fn validate_activities(doc: &ActivitiesDocument) -> Vec<Issue> {
    let mut c = Collector::new(ActivitiesDocument::NAME);
    c.unique_keys(&doc.sections);
    for s in &doc.sections {
        c.require(&s.id, "title", &s.title);
        for a in &s.activities {
            c.require(&s.id, "activity title", &a.title);
        }
    }
    c.issues
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn valid(id: &str, title: &str) -> Publication {
        Publication {
            id: id.into(),
            title: title.into(),
            authors: vec!["Ada Korol".into()],
            year: 2024,
            doi: Some("10.1000/xyz123".into()),
            ..Publication::default()
        }
    }

    fn kinds(issues: &[Issue]) -> Vec<IssueKind> {
        issues.iter().map(|i| i.kind).collect()
    }

    fn doc(pubs: Vec<Publication>) -> PublicationsDocument {
        PublicationsDocument {
            publications: pubs,
            ..PublicationsDocument::default()
        }
    }

    #[test]
    fn valid_publication_has_no_issues() {
        assert!(validate_publications(&doc(vec![valid("a", "A")]), today()).is_empty());
    }

    #[test]
    fn bad_doi_is_one_issue() {
        let mut p = valid("a", "A");
        p.doi = Some("abc".into());
        let issues = validate_publications(&doc(vec![p]), today());
        assert_eq!(kinds(&issues), vec![IssueKind::DoiFormat]);
    }

    #[test]
    fn year_1850_is_one_issue() {
        let mut p = valid("a", "A");
        p.year = 1850;
        let issues = validate_publications(&doc(vec![p]), today());
        assert_eq!(kinds(&issues), vec![IssueKind::YearRange]);

        let mut future = valid("b", "B");
        future.year = 2027;
        assert!(validate_publications(&doc(vec![future]), today()).is_empty());
    }

    #[test]
    fn case_insensitive_duplicate_title_is_one_issue() {
        let issues = validate_publications(
            &doc(vec![valid("a", "Spin Waves"), valid("b", "spin waves ")]),
            today(),
        );
        assert_eq!(kinds(&issues), vec![IssueKind::DuplicateTitle]);
        assert_eq!(issues[0].record, "b");
    }

    #[test]
    fn missing_title_and_authors() {
        let mut p = valid("a", "");
        p.authors.clear();
        let issues = validate_publications(&doc(vec![p]), today());
        assert_eq!(
            kinds(&issues),
            vec![IssueKind::MissingField, IssueKind::MissingField]
        );
    }

    #[test]
    fn duplicate_ids_and_bad_dates() {
        let item = |id: &str, date: &str| NewsItem {
            id: id.into(),
            title: "t".into(),
            date: date.into(),
            ..NewsItem::default()
        };
        let news = NewsDocument {
            news: vec![item("n1", "2024-02-30"), item("n1", "2024-02-01")],
            ..NewsDocument::default()
        };
        let issues = validate_news(&news);
        assert_eq!(
            kinds(&issues),
            vec![IssueKind::DuplicateId, IssueKind::InvalidDate]
        );
    }

    #[test]
    fn relative_social_link_is_an_invalid_url() {
        let mut profile = PersonalProfile {
            name: "Ada Korol".into(),
            ..PersonalProfile::default()
        };
        profile.social.insert("twitter".into(), "twitter.com/ada".into());
        profile.social.insert("linkedin".into(), "https://linkedin.com/in/ada".into());
        let issues = validate_profile(&profile);
        assert_eq!(kinds(&issues), vec![IssueKind::InvalidUrl]);
        assert_eq!(issues[0].record, "twitter");
    }

    #[test]
    fn resource_links_need_urls() {
        let doc = ResourcesDocument {
            sections: vec![ResourceSection {
                key: "python".into(),
                title: "Python".into(),
                resources: vec![Resource {
                    title: "Intro".into(),
                    links: vec![ResourceLink {
                        title: "Slides".into(),
                        url: " ".into(),
                        provider: String::new(),
                        ..ResourceLink::default()
                    }],
                    ..Resource::default()
                }],
                ..ResourceSection::default()
            }],
            ..ResourcesDocument::default()
        };
        let issues = validate_resources(&doc);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].to_string().starts_with("resources[python]"));
    }
}
