//! Record types for the five site documents.
//!
//! Field order is declaration order, which keeps the pretty-printed JSON
//! stable for version control.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::merge::Keyed;

/// A whole JSON document in the data store.
pub trait Document: Serialize + DeserializeOwned + Default {
    /// File stem under the data directory.
    const NAME: &'static str;
}

/// Every document name, in pipeline order.
pub const DOCUMENT_NAMES: [&str; 5] = [
    PersonalProfile::NAME,
    PublicationsDocument::NAME,
    NewsDocument::NAME,
    ResourcesDocument::NAME,
    ActivitiesDocument::NAME,
];

fn is_false(b: &bool) -> bool {
    !*b
}

// ── Profile ──

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub institution: Institution,
    #[serde(default)]
    pub background: Background,
    #[serde(default)]
    pub research: Research,
    /// Platform name → URL.
    #[serde(default)]
    pub social: BTreeMap<String, String>,
    #[serde(default)]
    pub interests: Vec<String>,
    /// Keys this tool does not know about, carried through load and save.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Institution {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub department: String,
    #[serde(default, rename = "departmentUrl")]
    pub department_url: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Background {
    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Education {
    pub degree: String,
    pub institution: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Research {
    #[serde(default)]
    pub focus: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Document for PersonalProfile {
    const NAME: &'static str = "personal";
}

// ── Publications ──

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublicationType {
    #[default]
    Journal,
    Conference,
    Preprint,
}

impl PublicationType {
    pub const ALL: [PublicationType; 3] = [Self::Journal, Self::Conference, Self::Preprint];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Journal => "journal",
            Self::Conference => "conference",
            Self::Preprint => "preprint",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublicationStatus {
    #[default]
    Published,
    Submitted,
    InPreparation,
}

impl PublicationStatus {
    pub const ALL: [PublicationStatus; 3] =
        [Self::Published, Self::Submitted, Self::InPreparation];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Published => "published",
            Self::Submitted => "submitted",
            Self::InPreparation => "in_preparation",
        }
    }
}

impl fmt::Display for PublicationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for PublicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Publication {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub journal: String,
    pub year: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(default, rename = "abstract")]
    pub abstract_text: String,
    #[serde(default)]
    pub image: String,
    #[serde(default, rename = "type")]
    pub kind: PublicationType,
    #[serde(default)]
    pub status: PublicationStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub awards: Vec<String>,
    /// Set on extracted candidates until a person has checked them.
    #[serde(default, skip_serializing_if = "is_false")]
    pub needs_review: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Keyed for Publication {
    fn key(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublicationsDocument {
    #[serde(default)]
    pub publications: Vec<Publication>,
    /// Open object; metrics runs shallow-merge their keys into it.
    #[serde(default)]
    pub statistics: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Document for PublicationsDocument {
    const NAME: &'static str = "publications";
}

// ── News ──

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NewsCategory {
    #[default]
    Academic,
    Research,
    Personal,
    Awards,
    Outreach,
}

impl NewsCategory {
    pub const ALL: [NewsCategory; 5] = [
        Self::Academic,
        Self::Research,
        Self::Personal,
        Self::Awards,
        Self::Outreach,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Academic => "academic",
            Self::Research => "research",
            Self::Personal => "personal",
            Self::Awards => "awards",
            Self::Outreach => "outreach",
        }
    }
}

impl fmt::Display for NewsCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub id: String,
    pub title: String,
    /// Calendar date, `YYYY-MM-DD`.
    pub date: String,
    #[serde(default)]
    pub category: NewsCategory,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub needs_review: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Keyed for NewsItem {
    fn key(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewsDocument {
    #[serde(default)]
    pub news: Vec<NewsItem>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Document for NewsDocument {
    const NAME: &'static str = "news";
}

// ── Resources ──

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceSection {
    pub key: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub title: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub links: Vec<ResourceLink>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceLink {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub provider: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Keyed for ResourceSection {
    fn key(&self) -> &str {
        &self.key
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourcesDocument {
    #[serde(default)]
    pub sections: Vec<ResourceSection>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Document for ResourcesDocument {
    const NAME: &'static str = "resources";
}

// ── Activities ──

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivitySection {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Keyed for ActivitySection {
    fn key(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivitiesDocument {
    #[serde(default)]
    pub sections: Vec<ActivitySection>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Document for ActivitiesDocument {
    const NAME: &'static str = "activities";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publication_uses_site_field_names() {
        let p = Publication {
            id: "p1".into(),
            title: "T".into(),
            year: 2024,
            kind: PublicationType::Conference,
            status: PublicationStatus::InPreparation,
            abstract_text: "A".into(),
            ..Publication::default()
        };
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["type"], "conference");
        assert_eq!(v["status"], "in_preparation");
        assert_eq!(v["abstract"], "A");
        assert!(v.get("needs_review").is_none());
        assert!(v.get("doi").is_none());
    }

    #[test]
    fn profile_reads_department_url() {
        let json = r#"{
            "name": "Ada",
            "institution": { "name": "U", "departmentUrl": "https://u.example/phys" }
        }"#;
        let p: PersonalProfile = serde_json::from_str(json).unwrap();
        assert_eq!(p.institution.department_url, "https://u.example/phys");
        assert!(p.social.is_empty());
    }

    #[test]
    fn unknown_keys_survive_a_round_trip() {
        let json = r#"{
            "publications": [
                { "id": "a", "title": "T", "year": 2024, "pdf": "papers/a.pdf", "citations": 12 }
            ],
            "statistics": {},
            "metadata": { "curator": "ada" }
        }"#;
        let doc: PublicationsDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.publications[0].extra["pdf"], "papers/a.pdf");
        assert_eq!(doc.extra["metadata"]["curator"], "ada");

        let v = serde_json::to_value(&doc).unwrap();
        assert_eq!(v["publications"][0]["pdf"], "papers/a.pdf");
        assert_eq!(v["publications"][0]["citations"], 12);
        assert_eq!(v["metadata"]["curator"], "ada");

        let profile: PersonalProfile = serde_json::from_str(
            r#"{ "name": "Ada", "photo": "me.jpg", "institution": { "name": "U", "city": "Montreal" } }"#,
        )
        .unwrap();
        let v = serde_json::to_value(&profile).unwrap();
        assert_eq!(v["photo"], "me.jpg");
        assert_eq!(v["institution"]["city"], "Montreal");
    }

    #[test]
    fn unknown_category_is_rejected() {
        let json = r#"{ "news": [ { "id": "n", "title": "t", "date": "2024-01-01", "category": "gossip" } ] }"#;
        assert!(serde_json::from_str::<NewsDocument>(json).is_err());
    }
}
