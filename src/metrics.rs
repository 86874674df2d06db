use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;
use crate::model::{Publication, PublicationStatus, PublicationsDocument};

/// Aggregates over the publication list, recomputed from scratch each run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicationStatistics {
    pub total: usize,
    pub by_year: BTreeMap<i32, usize>,
    pub by_status: BTreeMap<String, usize>,
    pub by_type: BTreeMap<String, usize>,
    pub latest_publication: Option<Publication>,
    pub collaborators: Vec<String>,
}

fn normalize_author(name: &str) -> String {
    name.trim().trim_end_matches('*').trim().to_lowercase()
}

pub fn compute_metrics(publications: &[Publication], owner: &str) -> PublicationStatistics {
    let mut by_year = BTreeMap::new();
    let mut by_status = BTreeMap::new();
    let mut by_type = BTreeMap::new();
    let mut collaborators = BTreeSet::new();
    let owner = normalize_author(owner);

    for p in publications {
        *by_year.entry(p.year).or_insert(0) += 1;
        *by_status.entry(p.status.as_str().to_string()).or_insert(0) += 1;
        *by_type.entry(p.kind.as_str().to_string()).or_insert(0) += 1;
        for author in &p.authors {
            let trimmed = author.trim().trim_end_matches('*').trim();
            if !trimmed.is_empty() && normalize_author(trimmed) != owner {
                collaborators.insert(trimmed.to_string());
            }
        }
    }

    // Greatest year wins; on ties the earlier entry (newest by convention) stays.
    let latest_publication = publications
        .iter()
        .filter(|p| p.status == PublicationStatus::Published)
        .fold(None::<&Publication>, |best, p| match best {
            Some(b) if b.year >= p.year => Some(b),
            _ => Some(p),
        })
        .cloned();

    PublicationStatistics {
        total: publications.len(),
        by_year,
        by_status,
        by_type,
        latest_publication,
        collaborators: collaborators.into_iter().collect(),
    }
}

/// Shallow-merge `stats` into the document's `statistics` object.
pub fn apply_statistics(
    doc: &mut PublicationsDocument,
    stats: &PublicationStatistics,
    updated: NaiveDateTime,
) -> Result<()> {
    if let Value::Object(fields) = serde_json::to_value(stats)? {
        for (k, v) in fields {
            doc.statistics.insert(k, v);
        }
    }
    doc.statistics.insert(
        "last_updated".to_string(),
        Value::String(updated.format("%Y-%m-%dT%H:%M:%S").to_string()),
    );
    Ok(())
}
