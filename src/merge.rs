//! Existing-data-wins reconciliation.
//!
//! Extraction is lossy, so incoming records only ever fill gaps: an identity
//! key already in the collection leaves that record exactly as it was.

use std::collections::HashSet;

use crate::model::PersonalProfile;

/// A record with an identity key that is unique within its collection.
pub trait Keyed {
    fn key(&self) -> &str;
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeStats {
    pub added: usize,
    pub kept: usize,
}

impl MergeStats {
    pub fn changed(&self) -> bool {
        self.added > 0
    }
}

/// Append incoming records whose key is not yet present.
///
/// Duplicates within `incoming` collapse to their first occurrence.
pub fn merge_records<T: Keyed>(
    existing: &mut Vec<T>,
    incoming: impl IntoIterator<Item = T>,
) -> MergeStats {
    let mut seen: HashSet<String> = existing.iter().map(|r| r.key().to_string()).collect();
    let mut stats = MergeStats::default();

    for record in incoming {
        if seen.insert(record.key().to_string()) {
            existing.push(record);
            stats.added += 1;
        } else {
            stats.kept += 1;
        }
    }
    stats
}

/// Fill empty profile fields from `incoming`. Returns how many fields changed.
pub fn merge_profile(existing: &mut PersonalProfile, incoming: &PersonalProfile) -> usize {
    let mut filled = 0;
    let mut fill = |dst: &mut String, src: &str| {
        if dst.trim().is_empty() && !src.trim().is_empty() {
            *dst = src.to_string();
            filled += 1;
        }
    };

    fill(&mut existing.name, &incoming.name);
    fill(&mut existing.title, &incoming.title);
    fill(&mut existing.institution.name, &incoming.institution.name);
    fill(&mut existing.institution.url, &incoming.institution.url);
    fill(&mut existing.institution.department, &incoming.institution.department);
    fill(
        &mut existing.institution.department_url,
        &incoming.institution.department_url,
    );
    fill(&mut existing.research.focus, &incoming.research.focus);
    fill(&mut existing.research.description, &incoming.research.description);

    for (platform, url) in &incoming.social {
        if url.trim().is_empty() {
            continue;
        }
        let slot = existing.social.entry(platform.clone()).or_default();
        if slot.trim().is_empty() {
            *slot = url.clone();
            filled += 1;
        }
    }

    if existing.background.education.is_empty() && !incoming.background.education.is_empty() {
        existing.background.education = incoming.background.education.clone();
        filled += 1;
    }

    for interest in &incoming.interests {
        let known = existing
            .interests
            .iter()
            .any(|i| i.eq_ignore_ascii_case(interest));
        if !known && !interest.trim().is_empty() {
            existing.interests.push(interest.clone());
            filled += 1;
        }
    }

    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Publication, PublicationStatus};

    fn publication(id: &str, title: &str) -> Publication {
        Publication {
            id: id.into(),
            title: title.into(),
            year: 2023,
            ..Publication::default()
        }
    }

    #[test]
    fn existing_records_are_never_overwritten() {
        let mut curated = publication("k1", "Curated title");
        curated.authors = vec!["A. Korol".into()];
        curated.status = PublicationStatus::Submitted;
        let mut existing = vec![curated.clone()];

        let mut extracted = publication("k1", "Publication 1");
        extracted.needs_review = true;
        let stats = merge_records(&mut existing, vec![extracted, publication("k2", "New")]);

        assert_eq!(stats, MergeStats { added: 1, kept: 1 });
        assert_eq!(existing[0], curated);
        assert_eq!(existing[1].id, "k2");
    }

    #[test]
    fn merge_is_idempotent() {
        let mut existing = vec![publication("k1", "A")];
        let incoming = vec![publication("k2", "B"), publication("k2", "B again")];

        let first = merge_records(&mut existing, incoming.clone());
        assert_eq!(first, MergeStats { added: 1, kept: 1 });
        let snapshot = existing.clone();

        let second = merge_records(&mut existing, incoming);
        assert!(!second.changed());
        assert_eq!(existing, snapshot);
        assert_eq!(existing[1].title, "B");
    }

    #[test]
    fn profile_social_links_fill_gaps_only() {
        let mut existing = PersonalProfile {
            name: "Ada Korol".into(),
            ..PersonalProfile::default()
        };
        existing
            .social
            .insert("linkedin".into(), "https://linkedin.com/in/curated".into());
        existing.social.insert("twitter".into(), String::new());

        let mut incoming = PersonalProfile {
            name: "ADA K.".into(),
            title: "Professor".into(),
            ..PersonalProfile::default()
        };
        incoming
            .social
            .insert("linkedin".into(), "https://linkedin.com/in/scraped".into());
        incoming
            .social
            .insert("twitter".into(), "https://twitter.com/ada".into());
        incoming
            .social
            .insert("facebook".into(), String::new());

        let filled = merge_profile(&mut existing, &incoming);

        assert_eq!(filled, 2);
        assert_eq!(existing.name, "Ada Korol");
        assert_eq!(existing.title, "Professor");
        assert_eq!(existing.social["linkedin"], "https://linkedin.com/in/curated");
        assert_eq!(existing.social["twitter"], "https://twitter.com/ada");
        assert!(!existing.social.contains_key("facebook"));
    }
}
