//! schema.org `Person` structured data for the home page.

use serde_json::{json, Map, Value};

use crate::model::{PersonalProfile, PublicationStatus, PublicationsDocument};

pub fn render_person(
    profile: &PersonalProfile,
    publications: &PublicationsDocument,
    site_root: &str,
    include_unreviewed: bool,
) -> crate::error::Result<String> {
    let mut person = Map::new();
    person.insert("@context".into(), json!("https://schema.org"));
    person.insert("@type".into(), json!("Person"));
    person.insert("name".into(), json!(profile.name));
    person.insert("url".into(), json!(format!("{}/", site_root)));
    if !profile.title.is_empty() {
        person.insert("jobTitle".into(), json!(profile.title));
    }

    let inst = &profile.institution;
    if !inst.name.is_empty() {
        let mut org = Map::new();
        org.insert("@type".into(), json!("CollegeOrUniversity"));
        org.insert("name".into(), json!(inst.name));
        if !inst.url.is_empty() {
            org.insert("url".into(), json!(inst.url));
        }
        if !inst.department.is_empty() {
            org.insert(
                "department".into(),
                json!({ "@type": "Organization", "name": inst.department }),
            );
        }
        person.insert("affiliation".into(), Value::Object(org));
    }

    let alumni: Vec<Value> = profile
        .background
        .education
        .iter()
        .map(|e| json!({ "@type": "CollegeOrUniversity", "name": e.institution }))
        .collect();
    if !alumni.is_empty() {
        person.insert("alumniOf".into(), Value::Array(alumni));
    }

    let same_as: Vec<&String> = profile.social.values().filter(|u| !u.is_empty()).collect();
    if !same_as.is_empty() {
        person.insert("sameAs".into(), json!(same_as));
    }

    let mut knows: Vec<&str> = Vec::new();
    if !profile.research.focus.is_empty() {
        knows.push(&profile.research.focus);
    }
    knows.extend(profile.interests.iter().map(String::as_str));
    if !knows.is_empty() {
        person.insert("knowsAbout".into(), json!(knows));
    }

    let works: Vec<Value> = publications
        .publications
        .iter()
        .filter(|p| p.status == PublicationStatus::Published)
        .filter(|p| include_unreviewed || !p.needs_review)
        .map(|p| {
            let mut w = Map::new();
            w.insert("@type".into(), json!("ScholarlyArticle"));
            w.insert("headline".into(), json!(p.title));
            w.insert("datePublished".into(), json!(p.year.to_string()));
            if !p.journal.is_empty() {
                w.insert(
                    "isPartOf".into(),
                    json!({ "@type": "Periodical", "name": p.journal }),
                );
            }
            if let Some(doi) = &p.doi {
                w.insert("sameAs".into(), json!(format!("https://doi.org/{}", doi)));
            }
            w.insert(
                "author".into(),
                Value::Array(
                    p.authors
                        .iter()
                        .map(|a| json!({ "@type": "Person", "name": a }))
                        .collect(),
                ),
            );
            Value::Object(w)
        })
        .collect();
    if !works.is_empty() {
        person.insert("workExample".into(), Value::Array(works));
    }

    let mut text = serde_json::to_string_pretty(&Value::Object(person))?;
    text.push('\n');
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Institution, Publication};

    #[test]
    fn person_with_published_work() {
        let mut profile = PersonalProfile {
            name: "Ada Korol".into(),
            title: "Assistant Professor".into(),
            institution: Institution {
                name: "University of Montreal".into(),
                department: "Physics".into(),
                ..Institution::default()
            },
            interests: vec!["magnonics".into()],
            ..PersonalProfile::default()
        };
        profile
            .social
            .insert("linkedin".into(), "https://linkedin.com/in/ak".into());

        let pubs = PublicationsDocument {
            publications: vec![
                Publication {
                    id: "a".into(),
                    title: "Published".into(),
                    year: 2024,
                    doi: Some("10.1/x".into()),
                    ..Publication::default()
                },
                Publication {
                    id: "b".into(),
                    title: "Submitted".into(),
                    year: 2025,
                    status: PublicationStatus::Submitted,
                    ..Publication::default()
                },
            ],
            ..PublicationsDocument::default()
        };

        let text = render_person(&profile, &pubs, "https://korol.example", false).unwrap();
        assert_eq!(
            text,
            render_person(&profile, &pubs, "https://korol.example", false).unwrap()
        );
        let v: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(v["@type"], "Person");
        assert_eq!(v["url"], "https://korol.example/");
        assert_eq!(v["affiliation"]["department"]["name"], "Physics");
        assert_eq!(v["sameAs"][0], "https://linkedin.com/in/ak");
        assert_eq!(v["knowsAbout"][0], "magnonics");
        assert_eq!(v["workExample"].as_array().unwrap().len(), 1);
        assert_eq!(v["workExample"][0]["sameAs"], "https://doi.org/10.1/x");
        assert!(text.find("\"@context\"").unwrap() < text.find("\"name\"").unwrap());
    }
}
