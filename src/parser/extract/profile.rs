use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::links;
use crate::model::{Institution, PersonalProfile};
use crate::parser::html;

// "<title> @ <institution> in the <department>"
static SUBTITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)\s*@\s*(.+?)\s+in the\s+(.+)$").unwrap());

struct Subtitle {
    title: String,
    institution: String,
    department: String,
    links: Vec<String>,
}

/// Smallest element around an `@` whose text reads like the subtitle.
fn find_subtitle(document: &Html) -> Option<Subtitle> {
    html::elements_with_text(document, "@")
        .into_iter()
        .filter_map(|at| {
            std::iter::once(at)
                .chain(at.ancestors().filter_map(ElementRef::wrap))
                .find_map(|el| {
                    let text = html::text(el);
                    let caps = SUBTITLE_RE.captures(&text)?;
                    Some((
                        text.len(),
                        Subtitle {
                            title: caps[1].to_string(),
                            institution: caps[2].to_string(),
                            department: caps[3].to_string(),
                            links: html::hrefs(el),
                        },
                    ))
                })
        })
        .min_by_key(|(len, _)| *len)
        .map(|(_, s)| s)
}

pub fn extract(document: &Html) -> Option<PersonalProfile> {
    let logo_selector = Selector::parse("#logo, .logo").unwrap();
    let name = document
        .select(&logo_selector)
        .next()
        .map(html::text)
        .unwrap_or_default();

    let subtitle = find_subtitle(document);
    let social = links::extract(document);

    if name.is_empty() && subtitle.is_none() && social.is_empty() {
        return None;
    }

    let mut profile = PersonalProfile {
        name,
        social,
        ..PersonalProfile::default()
    };
    if let Some(s) = subtitle {
        profile.title = s.title;
        profile.institution = Institution {
            name: s.institution,
            url: s.links.first().cloned().unwrap_or_default(),
            department: s.department,
            department_url: s.links.get(1).cloned().unwrap_or_default(),
            ..Institution::default()
        };
    }
    Some(profile)
}
