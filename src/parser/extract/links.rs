use std::collections::BTreeMap;

use scraper::Html;

use crate::parser::html;

/// Platforms recognised on the profile page, keyed by the profile's social map.
const PLATFORMS: &[(&str, &[&str])] = &[
    ("linkedin", &["linkedin.com"]),
    ("twitter", &["twitter.com", "x.com"]),
    ("facebook", &["facebook.com"]),
    ("researchgate", &["researchgate.net"]),
];

/// First link per known platform found anywhere in `page`.
pub fn extract(document: &Html) -> BTreeMap<String, String> {
    let mut social = BTreeMap::new();
    for url in html::hrefs(document.root_element()) {
        if let Some(platform) = classify_domain(&extract_domain(&url)) {
            social.entry(platform.to_string()).or_insert(url);
        }
    }
    social
}

pub fn extract_domain(url: &str) -> String {
    url.split("//")
        .nth(1)
        .unwrap_or(url)
        .split('/')
        .next()
        .unwrap_or("")
        .trim_start_matches("www.")
        .to_ascii_lowercase()
}

fn classify_domain(domain: &str) -> Option<&'static str> {
    PLATFORMS.iter().find_map(|(name, domains)| {
        domains
            .iter()
            .any(|d| domain == *d || domain.ends_with(&format!(".{}", d)))
            .then_some(*name)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_domain() {
        assert_eq!(extract_domain("https://www.LinkedIn.com/in/x"), "linkedin.com");
        assert_eq!(extract_domain("x.com/ada"), "x.com");
    }

    #[test]
    fn first_link_per_platform_wins() {
        let page = r#"<a href="https://twitter.com/first">t</a>
                      <a href="https://x.com/second">x</a>
                      <a href="https://box.com/no">box</a>
                      <a href="https://mobile.facebook.com/ada">fb</a>"#;
        let social = extract(&Html::parse_document(page));
        assert_eq!(social["twitter"], "https://twitter.com/first");
        assert_eq!(social["facebook"], "https://mobile.facebook.com/ada");
        assert_eq!(social.len(), 2);
    }
}
