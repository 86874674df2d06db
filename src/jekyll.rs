//! Converts the hand-authored `en/` and `fr/` pages into Jekyll pages: front
//! matter from `<head>`, body from the main content region, links made absolute.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use regex::{Captures, Regex};
use tracing::{info, warn};

use crate::store::write_atomic;

pub const LANGS: [&str; 2] = ["en", "fr"];
const DEFAULT_TITLE: &str = "Korol Group";
const SUFFIX: &str = "-jekyll";

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<title>(.*?)</title>").unwrap());
static DESCRIPTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<meta name="description" content="(.*?)""#).unwrap());
static KEYWORDS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<meta name="keywords" content="(.*?)""#).unwrap());

// Tried in order; the first capture wins.
static CONTENT_RES: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    [
        Regex::new(r#"(?s)</section>\s*<!-- Main -->.*?<main id="main-content">(.*?)</main>"#)
            .unwrap(),
        Regex::new(r#"(?s)<!-- Main -->\s*<section id="main">(.*?)</section>\s*<!-- Footer -->"#)
            .unwrap(),
        Regex::new(r#"(?s)<!-- Main -->\s*<section id="main">(.*?)<!-- Footer -->"#).unwrap(),
        Regex::new(r"(?s)<main[^>]*>(.*?)</main>").unwrap(),
    ]
});

static SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!-- Publication unhide functionality -->.*?</script>").unwrap()
});
static HREF_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"href="([^"]*)""#).unwrap());

#[derive(Debug, Clone, PartialEq)]
pub struct PageMeta {
    pub title: String,
    pub description: String,
    pub keywords: String,
}

pub fn extract_metadata(html: &str) -> PageMeta {
    let grab = |re: &Regex| {
        re.captures(html)
            .map(|c| c[1].trim().to_string())
            .unwrap_or_default()
    };
    let title = grab(&TITLE_RE);
    PageMeta {
        title: if title.is_empty() { DEFAULT_TITLE.to_string() } else { title },
        description: grab(&DESCRIPTION_RE),
        keywords: grab(&KEYWORDS_RE),
    }
}

pub fn extract_content(html: &str) -> Option<&str> {
    CONTENT_RES
        .iter()
        .find_map(|re| re.captures(html))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
}

pub fn extract_custom_scripts(html: &str) -> Option<String> {
    let scripts: Vec<&str> = SCRIPT_RE.find_iter(html).map(|m| m.as_str()).collect();
    if scripts.is_empty() {
        None
    } else {
        Some(scripts.join("\n"))
    }
}

/// Asset paths become site-absolute; relative `*.html` links gain `/<lang>/`.
pub fn rewrite_links(content: &str, lang: &str) -> String {
    let content = content
        .replace(r#"src="../images/"#, r#"src="/images/"#)
        .replace(r#"href="../images/"#, r#"href="/images/"#)
        .replace(r#"srcset="images/"#, r#"srcset="/images/"#)
        .replace("../assets/", "/assets/");

    HREF_RE
        .replace_all(&content, |caps: &Captures<'_>| {
            let target = &caps[1];
            let absolute = ["http://", "https://", "/", "#", "mailto:"]
                .iter()
                .any(|p| target.starts_with(p));
            if !absolute && target.ends_with(".html") {
                format!(r#"href="/{}/{}""#, lang, target)
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

fn yaml_quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

/// The Jekyll rendition of one page, or `None` when no content region is found.
pub fn convert_page(html: &str, lang: &str, file_name: &str) -> Option<String> {
    let content = extract_content(html)?;
    let meta = extract_metadata(html);

    let mut out = String::from("---\nlayout: default\n");
    out.push_str(&format!("title: {}\n", yaml_quote(&meta.title)));
    out.push_str(&format!("description: {}\n", yaml_quote(&meta.description)));
    out.push_str(&format!("keywords: {}\n", yaml_quote(&meta.keywords)));
    out.push_str(&format!("lang: {}\n", lang));
    out.push_str(&format!("permalink: /{}/{}\n", lang, file_name));
    if let Some(scripts) = extract_custom_scripts(html) {
        out.push_str("custom_scripts: |\n");
        for line in scripts.lines() {
            out.push_str("  ");
            out.push_str(line);
            out.push('\n');
        }
    }
    out.push_str("---\n\n");
    out.push_str(&rewrite_links(content, lang));
    Some(out)
}

#[derive(Debug, Default)]
pub struct ConvertReport {
    pub converted: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
}

impl ConvertReport {
    pub fn print(&self) {
        println!(
            "Converted {} page(s), {} without recognizable content.",
            self.converted.len(),
            self.skipped.len()
        );
        for path in &self.skipped {
            println!("  ⚠️  {}", path.display());
        }
    }
}

fn pages_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut pages = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))? {
        let path = entry?.path();
        let is_source = path.extension().is_some_and(|e| e == "html")
            && path
                .file_stem()
                .and_then(|s| s.to_str())
                .is_some_and(|s| !s.ends_with(SUFFIX));
        if is_source {
            pages.push(path);
        }
    }
    pages.sort();
    Ok(pages)
}

/// Convert every page under `<pages_dir>/en` and `<pages_dir>/fr`, writing
/// `<stem>-jekyll.html` next to each source.
pub fn convert_all(pages_dir: &Path) -> Result<ConvertReport> {
    let mut work = Vec::new();
    for lang in LANGS {
        let dir = pages_dir.join(lang);
        if !dir.is_dir() {
            warn!("{} does not exist, skipping", dir.display());
            continue;
        }
        work.extend(pages_in(&dir)?.into_iter().map(|p| (lang, p)));
    }

    let pb = ProgressBar::new(work.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let mut report = ConvertReport::default();
    for (lang, path) in work {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        pb.set_message(file_name.clone());

        let html = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        match convert_page(&html, lang, &file_name) {
            Some(page) => {
                let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
                let out = path.with_file_name(format!("{}{}.html", stem, SUFFIX));
                write_atomic(&out, &page)?;
                info!("Created {}", out.display());
                report.converted.push(out);
            }
            None => {
                warn!("Could not extract content from {}", path.display());
                report.skipped.push(path);
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> String {
        std::fs::read_to_string("tests/fixtures/en/research.html").unwrap()
    }

    #[test]
    fn metadata_with_defaults() {
        let meta = extract_metadata(&fixture());
        assert_eq!(meta.title, "Research | Korol Group");
        assert_eq!(meta.description, "Spin dynamics and magnonics");
        assert_eq!(meta.keywords, "");

        assert_eq!(extract_metadata("<p>no head</p>").title, DEFAULT_TITLE);
    }

    #[test]
    fn content_patterns_in_order() {
        let html = fixture();
        let content = extract_content(&html).unwrap();
        assert!(content.starts_with("<h2>Research</h2>"));
        assert!(!content.contains("Footer"));

        let closed = "<!-- Main -->\n<section id=\"main\"><p>a</p></section>\n<!-- Footer -->";
        assert_eq!(extract_content(closed), Some("<p>a</p>"));
        assert_eq!(extract_content("<body><main class=\"x\"> b </main></body>"), Some("b"));
        assert_eq!(extract_content("<body>nothing</body>"), None);
    }

    #[test]
    fn links_and_assets_become_absolute() {
        let html = r##"<a href="publications.html">P</a> <a href="https://x.org/a.html">X</a>
<a href="/en/news.html">N</a> <a href="#top">T</a> <a href="mailto:a@b.c">M</a>
<img src="../images/a.png" srcset="images/a@2x.png 2x"> <link href="../assets/css/main.css">"##;
        let out = rewrite_links(html, "fr");
        assert!(out.contains(r#"href="/fr/publications.html""#));
        assert!(out.contains(r#"href="https://x.org/a.html""#));
        assert!(out.contains(r#"href="/en/news.html""#));
        assert!(out.contains(r##"href="#top""##));
        assert!(out.contains(r#"href="mailto:a@b.c""#));
        assert!(out.contains(r#"src="/images/a.png""#));
        assert!(out.contains(r#"srcset="/images/a@2x.png 2x""#));
        assert!(out.contains(r#"href="/assets/css/main.css""#));
    }

    #[test]
    fn converted_page_front_matter() {
        let page = convert_page(&fixture(), "en", "research.html").unwrap();
        assert!(page.starts_with("---\nlayout: default\ntitle: \"Research | Korol Group\"\n"));
        assert!(page.contains("permalink: /en/research.html\n"));
        assert!(page.contains("custom_scripts: |\n  <!-- Publication unhide functionality -->\n"));
        assert!(page.contains(r#"<a href="/en/publications.html">"#));
        assert!(page.contains(r#"<img src="/images/lab.jpg""#));
    }

    #[test]
    fn quotes_in_titles_stay_valid_yaml() {
        let html = "<title>The \"Spin\" Lab</title><main>x</main>";
        let page = convert_page(html, "en", "a.html").unwrap();
        assert!(page.contains(r#"title: "The \"Spin\" Lab""#));
    }

    #[test]
    fn convert_all_skips_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        let en = dir.path().join("en");
        std::fs::create_dir(&en).unwrap();
        std::fs::write(en.join("research.html"), fixture()).unwrap();
        std::fs::write(en.join("old-jekyll.html"), "<main>old</main>").unwrap();
        std::fs::write(en.join("empty.html"), "<body></body>").unwrap();

        let report = convert_all(dir.path()).unwrap();
        assert_eq!(report.converted, vec![en.join("research-jekyll.html")]);
        assert_eq!(report.skipped, vec![en.join("empty.html")]);
        assert!(!en.join("old-jekyll-jekyll.html").exists());
    }
}
