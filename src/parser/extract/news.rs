use chrono::NaiveDate;
use scraper::{Html, Selector};

use super::Candidate;
use crate::model::{NewsCategory, NewsItem};
use crate::parser::html;
use crate::utils::{slugify, truncate};

const SUMMARY_CHARS: usize = 200;

/// One candidate per `.news-item` element that has a heading.
pub fn extract(document: &Html, today: NaiveDate) -> Vec<Candidate<NewsItem>> {
    let item_selector = Selector::parse(".news-item").unwrap();
    let heading_selector = Selector::parse("h1, h2, h3, h4, h5, h6").unwrap();
    let time_selector = Selector::parse("time[datetime]").unwrap();
    let paragraph_selector = Selector::parse("p").unwrap();
    let image_selector = Selector::parse("img[src]").unwrap();

    let mut items = Vec::new();

    for e in document.select(&item_selector) {
        let Some(title) = e
            .select(&heading_selector)
            .next()
            .map(html::text)
            .filter(|t| !t.is_empty())
        else {
            continue;
        };
        let mut candidate = Candidate::new(NewsItem::default());

        let date = e
            .select(&time_selector)
            .next()
            .and_then(|t| t.value().attr("datetime"))
            .and_then(|d| NaiveDate::parse_from_str(d.get(..10)?, "%Y-%m-%d").ok())
            .unwrap_or_else(|| {
                candidate.defaulted.push("date");
                today
            });

        let paragraphs: Vec<String> = e
            .select(&paragraph_selector)
            .map(html::text)
            .filter(|t| !t.is_empty())
            .collect();
        let body = if paragraphs.is_empty() {
            html::text(e).replacen(&title, "", 1).trim().to_string()
        } else {
            paragraphs.join("\n\n")
        };

        let images: Vec<String> = e
            .select(&image_selector)
            .filter_map(|img| img.value().attr("src"))
            .map(str::to_string)
            .collect();

        let date = date.format("%Y-%m-%d").to_string();
        candidate.record = NewsItem {
            id: format!("{}-{}", date, slugify(&title)),
            title,
            date,
            category: NewsCategory::Academic,
            summary: truncate(&body, SUMMARY_CHARS),
            content: body,
            images,
            needs_review: true,
            ..NewsItem::default()
        };
        candidate.defaulted.extend(["category", "tags"]);
        items.push(candidate);
    }

    items
}
