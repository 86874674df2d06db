use std::fmt::Write;

use chrono::NaiveDate;

use super::escape_html;
use super::template::{Field, TemplateFields, Templates};
use crate::model::*;

const GENERATED_BANNER: &str = "<!-- generated by sitesync; edit the JSON data instead -->\n";

/// Options shared by every HTML fragment.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub owner: &'a str,
    pub include_unreviewed: bool,
}

impl RenderContext<'_> {
    fn shows(&self, needs_review: bool) -> bool {
        self.include_unreviewed || !needs_review
    }
}

fn text(s: impl Into<String>) -> Option<Field> {
    Some(Field::Text(s.into()))
}

fn markup(s: impl Into<String>) -> Option<Field> {
    Some(Field::Markup(s.into()))
}

fn image_tag(src: &str, alt: &str) -> String {
    if src.trim().is_empty() {
        String::new()
    } else {
        format!(
            r#"<img src="{}" alt="{}" loading="lazy">"#,
            escape_html(src),
            escape_html(alt)
        )
    }
}

fn list(class: &str, items: &[String]) -> String {
    if items.is_empty() {
        return String::new();
    }
    let mut out = format!(r#"<ul class="{}">"#, class);
    for item in items {
        let _ = write!(out, "<li>{}</li>", escape_html(item));
    }
    out.push_str("</ul>");
    out
}

// ── Publications ──

struct PublicationView<'a> {
    p: &'a Publication,
    owner: &'a str,
}

impl TemplateFields for PublicationView<'_> {
    fn field(&self, name: &str) -> Option<Field> {
        let p = self.p;
        match name {
            "id" => text(&p.id),
            "title" => text(&p.title),
            "journal" => text(&p.journal),
            "year" => text(p.year.to_string()),
            "abstract" => text(&p.abstract_text),
            "image" => text(&p.image),
            "type" => text(p.kind.as_str()),
            "status" => text(p.status.as_str()),
            "doi" => text(p.doi.clone().unwrap_or_default()),
            "authors" => markup(
                p.authors
                    .iter()
                    .map(|a| {
                        let is_owner = !self.owner.is_empty()
                            && a.trim().trim_end_matches('*').eq_ignore_ascii_case(self.owner);
                        if is_owner {
                            format!("<strong>{}</strong>", escape_html(a))
                        } else {
                            escape_html(a)
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            "image_tag" => markup(image_tag(&p.image, &p.title)),
            "doi_link" => markup(match &p.doi {
                Some(doi) if !doi.trim().is_empty() => format!(
                    r#", <a href="https://doi.org/{0}" target="_blank" rel="noopener">doi:{0}</a>"#,
                    escape_html(doi.trim())
                ),
                _ => String::new(),
            }),
            "awards" => markup(list("awards", &p.awards)),
            _ => None,
        }
    }
}

pub fn render_publications(
    doc: &PublicationsDocument,
    templates: &Templates,
    ctx: RenderContext<'_>,
) -> String {
    let mut out = String::from(GENERATED_BANNER);
    out.push_str("<section class=\"publications\">\n");
    let mut year = None;
    for p in doc.publications.iter().filter(|p| ctx.shows(p.needs_review)) {
        if year != Some(p.year) {
            let _ = writeln!(out, "<h3 class=\"year\">{}</h3>", p.year);
            year = Some(p.year);
        }
        out.push_str(&templates.publication.render(&PublicationView { p, owner: ctx.owner }));
    }
    out.push_str("</section>\n");
    out
}

// ── News ──

struct NewsView<'a>(&'a NewsItem);

impl TemplateFields for NewsView<'_> {
    fn field(&self, name: &str) -> Option<Field> {
        let n = self.0;
        match name {
            "id" => text(&n.id),
            "title" => text(&n.title),
            "date" => text(&n.date),
            "date_display" => text(
                NaiveDate::parse_from_str(&n.date, "%Y-%m-%d")
                    .map(|d| d.format("%B %-d, %Y").to_string())
                    .unwrap_or_else(|_| n.date.clone()),
            ),
            "category" => text(n.category.as_str()),
            "summary" => text(&n.summary),
            "content" => text(&n.content),
            "featured_class" => text(if n.featured { " featured" } else { "" }),
            "image_tag" => markup(image_tag(
                n.images.first().map(String::as_str).unwrap_or(""),
                &n.title,
            )),
            "tags" => markup(list("tags", &n.tags)),
            _ => None,
        }
    }
}

pub fn render_news(doc: &NewsDocument, templates: &Templates, ctx: RenderContext<'_>) -> String {
    let mut out = String::from(GENERATED_BANNER);
    out.push_str("<section class=\"news\">\n");
    for n in doc.news.iter().filter(|n| ctx.shows(n.needs_review)) {
        out.push_str(&templates.news.render(&NewsView(n)));
    }
    out.push_str("</section>\n");
    out
}

// ── Resources ──

struct ResourceView<'a>(&'a Resource);

impl TemplateFields for ResourceView<'_> {
    fn field(&self, name: &str) -> Option<Field> {
        let r = self.0;
        match name {
            "title" => text(&r.title),
            "type" => text(&r.kind),
            "description" => text(&r.description),
            "links" => {
                if r.links.is_empty() {
                    return markup("");
                }
                let mut out = String::from(r#"<ul class="links">"#);
                for l in &r.links {
                    let _ = write!(
                        out,
                        r#"<li><a href="{}" target="_blank" rel="noopener">{}</a>"#,
                        escape_html(&l.url),
                        escape_html(&l.title)
                    );
                    if !l.provider.is_empty() {
                        let _ = write!(out, r#" <span class="provider">({})</span>"#, escape_html(&l.provider));
                    }
                    out.push_str("</li>");
                }
                out.push_str("</ul>");
                markup(out)
            }
            _ => None,
        }
    }
}

pub fn render_resources(doc: &ResourcesDocument, templates: &Templates) -> String {
    let mut out = String::from(GENERATED_BANNER);
    for s in &doc.sections {
        let _ = writeln!(
            out,
            "<section class=\"resource-section\" id=\"{}\">\n<h3>{}</h3>",
            escape_html(&s.key),
            escape_html(&s.title)
        );
        if !s.description.is_empty() {
            let _ = writeln!(out, "<p>{}</p>", escape_html(&s.description));
        }
        for r in &s.resources {
            out.push_str(&templates.resource.render(&ResourceView(r)));
        }
        out.push_str("</section>\n");
    }
    out
}

// ── Activities ──

struct ActivityView<'a>(&'a Activity);

impl TemplateFields for ActivityView<'_> {
    fn field(&self, name: &str) -> Option<Field> {
        let a = self.0;
        match name {
            "title" => text(&a.title),
            "description" => text(&a.description),
            "date" => text(a.date.clone().unwrap_or_default()),
            "location" => text(a.location.clone().unwrap_or_default()),
            "image_tag" => markup(image_tag(a.image.as_deref().unwrap_or(""), &a.title)),
            "meta" => {
                let parts: Vec<String> = [a.date.as_deref(), a.location.as_deref()]
                    .into_iter()
                    .flatten()
                    .filter(|s| !s.trim().is_empty())
                    .map(escape_html)
                    .collect();
                markup(if parts.is_empty() {
                    String::new()
                } else {
                    format!(r#"<p class="meta">{}</p>"#, parts.join(" &middot; "))
                })
            }
            _ => None,
        }
    }
}

pub fn render_activities(doc: &ActivitiesDocument, templates: &Templates) -> String {
    let mut out = String::from(GENERATED_BANNER);
    for s in &doc.sections {
        let _ = writeln!(
            out,
            "<section class=\"activity-section\" id=\"{}\">\n<h3>{}</h3>",
            escape_html(&s.id),
            escape_html(&s.title)
        );
        if !s.description.is_empty() {
            let _ = writeln!(out, "<p>{}</p>", escape_html(&s.description));
        }
        for a in &s.activities {
            out.push_str(&templates.activity.render(&ActivityView(a)));
        }
        out.push_str("</section>\n");
    }
    out
}
