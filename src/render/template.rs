//! `{{field}}` templates over typed accessors.
//!
//! Each record view decides which names it answers to; an unknown name is
//! left in the output verbatim and logged, so one typo never breaks a page.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::{debug, warn};

use super::escape_html;
use crate::error::Result;

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([A-Za-z0-9_.]+)\s*\}\}").unwrap());

/// A resolved template value.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    /// Plain text, escaped on insertion.
    Text(String),
    /// Markup assembled from already-escaped parts.
    Markup(String),
}

pub trait TemplateFields {
    fn field(&self, name: &str) -> Option<Field>;
}

#[derive(Debug, Clone)]
pub struct Template {
    name: &'static str,
    source: String,
}

impl Template {
    pub fn new(name: &'static str, source: impl Into<String>) -> Self {
        Template {
            name,
            source: source.into(),
        }
    }

    pub fn render(&self, record: &impl TemplateFields) -> String {
        PLACEHOLDER_RE
            .replace_all(&self.source, |caps: &Captures<'_>| {
                match record.field(&caps[1]) {
                    Some(Field::Text(t)) => escape_html(&t),
                    Some(Field::Markup(m)) => m,
                    None => {
                        warn!(template = self.name, field = &caps[1], "unresolved placeholder");
                        caps[0].to_string()
                    }
                }
            })
            .into_owned()
    }
}

const PUBLICATION: &str = r#"<article class="publication" id="{{id}}">
  {{image_tag}}
  <div class="publication-body">
    <h4>{{title}}</h4>
    <p class="authors">{{authors}}</p>
    <p class="venue"><em>{{journal}}</em> ({{year}}){{doi_link}}</p>
    {{awards}}
    <p class="abstract">{{abstract}}</p>
  </div>
</article>
"#;

const NEWS: &str = r#"<article class="news-item {{category}}{{featured_class}}" id="{{id}}">
  <time datetime="{{date}}">{{date_display}}</time>
  <h3>{{title}}</h3>
  {{image_tag}}
  <p>{{summary}}</p>
  {{tags}}
</article>
"#;

const RESOURCE: &str = r#"<div class="resource {{type}}">
  <h4>{{title}}</h4>
  <p>{{description}}</p>
  {{links}}
</div>
"#;

const ACTIVITY: &str = r#"<div class="activity">
  {{image_tag}}
  <h4>{{title}}</h4>
  {{meta}}
  <p>{{description}}</p>
</div>
"#;

/// The four per-record templates, built in or overridden from a directory.
#[derive(Debug, Clone)]
pub struct Templates {
    pub publication: Template,
    pub news: Template,
    pub resource: Template,
    pub activity: Template,
}

impl Default for Templates {
    fn default() -> Self {
        Templates {
            publication: Template::new("publication", PUBLICATION),
            news: Template::new("news", NEWS),
            resource: Template::new("resource", RESOURCE),
            activity: Template::new("activity", ACTIVITY),
        }
    }
}

impl Templates {
    /// Built-ins, replaced by `<dir>/<name>.html` where such a file exists.
    pub fn load(dir: Option<&Path>) -> Result<Self> {
        let mut templates = Templates::default();
        let Some(dir) = dir else {
            return Ok(templates);
        };
        for slot in [
            &mut templates.publication,
            &mut templates.news,
            &mut templates.resource,
            &mut templates.activity,
        ] {
            let path = dir.join(format!("{}.html", slot.name));
            if path.exists() {
                slot.source = fs::read_to_string(&path)?;
                debug!("template override {}", path.display());
            }
        }
        Ok(templates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed;

    impl TemplateFields for Fixed {
        fn field(&self, name: &str) -> Option<Field> {
            match name {
                "title" => Some(Field::Text("<script>alert(1)</script> & more".into())),
                "link" => Some(Field::Markup("<a href=\"/x\">x</a>".into())),
                _ => None,
            }
        }
    }

    #[test]
    fn text_is_escaped_and_markup_is_not() {
        let t = Template::new("t", "<h1>{{ title }}</h1>{{link}}");
        assert_eq!(
            t.render(&Fixed),
            "<h1>&lt;script&gt;alert(1)&lt;/script&gt; &amp; more</h1><a href=\"/x\">x</a>"
        );
    }

    #[test]
    fn unresolved_placeholders_pass_through() {
        let t = Template::new("t", "{{titel}} / {{author.name}}");
        assert_eq!(t.render(&Fixed), "{{titel}} / {{author.name}}");
    }

    #[test]
    fn directory_overrides_replace_builtins() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("news.html"), "<li>{{title}}</li>").unwrap();
        let t = Templates::load(Some(dir.path())).unwrap();
        assert!(t.news.render(&Fixed).starts_with("<li>&lt;script"));
        assert!(t.publication.source.contains("publication-body"));
    }
}
