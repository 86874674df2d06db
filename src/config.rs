use std::path::PathBuf;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::Result;

const CONFIG_FILE: &str = "sitesync";
const ENV_PREFIX: &str = "SITESYNC";

/// Everything the pipeline needs to know about the site layout.
///
/// Resolved once in `main` and passed down to each component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Directory holding the JSON documents.
    pub data_dir: PathBuf,
    /// Where generated fragments, JSON-LD, sitemap and CV are written.
    pub output_dir: PathBuf,
    /// Optional directory with template overrides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_dir: Option<PathBuf>,
    pub backup_dir: PathBuf,
    /// Root of the hand-authored pages (`en/`, `fr/`) for Jekyll conversion.
    pub pages_dir: PathBuf,
    pub base_url: String,
    /// Profile owner; excluded from the collaborator list and bolded in author lists.
    pub owner_name: String,
    /// Text that marks an HTML element as one of the owner's publications.
    pub author_marker: String,
    #[serde(default)]
    pub html_sources: Vec<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bibtex_source: Option<PathBuf>,
    pub latex_command: String,
    #[serde(default)]
    pub latex_args: Vec<String>,
    pub latex_timeout_secs: u64,
    pub watch_interval_ms: u64,
    /// Render records that still carry `needs_review`.
    #[serde(default)]
    pub include_unreviewed: bool,
}

impl Default for SiteConfig {
    fn default() -> Self {
        SiteConfig {
            data_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("generated"),
            template_dir: None,
            backup_dir: PathBuf::from("backups"),
            pages_dir: PathBuf::from("."),
            base_url: "https://example.org".to_string(),
            owner_name: String::new(),
            author_marker: String::new(),
            html_sources: Vec::new(),
            bibtex_source: None,
            latex_command: "pdflatex".to_string(),
            latex_args: vec![
                "-interaction=nonstopmode".to_string(),
                "-halt-on-error".to_string(),
            ],
            latex_timeout_secs: 120,
            watch_interval_ms: 1000,
            include_unreviewed: false,
        }
    }
}

impl SiteConfig {
    /// Defaults, then `sitesync.toml` (if present), then `SITESYNC_*` variables.
    pub fn load() -> Result<Self> {
        let settings = Config::builder()
            .add_source(Config::try_from(&SiteConfig::default())?)
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("html_sources")
                    .with_list_parse_key("latex_args"),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    pub fn latex_timeout(&self) -> Duration {
        Duration::from_secs(self.latex_timeout_secs)
    }

    pub fn watch_interval(&self) -> Duration {
        Duration::from_millis(self.watch_interval_ms.max(50))
    }

    /// Base URL without a trailing slash.
    pub fn site_root(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}
