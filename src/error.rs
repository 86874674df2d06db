use std::path::PathBuf;

/// Failure categories shared by the store, extractors and external tools.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed JSON or BibTeX. The on-disk document is left untouched.
    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// Missing input file. Callers usually treat this as "nothing to do".
    #[error("{0} not found")]
    NotFound(PathBuf),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} timed out after {secs}s")]
    Timeout { command: String, secs: u64 },

    #[error("{command} exited with status {code:?}")]
    External { command: String, code: Option<i32> },

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("validation reported {0} issue(s)")]
    Invalid(usize),

    #[error("{failed} of {total} document(s) failed")]
    Partial { failed: usize, total: usize },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Process exit code for this failure. Every category gets its own code.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Parse { .. } => 2,
            Error::Write { .. } => 3,
            Error::Timeout { .. } => 4,
            Error::Config(_) => 5,
            Error::Invalid(_) => 6,
            Error::Partial { .. } => 7,
            Error::External { .. } => 8,
            Error::NotFound(_) => 9,
            Error::Json(_) | Error::Io(_) => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
