use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model::{Document, DOCUMENT_NAMES};

/// The JSON documents under one data directory.
///
/// No locking: callers serialize writers against the same document.
pub struct DataStore {
    dir: PathBuf,
}

impl DataStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DataStore { dir: dir.into() }
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }

    pub fn load<D: Document>(&self) -> Result<D> {
        let path = self.path_of(D::NAME);
        let text = match fs::read_to_string(&path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::NotFound(path))
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&text).map_err(|e| Error::Parse {
            path,
            message: e.to_string(),
        })
    }

    /// Like [`load`](Self::load), but a missing file yields an empty document.
    pub fn load_or_default<D: Document>(&self) -> Result<D> {
        match self.load() {
            Err(Error::NotFound(path)) => {
                debug!("{} missing, starting empty", path.display());
                Ok(D::default())
            }
            other => other,
        }
    }

    /// Pretty-print and atomically replace the document file.
    pub fn save<D: Document>(&self, doc: &D) -> Result<()> {
        let mut text = serde_json::to_string_pretty(doc)?;
        text.push('\n');
        let path = self.path_of(D::NAME);
        write_atomic(&path, &text)?;
        debug!("saved {}", path.display());
        Ok(())
    }

    /// Copy every existing document into `<root>/<YYYYMMDD-HHMMSS>/`.
    pub fn backup(&self, root: &Path, at: NaiveDateTime) -> Result<Backup> {
        let target = root.join(at.format("%Y%m%d-%H%M%S").to_string());
        fs::create_dir_all(&target).map_err(|source| Error::Write {
            path: target.clone(),
            source,
        })?;

        let mut copied = Vec::new();
        for name in DOCUMENT_NAMES {
            let src = self.path_of(name);
            if !src.exists() {
                continue;
            }
            let dst = target.join(format!("{}.json", name));
            fs::copy(&src, &dst).map_err(|source| Error::Write {
                path: dst.clone(),
                source,
            })?;
            copied.push(name);
        }
        info!("backed up {} document(s) to {}", copied.len(), target.display());
        Ok(Backup {
            dir: target,
            documents: copied,
        })
    }
}

pub struct Backup {
    pub dir: PathBuf,
    pub documents: Vec<&'static str>,
}

/// Write through a temp file in the same directory, then rename over `path`.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let write_err = |source| Error::Write {
        path: path.to_path_buf(),
        source,
    };

    fs::create_dir_all(&dir).map_err(write_err)?;
    let mut tmp = NamedTempFile::new_in(&dir).map_err(write_err)?;
    tmp.write_all(contents.as_bytes()).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}
