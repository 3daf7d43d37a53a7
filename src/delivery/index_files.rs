//! Per-player document files on disk.
//!
//! A file is only rewritten when its content changes, so its modification
//! time is the moment the document last changed and can back
//! `Last-Modified`.

use super::DeliveryError;
use crate::compiler::content_fingerprint;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredDocument {
    pub path: PathBuf,
    pub body: Vec<u8>,
    /// Quoted content hash.
    pub fingerprint: String,
    pub last_modified: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct IndexFileStore {
    dir: PathBuf,
}

/// Device keys come from the URL, keep them to a safe file name alphabet.
fn sanitize(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

impl IndexFileStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create document directory {:?}", dir))?;
        Ok(Self { dir })
    }

    pub fn index_path(&self, uuid: &str) -> PathBuf {
        self.dir.join(format!("{}.smil", sanitize(uuid)))
    }

    pub fn task_schedule_path(&self, uuid: &str) -> PathBuf {
        self.dir.join(format!("{}_tasks.xml", sanitize(uuid)))
    }

    /// Atomically replaces the file when `content` differs from what is
    /// stored. Returns whether it wrote.
    pub fn write_if_changed(&self, path: &Path, content: &[u8]) -> Result<bool> {
        match std::fs::read(path) {
            Ok(existing) if existing == content => return Ok(false),
            Ok(_) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => {
                return Err(err).with_context(|| format!("Failed to read {:?}", path));
            }
        }

        let mut tmp = NamedTempFile::new_in(&self.dir)
            .with_context(|| format!("Failed to create temp file in {:?}", self.dir))?;
        tmp.write_all(content)?;
        tmp.flush()?;
        tmp.persist(path)
            .with_context(|| format!("Failed to persist {:?}", path))?;
        debug!("Wrote {} bytes to {:?}", content.len(), path);
        Ok(true)
    }

    /// Reads a document with its fingerprint and modification time.
    /// A missing file is `None`.
    pub fn load(&self, path: &Path) -> Result<Option<StoredDocument>, DeliveryError> {
        let read_error = |source: std::io::Error| DeliveryError::ResourceRead {
            path: path.to_path_buf(),
            source,
        };
        let body = match std::fs::read(path) {
            Ok(body) => body,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(read_error(err)),
        };
        let modified = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .map_err(read_error)?;

        Ok(Some(StoredDocument {
            path: path.to_path_buf(),
            fingerprint: content_fingerprint(&body),
            body,
            last_modified: DateTime::<Utc>::from(modified),
        }))
    }

    pub fn remove(&self, path: &Path) -> Result<()> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).with_context(|| format!("Failed to remove {:?}", path)),
        }
    }
}
