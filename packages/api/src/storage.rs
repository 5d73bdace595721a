//! # Upload storage
//!
//! Uploaded scans are written to a single directory under a generated name,
//! `<uuid v4>.<ext>`, so two uploads can never overwrite each other no matter
//! what the client called them. The client's filename is sanitized and kept
//! only as metadata on the upload record.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

use crate::settings::StorageSettings;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("No file uploaded")]
    Empty,

    #[error("Unsupported file type; allowed: {allowed}")]
    UnsupportedType { allowed: String },

    #[error("failed to store upload: {0}")]
    Io(#[from] io::Error),
}

/// A file written by [`UploadStore::save`].
#[derive(Debug, Clone)]
pub struct StoredFile {
    /// Generated file name, unique within the upload directory.
    pub key: String,
    pub path: PathBuf,
    /// Sanitized version of the name the client sent.
    pub original_name: String,
}

#[derive(Debug)]
pub struct UploadStore {
    dir: PathBuf,
    allowed_extensions: Vec<String>,
    max_bytes: usize,
}

impl UploadStore {
    /// Create the upload directory if needed.
    pub async fn init(settings: &StorageSettings) -> io::Result<Self> {
        tokio::fs::create_dir_all(&settings.upload_dir).await?;
        Ok(Self {
            dir: settings.upload_dir.clone(),
            allowed_extensions: settings
                .allowed_extensions
                .iter()
                .map(|ext| ext.to_ascii_lowercase())
                .collect(),
            max_bytes: settings.max_upload_bytes,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    /// Lowercased extension of `filename` if it is on the allow list.
    pub fn allowed_extension(&self, filename: &str) -> Result<String, StorageError> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .filter(|ext| self.allowed_extensions.contains(ext));

        ext.ok_or_else(|| StorageError::UnsupportedType {
            allowed: self.allowed_extensions.join(", "),
        })
    }

    pub async fn save(&self, filename: &str, bytes: &[u8]) -> Result<StoredFile, StorageError> {
        if bytes.is_empty() {
            return Err(StorageError::Empty);
        }
        let ext = self.allowed_extension(filename)?;

        let key = format!("{}.{}", Uuid::new_v4(), ext);
        let path = self.path_for(&key);
        tokio::fs::write(&path, bytes).await?;

        tracing::debug!(key = %key, size = bytes.len(), "stored upload");

        Ok(StoredFile {
            key,
            path,
            original_name: sanitize_filename(filename),
        })
    }

    /// Delete a stored file. Missing files are not an error.
    pub async fn remove(&self, stored: &StoredFile) {
        if let Err(e) = tokio::fs::remove_file(&stored.path).await {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!(key = %stored.key, "failed to remove upload: {}", e);
            }
        }
    }
}

/// Reduce a client-supplied name to a safe basename of ASCII letters, digits,
/// `.`, `-` and `_`. Whitespace becomes `_`; leading dots are dropped.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();

    let cleaned: String = base
        .chars()
        .filter_map(|c| match c {
            c if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') => Some(c),
            c if c.is_whitespace() => Some('_'),
            _ => None,
        })
        .collect();

    cleaned.trim_start_matches('.').to_string()
}
