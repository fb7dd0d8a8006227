use super::sanitize::sanitize_filename;
use crate::error::StoreError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Metadata for one knowledge document, straight from the filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentInfo {
    pub name: String,
    pub size: u64,
    /// RFC 3339, UTC
    pub modified: String,
}

/// A file handed to [`DocumentStore::upload`].
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

/// Flat directory of knowledge documents.
///
/// Every name coming from outside goes through [`sanitize_filename`] before it
/// touches the filesystem, so the store never reads or writes outside `root`.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    root: PathBuf,
}

impl DocumentStore {
    /// Open the store, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, name: &str) -> Result<(String, PathBuf), StoreError> {
        let clean =
            sanitize_filename(name).ok_or_else(|| StoreError::InvalidName(name.to_string()))?;
        let path = self.root.join(&clean);
        Ok((clean, path))
    }

    /// Regular files in the store, sorted by name.
    pub(crate) fn sorted_entries(&self) -> Result<Vec<(String, PathBuf)>, StoreError> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if !file_type.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            entries.push((name, entry.path()));
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries)
    }

    pub fn list(&self) -> Result<Vec<DocumentInfo>, StoreError> {
        let mut docs = Vec::new();
        for (name, path) in self.sorted_entries()? {
            let Ok(meta) = fs::metadata(&path) else {
                tracing::debug!(document = %name, "skipping document with unreadable metadata");
                continue;
            };
            let modified = meta
                .modified()
                .map(|t| DateTime::<Utc>::from(t).to_rfc3339())
                .unwrap_or_default();
            docs.push(DocumentInfo {
                name,
                size: meta.len(),
                modified,
            });
        }
        Ok(docs)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.resolve(name).is_ok_and(|(_, path)| path.is_file())
    }

    /// Document text; invalid UTF-8 is replaced rather than rejected.
    pub fn read(&self, name: &str) -> Result<(String, String), StoreError> {
        let (clean, path) = self.resolve(name)?;
        match fs::read(&path) {
            Ok(bytes) => Ok((clean, String::from_utf8_lossy(&bytes).into_owned())),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound(clean)),
            Err(e) => Err(e.into()),
        }
    }

    /// Create or overwrite. Returns the sanitized name actually written.
    pub fn write(&self, name: &str, content: &str) -> Result<String, StoreError> {
        let (clean, path) = self.resolve(name)?;
        fs::write(&path, content)?;
        tracing::info!(document = %clean, bytes = content.len(), "document written");
        Ok(clean)
    }

    /// Remove a document. Absent documents are not an error.
    pub fn delete(&self, name: &str) -> Result<(), StoreError> {
        let (clean, path) = self.resolve(name)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!(document = %clean, "document deleted");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Save every file that has a usable name; returns the accepted names in
    /// input order. Entries with empty, missing or unsanitizable names are
    /// skipped.
    pub fn upload(&self, files: Vec<UploadedFile>) -> Result<Vec<String>, StoreError> {
        let mut accepted = Vec::with_capacity(files.len());
        for file in files {
            let Some(raw) = file.file_name.as_deref().filter(|n| !n.trim().is_empty()) else {
                continue;
            };
            let Some(clean) = sanitize_filename(raw) else {
                tracing::warn!(name = raw, "upload skipped: name sanitizes to nothing");
                continue;
            };
            fs::write(self.root.join(&clean), &file.bytes)?;
            tracing::info!(document = %clean, bytes = file.bytes.len(), "document uploaded");
            accepted.push(clean);
        }
        Ok(accepted)
    }
}
