use super::types::{LogRecord, LogSummary, MessageRole};
use crate::error::StoreError;
use crate::knowledge::sanitize_filename;
use chrono::{DateTime, Utc};
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

const LOG_EXTENSION: &str = "csv";
const HEADER: [&str; 4] = ["timestamp", "session_id", "role", "message"];

/// Append-only CSV transcripts, one file per session: `{session_id}.csv`.
#[derive(Debug, Clone)]
pub struct SessionLog {
    root: PathBuf,
}

impl SessionLog {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, session_id: &str) -> Result<PathBuf, StoreError> {
        let clean = sanitize_filename(session_id)
            .ok_or_else(|| StoreError::InvalidName(session_id.to_string()))?;
        Ok(self.root.join(format!("{clean}.{LOG_EXTENSION}")))
    }

    pub fn exists(&self, session_id: &str) -> bool {
        self.path_for(session_id).is_ok_and(|path| path.is_file())
    }

    /// Append one record, writing the header row first if the file is new.
    pub fn append(
        &self,
        session_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<(), StoreError> {
        let path = self.path_for(session_id)?;
        let is_new = !path.exists();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if is_new {
            writer.write_record(HEADER)?;
        }
        writer.serialize(LogRecord {
            timestamp: Utc::now().to_rfc3339(),
            session_id: session_id.to_string(),
            role,
            message: content.to_string(),
        })?;
        writer.flush()?;
        Ok(())
    }

    /// Every record of one transcript, oldest first.
    pub fn read(&self, session_id: &str) -> Result<Vec<LogRecord>, StoreError> {
        let path = self.path_for(session_id)?;
        let mut reader = match csv::Reader::from_path(&path) {
            Ok(reader) => reader,
            Err(e) if is_not_found(&e) => {
                return Err(StoreError::NotFound(session_id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        reader
            .deserialize()
            .collect::<Result<Vec<LogRecord>, _>>()
            .map_err(StoreError::from)
    }

    fn count_records(path: &Path) -> Result<usize, StoreError> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut count = 0;
        for record in reader.records() {
            record?;
            count += 1;
        }
        Ok(count)
    }

    /// Summaries of all transcripts, most recently modified first.
    ///
    /// A transcript that cannot be parsed still shows up, with a count of 0.
    pub fn list(&self) -> Result<Vec<LogSummary>, StoreError> {
        let mut found: Vec<(SystemTime, LogSummary)> = Vec::new();

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(LOG_EXTENSION) {
                continue;
            }
            let Some(session_id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let Ok(meta) = entry.metadata() else {
                continue;
            };
            if !meta.is_file() {
                continue;
            }

            let message_count = Self::count_records(&path).unwrap_or_else(|e| {
                tracing::debug!(session_id, error = %e, "transcript unreadable; counting as 0");
                0
            });
            let modified_at = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);

            found.push((
                modified_at,
                LogSummary {
                    session_id: session_id.to_string(),
                    message_count,
                    modified: DateTime::<Utc>::from(modified_at).to_rfc3339(),
                },
            ));
        }

        found.sort_by(|a, b| {
            b.0.cmp(&a.0)
                .then_with(|| a.1.session_id.cmp(&b.1.session_id))
        });
        Ok(found.into_iter().map(|(_, summary)| summary).collect())
    }

    /// Remove a transcript. Returns whether a file was removed.
    pub fn delete(&self, session_id: &str) -> Result<bool, StoreError> {
        let path = self.path_for(session_id)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

fn is_not_found(error: &csv::Error) -> bool {
    matches!(error.kind(), csv::ErrorKind::Io(io) if io.kind() == ErrorKind::NotFound)
}
