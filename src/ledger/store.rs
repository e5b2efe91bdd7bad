use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;
use tracing::debug;

use super::entry::LedgerEntry;
use crate::document::Document;

/// Default ledger location, relative to the working directory.
pub const DEFAULT_LEDGER_FILE: &str = "translation-ledger.json";

/// Errors that can occur while loading or persisting the ledger.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// IO error during file operations.
    #[error("Ledger IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The ledger file exists but is not valid JSON.
    #[error("Ledger file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Translation ledger keyed by source document id, persisted as one JSON object.
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
    entries: BTreeMap<String, LedgerEntry>,
}

impl Ledger {
    /// Load the ledger at `path`. A missing file is an empty ledger.
    pub fn load(path: impl Into<PathBuf>) -> LedgerResult<Self> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_str(&content).map_err(|source| LedgerError::Corrupt {
                path: path.clone(),
                source,
            })?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(LedgerError::Io { path, source }),
        };
        debug!(path = %path.display(), entries = entries.len(), "Loaded ledger");
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_translated(&self, source_id: &str) -> bool {
        self.entries.contains_key(source_id)
    }

    pub fn get(&self, source_id: &str) -> Option<&LedgerEntry> {
        self.entries.get(source_id)
    }

    /// Record that `source` was translated into `destination`, stamped now,
    /// and persist before returning.
    pub fn add(&mut self, source: &Document, destination: &Document) -> LedgerResult<()> {
        let entry = LedgerEntry::new(source, destination, Utc::now());
        self.insert(source.id.clone(), entry).map(|_| ())
    }

    /// Store `entry` under `source_id`, replacing any previous entry, and persist.
    ///
    /// When persisting fails the in-memory ledger is left as it was.
    pub fn insert(
        &mut self,
        source_id: impl Into<String>,
        entry: LedgerEntry,
    ) -> LedgerResult<Option<LedgerEntry>> {
        let source_id = source_id.into();
        let previous = self.entries.insert(source_id.clone(), entry);
        if let Err(err) = self.persist() {
            match previous {
                Some(previous) => self.entries.insert(source_id, previous),
                None => self.entries.remove(&source_id),
            };
            return Err(err);
        }
        Ok(previous)
    }

    /// Remove the entry for `source_id` and persist. Returns the removed entry.
    pub fn remove(&mut self, source_id: &str) -> LedgerResult<Option<LedgerEntry>> {
        let Some(removed) = self.entries.remove(source_id) else {
            return Ok(None);
        };
        if let Err(err) = self.persist() {
            self.entries.insert(source_id.to_string(), removed);
            return Err(err);
        }
        Ok(Some(removed))
    }

    /// True iff `doc` was translated before and changed after its translation.
    pub fn needs_update(&self, doc: &Document) -> bool {
        self.entries
            .get(&doc.id)
            .is_some_and(|entry| entry.is_stale_for(doc))
    }

    /// Snapshot of every entry, ordered by source id.
    pub fn list_all(&self) -> Vec<(String, LedgerEntry)> {
        self.entries
            .iter()
            .map(|(id, entry)| (id.clone(), entry.clone()))
            .collect()
    }

    fn persist(&self) -> LedgerResult<()> {
        let io_err = |source| LedgerError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let json = serde_json::to_string_pretty(&self.entries)?;
        let mut temp_name = self.path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);

        let written = fs::File::create(&temp_path)
            .and_then(|mut file| {
                file.write_all(json.as_bytes())?;
                file.sync_all()
            })
            .and_then(|()| fs::rename(&temp_path, &self.path));

        if let Err(source) = written {
            // The temp file may not exist if creating it was what failed.
            let _ = fs::remove_file(&temp_path);
            return Err(io_err(source));
        }
        Ok(())
    }
}
