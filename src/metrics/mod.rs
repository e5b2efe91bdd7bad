//! Per-run counters for a migration.

use std::time::Duration;

use serde::Serialize;

use crate::folder::FolderStats;

/// A document that could not be migrated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentFailure {
    pub document_id: String,
    pub title: String,
    pub error: String,
}

/// Outcome counters for one run.
///
/// `translated`, `skipped`, `errored` and `simulated` only count documents that
/// entered the batch loop; `up_to_date` and `remaining` describe what was left
/// out of the batch before it started.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStats {
    /// Documents translated and created in the destination
    pub translated: u32,
    /// Batch documents found already recorded when their turn came
    pub skipped: u32,
    /// Batch documents that failed
    pub errored: u32,
    /// Batch documents only simulated during a dry run
    pub simulated: u32,
    /// Documents excluded because their translation is current
    pub up_to_date: u32,
    /// Pending documents left for a later run by the batch size
    pub remaining: u32,
    /// Documents whose translation superseded an earlier one
    pub superseded: u32,
    pub folders: FolderStats,
    pub failures: Vec<DocumentFailure>,
    pub duration: Duration,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_translated(&mut self) {
        self.translated += 1;
    }

    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    pub fn record_simulated(&mut self) {
        self.simulated += 1;
    }

    pub fn record_failure(
        &mut self,
        document_id: impl Into<String>,
        title: impl Into<String>,
        error: impl ToString,
    ) {
        self.errored += 1;
        self.failures.push(DocumentFailure {
            document_id: document_id.into(),
            title: title.into(),
            error: error.to_string(),
        });
    }

    /// Whether every batch document went through without error.
    pub fn is_clean(&self) -> bool {
        self.errored == 0
    }
}
