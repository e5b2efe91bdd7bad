use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::Document;

/// Record of one source document that has a translated counterpart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Identifier of the translated document in the destination collection.
    pub destination_id: String,
    pub source_title: String,
    pub destination_title: String,
    /// Source `updated_at` at the time of translation.
    pub source_updated_at: DateTime<Utc>,
    /// When the translated document was recorded.
    pub translated_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Build an entry for a source/destination pair translated at `translated_at`.
    pub fn new(source: &Document, destination: &Document, translated_at: DateTime<Utc>) -> Self {
        Self {
            destination_id: destination.id.clone(),
            source_title: source.title.clone(),
            destination_title: destination.title.clone(),
            source_updated_at: source.updated_at,
            translated_at,
        }
    }

    /// Whether the source changed after it was translated.
    pub fn is_stale_for(&self, source: &Document) -> bool {
        source.updated_at > self.translated_at
    }
}
