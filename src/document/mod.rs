//! Knowledge base documents and the store they live in.
//!
//! The migration only ever reads from the source collection and creates in the
//! destination collection, so [`DocumentStore`] is limited to list, get, create
//! and an exact-title lookup used for folder de-duplication.

pub mod outline;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use outline::OutlineClient;

/// A document as returned by the knowledge base API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub title: String,
    /// Markdown body.
    #[serde(default)]
    pub text: String,
    #[serde(default, alias = "icon", skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    /// `None` for documents at the root of their collection.
    #[serde(default)]
    pub parent_document_id: Option<String>,
    #[serde(default)]
    pub collection_id: String,
    pub updated_at: DateTime<Utc>,
}

/// Parameters for creating a document in the destination collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDocument {
    pub title: String,
    pub text: String,
    pub collection_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_document_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
}

impl NewDocument {
    pub fn new(
        title: impl Into<String>,
        text: impl Into<String>,
        collection_id: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            collection_id: collection_id.into(),
            parent_document_id: None,
            emoji: None,
        }
    }

    pub fn with_parent(mut self, parent_id: Option<String>) -> Self {
        self.parent_document_id = parent_id;
        self
    }

    pub fn with_emoji(mut self, emoji: Option<String>) -> Self {
        self.emoji = emoji;
        self
    }
}

/// Errors raised by a [`DocumentStore`].
#[derive(Error, Debug)]
pub enum StoreError {
    /// Transport-level failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The requested document does not exist.
    #[error("Document not found: {0}")]
    NotFound(String),

    /// The API answered with a body we could not decode.
    #[error("Unexpected response: {0}")]
    Decode(String),
}

/// Result type for document store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Remote document store holding both the source and destination collections.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch every document of a collection, following pagination.
    async fn list_documents(&self, collection_id: &str) -> StoreResult<Vec<Document>>;

    /// Fetch a single document.
    async fn get_document(&self, id: &str) -> StoreResult<Document>;

    /// Create and publish a document.
    async fn create_document(&self, document: NewDocument) -> StoreResult<Document>;

    /// Find a document whose title is exactly `title` directly under `parent_id`
    /// (or at the collection root when `parent_id` is `None`).
    async fn find_by_title(
        &self,
        title: &str,
        collection_id: &str,
        parent_id: Option<&str>,
    ) -> StoreResult<Option<Document>>;
}
