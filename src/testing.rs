//! In-memory doubles for the document store and the translation engine.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use crate::budget::TokenCount;
use crate::document::{Document, DocumentStore, NewDocument, StoreError, StoreResult};
use crate::translate::{TranslateError, TranslateResult, Translation, Translator};

/// Timestamp used for every fixture document unless overridden.
pub(crate) fn fixture_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// Source document fixture in collection `source`.
pub(crate) fn doc(id: &str, parent: Option<&str>, title: &str) -> Document {
    Document {
        id: id.to_string(),
        title: title.to_string(),
        text: String::new(),
        emoji: None,
        parent_document_id: parent.map(str::to_string),
        collection_id: "source".to_string(),
        updated_at: fixture_time(),
    }
}

impl Document {
    pub(crate) fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub(crate) fn updated(mut self, at: DateTime<Utc>) -> Self {
        self.updated_at = at;
        self
    }

    pub(crate) fn with_emoji(mut self, emoji: &str) -> Self {
        self.emoji = Some(emoji.to_string());
        self
    }
}

/// Document store holding everything in a vector.
#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    documents: Mutex<Vec<Document>>,
    created: Mutex<Vec<Document>>,
    next_id: AtomicUsize,
    fail_searches: bool,
    fail_create_titles: Mutex<HashSet<String>>,
    searches: AtomicUsize,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_documents(documents: Vec<Document>) -> Self {
        let store = Self::new();
        *store.documents.lock().unwrap() = documents;
        store
    }

    /// Make every `find_by_title` call fail with a transport-like error.
    pub(crate) fn failing_searches(mut self) -> Self {
        self.fail_searches = true;
        self
    }

    /// Make creation fail for documents with this (translated) title.
    pub(crate) fn fail_create(&self, title: &str) {
        self.fail_create_titles
            .lock()
            .unwrap()
            .insert(title.to_string());
    }

    /// Documents created through the store, in creation order.
    pub(crate) fn created(&self) -> Vec<Document> {
        self.created.lock().unwrap().clone()
    }

    pub(crate) fn created_titles(&self) -> Vec<String> {
        self.created().into_iter().map(|d| d.title).collect()
    }

    pub(crate) fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    pub(crate) fn insert(&self, document: Document) {
        self.documents.lock().unwrap().push(document);
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list_documents(&self, collection_id: &str) -> StoreResult<Vec<Document>> {
        Ok(self
            .documents
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.collection_id == collection_id)
            .cloned()
            .collect())
    }

    async fn get_document(&self, id: &str) -> StoreResult<Document> {
        self.documents
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn create_document(&self, document: NewDocument) -> StoreResult<Document> {
        if self.fail_create_titles.lock().unwrap().contains(&document.title) {
            return Err(StoreError::Api {
                status: 500,
                message: format!("cannot create {}", document.title),
            });
        }
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let created = Document {
            id: format!("dest-{n}"),
            title: document.title,
            text: document.text,
            emoji: document.emoji,
            parent_document_id: document.parent_document_id,
            collection_id: document.collection_id,
            updated_at: Utc::now(),
        };
        self.documents.lock().unwrap().push(created.clone());
        self.created.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn find_by_title(
        &self,
        title: &str,
        collection_id: &str,
        parent_id: Option<&str>,
    ) -> StoreResult<Option<Document>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        if self.fail_searches {
            return Err(StoreError::Api {
                status: 503,
                message: "search unavailable".to_string(),
            });
        }
        Ok(self
            .documents
            .lock()
            .unwrap()
            .iter()
            .find(|d| {
                d.collection_id == collection_id
                    && d.title == title
                    && d.parent_document_id.as_deref() == parent_id
            })
            .cloned())
    }
}

/// Translator that appends ` [en]` and reports one token in, one out per call.
#[derive(Debug, Default)]
pub(crate) struct EchoTranslator {
    calls: AtomicUsize,
    fail_titles: Mutex<HashSet<String>>,
    /// `force` flag of every title and body request, in arrival order.
    force_flags: Mutex<Vec<bool>>,
}

impl EchoTranslator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn force_flags(&self) -> Vec<bool> {
        self.force_flags.lock().unwrap().clone()
    }

    /// Make title translation fail for this source title.
    pub(crate) fn fail_on(&self, title: &str) {
        self.fail_titles.lock().unwrap().insert(title.to_string());
    }

    pub(crate) fn translated(text: &str) -> String {
        format!("{text} [en]")
    }
}

#[async_trait]
impl Translator for EchoTranslator {
    async fn translate_title(&self, text: &str, force: bool) -> TranslateResult<Translation> {
        self.force_flags.lock().unwrap().push(force);
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_titles.lock().unwrap().contains(text) {
            return Err(TranslateError::Api {
                status: 429,
                message: "rate limited".to_string(),
            });
        }
        Ok(Translation::translated(
            Self::translated(text),
            TokenCount::new(1, 1),
        ))
    }

    async fn translate_body(
        &self,
        text: &str,
        _title_hint: &str,
        force: bool,
    ) -> TranslateResult<Translation> {
        self.force_flags.lock().unwrap().push(force);
        if text.is_empty() {
            return Ok(Translation::unchanged(text));
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Translation::translated(
            Self::translated(text),
            TokenCount::new(1, 1),
        ))
    }
}
