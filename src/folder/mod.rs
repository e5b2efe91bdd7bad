//! Destination folder resolution.
//!
//! Before a document is created in the destination collection, every ancestor
//! on its source path must exist there too. [`FolderResolver`] walks the path
//! root-first and resolves each ancestor from, in order: the in-run mapping
//! cache, the ledger, an exact-title search in the destination, and finally a
//! fresh translated document. Each source folder is created at most once,
//! whatever order the leaves are processed in.

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::budget::TokenCount;
use crate::document::{Document, DocumentStore, NewDocument, StoreError};
use crate::hierarchy::Hierarchy;
use crate::ledger::{Ledger, LedgerError};
use crate::translate::{TranslateError, Translator};

/// A source folder already resolved during this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderMapping {
    pub destination_id: String,
    pub source_name: String,
    pub destination_name: String,
}

/// How ancestors were resolved over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FolderStats {
    pub created: u32,
    pub reused_from_cache: u32,
    pub reused_from_ledger: u32,
    pub adopted_existing: u32,
    pub search_failures: u32,
}

#[derive(Error, Debug)]
pub enum FolderError {
    #[error("Failed to translate folder '{title}': {source}")]
    Translate {
        title: String,
        #[source]
        source: TranslateError,
    },

    #[error("Failed to create folder '{title}': {source}")]
    Create {
        title: String,
        #[source]
        source: StoreError,
    },

    /// The ledger could not be written; the run must stop.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl FolderError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, FolderError::Ledger(_))
    }
}

pub type FolderResult<T> = Result<T, FolderError>;

/// Ensures ancestor folders exist in the destination collection.
pub struct FolderResolver<'a> {
    hierarchy: &'a Hierarchy,
    store: &'a dyn DocumentStore,
    translator: &'a dyn Translator,
    mappings: HashMap<String, FolderMapping>,
    stats: FolderStats,
    usage: TokenCount,
}

impl<'a> FolderResolver<'a> {
    pub fn new(
        hierarchy: &'a Hierarchy,
        store: &'a dyn DocumentStore,
        translator: &'a dyn Translator,
    ) -> Self {
        Self {
            hierarchy,
            store,
            translator,
            mappings: HashMap::new(),
            stats: FolderStats::default(),
            usage: TokenCount::default(),
        }
    }

    /// Make sure every ancestor of `document_id` exists in `destination_collection`
    /// and return the destination id to use as the document's parent.
    ///
    /// `None` means the document belongs at the collection root.
    pub async fn ensure_folder_structure(
        &mut self,
        ledger: &mut Ledger,
        document_id: &str,
        destination_collection: &str,
        force_translate: bool,
    ) -> FolderResult<Option<String>> {
        let hierarchy = self.hierarchy;
        let mut current_parent: Option<String> = None;

        for ancestor in hierarchy.ancestors(document_id) {
            let destination_id = self
                .resolve_ancestor(
                    ledger,
                    ancestor.document(),
                    destination_collection,
                    current_parent.as_deref(),
                    force_translate,
                )
                .await?;
            current_parent = Some(destination_id);
        }

        Ok(current_parent)
    }

    async fn resolve_ancestor(
        &mut self,
        ledger: &mut Ledger,
        folder: &Document,
        destination_collection: &str,
        parent_id: Option<&str>,
        force_translate: bool,
    ) -> FolderResult<String> {
        if let Some(mapping) = self.mappings.get(&folder.id) {
            self.stats.reused_from_cache += 1;
            return Ok(mapping.destination_id.clone());
        }

        if let Some(entry) = ledger.get(&folder.id) {
            debug!(folder = %folder.title, destination = %entry.destination_id, "Folder found in ledger");
            let destination_id = entry.destination_id.clone();
            let destination_name = entry.destination_title.clone();
            self.remember(folder, destination_id.clone(), destination_name);
            self.stats.reused_from_ledger += 1;
            return Ok(destination_id);
        }

        let title = self
            .translator
            .translate_title(&folder.title, force_translate)
            .await
            .map_err(|source| FolderError::Translate {
                title: folder.title.clone(),
                source,
            })?;
        self.usage += title.usage;

        match self
            .store
            .find_by_title(&title.text, destination_collection, parent_id)
            .await
        {
            Ok(Some(existing)) => {
                info!(folder = %folder.title, destination = %existing.id, "Adopting existing destination folder");
                ledger.add(folder, &existing)?;
                self.remember(folder, existing.id.clone(), existing.title);
                self.stats.adopted_existing += 1;
                return Ok(existing.id);
            }
            Ok(None) => {}
            Err(err) => {
                warn!(folder = %folder.title, error = %err, "Folder search failed, creating a new folder");
                self.stats.search_failures += 1;
            }
        }

        let body = if folder.text.trim().is_empty() {
            String::new()
        } else {
            let body = self
                .translator
                .translate_body(&folder.text, &folder.title, force_translate)
                .await
                .map_err(|source| FolderError::Translate {
                    title: folder.title.clone(),
                    source,
                })?;
            self.usage += body.usage;
            body.text
        };

        let draft = NewDocument::new(title.text, body, destination_collection)
            .with_parent(parent_id.map(str::to_string))
            .with_emoji(folder.emoji.clone());
        let created = self
            .store
            .create_document(draft)
            .await
            .map_err(|source| FolderError::Create {
                title: folder.title.clone(),
                source,
            })?;

        ledger.add(folder, &created)?;
        info!(folder = %folder.title, destination = %created.id, "Created destination folder");
        self.remember(folder, created.id.clone(), created.title);
        self.stats.created += 1;
        Ok(created.id)
    }

    fn remember(&mut self, folder: &Document, destination_id: String, destination_name: String) {
        self.mappings.insert(
            folder.id.clone(),
            FolderMapping {
                destination_id,
                source_name: folder.title.clone(),
                destination_name,
            },
        );
    }

    pub fn mapping(&self, source_id: &str) -> Option<&FolderMapping> {
        self.mappings.get(source_id)
    }

    pub fn mappings(&self) -> &HashMap<String, FolderMapping> {
        &self.mappings
    }

    pub fn stats(&self) -> FolderStats {
        self.stats
    }

    /// Translation usage accumulated since the last call.
    pub fn take_usage(&mut self) -> TokenCount {
        std::mem::take(&mut self.usage)
    }

    /// Forget every mapping resolved so far.
    pub fn reset(&mut self) {
        self.mappings.clear();
    }
}
