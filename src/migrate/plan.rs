//! Batch selection: what a run will translate.

use std::collections::HashSet;

use crate::budget::{CostEstimate, TokenCost, TokenEstimator};
use crate::document::Document;
use crate::hierarchy::Hierarchy;
use crate::ledger::Ledger;

/// Documents selected for one run.
#[derive(Debug, Clone)]
pub struct BatchPlan<'h> {
    /// Pending documents in fetch order, truncated to the batch size.
    pub batch: Vec<&'h Document>,
    /// Ancestors of the batch that will need a new destination folder.
    pub folders: Vec<&'h Document>,
    /// Documents whose translation is current.
    pub up_to_date: usize,
    /// Pending documents beyond the batch size.
    pub remaining: usize,
}

impl<'h> BatchPlan<'h> {
    /// Select never-translated and stale documents, then apply `batch_size`.
    pub fn build(hierarchy: &'h Hierarchy, ledger: &Ledger, batch_size: Option<usize>) -> Self {
        let (pending, current): (Vec<&Document>, Vec<&Document>) = hierarchy
            .documents()
            .partition(|doc| !ledger.is_translated(&doc.id) || ledger.needs_update(doc));

        let limit = batch_size.unwrap_or(pending.len());
        let remaining = pending.len().saturating_sub(limit);
        let batch: Vec<&Document> = pending.into_iter().take(limit).collect();

        let in_batch: HashSet<&str> = batch.iter().map(|doc| doc.id.as_str()).collect();
        let mut seen = HashSet::new();
        let mut folders = Vec::new();
        for doc in &batch {
            for ancestor in hierarchy.ancestors(&doc.id) {
                let id = ancestor.id();
                if in_batch.contains(id) || ledger.is_translated(id) || !seen.insert(id) {
                    continue;
                }
                folders.push(ancestor.document());
            }
        }

        Self {
            batch,
            folders,
            up_to_date: current.len(),
            remaining,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }

    pub fn estimate(&self, estimator: &TokenEstimator, pricing: &TokenCost) -> CostEstimate {
        CostEstimate::for_documents(estimator, pricing, &self.batch, &self.folders)
    }
}
