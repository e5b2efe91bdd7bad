//! Run orchestration.
//!
//! One run fetches the source collection, rebuilds its hierarchy, selects the
//! documents that were never translated or changed since, gates the batch on
//! its estimated cost and then migrates the documents one at a time. Folder
//! resolution and creation are strictly sequential; only the title and body
//! translations of a single document are in flight together.

mod plan;

use std::time::{Duration, Instant};

use indicatif::ProgressBar;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::budget::{
    BudgetConfig, BudgetGate, CostEstimate, GateDecision, TokenCount, TokenEstimator, UsageTracker,
};
use crate::document::{Document, DocumentStore, NewDocument, StoreError};
use crate::folder::{FolderError, FolderResolver};
use crate::hierarchy::Hierarchy;
use crate::ledger::{Ledger, LedgerError};
use crate::metrics::RunStats;
use crate::translate::Translator;

pub use plan::BatchPlan;

/// Default pause between two documents.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(1000);

/// Errors that prevent a run from starting.
#[derive(Error, Debug)]
pub enum MigrateError {
    #[error("Failed to fetch source documents: {0}")]
    Fetch(#[source] StoreError),
}

pub type MigrateResult<T> = Result<T, MigrateError>;

/// Settings for one run.
#[derive(Debug, Clone)]
pub struct MigrationOptions {
    pub source_collection: String,
    pub destination_collection: String,
    /// Maximum documents per run (`None` = all pending)
    pub batch_size: Option<usize>,
    pub budget: BudgetConfig,
    pub dry_run: bool,
    /// Translate even text that already looks like the target language
    pub force_translate: bool,
    /// Pause between documents
    pub delay: Duration,
    pub estimator: TokenEstimator,
}

impl MigrationOptions {
    pub fn new(source_collection: impl Into<String>, destination_collection: impl Into<String>) -> Self {
        Self {
            source_collection: source_collection.into(),
            destination_collection: destination_collection.into(),
            batch_size: None,
            budget: BudgetConfig::default(),
            dry_run: false,
            force_translate: false,
            delay: DEFAULT_DELAY,
            estimator: TokenEstimator::default(),
        }
    }

    pub fn with_batch_size(mut self, batch_size: Option<usize>) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_budget(mut self, budget: BudgetConfig) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_force_translate(mut self, force: bool) -> Self {
        self.force_translate = force;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed,
    /// No document needed translating.
    NothingToDo,
    /// The estimate exceeded the spending ceiling; nothing was translated.
    BudgetRejected { estimated: f64, ceiling: f64 },
    /// The ledger could not be written; the batch stopped at that document.
    Aborted { reason: String },
}

/// The real translation made during a dry run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DryRunPreview {
    pub source_title: String,
    pub translated_title: String,
    pub translated_body: String,
}

/// Result of a run.
#[derive(Debug, Clone)]
pub struct MigrationReport {
    pub outcome: RunOutcome,
    pub stats: RunStats,
    pub estimate: Option<CostEstimate>,
    /// Usage reported by the translation engine
    pub usage: TokenCount,
    /// USD, from actual usage
    pub actual_cost: f64,
    pub preview: Option<DryRunPreview>,
}

/// What a run would do, without doing it.
#[derive(Debug, Clone)]
pub struct EstimateReport {
    pub estimate: CostEstimate,
    pub up_to_date: usize,
    pub remaining: usize,
    pub decision: GateDecision,
}

enum DocumentOutcome {
    Translated { superseded: Option<String> },
    AlreadyRecorded,
}

enum DocumentError {
    /// The ledger could not be written.
    Fatal(LedgerError),
    Failed(String),
}

impl From<FolderError> for DocumentError {
    fn from(err: FolderError) -> Self {
        match err {
            FolderError::Ledger(err) => DocumentError::Fatal(err),
            other => DocumentError::Failed(other.to_string()),
        }
    }
}

/// Copies and translates one collection into another.
pub struct Migrator<'a> {
    store: &'a dyn DocumentStore,
    translator: &'a dyn Translator,
    options: MigrationOptions,
    progress: ProgressBar,
}

impl<'a> Migrator<'a> {
    pub fn new(
        store: &'a dyn DocumentStore,
        translator: &'a dyn Translator,
        options: MigrationOptions,
    ) -> Self {
        Self {
            store,
            translator,
            options,
            progress: ProgressBar::hidden(),
        }
    }

    /// Report batch progress on `progress`.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    async fn fetch_hierarchy(&self) -> MigrateResult<Hierarchy> {
        let documents = self
            .store
            .list_documents(&self.options.source_collection)
            .await
            .map_err(MigrateError::Fetch)?;
        info!(
            collection = %self.options.source_collection,
            documents = documents.len(),
            "Fetched source documents"
        );
        let hierarchy = Hierarchy::build(documents);
        let orphans = hierarchy.orphans().count();
        if orphans > 0 {
            warn!(orphans, "Some documents were placed at the root because their parent is missing");
        }
        Ok(hierarchy)
    }

    /// Fetch and plan the next batch and check it against the gate.
    pub async fn estimate(&self, ledger: &Ledger) -> MigrateResult<EstimateReport> {
        let hierarchy = self.fetch_hierarchy().await?;
        let plan = BatchPlan::build(&hierarchy, ledger, self.options.batch_size);
        let estimate = plan.estimate(&self.options.estimator, &self.options.budget.cost);
        let decision = BudgetGate::new(&self.options.budget).check(&estimate);
        Ok(EstimateReport {
            estimate,
            up_to_date: plan.up_to_date,
            remaining: plan.remaining,
            decision,
        })
    }

    /// Run one migration pass.
    ///
    /// Per-document failures are counted and the loop moves on. A failure to
    /// fetch the source collection is an error. A failure to write the ledger
    /// stops the batch and is reported as [`RunOutcome::Aborted`] together with
    /// the counts gathered so far.
    pub async fn run(&self, ledger: &mut Ledger) -> MigrateResult<MigrationReport> {
        let started = Instant::now();
        let mut stats = RunStats::new();
        let mut tracker = UsageTracker::new(self.options.budget.cost.clone());

        let hierarchy = self.fetch_hierarchy().await?;
        let plan = BatchPlan::build(&hierarchy, ledger, self.options.batch_size);
        stats.up_to_date = plan.up_to_date as u32;
        stats.remaining = plan.remaining as u32;

        if plan.is_empty() {
            info!("Nothing to translate");
            stats.duration = started.elapsed();
            return Ok(report(RunOutcome::NothingToDo, stats, None, &tracker, None));
        }

        let estimate = plan.estimate(&self.options.estimator, &self.options.budget.cost);
        info!(
            documents = estimate.documents,
            folders = estimate.folders,
            tokens = estimate.tokens.total(),
            cost = %format!("${:.4}", estimate.cost),
            "Estimated batch cost"
        );

        if let GateDecision::Reject { estimated, ceiling } =
            BudgetGate::new(&self.options.budget).check(&estimate)
        {
            warn!(
                estimated = %format!("${estimated:.4}"),
                ceiling = %format!("${ceiling:.4}"),
                "Estimated cost exceeds the spending limit, nothing was translated"
            );
            stats.duration = started.elapsed();
            return Ok(report(
                RunOutcome::BudgetRejected { estimated, ceiling },
                stats,
                Some(estimate),
                &tracker,
                None,
            ));
        }

        let mut outcome = RunOutcome::Completed;
        let preview = if self.options.dry_run {
            self.simulate(&plan, &mut stats, &mut tracker).await
        } else {
            if let Err(err) = self
                .migrate_batch(&hierarchy, &plan, ledger, &mut stats, &mut tracker)
                .await
            {
                error!(error = %err, "Ledger write failed, stopping the run");
                outcome = RunOutcome::Aborted {
                    reason: err.to_string(),
                };
            }
            None
        };

        stats.duration = started.elapsed();
        info!(
            translated = stats.translated,
            skipped = stats.skipped,
            errored = stats.errored,
            simulated = stats.simulated,
            "Run finished"
        );
        Ok(report(
            outcome,
            stats,
            Some(estimate),
            &tracker,
            preview,
        ))
    }

    async fn migrate_batch(
        &self,
        hierarchy: &Hierarchy,
        plan: &BatchPlan<'_>,
        ledger: &mut Ledger,
        stats: &mut RunStats,
        tracker: &mut UsageTracker,
    ) -> Result<(), LedgerError> {
        let mut resolver = FolderResolver::new(hierarchy, self.store, self.translator);
        self.progress.set_length(plan.batch.len() as u64);

        for (position, doc) in plan.batch.iter().enumerate() {
            if position > 0 && !self.options.delay.is_zero() {
                tokio::time::sleep(self.options.delay).await;
            }
            self.progress.set_message(doc.title.clone());

            let result = self.migrate_document(&mut resolver, ledger, doc, tracker).await;
            tracker.record(resolver.take_usage());
            stats.folders = resolver.stats();

            match result {
                Ok(DocumentOutcome::Translated { superseded }) => {
                    stats.record_translated();
                    if let Some(previous) = superseded {
                        stats.superseded += 1;
                        warn!(title = %doc.title, previous = %previous, "Superseded an earlier translation");
                    }
                }
                Ok(DocumentOutcome::AlreadyRecorded) => stats.record_skipped(),
                Err(DocumentError::Failed(message)) => {
                    error!(id = %doc.id, title = %doc.title, error = %message, "Failed to migrate document");
                    stats.record_failure(&doc.id, &doc.title, message);
                }
                Err(DocumentError::Fatal(err)) => {
                    self.progress.abandon();
                    return Err(err);
                }
            }
            self.progress.inc(1);
        }

        self.progress.finish_and_clear();
        Ok(())
    }

    async fn migrate_document(
        &self,
        resolver: &mut FolderResolver<'_>,
        ledger: &mut Ledger,
        doc: &Document,
        tracker: &mut UsageTracker,
    ) -> Result<DocumentOutcome, DocumentError> {
        // It may have been created as an ancestor folder earlier in this run.
        if ledger.is_translated(&doc.id) && !ledger.needs_update(doc) {
            debug!(title = %doc.title, "Already recorded, skipping");
            return Ok(DocumentOutcome::AlreadyRecorded);
        }
        let superseded = ledger.get(&doc.id).map(|entry| entry.destination_id.clone());
        let force = self.options.force_translate;

        let parent = resolver
            .ensure_folder_structure(ledger, &doc.id, &self.options.destination_collection, force)
            .await?;

        let (title, body) = futures::try_join!(
            self.translator.translate_title(&doc.title, force),
            self.translator.translate_body(&doc.text, &doc.title, force),
        )
        .map_err(|err| DocumentError::Failed(err.to_string()))?;
        tracker.record(title.usage + body.usage);

        let draft = NewDocument::new(title.text, body.text, &self.options.destination_collection)
            .with_parent(parent)
            .with_emoji(doc.emoji.clone());
        let created = self
            .store
            .create_document(draft)
            .await
            .map_err(|err| DocumentError::Failed(err.to_string()))?;

        ledger.add(doc, &created).map_err(DocumentError::Fatal)?;
        info!(title = %doc.title, destination = %created.id, "Translated document");
        Ok(DocumentOutcome::Translated { superseded })
    }

    /// Translate the first document for real and simulate the rest.
    async fn simulate(
        &self,
        plan: &BatchPlan<'_>,
        stats: &mut RunStats,
        tracker: &mut UsageTracker,
    ) -> Option<DryRunPreview> {
        let force = self.options.force_translate;
        let mut preview = None;

        if let Some(first) = plan.batch.first() {
            match futures::try_join!(
                self.translator.translate_title(&first.title, force),
                self.translator.translate_body(&first.text, &first.title, force),
            ) {
                Ok((title, body)) => {
                    tracker.record(title.usage + body.usage);
                    info!(title = %first.title, translated = %title.text, "[dry run] Translated sample document");
                    preview = Some(DryRunPreview {
                        source_title: first.title.clone(),
                        translated_title: title.text,
                        translated_body: body.text,
                    });
                    stats.record_simulated();
                }
                Err(err) => {
                    error!(title = %first.title, error = %err, "[dry run] Sample translation failed");
                    stats.record_failure(&first.id, &first.title, err);
                }
            }
        }

        for doc in plan.batch.iter().skip(1) {
            info!(title = %doc.title, "[dry run] Would translate");
            stats.record_simulated();
        }
        preview
    }
}

fn report(
    outcome: RunOutcome,
    stats: RunStats,
    estimate: Option<CostEstimate>,
    tracker: &UsageTracker,
    preview: Option<DryRunPreview>,
) -> MigrationReport {
    MigrationReport {
        outcome,
        stats,
        estimate,
        usage: tracker.usage(),
        actual_cost: tracker.total_cost(),
        preview,
    }
}
