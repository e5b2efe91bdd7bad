//! Translation cost estimation and the spending gate.
//!
//! # Overview
//!
//! - **TokenEstimator**: estimates token counts from text before anything is sent
//! - **TokenCost**: per-model pricing used to turn tokens into dollars
//! - **TokenUsageParser**: extracts the usage a translation API actually reports
//! - **UsageTracker**: accumulates actual usage over a run
//! - **BudgetGate**: compares a batch estimate against the spending ceiling
//!
//! # Example
//!
//! ```ignore
//! use kb_migrate::budget::{BudgetConfig, BudgetGate, CostEstimate, TokenEstimator};
//!
//! let config = BudgetConfig::default().with_max_spending(1.00);
//! let estimate = CostEstimate::for_documents(&TokenEstimator::default(), &config.cost, &batch, &[]);
//!
//! if BudgetGate::new(&config).check(&estimate).is_allowed() {
//!     // translate the batch
//! }
//! ```

mod config;
mod estimator;
mod gate;
mod parser;
mod tracker;

pub use config::{BudgetConfig, TokenCost};
pub use estimator::{TokenCount, TokenEstimator};
pub use gate::{BudgetGate, CostEstimate, GateDecision};
pub use parser::{extract_or_estimate, TokenUsageParser};
pub use tracker::UsageTracker;
