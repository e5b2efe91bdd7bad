//! Actual usage tracking over a run.

use serde::{Deserialize, Serialize};

use super::config::TokenCost;
use super::estimator::TokenCount;

/// Accumulates the token usage reported by the translation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageTracker {
    cost: TokenCost,
    usage: TokenCount,
}

impl UsageTracker {
    pub fn new(cost: TokenCost) -> Self {
        Self {
            cost,
            usage: TokenCount::default(),
        }
    }

    pub fn record(&mut self, usage: TokenCount) {
        self.usage += usage;
    }

    pub fn usage(&self) -> TokenCount {
        self.usage
    }

    /// Total cost in USD.
    pub fn total_cost(&self) -> f64 {
        self.cost
            .calculate_cost(self.usage.input_tokens, self.usage.output_tokens)
    }
}
