//! Pre-run cost estimate and the spending gate.

use serde::{Deserialize, Serialize};

use super::config::{BudgetConfig, TokenCost};
use super::estimator::{TokenCount, TokenEstimator};
use crate::document::Document;

/// Estimated cost of translating a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    /// Documents in the batch
    pub documents: usize,
    /// Ancestor folders that will have to be created for the batch
    pub folders: usize,
    pub tokens: TokenCount,
    /// USD
    pub cost: f64,
}

impl CostEstimate {
    /// Estimate translating every document and folder given.
    pub fn for_documents(
        estimator: &TokenEstimator,
        pricing: &TokenCost,
        documents: &[&Document],
        folders: &[&Document],
    ) -> Self {
        let tokens: TokenCount = documents
            .iter()
            .chain(folders.iter())
            .map(|doc| estimator.estimate_document(&doc.title, &doc.text))
            .sum();

        Self {
            documents: documents.len(),
            folders: folders.len(),
            cost: pricing.calculate_cost(tokens.input_tokens, tokens.output_tokens),
            tokens,
        }
    }
}

/// Outcome of checking an estimate against the ceiling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateDecision {
    Allow,
    Reject { estimated: f64, ceiling: f64 },
}

impl GateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GateDecision::Allow)
    }
}

/// Rejects a batch whose estimated cost exceeds the configured ceiling.
#[derive(Debug, Clone, Copy)]
pub struct BudgetGate {
    ceiling: Option<f64>,
}

impl BudgetGate {
    pub fn new(config: &BudgetConfig) -> Self {
        Self {
            ceiling: config.max_spending,
        }
    }

    /// An estimate at or below the ceiling passes.
    pub fn check(&self, estimate: &CostEstimate) -> GateDecision {
        match self.ceiling {
            Some(ceiling) if estimate.cost > ceiling => GateDecision::Reject {
                estimated: estimate.cost,
                ceiling,
            },
            _ => GateDecision::Allow,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::doc;

    fn estimate_of(cost: f64) -> CostEstimate {
        CostEstimate {
            cost,
            ..CostEstimate::default()
        }
    }

    #[test]
    fn test_gate_rejects_over_ceiling() {
        let gate = BudgetGate::new(&BudgetConfig::default().with_max_spending(1.00));
        let decision = gate.check(&estimate_of(1.50));

        assert_eq!(
            decision,
            GateDecision::Reject {
                estimated: 1.50,
                ceiling: 1.00
            }
        );
        assert!(!decision.is_allowed());
    }

    #[test]
    fn test_gate_allows_at_ceiling() {
        let gate = BudgetGate::new(&BudgetConfig::default().with_max_spending(1.00));
        assert!(gate.check(&estimate_of(1.00)).is_allowed());
        assert!(gate.check(&estimate_of(0.25)).is_allowed());
    }

    #[test]
    fn test_no_ceiling_allows_anything() {
        let gate = BudgetGate::new(&BudgetConfig::default());
        assert!(gate.check(&estimate_of(1e9)).is_allowed());
    }

    #[test]
    fn test_estimate_counts_documents_and_folders() {
        let estimator = TokenEstimator::default();
        let pricing = TokenCost::new("test", 1.0, 1.0);
        let lore = doc("A", None, "Lore");
        let arthur = doc("C", Some("B"), "Arthur").with_text("The once and future king.");

        let estimate = CostEstimate::for_documents(&estimator, &pricing, &[&arthur], &[&lore]);

        let expected = estimator.estimate_document("Arthur", "The once and future king.")
            + estimator.estimate_document("Lore", "");
        assert_eq!(estimate.documents, 1);
        assert_eq!(estimate.folders, 1);
        assert_eq!(estimate.tokens, expected);
        assert!((estimate.cost - expected.total() as f64 / 1_000_000.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_batch_costs_nothing() {
        let estimate =
            CostEstimate::for_documents(&TokenEstimator::default(), &TokenCost::default(), &[], &[]);
        assert_eq!(estimate.cost, 0.0);
        assert!(estimate.tokens.is_zero());
    }
}
