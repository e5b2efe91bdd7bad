//! Pricing and spending limits.

use serde::{Deserialize, Serialize};

/// Cost per million tokens for a translation model, in USD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenCost {
    /// USD per 1M input tokens
    pub input_cost_per_million: f64,
    /// USD per 1M output tokens
    pub output_cost_per_million: f64,
    /// Model name for reference
    pub model_name: String,
}

impl Default for TokenCost {
    fn default() -> Self {
        Self::for_model("gpt-4o-mini")
    }
}

impl TokenCost {
    /// Create custom pricing.
    pub fn new(model_name: impl Into<String>, input_per_million: f64, output_per_million: f64) -> Self {
        Self {
            input_cost_per_million: input_per_million,
            output_cost_per_million: output_per_million,
            model_name: model_name.into(),
        }
    }

    /// Look up list pricing for a known model.
    ///
    /// Unknown models get gpt-4o pricing so estimates err on the expensive side.
    pub fn for_model(model: &str) -> Self {
        let (input, output) = match model {
            m if m.starts_with("gpt-4o-mini") => (0.15, 0.60),
            m if m.starts_with("gpt-4.1-nano") => (0.10, 0.40),
            m if m.starts_with("gpt-4.1-mini") => (0.40, 1.60),
            m if m.starts_with("gpt-4.1") => (2.00, 8.00),
            m if m.starts_with("gpt-3.5-turbo") => (0.50, 1.50),
            _ => (2.50, 10.00),
        };
        Self::new(model, input, output)
    }

    /// Calculate cost in USD for given token counts.
    pub fn calculate_cost(&self, input_tokens: u64, output_tokens: u64) -> f64 {
        let input_cost = (input_tokens as f64 / 1_000_000.0) * self.input_cost_per_million;
        let output_cost = (output_tokens as f64 / 1_000_000.0) * self.output_cost_per_million;
        input_cost + output_cost
    }
}

/// Spending limits for a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BudgetConfig {
    /// Maximum spend in USD for one run (`None` = unlimited)
    pub max_spending: Option<f64>,
    /// Pricing for the translation model
    pub cost: TokenCost,
}

impl BudgetConfig {
    pub fn new(cost: TokenCost) -> Self {
        Self {
            max_spending: None,
            cost,
        }
    }

    /// Set the spending ceiling in USD.
    pub fn with_max_spending(mut self, usd: f64) -> Self {
        self.max_spending = Some(usd.max(0.0));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_unlimited() {
        let config = BudgetConfig::default();
        assert!(config.max_spending.is_none());
        assert_eq!(config.cost.model_name, "gpt-4o-mini");
    }

    #[test]
    fn test_with_max_spending_clamps_negative() {
        let config = BudgetConfig::default().with_max_spending(-3.0);
        assert_eq!(config.max_spending, Some(0.0));
    }

    #[test]
    fn test_token_cost_calculation() {
        let cost = TokenCost::new("test", 1.0, 4.0);
        let total = cost.calculate_cost(500_000, 250_000);
        // 0.5M input at $1 + 0.25M output at $4 = $1.50
        assert!((total - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_known_models() {
        assert!(TokenCost::for_model("gpt-4o-mini-2024-07-18").input_cost_per_million < 0.2);
        assert!(
            TokenCost::for_model("gpt-4.1-mini").input_cost_per_million
                < TokenCost::for_model("gpt-4.1").input_cost_per_million
        );
    }

    #[test]
    fn test_unknown_model_priced_high() {
        let unknown = TokenCost::for_model("mystery-model");
        assert!(unknown.input_cost_per_million >= TokenCost::default().input_cost_per_million);
        assert_eq!(unknown.model_name, "mystery-model");
    }
}
