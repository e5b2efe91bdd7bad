//! Token usage parsing from translation API responses.
//!
//! OpenAI-compatible APIs report usage as
//! `{"usage": {"prompt_tokens": N, "completion_tokens": N}}`. When a response
//! carries no usage block the counts are estimated instead.

use serde::Deserialize;
use serde_json::Value;

use super::estimator::{TokenCount, TokenEstimator};

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

/// Extracts reported usage from a decoded API response.
#[derive(Debug, Clone, Default)]
pub struct TokenUsageParser;

impl TokenUsageParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse the `usage` block of a response body, if present.
    pub fn parse_response(&self, response: &Value) -> Option<TokenCount> {
        let usage = response.get("usage")?;
        let usage = OpenAIUsage::deserialize(usage).ok()?;
        Some(TokenCount::new(usage.prompt_tokens, usage.completion_tokens))
    }
}

/// Take the usage reported in `response`, or estimate it from the prompt and
/// completion text when the provider omitted it.
pub fn extract_or_estimate(
    response: &Value,
    prompt: &str,
    completion: &str,
    estimator: &TokenEstimator,
) -> TokenCount {
    TokenUsageParser::new()
        .parse_response(response)
        .unwrap_or_else(|| TokenCount::new(estimator.estimate(prompt), estimator.estimate(completion)))
}
