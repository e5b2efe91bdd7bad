//! Token estimation utilities.
//!
//! Costs have to be known before any translation is requested, so this module
//! estimates token counts from character and word counts.

use serde::{Deserialize, Serialize};

/// Instruction tokens sent with every translation request.
pub const PROMPT_OVERHEAD: u64 = 120;

/// Conservative token estimator: the larger of a character-based and a
/// word-based count, scaled by a safety margin.
#[derive(Debug, Clone)]
pub struct TokenEstimator {
    safety_margin: f64,
}

impl Default for TokenEstimator {
    fn default() -> Self {
        Self {
            safety_margin: 1.2, // 20% safety margin
        }
    }
}

impl TokenEstimator {
    /// Estimate tokens from text.
    pub fn estimate(&self, text: &str) -> u64 {
        let base_estimate = self.estimate_by_chars(text).max(self.estimate_by_words(text));
        (base_estimate as f64 * self.safety_margin).ceil() as u64
    }

    /// Roughly 4 characters per token for English text.
    fn estimate_by_chars(&self, text: &str) -> u64 {
        let chars = text.chars().count();
        // Use 3.5 chars per token to be slightly conservative
        (chars as f64 / 3.5).ceil() as u64
    }

    /// Roughly 1.3 tokens per word for English text.
    fn estimate_by_words(&self, text: &str) -> u64 {
        let words = text.split_whitespace().count();
        (words as f64 * 1.3).ceil() as u64
    }

    /// Estimate one translation request: the text plus instructions in, a
    /// translation of about the same length out. Empty text costs nothing
    /// because it is never sent.
    pub fn estimate_translation(&self, text: &str) -> TokenCount {
        if text.trim().is_empty() {
            return TokenCount::default();
        }
        let text_tokens = self.estimate(text);
        TokenCount::new(text_tokens + PROMPT_OVERHEAD, text_tokens)
    }

    /// Estimate translating a document's title and body.
    pub fn estimate_document(&self, title: &str, body: &str) -> TokenCount {
        let mut title_count = self.estimate_translation(title);
        if !body.trim().is_empty() {
            // The body request carries the title as context.
            title_count.input_tokens += self.estimate(title);
        }
        title_count + self.estimate_translation(body)
    }
}

/// Token count for one or more requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCount {
    /// Input/prompt tokens
    pub input_tokens: u64,
    /// Output/completion tokens
    pub output_tokens: u64,
}

impl TokenCount {
    /// Create a new token count.
    pub fn new(input: u64, output: u64) -> Self {
        Self {
            input_tokens: input,
            output_tokens: output,
        }
    }

    /// Get total tokens.
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }

    pub fn is_zero(&self) -> bool {
        self.total() == 0
    }
}

impl std::ops::Add for TokenCount {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            input_tokens: self.input_tokens + other.input_tokens,
            output_tokens: self.output_tokens + other.output_tokens,
        }
    }
}

impl std::ops::AddAssign for TokenCount {
    fn add_assign(&mut self, other: Self) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
    }
}

impl std::iter::Sum for TokenCount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |acc, count| acc + count)
    }
}
