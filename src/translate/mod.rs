//! Translation engine seam.
//!
//! A [`Translator`] turns a title or a Markdown body into the target language
//! and reports the tokens the call consumed. Implementations may hand the text
//! back unchanged when it already looks translated, unless `force` is set.

pub mod language;
pub mod openai;

use async_trait::async_trait;
use thiserror::Error;

use crate::budget::TokenCount;

pub use openai::OpenAiTranslator;

/// Output of a single translation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub text: String,
    pub usage: TokenCount,
    /// True when the input was returned as-is without calling the engine.
    pub unchanged: bool,
}

impl Translation {
    pub fn translated(text: impl Into<String>, usage: TokenCount) -> Self {
        Self {
            text: text.into(),
            usage,
            unchanged: false,
        }
    }

    pub fn unchanged(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: TokenCount::default(),
            unchanged: true,
        }
    }
}

/// Errors raised by a [`Translator`].
#[derive(Error, Debug)]
pub enum TranslateError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Translation API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Translation API returned no text")]
    EmptyResponse,

    #[error("Unexpected translation response: {0}")]
    Decode(String),
}

/// Result type for translation calls.
pub type TranslateResult<T> = Result<T, TranslateError>;

#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate a document title.
    async fn translate_title(&self, text: &str, force: bool) -> TranslateResult<Translation>;

    /// Translate a Markdown body. `title_hint` gives the engine context.
    async fn translate_body(
        &self,
        text: &str,
        title_hint: &str,
        force: bool,
    ) -> TranslateResult<Translation>;
}
