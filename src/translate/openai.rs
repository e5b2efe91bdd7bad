//! Translator backed by an OpenAI-compatible chat completions API.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use super::{language, TranslateError, TranslateResult, Translation, Translator};
use crate::budget::{extract_or_estimate, TokenEstimator};

const DEFAULT_TEMPERATURE: f64 = 0.2;

/// Chat-completions translator.
#[derive(Debug, Clone)]
pub struct OpenAiTranslator {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    target_language: String,
    estimator: TokenEstimator,
}

impl OpenAiTranslator {
    /// Create a translator for `base_url` (e.g. `https://api.openai.com/v1`).
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        target_language: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            target_language: target_language.into(),
            estimator: TokenEstimator::default(),
        }
    }

    fn title_instructions(&self) -> String {
        format!(
            "You translate knowledge base document titles into {}. \
             Reply with the translated title only, without quotes or commentary. \
             Keep proper nouns and emoji unchanged.",
            self.target_language
        )
    }

    fn body_instructions(&self, title_hint: &str) -> String {
        format!(
            "You translate Markdown documents into {}. The document is titled \"{}\". \
             Preserve all Markdown structure, links, image references, tables and code blocks exactly; \
             translate only human-readable text. Reply with the translated document only.",
            self.target_language, title_hint
        )
    }

    pub(crate) fn request_body(&self, instructions: &str, text: &str) -> Value {
        json!({
            "model": self.model,
            "temperature": DEFAULT_TEMPERATURE,
            "messages": [
                { "role": "system", "content": instructions },
                { "role": "user", "content": text }
            ]
        })
    }

    async fn complete(&self, instructions: &str, text: &str) -> TranslateResult<Translation> {
        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&self.request_body(instructions, text))
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;
        if !status.is_success() {
            return Err(TranslateError::Api {
                status: status.as_u16(),
                message: error_message(&bytes),
            });
        }

        let body: Value =
            serde_json::from_slice(&bytes).map_err(|e| TranslateError::Decode(e.to_string()))?;
        let prompt = format!("{instructions}\n{text}");
        parse_completion(&body, &prompt, &self.estimator)
    }
}

#[async_trait]
impl Translator for OpenAiTranslator {
    async fn translate_title(&self, text: &str, force: bool) -> TranslateResult<Translation> {
        if text.trim().is_empty() {
            return Ok(Translation::unchanged(text));
        }
        if !force && language::is_probably_in(text, &self.target_language) {
            debug!(title = %text, "Title already in target language");
            return Ok(Translation::unchanged(text));
        }
        let mut translation = self.complete(&self.title_instructions(), text).await?;
        translation.text = clean_title(&translation.text);
        Ok(translation)
    }

    async fn translate_body(
        &self,
        text: &str,
        title_hint: &str,
        force: bool,
    ) -> TranslateResult<Translation> {
        if text.trim().is_empty() {
            return Ok(Translation::unchanged(text));
        }
        if !force && language::is_probably_in(text, &self.target_language) {
            debug!(title = %title_hint, "Body already in target language");
            return Ok(Translation::unchanged(text));
        }
        self.complete(&self.body_instructions(title_hint), text).await
    }
}

/// Pull the first choice's text and the usage out of a completion response.
pub(crate) fn parse_completion(
    body: &Value,
    prompt: &str,
    estimator: &TokenEstimator,
) -> TranslateResult<Translation> {
    let text = body
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(TranslateError::EmptyResponse)?;

    let usage = extract_or_estimate(body, prompt, text, estimator);
    Ok(Translation::translated(text, usage))
}

/// Models occasionally wrap a title in quotes or add a trailing newline.
fn clean_title(raw: &str) -> String {
    let line = raw.lines().next().unwrap_or_default().trim();
    let unquoted = line
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(line);
    unquoted.trim().to_string()
}

fn error_message(body: &[u8]) -> String {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| String::from_utf8_lossy(body).trim().to_string())
}
