//! Translator traits and error type.
//!
//! Every provider — classical MT service or LLM — is a value implementing
//! a small capability set: a name plus an async translate call. The
//! dispatcher iterates ordered lists of these trait objects; nothing is
//! dispatched by string lookup.

use std::time::Instant;

use async_trait::async_trait;
use thiserror::Error;

// ---------------------------------------------------------------------------
// TranslateError
// ---------------------------------------------------------------------------

/// Errors a provider call can produce.
///
/// `MissingKey` is not a failure — the provider is unconfigured and the
/// chain moves on silently. Everything else counts as a failed attempt.
#[derive(Debug, Error)]
pub enum TranslateError {
    /// The provider's API key environment variable is unset.
    #[error("{0} is not configured")]
    MissingKey(&'static str),

    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The HTTP response could not be parsed as expected JSON.
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// The service returned an application-level error.
    #[error("provider error: {0}")]
    Api(String),

    /// The provider returned no usable text.
    #[error("empty response")]
    EmptyResponse,

    /// The candidate translation failed the sanity rules.
    #[error("rejected by sanity check: {0}")]
    Insane(&'static str),
}

impl From<reqwest::Error> for TranslateError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TranslateError::Timeout
        } else {
            TranslateError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// A classical MT provider: one string in, one string out.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Short display name ("DeepL", "Google", …) used in status messages
    /// and per-provider accounting.
    fn name(&self) -> &'static str;

    async fn translate(&self, text: &str) -> Result<String, TranslateError>;
}

/// An LLM provider: accepts a system rule prompt (built internally) and
/// recent `(source, translation)` pairs as context.
#[async_trait]
pub trait LlmTranslator: Send + Sync {
    fn name(&self) -> &'static str;

    async fn translate_with_context(
        &self,
        text: &str,
        context: &[(String, String)],
    ) -> Result<String, TranslateError>;
}

// Compile-time assertions: both traits must stay object-safe.
const _: fn() = || {
    fn _assert_translator(_: Box<dyn Translator>) {}
    fn _assert_llm(_: Box<dyn LlmTranslator>) {}
};

// ---------------------------------------------------------------------------
// TranslationResult
// ---------------------------------------------------------------------------

/// A finished translation, immutable once produced.
#[derive(Debug, Clone)]
pub struct TranslationResult {
    pub source_text: String,
    pub translated_text: String,
    /// Which provider produced it ("DeepL", "cache", "none", …).
    pub provider_name: String,
    /// Carried through from the commit; partial results render muted.
    pub is_final: bool,
    /// Character length of the source at commit time.
    pub original_length: usize,
    pub timestamp: Instant,
}

// ---------------------------------------------------------------------------
// Mock providers (test-only)
// ---------------------------------------------------------------------------

/// MT test double with a fixed outcome.
#[cfg(test)]
pub struct MockTranslator {
    name: &'static str,
    outcome: MockOutcome,
}

#[cfg(test)]
pub enum MockOutcome {
    Ok(String),
    MissingKey,
    Fail,
}

#[cfg(test)]
impl MockTranslator {
    pub fn ok(name: &'static str, text: impl Into<String>) -> Self {
        Self {
            name,
            outcome: MockOutcome::Ok(text.into()),
        }
    }

    pub fn unconfigured(name: &'static str) -> Self {
        Self {
            name,
            outcome: MockOutcome::MissingKey,
        }
    }

    pub fn failing(name: &'static str) -> Self {
        Self {
            name,
            outcome: MockOutcome::Fail,
        }
    }
}

#[cfg(test)]
#[async_trait]
impl Translator for MockTranslator {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn translate(&self, text: &str) -> Result<String, TranslateError> {
        match &self.outcome {
            MockOutcome::Ok(t) => Ok(format!("{t}{text}")),
            MockOutcome::MissingKey => Err(TranslateError::MissingKey("MOCK_KEY")),
            MockOutcome::Fail => Err(TranslateError::Request("mock failure".into())),
        }
    }
}

/// LLM test double that replays scripted responses.
#[cfg(test)]
pub struct MockLlm {
    name: &'static str,
    script: std::sync::Mutex<std::collections::VecDeque<Result<String, ()>>>,
}

#[cfg(test)]
impl MockLlm {
    pub fn script<I>(name: &'static str, responses: I) -> Self
    where
        I: IntoIterator<Item = Result<String, ()>>,
    {
        Self {
            name,
            script: std::sync::Mutex::new(responses.into_iter().collect()),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl LlmTranslator for MockLlm {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn translate_with_context(
        &self,
        _text: &str,
        _context: &[(String, String)],
    ) -> Result<String, TranslateError> {
        match self.script.lock().unwrap().pop_front() {
            Some(Ok(t)) => Ok(t),
            Some(Err(())) => Err(TranslateError::Request("mock llm failure".into())),
            None => Err(TranslateError::EmptyResponse),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_translator_prefixes_text() {
        let t = MockTranslator::ok("DeepL", "t:");
        assert_eq!(t.translate("abc").await.unwrap(), "t:abc");
    }

    #[tokio::test]
    async fn mock_llm_replays_and_exhausts() {
        let llm = MockLlm::script("LLM", [Ok("first".to_string()), Err(())]);
        assert_eq!(
            llm.translate_with_context("x", &[]).await.unwrap(),
            "first"
        );
        assert!(llm.translate_with_context("x", &[]).await.is_err());
        assert!(matches!(
            llm.translate_with_context("x", &[]).await.unwrap_err(),
            TranslateError::EmptyResponse
        ));
    }

    #[test]
    fn error_display_is_informative() {
        assert!(TranslateError::MissingKey("DEEPL_AUTH_KEY")
            .to_string()
            .contains("DEEPL_AUTH_KEY"));
        assert!(TranslateError::Timeout.to_string().contains("timed out"));
    }
}
