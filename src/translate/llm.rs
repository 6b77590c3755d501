//! LLM translation providers.
//!
//! One generic OpenAI-compatible chat-completions caller covers
//! SiliconFlow, OpenAI and DeepSeek; Anthropic's Messages API gets its own
//! implementation. All of them build the same strict rule prompt — the
//! model is a translation tool, nothing else — and receive recent
//! `(source, translation)` pairs as conversational context.

use std::time::Duration;

use async_trait::async_trait;

use crate::config::LlmProvider;
use crate::lang::lang_name;

use super::provider::{LlmTranslator, TranslateError};

/// Sampling temperature for translation — low for determinism.
const TEMPERATURE: f64 = 0.1;
/// Response token cap.
const MAX_TOKENS: u32 = 500;

// ---------------------------------------------------------------------------
// Prompt construction
// ---------------------------------------------------------------------------

/// The system rule prompt: translation only, no assistant behavior.
fn rule_prompt(source_lang: &str, target_lang: &str) -> String {
    format!(
        "You are a translation tool. Translate the input text from {} to {}.\n\
         Reply with ONLY the translated text. No explanations, no commentary, \
         no prefixes like 'Translation:'.",
        lang_name(source_lang),
        lang_name(target_lang),
    )
}

/// The user message: recent pairs for continuity, then the input.
fn user_message(text: &str, context: &[(String, String)]) -> String {
    if context.is_empty() {
        return format!("Input:\n{text}");
    }
    let mut msg = String::from("Recent lines for context:\n");
    for (source, translation) in context {
        msg.push_str(source);
        msg.push_str(" => ");
        msg.push_str(translation);
        msg.push('\n');
    }
    msg.push_str("\nInput:\n");
    msg.push_str(text);
    msg
}

/// Build the HTTP client with the LLM timeout.
pub fn llm_client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

fn env_key(var: &'static str) -> Result<String, TranslateError> {
    match std::env::var(var) {
        Ok(v) if !v.is_empty() => Ok(v),
        _ => Err(TranslateError::MissingKey(var)),
    }
}

// ---------------------------------------------------------------------------
// OpenAI-compatible providers
// ---------------------------------------------------------------------------

/// Chat-completions caller for any OpenAI-compatible endpoint.
pub struct OpenAiCompatLlm {
    name: &'static str,
    base_url: &'static str,
    key_env: &'static str,
    model: &'static str,
    client: reqwest::Client,
    source_lang: String,
    target_lang: String,
}

impl OpenAiCompatLlm {
    pub fn siliconflow(client: reqwest::Client, source_lang: &str, target_lang: &str) -> Self {
        Self {
            name: "SiliconFlow",
            base_url: "https://api.siliconflow.com/v1",
            key_env: "SILICONFLOW_API_KEY",
            model: "Qwen/Qwen2.5-7B-Instruct",
            client,
            source_lang: source_lang.into(),
            target_lang: target_lang.into(),
        }
    }

    pub fn openai(client: reqwest::Client, source_lang: &str, target_lang: &str) -> Self {
        Self {
            name: "OpenAI",
            base_url: "https://api.openai.com/v1",
            key_env: "OPENAI_API_KEY",
            model: "gpt-4o-mini",
            client,
            source_lang: source_lang.into(),
            target_lang: target_lang.into(),
        }
    }

    pub fn deepseek(client: reqwest::Client, source_lang: &str, target_lang: &str) -> Self {
        Self {
            name: "DeepSeek",
            base_url: "https://api.deepseek.com/v1",
            key_env: "DEEPSEEK_API_KEY",
            model: "deepseek-chat",
            client,
            source_lang: source_lang.into(),
            target_lang: target_lang.into(),
        }
    }
}

#[async_trait]
impl LlmTranslator for OpenAiCompatLlm {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn translate_with_context(
        &self,
        text: &str,
        context: &[(String, String)],
    ) -> Result<String, TranslateError> {
        let key = env_key(self.key_env)?;

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": rule_prompt(&self.source_lang, &self.target_lang) },
                { "role": "user",   "content": user_message(text, context) },
            ],
            "stream": false,
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS,
        });

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(key)
            .json(&body)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| TranslateError::Api(e.to_string()))?;

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| TranslateError::Parse(e.to_string()))?;
        json["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(TranslateError::EmptyResponse)
    }
}

// ---------------------------------------------------------------------------
// Anthropic
// ---------------------------------------------------------------------------

/// Anthropic Messages API. `ANTHROPIC_API_KEY`.
pub struct AnthropicLlm {
    client: reqwest::Client,
    source_lang: String,
    target_lang: String,
}

impl AnthropicLlm {
    const MODEL: &'static str = "claude-3-5-haiku-20241022";

    pub fn new(client: reqwest::Client, source_lang: &str, target_lang: &str) -> Self {
        Self {
            client,
            source_lang: source_lang.into(),
            target_lang: target_lang.into(),
        }
    }
}

#[async_trait]
impl LlmTranslator for AnthropicLlm {
    fn name(&self) -> &'static str {
        "Anthropic"
    }

    async fn translate_with_context(
        &self,
        text: &str,
        context: &[(String, String)],
    ) -> Result<String, TranslateError> {
        let key = env_key("ANTHROPIC_API_KEY")?;

        let body = serde_json::json!({
            "model": Self::MODEL,
            "max_tokens": MAX_TOKENS,
            "system": rule_prompt(&self.source_lang, &self.target_lang),
            "messages": [
                { "role": "user", "content": user_message(text, context) },
            ],
        });

        let resp = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", key)
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| TranslateError::Api(e.to_string()))?;

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| TranslateError::Parse(e.to_string()))?;

        let blocks = json["content"].as_array().cloned().unwrap_or_default();
        for block in blocks {
            if block["type"].as_str() == Some("text") {
                if let Some(text) = block["text"].as_str() {
                    let trimmed = text.trim();
                    if !trimmed.is_empty() {
                        return Ok(trimmed.to_string());
                    }
                }
            }
        }
        Err(TranslateError::EmptyResponse)
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

use std::sync::Arc;

/// Build the configured LLM provider.
pub fn build_llm(
    provider: LlmProvider,
    client: reqwest::Client,
    source_lang: &str,
    target_lang: &str,
) -> Arc<dyn LlmTranslator> {
    match provider {
        LlmProvider::SiliconFlow => {
            Arc::new(OpenAiCompatLlm::siliconflow(client, source_lang, target_lang))
        }
        LlmProvider::OpenAi => Arc::new(OpenAiCompatLlm::openai(client, source_lang, target_lang)),
        LlmProvider::DeepSeek => {
            Arc::new(OpenAiCompatLlm::deepseek(client, source_lang, target_lang))
        }
        LlmProvider::Anthropic => Arc::new(AnthropicLlm::new(client, source_lang, target_lang)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
