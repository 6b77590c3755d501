//! Translation stage — providers, sanity checking, repair, dispatch.
//!
//! This module provides:
//! * [`Translator`] / [`LlmTranslator`] — traits implemented by all
//!   provider backends.
//! * [`providers`] — the classical MT services (DeepL, Google, Baidu,
//!   Youdao, Yandex, LibreTranslate, Caiyun, Niutrans).
//! * [`llm`] — LLM backends (SiliconFlow/OpenAI/DeepSeek via one
//!   OpenAI-compatible caller, plus Anthropic).
//! * [`sanity`] — rejection rules for LLM candidates.
//! * [`repair`] — mixed-output repair for leftover CJK fragments.
//! * [`Dispatcher`] — caching, routing, failover, health checks,
//!   accounting.

pub mod dispatcher;
pub mod llm;
pub mod provider;
pub mod providers;
pub mod repair;
pub mod sanity;

pub use dispatcher::{Dispatcher, StatusSink, WordCounters};
pub use llm::{build_llm, llm_client, AnthropicLlm, OpenAiCompatLlm};
pub use provider::{LlmTranslator, TranslateError, TranslationResult, Translator};
pub use providers::{llm_fallback_chain, mt_client, small_model_chain};
pub use repair::SplicePolicy;

#[cfg(test)]
pub use provider::{MockLlm, MockTranslator};
