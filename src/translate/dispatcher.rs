//! Translation dispatcher — caching, routing, validation, failover.
//!
//! # Flow per request
//!
//! ```text
//! translate(commit)
//!   ├─ cache hit ──────────────────────────────▶ cached result
//!   ├─ large-model mode, not in fallback:
//!   │    llm call (slow-notice after 5 s)
//!   │      ├─ sanity ok (after mixed-output repair) ─▶ cache + account
//!   │      └─ failure / insane ─▶ enter MT-fallback, continue ↓
//!   └─ MT chain, in order ─▶ first success ─▶ cache + account
//!        └─ all fail ─▶ cache placeholder, warn once
//! ```
//!
//! A background health-check probe clears the fallback state; see
//! [`Dispatcher::health_check_loop`].

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use crate::display::StatusMessage;
use crate::lang::count_words;
use crate::reconcile::Commit;

use super::provider::{LlmTranslator, TranslateError, TranslationResult, Translator};
use super::repair::{self, SplicePolicy};
use super::sanity;

/// Seconds before an in-flight LLM call surfaces "No API response".
const SLOW_NOTICE_SECS: u64 = 5;
/// Health probe timeout.
const PROBE_TIMEOUT_SECS: u64 = 5;
/// Status message lifetime.
const STATUS_SECS: u64 = 10;
/// One-character probe text for the health check.
const PROBE_TEXT: &str = "嗨";

// ---------------------------------------------------------------------------
// Shared pieces
// ---------------------------------------------------------------------------

/// Per-provider translated-source word counters, read by the UI tick for
/// the info pill.
pub type WordCounters = Arc<Mutex<HashMap<String, u64>>>;

/// Sender half for surfacing status messages to the display.
pub type StatusSink = mpsc::UnboundedSender<StatusMessage>;

fn status(sink: &StatusSink, text: impl Into<String>, good: bool) {
    let msg = StatusMessage::new(
        text,
        Instant::now() + Duration::from_secs(STATUS_SECS),
        good,
    );
    let _ = sink.send(msg);
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Owns translation for the whole pipeline. Lives on the translation
/// worker; the shared bits (`fallback`, `counters`) are the only state
/// other tasks may touch.
pub struct Dispatcher {
    llm: Option<Arc<dyn LlmTranslator>>,
    mt_chain: Vec<Arc<dyn Translator>>,
    target_lang: String,
    splice_policy: SplicePolicy,

    cache: HashMap<String, String>,
    context: VecDeque<(String, String)>,
    context_count: usize,

    fallback: Arc<AtomicBool>,
    counters: WordCounters,
    status_sink: StatusSink,

    /// "switching to {mt}" shown once per transition into fallback.
    switch_notice_pending: bool,
    /// "Translation Failed" warned once per session.
    fail_warned: bool,
}

impl Dispatcher {
    /// Build a dispatcher. `llm` is `None` in small-model mode.
    pub fn new(
        llm: Option<Arc<dyn LlmTranslator>>,
        mt_chain: Vec<Arc<dyn Translator>>,
        target_lang: impl Into<String>,
        context_count: usize,
        status_sink: StatusSink,
    ) -> Self {
        let target_lang = target_lang.into();
        Self {
            splice_policy: SplicePolicy::for_target(&target_lang),
            llm,
            mt_chain,
            target_lang,
            cache: HashMap::new(),
            context: VecDeque::new(),
            context_count,
            fallback: Arc::new(AtomicBool::new(false)),
            counters: Arc::new(Mutex::new(HashMap::new())),
            status_sink,
            switch_notice_pending: false,
            fail_warned: false,
        }
    }

    /// Shared fallback flag, for the health-check task.
    pub fn fallback_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.fallback)
    }

    /// Shared per-provider word counters, for the UI tick.
    pub fn counters(&self) -> WordCounters {
        Arc::clone(&self.counters)
    }

    /// Translate one committed unit. Never fails: after every provider is
    /// exhausted a placeholder result is produced (and cached, so the
    /// chain is not hammered for the same source again).
    pub async fn translate(&mut self, commit: &Commit) -> TranslationResult {
        let text = commit.text.trim().to_string();

        if let Some(hit) = self.cache.get(&text) {
            return self.result(commit, hit.clone(), "cache");
        }

        // ── LLM path ─────────────────────────────────────────────────────
        if let Some(llm) = self.llm.clone() {
            if !self.fallback.load(Ordering::SeqCst) {
                match self.llm_attempt(&llm, &text).await {
                    Ok(translated) => {
                        self.cache.insert(text.clone(), translated.clone());
                        self.account(llm.name(), &text);
                        self.push_context(&text, &translated);
                        return self.result(commit, translated, llm.name());
                    }
                    Err(e) => {
                        log::warn!("dispatcher: LLM {} failed: {e}", llm.name());
                        self.fallback.store(true, Ordering::SeqCst);
                        self.switch_notice_pending = true;
                    }
                }
            }
        }

        // ── MT chain ─────────────────────────────────────────────────────
        if let Some((translated, provider)) = self.mt_attempt(&text).await {
            if self.switch_notice_pending {
                self.switch_notice_pending = false;
                status(
                    &self.status_sink,
                    format!("switching to {provider}"),
                    false,
                );
            }
            self.cache.insert(text.clone(), translated.clone());
            self.account(&provider, &text);
            self.push_context(&text, &translated);
            return self.result(commit, translated, &provider);
        }

        // ── Total failure ────────────────────────────────────────────────
        let prefix: String = text.chars().take(15).collect();
        let placeholder = format!("Translation Failed: {prefix}…");
        self.cache.insert(text, placeholder.clone());
        if !self.fail_warned {
            self.fail_warned = true;
            status(&self.status_sink, "Translation failed — check API keys", false);
        }
        self.result(commit, placeholder, "none")
    }

    /// Translate a bare fragment through the MT chain (mixed-output repair
    /// and the learn channel's definition lookups).
    pub async fn translate_fragment(&mut self, fragment: &str) -> Option<String> {
        if let Some(hit) = self.cache.get(fragment) {
            return Some(hit.clone());
        }
        let (translated, _) = self.mt_attempt(fragment).await?;
        self.cache.insert(fragment.to_string(), translated.clone());
        Some(translated)
    }

    // -----------------------------------------------------------------------
    // LLM attempt
    // -----------------------------------------------------------------------

    /// One LLM call with slow-request notices, sanity checking, and
    /// mixed-output repair.
    async fn llm_attempt(
        &mut self,
        llm: &Arc<dyn LlmTranslator>,
        text: &str,
    ) -> Result<String, TranslateError> {
        let context: Vec<(String, String)> = self.context.iter().cloned().collect();

        let fut = llm.translate_with_context(text, &context);
        tokio::pin!(fut);

        let slow = tokio::time::sleep(Duration::from_secs(SLOW_NOTICE_SECS));
        tokio::pin!(slow);

        let mut warned_slow = false;
        let answer = loop {
            tokio::select! {
                result = &mut fut => break result?,
                _ = &mut slow, if !warned_slow => {
                    warned_slow = true;
                    status(&self.status_sink, "No API response", false);
                }
            }
        };
        if warned_slow {
            status(&self.status_sink, "API responded", true);
        }

        sanity::check(text, &answer).map_err(TranslateError::Insane)?;

        // Leftover CJK in a Latin-script target: translate each fragment
        // through the MT chain and splice.
        if repair::needs_repair(&answer, &self.target_lang) {
            let repaired = self.repair_mixed(&answer).await;
            sanity::check(text, &repaired).map_err(TranslateError::Insane)?;
            return Ok(repaired);
        }

        Ok(answer)
    }

    async fn repair_mixed(&mut self, candidate: &str) -> String {
        let fragments = repair::find_fragments(candidate);
        let mut replacements = Vec::with_capacity(fragments.len());
        for range in fragments {
            let fragment = repair::fragment_text(candidate, range);
            let replacement = match self.translate_fragment(&fragment).await {
                Some(t) => t,
                // Fragment untranslatable — keep it rather than lose text.
                None => fragment,
            };
            replacements.push((range, replacement));
        }
        repair::splice(candidate, &replacements, &self.splice_policy)
    }

    // -----------------------------------------------------------------------
    // MT chain
    // -----------------------------------------------------------------------

    /// Iterate the MT chain; first non-empty success wins.
    async fn mt_attempt(&self, text: &str) -> Option<(String, String)> {
        for provider in &self.mt_chain {
            match provider.translate(text).await {
                Ok(translated) if !translated.trim().is_empty() => {
                    return Some((translated, provider.name().to_string()));
                }
                Ok(_) => continue,
                Err(TranslateError::MissingKey(_)) => continue,
                Err(e) => {
                    log::debug!("dispatcher: {} failed: {e}", provider.name());
                    continue;
                }
            }
        }
        None
    }

    // -----------------------------------------------------------------------
    // Bookkeeping
    // -----------------------------------------------------------------------

    fn account(&self, provider: &str, source: &str) {
        let words = count_words(source) as u64;
        if words == 0 {
            return;
        }
        let mut counters = self.counters.lock().unwrap();
        *counters.entry(provider.to_string()).or_insert(0) += words;
    }

    fn push_context(&mut self, source: &str, translation: &str) {
        if self.context_count == 0 {
            return;
        }
        self.context
            .push_back((source.to_string(), translation.to_string()));
        while self.context.len() > self.context_count {
            self.context.pop_front();
        }
    }

    fn result(&self, commit: &Commit, translated: String, provider: &str) -> TranslationResult {
        TranslationResult {
            source_text: commit.text.clone(),
            translated_text: translated,
            provider_name: provider.to_string(),
            is_final: commit.is_final,
            original_length: commit.original_length,
            timestamp: Instant::now(),
        }
    }

    // -----------------------------------------------------------------------
    // Health check
    // -----------------------------------------------------------------------

    /// Background reconnect loop: while in MT-fallback, probe the LLM with
    /// a one-character translation every `interval`; on success clear the
    /// fallback and tell the user. Runs until the owning task is aborted.
    pub async fn health_check_loop(
        llm: Arc<dyn LlmTranslator>,
        fallback: Arc<AtomicBool>,
        status_sink: StatusSink,
        interval: Duration,
    ) {
        loop {
            tokio::time::sleep(interval).await;
            if !fallback.load(Ordering::SeqCst) {
                continue;
            }

            let probe = tokio::time::timeout(
                Duration::from_secs(PROBE_TIMEOUT_SECS),
                llm.translate_with_context(PROBE_TEXT, &[]),
            )
            .await;

            match probe {
                Ok(Ok(answer)) if !answer.trim().is_empty() => {
                    fallback.store(false, Ordering::SeqCst);
                    status(
                        &status_sink,
                        format!("switching back to {}", llm.name()),
                        true,
                    );
                    log::info!("dispatcher: LLM {} healthy again", llm.name());
                }
                _ => {
                    log::debug!("dispatcher: health probe failed, staying on MT");
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
