//! The display stack — which translations are on screen.
//!
//! An ordered set of the last two committed translations, guarded by a
//! similarity check against both the stack and a short recency window so
//! paraphrase repeats and substring regressions never reach the overlay.
//! The thresholds are empirical and come from
//! [`DisplayConfig`](crate::config::DisplayConfig).

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::config::DisplayConfig;
use crate::translate::TranslationResult;

/// Visible entries.
const STACK_CAPACITY: usize = 2;
/// Recent-translations window entry bound.
const RECENT_CAPACITY: usize = 15;

// ---------------------------------------------------------------------------
// DisplayItem
// ---------------------------------------------------------------------------

/// One on-screen translation.
#[derive(Debug, Clone)]
pub struct DisplayItem {
    pub text: String,
    /// Partial (non-final) items render muted; LLM path only.
    pub is_final: bool,
    pub shown_at: Instant,
}

// ---------------------------------------------------------------------------
// DisplayStack
// ---------------------------------------------------------------------------

/// Ordered, de-duplicated, length-bounded set of shown translations.
pub struct DisplayStack {
    config: DisplayConfig,
    items: VecDeque<DisplayItem>,
    recent: VecDeque<(String, Instant)>,
    last_push: Option<Instant>,
}

impl DisplayStack {
    pub fn new(config: DisplayConfig) -> Self {
        Self {
            config,
            items: VecDeque::with_capacity(STACK_CAPACITY + 1),
            recent: VecDeque::with_capacity(RECENT_CAPACITY + 1),
            last_push: None,
        }
    }

    /// Offer a new translation. Returns `false` when suppressed as a
    /// near-duplicate of something already shown (or recently shown).
    pub fn push(&mut self, result: &TranslationResult, now: Instant) -> bool {
        self.prune_recent(now);

        let text = result.translated_text.trim();
        if text.is_empty() {
            return false;
        }

        let candidates: Vec<&str> = self
            .items
            .iter()
            .map(|i| i.text.as_str())
            .chain(self.recent.iter().map(|(t, _)| t.as_str()))
            .collect();
        for prev in candidates {
            if self.is_duplicate(text, prev) {
                return false;
            }
        }

        self.items.push_back(DisplayItem {
            text: text.to_string(),
            is_final: result.is_final,
            shown_at: now,
        });
        while self.items.len() > STACK_CAPACITY {
            if let Some(old) = self.items.pop_front() {
                self.recent.push_back((old.text, now));
            }
        }
        while self.recent.len() > RECENT_CAPACITY {
            self.recent.pop_front();
        }
        self.last_push = Some(now);
        true
    }

    /// Visible items, oldest first.
    pub fn items(&self) -> impl Iterator<Item = &DisplayItem> {
        self.items.iter()
    }

    /// The overlay text: visible items joined with newlines.
    pub fn display_text(&self) -> String {
        self.items
            .iter()
            .map(|i| i.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// `true` when the bottom (newest) entry is partial.
    pub fn bottom_is_partial(&self) -> bool {
        self.items.back().map(|i| !i.is_final).unwrap_or(false)
    }

    /// Everything currently or recently shown — input for the gate's
    /// self-echo rule.
    pub fn shown_texts(&mut self, now: Instant) -> Vec<String> {
        self.prune_recent(now);
        self.items
            .iter()
            .map(|i| i.text.clone())
            .chain(self.recent.iter().map(|(t, _)| t.clone()))
            .collect()
    }

    /// When the last accepted push happened.
    pub fn last_push(&self) -> Option<Instant> {
        self.last_push
    }

    fn prune_recent(&mut self, now: Instant) {
        let window = Duration::from_secs_f64(self.config.recent_window_secs);
        while let Some((_, t)) = self.recent.front() {
            if now.duration_since(*t) > window {
                self.recent.pop_front();
            } else {
                break;
            }
        }
    }

    // -----------------------------------------------------------------------
    // Similarity
    // -----------------------------------------------------------------------

    fn is_duplicate(&self, new: &str, prev: &str) -> bool {
        let a = normalize(new);
        let b = normalize(prev);
        if a.is_empty() || b.is_empty() {
            return false;
        }
        if a == b {
            return true;
        }

        // Substring regression: the new text adds nothing over a previous,
        // longer line.
        let min_chars = self.config.ocr_similarity_substring_chars;
        if a.chars().count() >= min_chars && b.chars().count() >= min_chars && b.contains(&a) {
            return true;
        }

        // Token-set overlap on substantial lines.
        let ta = content_tokens(&a);
        let tb = content_tokens(&b);
        if ta.len() >= self.config.min_content_tokens && tb.len() >= self.config.min_content_tokens
        {
            let inter = ta.intersection(&tb).count() as f64;
            if inter / ta.len() as f64 >= self.config.token_overlap_ratio
                && inter / tb.len() as f64 >= self.config.token_overlap_ratio
            {
                return true;
            }
        }
        false
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

fn content_tokens(s: &str) -> std::collections::HashSet<String> {
    s.split_whitespace()
        .filter(|w| w.chars().count() > 1)
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
