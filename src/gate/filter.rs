//! Text-level gate rules: language mismatch, word cap, echo filters.

use crate::lang::{count_words, has_cjk, lang_is_cjk, script_ratios, significant_chars};

/// Texts shorter than this many significant characters skip the
/// language-mismatch check.
const MISMATCH_MIN_CHARS: usize = 8;
/// Expected-script ratio below which the text is "missing" its script.
const MISSING_SCRIPT_RATIO: f64 = 0.10;
/// Foreign-script ratio above which the text is dominated by it.
const FOREIGN_SCRIPT_RATIO: f64 = 0.85;

/// A token repeating this often marks chrome/UI text, not subtitles.
const UI_ECHO_REPEATS: usize = 5;

/// Token-set overlap at which a recognition is an echo of our own output.
const SELF_ECHO_OVERLAP: f64 = 0.65;
/// Minimum length before the echo containment check applies.
const SELF_ECHO_MIN_CHARS: usize = 4;

// ---------------------------------------------------------------------------
// Language mismatch
// ---------------------------------------------------------------------------

/// `true` when a recognition's script wildly disagrees with the configured
/// source language — the subtitle is obstructed and OCR is reading other
/// page content.
pub fn language_mismatch(text: &str, source_lang: &str) -> bool {
    if source_lang == "auto" {
        return false;
    }
    if significant_chars(text) < MISMATCH_MIN_CHARS {
        return false;
    }
    let (cjk_ratio, latin_ratio) = script_ratios(text);

    if lang_is_cjk(source_lang) {
        cjk_ratio < MISSING_SCRIPT_RATIO && latin_ratio > FOREIGN_SCRIPT_RATIO
    } else {
        latin_ratio < MISSING_SCRIPT_RATIO && cjk_ratio > FOREIGN_SCRIPT_RATIO
    }
}

// ---------------------------------------------------------------------------
// Word cap
// ---------------------------------------------------------------------------

/// `true` when the recognition exceeds the configured word cap.
pub fn exceeds_word_cap(text: &str, enabled: bool, max_words: usize) -> bool {
    enabled && count_words(text) > max_words
}

// ---------------------------------------------------------------------------
// UI echo
// ---------------------------------------------------------------------------

/// `true` for Latin-only text where one token repeats like a menu or
/// button column ("Reply Reply Reply Reply Reply").
pub fn is_ui_echo(text: &str) -> bool {
    if has_cjk(text) {
        return false;
    }
    let tokens: Vec<String> = text
        .split_whitespace()
        .map(|t| t.to_lowercase())
        .collect();
    if tokens.is_empty() {
        return false;
    }
    let latin_tokens = tokens
        .iter()
        .filter(|t| t.chars().any(|c| c.is_ascii_alphabetic()))
        .count();
    if latin_tokens * 2 < tokens.len() {
        return false;
    }

    let mut counts: std::collections::HashMap<&str, usize> = std::collections::HashMap::new();
    for t in &tokens {
        *counts.entry(t.as_str()).or_insert(0) += 1;
    }
    counts.values().any(|&c| c >= UI_ECHO_REPEATS)
}

// ---------------------------------------------------------------------------
// Self echo
// ---------------------------------------------------------------------------

/// Content tokens of length > 1, lowercased.
fn content_tokens(text: &str) -> std::collections::HashSet<String> {
    text.split_whitespace()
        .filter(|w| w.chars().count() > 1)
        .map(|w| w.to_lowercase())
        .collect()
}

/// `true` when the recognition is substantially our own displayed output —
/// the capture region overlaps the overlay or the learn panel.
pub fn is_self_echo<'a>(text: &str, displayed: impl IntoIterator<Item = &'a str>) -> bool {
    let a = text.trim().to_lowercase();
    if a.chars().count() < SELF_ECHO_MIN_CHARS {
        return false;
    }
    let joined: String = displayed
        .into_iter()
        .collect::<Vec<_>>()
        .join("\n")
        .to_lowercase();
    if joined.trim().is_empty() {
        return false;
    }

    if joined.contains(&a) || a.contains(joined.trim()) {
        return true;
    }

    let words_a = content_tokens(&a);
    if words_a.is_empty() {
        return false;
    }
    let words_d = content_tokens(&joined);
    let overlap = words_a.intersection(&words_d).count() as f64 / words_a.len() as f64;
    overlap >= SELF_ECHO_OVERLAP
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
