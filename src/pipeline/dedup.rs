//! Recent-source deduplication for the translation worker.
//!
//! OCR emits variants of the same sentence (重/蛋/虫 confusions, shifted
//! windows). Committing each variant would translate the same subtitle
//! several times, so the worker keeps a short time-bounded window of
//! recently translated sources and drops near-matches before they reach
//! the dispatcher.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::lang::has_cjk_family;

/// Window entry bound.
const WINDOW_CAPACITY: usize = 15;
/// Window age bound.
const WINDOW_SECS: f64 = 12.0;

// ---------------------------------------------------------------------------
// Source similarity
// ---------------------------------------------------------------------------

/// Whether two source texts are recognition variants of one another.
pub fn sources_similar(a: &str, b: &str) -> bool {
    let a = a.trim();
    let b = b.trim();
    if a.is_empty() || b.is_empty() {
        return true;
    }
    if a == b {
        return true;
    }

    let (shorter, longer) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };
    let short_len = shorter.chars().count();
    let long_len = longer.chars().count();

    // One contains the other with little extra: a progressive-reveal tail.
    if longer.contains(shorter) {
        return long_len - short_len <= 5;
    }
    if long_len - short_len > 8 {
        return false;
    }

    // CJK variants share most of their character set.
    if has_cjk_family(a) || has_cjk_family(b) {
        let set_a: std::collections::HashSet<char> = a.chars().collect();
        let set_b: std::collections::HashSet<char> = b.chars().collect();
        let inter = set_a.intersection(&set_b).count() as f64;
        let denom = set_a.len().min(set_b.len()) as f64;
        if denom > 0.0
            && inter / denom >= 0.72
            && long_len as f64 / short_len.max(1) as f64 <= 1.5
        {
            return true;
        }
    }

    // Character-wise disagreement bounded by a third of the length.
    let diffs = a
        .chars()
        .zip(b.chars())
        .filter(|(x, y)| x != y)
        .count()
        + long_len.saturating_sub(short_len);
    diffs <= 4.max(long_len / 3)
}

// ---------------------------------------------------------------------------
// RecentSources
// ---------------------------------------------------------------------------

/// Time-bounded ring of recently translated sources.
pub struct RecentSources {
    entries: VecDeque<(String, Instant)>,
}

impl RecentSources {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(WINDOW_CAPACITY + 1),
        }
    }

    /// `true` when `text` is a variant of something translated within the
    /// window; otherwise records it and returns `false`.
    pub fn check_and_record(&mut self, text: &str, now: Instant) -> bool {
        self.prune(now);
        if self
            .entries
            .iter()
            .any(|(prev, _)| sources_similar(text, prev))
        {
            return true;
        }
        self.entries.push_back((text.to_string(), now));
        while self.entries.len() > WINDOW_CAPACITY {
            self.entries.pop_front();
        }
        false
    }

    fn prune(&mut self, now: Instant) {
        let window = Duration::from_secs_f64(WINDOW_SECS);
        while let Some((_, t)) = self.entries.front() {
            if now.duration_since(*t) > window {
                self.entries.pop_front();
            } else {
                break;
            }
        }
    }
}

impl Default for RecentSources {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // --- sources_similar ---

    #[test]
    fn identical_and_blank_are_similar() {
        assert!(sources_similar("你好", "你好"));
        assert!(sources_similar("", "anything"));
    }

    #[test]
    fn containment_with_small_tail_is_similar() {
        assert!(sources_similar("你好世界", "你好世界啊"));
        assert!(!sources_similar("你好", "你好世界再见了朋友们"));
    }

    #[test]
    fn cjk_single_char_variant_is_similar() {
        // OCR confusion on one character of an identical sentence.
        assert!(sources_similar("今天天气很好", "今天天氣很好"));
    }

    #[test]
    fn different_sentences_are_not_similar() {
        assert!(!sources_similar("今天天气很好", "我们明天去爬山吧"));
        assert!(!sources_similar(
            "hello world this is long",
            "a different phrase entirely"
        ));
    }

    #[test]
    fn latin_typo_variant_is_similar() {
        assert!(sources_similar("Hello world", "Hullo world"));
    }

    // --- RecentSources ---

    #[test]
    fn variant_within_window_is_deduplicated() {
        let mut recent = RecentSources::new();
        let t0 = Instant::now();
        assert!(!recent.check_and_record("今天天气很好", t0));
        assert!(recent.check_and_record("今天天氣很好", t0 + Duration::from_secs(1)));
    }

    #[test]
    fn entry_expires_after_window() {
        let mut recent = RecentSources::new();
        let t0 = Instant::now();
        assert!(!recent.check_and_record("今天天气很好", t0));
        assert!(!recent.check_and_record("今天天气很好", t0 + Duration::from_secs(13)));
    }

    #[test]
    fn window_is_bounded() {
        let mut recent = RecentSources::new();
        let t0 = Instant::now();
        for i in 0..30 {
            recent.check_and_record(
                &format!("完全不同的第{i}句字幕内容在这里"),
                t0 + Duration::from_millis(i),
            );
        }
        assert!(recent.entries.len() <= 15);
    }
}
