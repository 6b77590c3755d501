//! Streaming reconciler for the classical-MT translation path.
//!
//! Maintains an unstable working buffer merged from each OCR frame and a
//! short stable history of committed units. A unit is committed when the
//! frame stream stops changing for the stability window, when the buffer
//! has been pending for twice that long (timeout), or when a substantial
//! buffer has held still briefly (early commit).
//!
//! The reconciler is a plain value: the caller passes the clock into
//! [`MtReconciler::ingest`], so every timing path is reachable from tests.

use std::collections::VecDeque;
use std::time::Instant;

use super::merge::merge_frames;
use super::Commit;

/// Committed-history bound; the stable buffer only serves as short context.
const STABLE_CAPACITY: usize = 5;

/// Early-commit gates: a buffer of at least this many characters commits
/// after this many stable seconds even when the configured window is longer.
const EARLY_STABLE_SECS: f64 = 0.2;
const EARLY_MIN_CHARS: usize = 6;

// ---------------------------------------------------------------------------
// MtReconciler
// ---------------------------------------------------------------------------

/// Stable/unstable buffer reconciler tuned for sentence-at-a-time MT.
///
/// # Example
///
/// ```
/// use std::time::{Duration, Instant};
/// use live_translate::reconcile::MtReconciler;
///
/// let mut rec = MtReconciler::new(0.2);
/// let t0 = Instant::now();
///
/// assert!(rec.ingest("你好世界", t0).is_none());
/// // Same frame again once the stability window has elapsed: one commit.
/// let commit = rec.ingest("你好世界", t0 + Duration::from_millis(250)).unwrap();
/// assert_eq!(commit.text, "你好世界");
/// assert!(commit.is_final);
/// ```
pub struct MtReconciler {
    stability_threshold: f64,
    unstable: String,
    stable: VecDeque<String>,
    last_frame: String,
    /// Time of the last frame-to-frame change; stability is measured from
    /// here.
    last_change: Option<Instant>,
    /// When the unstable buffer was first created (for the timeout commit).
    unstable_start: Option<Instant>,
}

impl MtReconciler {
    /// Create a reconciler with the given stability window in seconds.
    pub fn new(stability_threshold: f64) -> Self {
        Self {
            stability_threshold,
            unstable: String::new(),
            stable: VecDeque::with_capacity(STABLE_CAPACITY + 1),
            last_frame: String::new(),
            last_change: None,
            unstable_start: None,
        }
    }

    /// Feed one OCR frame. Returns a commit when a unit is ready for
    /// translation; the committed text has already been moved into the
    /// stable history.
    pub fn ingest(&mut self, new_text: &str, now: Instant) -> Option<Commit> {
        let new_text = new_text.trim();
        if new_text.is_empty() {
            return None;
        }

        if new_text == self.last_frame {
            // Frame is holding steady. An empty buffer means this frame was
            // already committed; wait for a change rather than re-commit.
            if self.unstable.is_empty() {
                return None;
            }
            let elapsed = self
                .last_change
                .map(|t| now.duration_since(t).as_secs_f64())
                .unwrap_or(0.0);

            if elapsed >= self.stability_threshold {
                return Some(Commit::final_unit(self.commit_unstable()));
            }

            // Early commit: a substantial buffer that has held still.
            if elapsed >= EARLY_STABLE_SECS
                && self.unstable.chars().count() >= EARLY_MIN_CHARS
            {
                return Some(Commit::final_unit(self.commit_unstable()));
            }
        } else {
            let was_empty = self.unstable.is_empty();
            self.unstable = merge_frames(&self.unstable, new_text);
            self.last_change = Some(now);
            if was_empty && !self.unstable.is_empty() {
                self.unstable_start = Some(now);
            }
            self.last_frame = new_text.to_string();
        }

        // Timeout: the buffer has waited long enough; a full sentence was
        // captured even if frames kept jittering.
        if let Some(start) = self.unstable_start {
            if !self.unstable.is_empty()
                && now.duration_since(start).as_secs_f64() >= self.stability_threshold * 2.0
            {
                return Some(Commit::final_unit(self.commit_unstable()));
            }
        }

        None
    }

    /// Stable + unstable text, for partial display.
    pub fn current_text(&self) -> String {
        let stable: Vec<&str> = self.stable.iter().map(String::as_str).collect();
        let stable_text = stable.join(" ");
        match (stable_text.is_empty(), self.unstable.is_empty()) {
            (false, false) => format!("{} {}", stable_text, self.unstable),
            (false, true) => stable_text,
            (true, _) => self.unstable.clone(),
        }
    }

    /// Recently committed units, oldest first.
    pub fn stable_context(&self) -> impl Iterator<Item = &str> {
        self.stable.iter().map(String::as_str)
    }

    /// Discard all buffers and timers (e.g. when the capture region moves).
    pub fn reset(&mut self) {
        self.unstable.clear();
        self.stable.clear();
        self.last_frame.clear();
        self.last_change = None;
        self.unstable_start = None;
    }

    fn commit_unstable(&mut self) -> String {
        let text = std::mem::take(&mut self.unstable);
        if !text.is_empty() {
            self.stable.push_back(text.clone());
            while self.stable.len() > STABLE_CAPACITY {
                self.stable.pop_front();
            }
        }
        self.last_change = None;
        self.unstable_start = None;
        text
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn at(t0: Instant, millis: u64) -> Instant {
        t0 + Duration::from_millis(millis)
    }

    /// Progressive reveal: "你" → "你好" → "你好世界" → (steady at 0.3 s)
    /// commits the full sentence exactly once, at the 0.3 s frame.
    #[test]
    fn progressive_reveal_single_commit() {
        let mut rec = MtReconciler::new(0.2);
        let t0 = Instant::now();

        assert!(rec.ingest("你", t0).is_none());
        assert!(rec.ingest("你好", at(t0, 50)).is_none());
        assert!(rec.ingest("你好世界", at(t0, 100)).is_none());

        let commit = rec.ingest("你好世界", at(t0, 300)).expect("commit");
        assert_eq!(commit.text, "你好世界");
        assert!(commit.is_final);

        // The steady frame has been committed; no re-commit while it holds.
        assert!(rec.ingest("你好世界", at(t0, 310)).is_none());
        assert!(rec.ingest("你好世界", at(t0, 900)).is_none());
    }

    /// Mid-sentence OCR correction collapses to a single commit of the
    /// corrected sentence.
    #[test]
    fn mid_sentence_correction_single_commit() {
        let mut rec = MtReconciler::new(0.2);
        let t0 = Instant::now();

        assert!(rec.ingest("Helo wor", t0).is_none());
        assert!(rec.ingest("Hello wor", at(t0, 130)).is_none());
        assert!(rec.ingest("Hello world", at(t0, 260)).is_none());

        // 0.4 s after buffer creation the timeout (2 × 0.2 s) fires.
        let commit = rec.ingest("Hello world", at(t0, 400)).expect("commit");
        assert_eq!(commit.text, "Hello world");

        assert!(rec.ingest("Hello world", at(t0, 450)).is_none());
    }

    /// Boundary overlap merges into the unstable buffer before commit.
    #[test]
    fn boundary_overlap_merges_then_commits() {
        let mut rec = MtReconciler::new(0.2);
        let t0 = Instant::now();

        assert!(rec.ingest("the quick brown", t0).is_none());
        assert!(rec.ingest("quick brown fox", at(t0, 50)).is_none());
        assert!(rec.ingest("quick brown fox", at(t0, 100)).is_none());

        let commit = rec.ingest("quick brown fox", at(t0, 260)).expect("commit");
        assert_eq!(commit.text, "the quick brown fox");
    }

    /// A jittering stream still commits once the buffer exceeds the
    /// timeout (2 × stability window).
    #[test]
    fn timeout_commit_on_jittering_frames() {
        let mut rec = MtReconciler::new(0.2);
        let t0 = Instant::now();

        assert!(rec.ingest("字幕一", t0).is_none());
        assert!(rec.ingest("字幕二", at(t0, 150)).is_none());
        assert!(rec.ingest("字幕三", at(t0, 300)).is_none());
        let commit = rec.ingest("字幕四", at(t0, 410)).expect("timeout commit");
        assert!(!commit.text.is_empty());
    }

    /// Exactly one commit per stable run: identical frames held well past
    /// the threshold produce one commit, not one per poll.
    #[test]
    fn stable_run_produces_exactly_one_commit() {
        let mut rec = MtReconciler::new(0.2);
        let t0 = Instant::now();

        let mut commits = 0;
        for i in 0..20 {
            if rec.ingest("一句话", at(t0, i * 50)).is_some() {
                commits += 1;
            }
        }
        assert_eq!(commits, 1);
    }

    /// Early commit: with a long stability window, a substantial buffer
    /// commits after 0.2 s of stillness instead of waiting the full window.
    #[test]
    fn early_commit_for_substantial_buffer() {
        let mut rec = MtReconciler::new(1.0);
        let t0 = Instant::now();

        assert!(rec.ingest("a substantial subtitle line", t0).is_none());
        let commit = rec
            .ingest("a substantial subtitle line", at(t0, 250))
            .expect("early commit");
        assert_eq!(commit.text, "a substantial subtitle line");
    }

    /// Short buffers do not early-commit; they wait for the full window.
    #[test]
    fn short_buffer_waits_full_window() {
        let mut rec = MtReconciler::new(1.0);
        let t0 = Instant::now();

        assert!(rec.ingest("你好", t0).is_none());
        assert!(rec.ingest("你好", at(t0, 250)).is_none());
        // Full window elapsed → commit.
        assert!(rec.ingest("你好", at(t0, 1_050)).is_some());
    }

    /// Stable history is bounded to five entries.
    #[test]
    fn stable_buffer_bounded_to_five() {
        let mut rec = MtReconciler::new(0.2);
        let mut t = Instant::now();

        for i in 0..8 {
            let text = format!("sentence number {i} is long enough");
            assert!(rec.ingest(&text, t).is_none());
            t += Duration::from_millis(250);
            assert!(rec.ingest(&text, t).is_some(), "commit {i}");
            t += Duration::from_millis(10);
        }
        assert!(rec.stable_context().count() <= 5);
    }

    /// Empty and whitespace-only frames are ignored entirely.
    #[test]
    fn blank_frames_ignored() {
        let mut rec = MtReconciler::new(0.2);
        let t0 = Instant::now();
        assert!(rec.ingest("", t0).is_none());
        assert!(rec.ingest("   ", at(t0, 500)).is_none());
        assert_eq!(rec.current_text(), "");
    }

    /// `reset` clears every buffer and timer.
    #[test]
    fn reset_clears_state() {
        let mut rec = MtReconciler::new(0.2);
        let t0 = Instant::now();
        rec.ingest("some text", t0);
        rec.reset();
        assert_eq!(rec.current_text(), "");
        assert_eq!(rec.stable_context().count(), 0);
    }

    /// `current_text` joins stable history and the working buffer.
    #[test]
    fn current_text_joins_stable_and_unstable() {
        let mut rec = MtReconciler::new(0.2);
        let t0 = Instant::now();

        rec.ingest("first sentence done", t0);
        rec.ingest("first sentence done", at(t0, 250)); // commits
        rec.ingest("second part", at(t0, 300));

        let text = rec.current_text();
        assert!(text.contains("first sentence done"));
        assert!(text.contains("second part"));
    }
}
