//! Streaming reconciler for the LLM translation path.
//!
//! Same merge algorithm as the MT variant, different commit policy: LLMs
//! handle larger contextual units well, so this reconciler accumulates
//! longer before committing, with a hard cap on lateness. A unit commits
//! when it has been unchanged for the (short) stability window, or — even
//! if still jittering — once it has been pending for `max_buffer_time`
//! and the latest frame agrees with the buffer. Timeout commits are
//! flagged non-final so the overlay can render them muted.

use std::time::Instant;

use super::merge::merge_frames;
use super::Commit;

/// Minimum buffer length for a timeout commit.
const MIN_TIMEOUT_CHARS: usize = 2;

// ---------------------------------------------------------------------------
// LlmReconciler
// ---------------------------------------------------------------------------

/// Accumulating reconciler for contextual LLM translation.
///
/// # Example
///
/// ```
/// use std::time::{Duration, Instant};
/// use live_translate::reconcile::LlmReconciler;
///
/// let mut rec = LlmReconciler::new(0.12, 0.6);
/// let t0 = Instant::now();
///
/// assert!(rec.ingest("今天我们", t0).is_none());
/// let commit = rec.ingest("今天我们", t0 + Duration::from_millis(150)).unwrap();
/// assert_eq!(commit.text, "今天我们");
/// assert!(commit.is_final);
/// ```
pub struct LlmReconciler {
    stability_threshold: f64,
    max_buffer_time: f64,
    buffer: String,
    last_frame: String,
    last_change: Option<Instant>,
    buffer_start: Option<Instant>,
}

impl LlmReconciler {
    /// Create a reconciler with the given stability window and lateness cap
    /// (both in seconds).
    pub fn new(stability_threshold: f64, max_buffer_time: f64) -> Self {
        Self {
            stability_threshold,
            max_buffer_time,
            buffer: String::new(),
            last_frame: String::new(),
            last_change: None,
            buffer_start: None,
        }
    }

    /// Feed one OCR frame. Returns a commit when the accumulated unit is
    /// ready for translation.
    pub fn ingest(&mut self, new_text: &str, now: Instant) -> Option<Commit> {
        let new_text = new_text.trim();
        if new_text.is_empty() {
            return None;
        }

        // A steady frame whose content was already committed: wait for a
        // change rather than re-commit the same unit.
        if self.buffer.is_empty() && new_text == self.last_frame {
            return None;
        }

        let merged = merge_frames(&self.buffer, new_text);
        if self.buffer.is_empty() && !merged.is_empty() {
            self.buffer_start = Some(now);
        }
        if merged != self.buffer {
            self.last_change = Some(now);
        }
        self.buffer = merged;
        self.last_frame = new_text.to_string();

        let elapsed = self
            .last_change
            .map(|t| now.duration_since(t).as_secs_f64())
            .unwrap_or(0.0);

        // Stable: unchanged for the stability window.
        if elapsed >= self.stability_threshold && !self.buffer.is_empty() {
            return Some(Commit::final_unit(self.take_buffer()));
        }

        // Lateness cap: the buffer has been pending long enough and the
        // latest frame agrees with it.
        if self.buffer.chars().count() >= MIN_TIMEOUT_CHARS {
            if let Some(start) = self.buffer_start {
                if now.duration_since(start).as_secs_f64() >= self.max_buffer_time
                    && self.buffer == new_text
                {
                    return Some(Commit::partial_unit(self.take_buffer()));
                }
            }
        }

        None
    }

    /// Discard all buffers and timers.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.last_frame.clear();
        self.last_change = None;
        self.buffer_start = None;
    }

    fn take_buffer(&mut self) -> String {
        self.last_change = None;
        self.buffer_start = None;
        std::mem::take(&mut self.buffer).trim().to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
