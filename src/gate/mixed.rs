//! Temporal mixed-content detector.
//!
//! When the capture region spans both a subtitle band and static page
//! content (a banner, a comment column), OCR keeps re-reading the static
//! part and floods the pipeline. The detector splits each frame into five
//! vertical bands, tracks which bands change frame-to-frame over a sliding
//! window, and trips when some bands are clearly live while others never
//! move: that shape means the region includes static non-subtitle content.

use std::collections::VecDeque;

use crate::capture::Frame;

/// Number of vertical bands.
const BANDS: usize = 5;
/// Frames of history required before the detector may trip.
const WINDOW: usize = 25;
/// A band "changed" when its mean intensity moved by more than this.
const CHANGE_EPSILON: f32 = 1.0;
/// Trip condition: the liveliest band changes in over 60 % more of the
/// window than the stillest, and the stillest is nearly static.
const SPREAD_THRESHOLD: f64 = 0.6;
const STATIC_THRESHOLD: f64 = 0.2;

// ---------------------------------------------------------------------------
// MixedContentDetector
// ---------------------------------------------------------------------------

/// Sliding-window band-change tracker.
pub struct MixedContentDetector {
    last_means: Option<Vec<f32>>,
    /// Per-frame change flags, one bitset-ish row per frame pair.
    changes: VecDeque<[bool; BANDS]>,
}

impl MixedContentDetector {
    pub fn new() -> Self {
        Self {
            last_means: None,
            changes: VecDeque::with_capacity(WINDOW + 1),
        }
    }

    /// Observe one frame. Returns `true` when the window shows the
    /// mixed-content shape and OCR should pause.
    pub fn observe(&mut self, frame: &Frame) -> bool {
        let means = frame.band_means(BANDS);
        if means.len() != BANDS {
            return false;
        }

        if let Some(prev) = &self.last_means {
            let mut row = [false; BANDS];
            for (i, (m, p)) in means.iter().zip(prev).enumerate() {
                row[i] = (m - p).abs() > CHANGE_EPSILON;
            }
            self.changes.push_back(row);
            while self.changes.len() > WINDOW {
                self.changes.pop_front();
            }
        }
        self.last_means = Some(means);

        if self.changes.len() < WINDOW {
            return false;
        }

        let n = self.changes.len() as f64;
        let mut ratios = [0.0f64; BANDS];
        for row in &self.changes {
            for (i, &changed) in row.iter().enumerate() {
                if changed {
                    ratios[i] += 1.0;
                }
            }
        }
        for r in &mut ratios {
            *r /= n;
        }

        let max = ratios.iter().cloned().fold(f64::MIN, f64::max);
        let min = ratios.iter().cloned().fold(f64::MAX, f64::min);
        max - min > SPREAD_THRESHOLD && min < STATIC_THRESHOLD
    }

    /// Forget all history (region change, resume).
    pub fn reset(&mut self) {
        self.last_means = None;
        self.changes.clear();
    }
}

impl Default for MixedContentDetector {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
