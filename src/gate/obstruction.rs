//! Overlay-overlap detection and the capture-time overlap policy.
//!
//! The overlay window can drift into its own capture region, at which
//! point OCR would read our own subtitles back. The overlap test shrinks
//! the overlay rectangle by an inset first — window shadows and
//! decorations extend past the visible content — and only counts overlap
//! that covers a meaningful fraction of the capture region.

use std::time::Instant;

use crate::capture::Region;

/// Inset shrinking the overlay rect before the overlap test, capped at a
/// third of either overlay dimension.
const OVERLAP_INSET: u32 = 30;
/// Floor for the shrunken overlay sides.
const MIN_INNER_SIDE: u32 = 10;
/// Overlap must cover at least this fraction of the capture region.
const MIN_OVERLAP_FRACTION: f64 = 0.10;
/// Seconds between hide-capture-show cycles when overlap is allowed.
const HIDDEN_CAPTURE_INTERVAL: f64 = 0.5;

// ---------------------------------------------------------------------------
// Overlap test
// ---------------------------------------------------------------------------

/// Shrink the overlay rect by the inset (content only, no frame/shadow).
fn inset_overlay(overlay: &Region) -> Region {
    let margin = OVERLAP_INSET
        .min(overlay.width / 3)
        .min(overlay.height / 3);
    Region {
        left: overlay.left + margin as i32,
        top: overlay.top + margin as i32,
        width: (overlay.width.saturating_sub(2 * margin)).max(MIN_INNER_SIDE),
        height: (overlay.height.saturating_sub(2 * margin)).max(MIN_INNER_SIDE),
    }
}

/// `true` when the overlay content substantially covers the capture region
/// (≥ 10 % of the OCR area after insetting).
pub fn overlap_is_significant(region: &Region, overlay: &Region) -> bool {
    let inner = inset_overlay(overlay);
    let overlap = region.overlap_area(&inner) as f64;
    overlap >= region.area() as f64 * MIN_OVERLAP_FRACTION
}

/// Which side of the capture region the overlay should snap to — the
/// nearer of above/below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapDirection {
    Above,
    Below,
}

/// Pick the snap side by overlay center relative to the region center.
pub fn snap_direction(region: &Region, overlay: &Region) -> SnapDirection {
    let region_center = region.top + region.height as i32 / 2;
    let overlay_center = overlay.top + overlay.height as i32 / 2;
    if overlay_center <= region_center {
        SnapDirection::Above
    } else {
        SnapDirection::Below
    }
}

// ---------------------------------------------------------------------------
// Capture-time policy
// ---------------------------------------------------------------------------

/// What the capture task should do this iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapAction {
    /// No significant overlap — capture normally.
    Capture,
    /// Ask the overlay to snap away and skip this frame.
    SnapAway(SnapDirection),
    /// Hide the overlay, capture once, re-show.
    HideAndCapture,
    /// Overlap is allowed but the hidden-capture throttle hasn't elapsed;
    /// skip this frame.
    Throttled,
}

/// Per-capture-task overlap state: throttles hide-and-capture to ≤ 2 Hz.
pub struct OverlapPolicy {
    allow_overlap: bool,
    last_hidden_capture: Option<Instant>,
}

impl OverlapPolicy {
    pub fn new(allow_overlap: bool) -> Self {
        Self {
            allow_overlap,
            last_hidden_capture: None,
        }
    }

    /// Decide the capture action for this iteration.
    pub fn decide(&mut self, region: &Region, overlay: Option<&Region>, now: Instant) -> OverlapAction {
        let overlay = match overlay {
            Some(o) => o,
            None => return OverlapAction::Capture,
        };
        if !overlap_is_significant(region, overlay) {
            return OverlapAction::Capture;
        }
        if !self.allow_overlap {
            return OverlapAction::SnapAway(snap_direction(region, overlay));
        }
        let due = self
            .last_hidden_capture
            .map(|t| now.duration_since(t).as_secs_f64() >= HIDDEN_CAPTURE_INTERVAL)
            .unwrap_or(true);
        if due {
            self.last_hidden_capture = Some(now);
            OverlapAction::HideAndCapture
        } else {
            OverlapAction::Throttled
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
