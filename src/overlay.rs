//! Overlay interface — the contract between the core and the window
//! toolkit.
//!
//! The overlay never calls back into the core; the pipeline drives it
//! exclusively through this trait on the UI tick. Implementations must be
//! cheap and non-blocking: the tick runs at 10 Hz.

use std::collections::HashMap;

use crate::capture::Region;
use crate::display::StatusMessage;
use crate::gate::SnapDirection;

/// The floating translation window, as the core sees it.
pub trait Overlay: Send + Sync {
    /// Replace the displayed translation text.
    ///
    /// `allow_show` is false while the overlay is hidden for a capture;
    /// `partial_last` asks for the bottom line in a muted style.
    fn update_text(&self, text: &str, allow_show: bool, partial_last: bool);

    /// Replace the transient status message list.
    fn set_status_messages(&self, messages: &[StatusMessage]);

    /// Update the per-provider word-count pill.
    fn set_info_pill_text(&self, counters: &HashMap<String, u64>);

    /// Refresh the play/pause control after a pause-state change.
    fn update_play_pause_state(&self);

    /// Animate away from the capture region (gate rule 2).
    fn snap_away_from_ocr(&self, region: &Region, direction: SnapDirection);

    /// Hide for a hide-and-capture cycle.
    fn hide(&self);
    /// Re-show after a hide-and-capture cycle.
    fn show(&self);

    /// Current overlay rectangle in screen coordinates, when mapped.
    fn rect(&self) -> Option<Region>;

    /// Final teardown at shutdown.
    fn close(&self);
}

// ---------------------------------------------------------------------------
// RecordingOverlay (test-only)
// ---------------------------------------------------------------------------

/// Test double that records every call.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingOverlay {
    pub texts: std::sync::Mutex<Vec<(String, bool, bool)>>,
    pub statuses: std::sync::Mutex<Vec<Vec<StatusMessage>>>,
    pub snaps: std::sync::Mutex<Vec<SnapDirection>>,
    pub closed: std::sync::atomic::AtomicBool,
    pub overlay_rect: std::sync::Mutex<Option<Region>>,
}

#[cfg(test)]
impl Overlay for RecordingOverlay {
    fn update_text(&self, text: &str, allow_show: bool, partial_last: bool) {
        self.texts
            .lock()
            .unwrap()
            .push((text.to_string(), allow_show, partial_last));
    }

    fn set_status_messages(&self, messages: &[StatusMessage]) {
        self.statuses.lock().unwrap().push(messages.to_vec());
    }

    fn set_info_pill_text(&self, _counters: &HashMap<String, u64>) {}

    fn update_play_pause_state(&self) {}

    fn snap_away_from_ocr(&self, _region: &Region, direction: SnapDirection) {
        self.snaps.lock().unwrap().push(direction);
    }

    fn hide(&self) {}
    fn show(&self) {}

    fn rect(&self) -> Option<Region> {
        *self.overlay_rect.lock().unwrap()
    }

    fn close(&self) {
        self.closed
            .store(true, std::sync::atomic::Ordering::SeqCst);
    }
}
