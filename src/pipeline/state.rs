//! Shared pipeline flags.
//!
//! Cross-task communication is strictly bounded queues plus this small
//! set of atomics. Every worker checks `running` on each dequeue so
//! shutdown is prompt; the pause flags gate the source stages without
//! tearing anything down.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// PipelineFlags
// ---------------------------------------------------------------------------

/// The atomics shared across pipeline tasks.
#[derive(Debug)]
pub struct PipelineFlags {
    /// Master run flag; cleared exactly once, at shutdown.
    pub running: AtomicBool,
    /// OCR source paused (user or gate initiated).
    pub ocr_paused: AtomicBool,
    /// Audio source paused.
    pub audio_paused: AtomicBool,
    /// The overlay is momentarily hidden for a capture; suppress re-show.
    pub hiding_for_capture: AtomicBool,
}

impl PipelineFlags {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            ocr_paused: AtomicBool::new(false),
            audio_paused: AtomicBool::new(false),
            hiding_for_capture: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn ocr_paused(&self) -> bool {
        self.ocr_paused.load(Ordering::SeqCst)
    }

    pub fn pause_ocr(&self) {
        self.ocr_paused.store(true, Ordering::SeqCst);
    }

    pub fn resume_ocr(&self) {
        self.ocr_paused.store(false, Ordering::SeqCst);
    }

    pub fn audio_paused(&self) -> bool {
        self.audio_paused.load(Ordering::SeqCst)
    }
}

impl Default for PipelineFlags {
    fn default() -> Self {
        Self::new()
    }
}

/// Cheap-to-clone handle to the shared flags.
pub type SharedFlags = Arc<PipelineFlags>;

/// Construct a fresh flag set.
pub fn new_shared_flags() -> SharedFlags {
    Arc::new(PipelineFlags::new())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_running_and_unpaused() {
        let flags = new_shared_flags();
        assert!(flags.is_running());
        assert!(!flags.ocr_paused());
        assert!(!flags.audio_paused());
    }

    #[test]
    fn stop_is_visible_across_clones() {
        let flags = new_shared_flags();
        let clone = Arc::clone(&flags);
        flags.stop();
        assert!(!clone.is_running());
    }

    #[test]
    fn pause_resume_cycle() {
        let flags = new_shared_flags();
        flags.pause_ocr();
        assert!(flags.ocr_paused());
        flags.resume_ocr();
        assert!(!flags.ocr_paused());
    }
}
