//! Obstruction gate — decides whether a recognition enters the pipeline.
//!
//! Rules, evaluated in order:
//!
//! 1. explicit pause → skip;
//! 2. overlay overlap (capture-time, see [`obstruction`]);
//! 3. temporal mixed-content → pause with explanation;
//! 4. language mismatch → pause ("text obstructed");
//! 5. word-count cap → drop;
//! 6. UI-echo (repeated chrome tokens) → drop;
//! 7. self-echo against displayed translations / learn text → drop.
//!
//! The gate also owns the dynamic text-region estimator.

pub mod filter;
pub mod mixed;
pub mod obstruction;
pub mod region_est;

pub use mixed::MixedContentDetector;
pub use obstruction::{
    overlap_is_significant, snap_direction, OverlapAction, OverlapPolicy, SnapDirection,
};
pub use region_est::RegionEstimator;

use crate::capture::Frame;
use crate::config::GateConfig;
use crate::recognize::RecognitionResult;

// ---------------------------------------------------------------------------
// Decision types
// ---------------------------------------------------------------------------

/// Outcome of running a recognition through the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Feed the reconciler.
    Pass,
    /// Drop silently.
    Drop(DropReason),
    /// Pause OCR and surface an explanation to the user.
    Pause(PauseReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// User-initiated pause.
    Paused,
    /// Nothing recognized.
    Empty,
    /// Word-count cap exceeded.
    WordCap,
    /// Repeated-token UI chrome.
    UiEcho,
    /// Echo of our own displayed output.
    SelfEcho,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseReason {
    /// The region mixes static and dynamic content.
    MixedContent,
    /// Recognized script disagrees with the source language.
    LanguageMismatch,
}

impl PauseReason {
    /// User-facing explanation pushed as a status message.
    pub fn message(&self) -> &'static str {
        match self {
            PauseReason::MixedContent => {
                "Region includes static content — move or shrink the capture box"
            }
            PauseReason::LanguageMismatch => "Text obstructed — OCR paused",
        }
    }
}

// ---------------------------------------------------------------------------
// Gate
// ---------------------------------------------------------------------------

/// Per-pipeline gate state.
pub struct Gate {
    config: GateConfig,
    source_lang: String,
    mixed: MixedContentDetector,
    estimator: RegionEstimator,
}

impl Gate {
    pub fn new(config: GateConfig, source_lang: impl Into<String>) -> Self {
        Self {
            config,
            source_lang: source_lang.into(),
            mixed: MixedContentDetector::new(),
            estimator: RegionEstimator::new(),
        }
    }

    /// Observe a captured frame before recognition. Returns the
    /// mixed-content pause when the detector trips.
    pub fn observe_frame(&mut self, frame: &Frame) -> Option<PauseReason> {
        if self.config.detect_mixed_content && self.mixed.observe(frame) {
            return Some(PauseReason::MixedContent);
        }
        None
    }

    /// Run a recognition result through rules 4–7.
    ///
    /// `paused` is the user-initiated pause flag (rule 1). `displayed` is
    /// the currently shown translations plus any learn-panel text, for the
    /// self-echo rule.
    pub fn check<'a>(
        &mut self,
        result: &RecognitionResult,
        paused: bool,
        displayed: impl IntoIterator<Item = &'a str>,
    ) -> GateDecision {
        if paused {
            return GateDecision::Drop(DropReason::Paused);
        }
        let text = result.text.trim();
        if text.is_empty() {
            return GateDecision::Drop(DropReason::Empty);
        }

        if filter::language_mismatch(text, &self.source_lang) {
            return GateDecision::Pause(PauseReason::LanguageMismatch);
        }

        if filter::exceeds_word_cap(
            text,
            self.config.max_words_enabled,
            self.config.max_words_for_translation,
        ) {
            return GateDecision::Drop(DropReason::WordCap);
        }

        if filter::is_ui_echo(text) {
            return GateDecision::Drop(DropReason::UiEcho);
        }

        if filter::is_self_echo(text, displayed) {
            return GateDecision::Drop(DropReason::SelfEcho);
        }

        if self.config.auto_detect_text_region {
            self.estimator.observe(&result.boxes);
        }

        GateDecision::Pass
    }

    /// Crop band from the dynamic text-region estimator, when stable.
    pub fn crop_band(&self) -> Option<(i32, i32)> {
        if self.config.auto_detect_text_region {
            self.estimator.crop_band()
        } else {
            None
        }
    }

    /// Reset temporal state (region change or explicit resume).
    pub fn reset(&mut self) {
        self.mixed.reset();
        self.estimator.reset();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognize::RecognitionResult;

    fn gate() -> Gate {
        Gate::new(GateConfig::default(), "zh")
    }

    fn result(text: &str) -> RecognitionResult {
        RecognitionResult::text_only(text)
    }

    #[test]
    fn pass_through_for_normal_text() {
        let mut g = gate();
        assert_eq!(g.check(&result("今天天气很好"), false, []), GateDecision::Pass);
    }

    #[test]
    fn paused_flag_drops_everything() {
        let mut g = gate();
        assert_eq!(
            g.check(&result("今天天气很好"), true, []),
            GateDecision::Drop(DropReason::Paused)
        );
    }

    #[test]
    fn language_mismatch_pauses() {
        let mut g = gate();
        assert_eq!(
            g.check(&result("clearly english interface text here"), false, []),
            GateDecision::Pause(PauseReason::LanguageMismatch)
        );
    }

    #[test]
    fn word_cap_drops_when_enabled() {
        let mut config = GateConfig::default();
        config.max_words_enabled = true;
        config.max_words_for_translation = 3;
        let mut g = Gate::new(config, "zh");
        assert_eq!(
            g.check(&result("一二三四五六"), false, []),
            GateDecision::Drop(DropReason::WordCap)
        );
    }

    #[test]
    fn ui_echo_drops() {
        let mut g = gate();
        assert_eq!(
            g.check(&result("Reply Reply Reply Reply Reply"), false, []),
            GateDecision::Drop(DropReason::UiEcho)
        );
    }

    #[test]
    fn self_echo_drops() {
        let mut g = gate();
        let displayed = ["we are going to the park today"];
        assert_eq!(
            g.check(&result("going to the park"), false, displayed),
            GateDecision::Drop(DropReason::SelfEcho)
        );
    }

    #[test]
    fn estimator_feeds_only_when_enabled() {
        let mut config = GateConfig::default();
        config.auto_detect_text_region = true;
        let mut g = Gate::new(config, "zh");

        for _ in 0..6 {
            let mut r = result("好的");
            r.boxes = vec![(40.0, 60.0)];
            assert_eq!(g.check(&r, false, []), GateDecision::Pass);
        }
        assert_eq!(g.crop_band(), Some((25, 75)));

        g.reset();
        assert!(g.crop_band().is_none());
    }

    #[test]
    fn pause_reasons_have_messages() {
        assert!(!PauseReason::MixedContent.message().is_empty());
        assert!(!PauseReason::LanguageMismatch.message().is_empty());
    }
}
