//! Recognizer traits and the recognition result type.
//!
//! # Overview
//!
//! [`Recognizer`] (OCR) and [`Transcriber`] (ASR) are the seams to the
//! external engines. Both are object-safe and `Send + Sync` so the
//! pipeline can hold them behind `Arc<dyn …>` and call them from blocking
//! worker tasks.
//!
//! # Contract
//!
//! Engine failures must not propagate into the pipeline: implementations
//! return an **empty** result instead of erroring. The post-filters in
//! [`filters`](crate::recognize::filters) run on the engine output before
//! it reaches the gate.

use std::time::Instant;

use crate::capture::Frame;

// ---------------------------------------------------------------------------
// RecognitionResult
// ---------------------------------------------------------------------------

/// Output of one recognition pass.
#[derive(Debug, Clone)]
pub struct RecognitionResult {
    /// Recognized text; empty when nothing was recognized or the engine
    /// failed.
    pub text: String,
    /// Ranked alternative strings per detected line, used only by the MT
    /// path's probabilistic correction. Empty when not requested.
    pub candidates: Vec<Vec<String>>,
    /// `(y_top, y_bottom)` extents per detected line, in frame pixels,
    /// used by the dynamic text-region estimator. Empty when not requested.
    pub boxes: Vec<(f32, f32)>,
    pub timestamp: Instant,
}

impl RecognitionResult {
    /// An empty result — the mandated engine-failure value.
    pub fn empty() -> Self {
        Self {
            text: String::new(),
            candidates: Vec::new(),
            boxes: Vec::new(),
            timestamp: Instant::now(),
        }
    }

    /// A plain text-only result.
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            candidates: Vec::new(),
            boxes: Vec::new(),
            timestamp: Instant::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

// ---------------------------------------------------------------------------
// Recognizer trait (OCR)
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface for OCR engines.
///
/// `want_boxes` asks the engine to also report per-line y-extents and
/// candidate lists; engines that cannot are free to leave them empty.
pub trait Recognizer: Send + Sync {
    fn process(&self, frame: &Frame, want_boxes: bool) -> RecognitionResult;
}

// Compile-time assertion: Box<dyn Recognizer> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn Recognizer>) {}
};

// ---------------------------------------------------------------------------
// Transcriber trait (ASR)
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface for speech recognition.
///
/// `audio` is 16 kHz mono f32 PCM. `prompt` is soft-biasing context — the
/// last committed text — which some engines use as a decoding hint.
/// Failures return an empty string.
pub trait Transcriber: Send + Sync {
    fn transcribe(&self, audio: &[f32], prompt: Option<&str>) -> String;
}

const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn Transcriber>) {}
};

// ---------------------------------------------------------------------------
// Mock engines (test-only)
// ---------------------------------------------------------------------------

/// Test double that replays a scripted sequence of recognition texts.
#[cfg(test)]
pub struct MockRecognizer {
    script: std::sync::Mutex<std::collections::VecDeque<String>>,
}

#[cfg(test)]
impl MockRecognizer {
    /// Replays `texts` one per call, then empty results.
    pub fn script<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: std::sync::Mutex::new(texts.into_iter().map(Into::into).collect()),
        }
    }
}

#[cfg(test)]
impl Recognizer for MockRecognizer {
    fn process(&self, _frame: &Frame, _want_boxes: bool) -> RecognitionResult {
        match self.script.lock().unwrap().pop_front() {
            Some(text) => RecognitionResult::text_only(text),
            None => RecognitionResult::empty(),
        }
    }
}

/// Test double that always returns the same transcript.
#[cfg(test)]
pub struct MockTranscriber {
    response: String,
}

#[cfg(test)]
impl MockTranscriber {
    pub fn fixed(text: impl Into<String>) -> Self {
        Self {
            response: text.into(),
        }
    }
}

#[cfg(test)]
impl Transcriber for MockTranscriber {
    fn transcribe(&self, _audio: &[f32], _prompt: Option<&str>) -> String {
        self.response.clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_result_is_empty() {
        assert!(RecognitionResult::empty().is_empty());
        assert!(RecognitionResult::text_only("  ").is_empty());
        assert!(!RecognitionResult::text_only("hi").is_empty());
    }

    #[test]
    fn mock_recognizer_replays_script() {
        let rec = MockRecognizer::script(["one", "two"]);
        let frame = Frame::solid(0, 4, 4, Instant::now());
        assert_eq!(rec.process(&frame, false).text, "one");
        assert_eq!(rec.process(&frame, false).text, "two");
        assert!(rec.process(&frame, false).is_empty());
    }

    #[test]
    fn mock_transcriber_returns_fixed_text() {
        let t = MockTranscriber::fixed("hello");
        assert_eq!(t.transcribe(&[0.0; 100], None), "hello");
        assert_eq!(t.transcribe(&[0.0; 100], Some("prompt")), "hello");
    }

    #[test]
    fn traits_are_object_safe() {
        let _: Box<dyn Recognizer> = Box::new(MockRecognizer::script(["x"]));
        let _: Box<dyn Transcriber> = Box::new(MockTranscriber::fixed("x"));
    }
}
