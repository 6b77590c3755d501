//! Recognition stage — engine seams, post-filters, candidate correction.
//!
//! The OCR/ASR engines themselves live outside this crate; everything
//! here runs on their output before it reaches the obstruction gate.

pub mod correct;
pub mod filters;
pub mod recognizer;

pub use correct::{correct, pick_best, LexiconScorer, TextScorer};
pub use filters::{filter_transcript, is_hallucination, is_prompt_echo, strip_garbage,
    strip_metadata_tags};
pub use recognizer::{RecognitionResult, Recognizer, Transcriber};

#[cfg(test)]
pub use recognizer::{MockRecognizer, MockTranscriber};
