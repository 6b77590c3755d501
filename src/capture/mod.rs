//! Capture stage — frame and audio sources.
//!
//! The platform capture primitives live outside this crate; the pipeline
//! consumes them through [`FrameSource`] and [`AudioSource`]. This module
//! also owns the frame types, the audio ingest queue with its overflow
//! policy, and the phrase-cut policy for audio buffering.

pub mod frame;
pub mod source;

pub use frame::{Frame, FrameHash, Region};
pub use source::{
    phrase_cut, rms, tail_is_silent, AudioQueue, AudioSource, FrameSource, PhraseCut, PushOutcome,
};
