//! Pipeline module — bounded queues, stage workers, lifecycle.
//!
//! # Architecture
//!
//! ```text
//! FrameSource / AudioSource
//!        │ newest-wins queues
//!        ▼
//! recognize / audio-process workers (gate + reconciler)
//!        │ Commit
//!        ▼
//! translate worker (dedup → Dispatcher → session log → keywords)
//!        │ TranslationResult
//!        ▼
//! UI tick @ 10 Hz (DisplayStack, StatusBoard, TTS) ──▶ Overlay
//! ```
//!
//! All cross-task state is a [`PipelineFlags`] set of atomics; everything
//! else flows through [`NewestWins`] queues.

pub mod dedup;
pub mod queue;
pub mod runner;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use dedup::{sources_similar, RecentSources};
pub use queue::NewestWins;
pub use runner::{LearnChannel, Pipeline, PipelineHandle, PipelineParts};
pub use state::{new_shared_flags, PipelineFlags, SharedFlags};
