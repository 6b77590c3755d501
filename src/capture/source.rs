//! Capture source traits and the audio chunk queue.
//!
//! The pipeline treats capture as opaque: a [`FrameSource`] yields frames
//! from some platform primitive, an [`AudioSource`] yields fixed-duration
//! 16 kHz mono chunks. Both are object-safe so the pipeline can hold them
//! behind `Arc<dyn …>`.
//!
//! [`AudioQueue`] implements the bounded ingest queue between the audio
//! capture task and the processing task, including the overflow policy:
//! silent-chunk shedding under pressure and batch draining under load.

use std::collections::VecDeque;

use super::frame::{Frame, Region};

// ---------------------------------------------------------------------------
// Source traits
// ---------------------------------------------------------------------------

/// Produces frames from a screen region. Capture failure yields `None`;
/// the pipeline idles and retries next tick.
pub trait FrameSource: Send + Sync {
    /// Grab one frame of the current region.
    fn capture(&self) -> Option<Frame>;
    /// The region being captured; re-read every iteration so live
    /// repositioning takes effect.
    fn region(&self) -> Region;
}

/// Produces fixed-duration float32 audio chunks at 16 kHz mono.
pub trait AudioSource: Send + Sync {
    /// Pull the next chunk. `None` means the stream has ended.
    fn next_chunk(&self) -> Option<Vec<f32>>;
    fn sample_rate(&self) -> u32 {
        16_000
    }
}

// ---------------------------------------------------------------------------
// RMS helpers
// ---------------------------------------------------------------------------

/// Root-mean-square amplitude of a sample slice.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f32 = samples.iter().map(|s| s * s).sum();
    (sum / samples.len() as f32).sqrt()
}

/// Whether the trailing `tail_samples` of `buffer` are below `threshold`.
/// `false` when the buffer is shorter than the tail.
pub fn tail_is_silent(buffer: &[f32], tail_samples: usize, threshold: f32) -> bool {
    if buffer.len() < tail_samples || tail_samples == 0 {
        return false;
    }
    rms(&buffer[buffer.len() - tail_samples..]) < threshold
}

// ---------------------------------------------------------------------------
// Phrase cut policy
// ---------------------------------------------------------------------------

/// Why a phrase buffer was finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhraseCut {
    /// Trailing silence after a normal-length phrase.
    Silence,
    /// Short trailing silence once the phrase has grown long.
    SoftLimit,
    /// The phrase hit the hard duration cap.
    HardLimit,
}

/// Decide whether the accumulated phrase buffer should be finalized.
///
/// * standard cut — ≥ `silence_duration` of trailing silence once the
///   buffer exceeds 2 s;
/// * soft cut — 0.4 s of trailing silence once the buffer exceeds 6 s;
/// * hard cut — the buffer exceeds `max_phrase_duration`.
pub fn phrase_cut(
    buffer: &[f32],
    sample_rate: u32,
    silence_threshold: f32,
    silence_duration: f64,
    max_phrase_duration: f64,
) -> Option<PhraseCut> {
    let duration = buffer.len() as f64 / sample_rate as f64;

    if duration > max_phrase_duration {
        return Some(PhraseCut::HardLimit);
    }

    if duration > 6.0 {
        let tail = (sample_rate as f64 * 0.4) as usize;
        if tail_is_silent(buffer, tail, silence_threshold) {
            return Some(PhraseCut::SoftLimit);
        }
    }

    if duration > 2.0 {
        let tail = (sample_rate as f64 * silence_duration) as usize;
        if tail_is_silent(buffer, tail, silence_threshold) {
            return Some(PhraseCut::Silence);
        }
    }

    None
}

// ---------------------------------------------------------------------------
// AudioQueue
// ---------------------------------------------------------------------------

/// Queue capacity and pressure thresholds.
const QUEUE_CAPACITY: usize = 100;
const SHED_OCCUPANCY: usize = 80;
const BATCH_OCCUPANCY: usize = 60;
/// At most this many oldest silent chunks are shed per push.
const MAX_SHED_PER_PUSH: usize = 3;
/// Chunks drained per tick under load.
const BATCH_DRAIN: usize = 4;

/// Outcome of [`AudioQueue::push`], so the caller can rate-limit a status
/// message on persistent overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Enqueued normally.
    Queued,
    /// Enqueued after shedding this many oldest silent chunks.
    ShedSilent(usize),
    /// The queue was full of non-silent chunks; the oldest was dropped.
    Overflowed,
}

/// Bounded chunk queue with silent-chunk shedding under pressure.
///
/// Synchronization is external (the pipeline wraps it in a mutex); the
/// policy itself is a plain value so it can be tested directly.
pub struct AudioQueue {
    chunks: VecDeque<Vec<f32>>,
    silence_threshold: f32,
}

impl AudioQueue {
    pub fn new(silence_threshold: f32) -> Self {
        Self {
            chunks: VecDeque::with_capacity(QUEUE_CAPACITY),
            silence_threshold,
        }
    }

    /// Number of queued chunks.
    pub fn occupancy(&self) -> usize {
        self.chunks.len()
    }

    /// Enqueue a chunk, applying the overflow policy.
    pub fn push(&mut self, chunk: Vec<f32>) -> PushOutcome {
        let mut outcome = PushOutcome::Queued;

        if self.chunks.len() > SHED_OCCUPANCY {
            let shed = self.shed_oldest_silent(MAX_SHED_PER_PUSH);
            if shed > 0 {
                outcome = PushOutcome::ShedSilent(shed);
            }
        }

        if self.chunks.len() >= QUEUE_CAPACITY {
            self.chunks.pop_front();
            outcome = PushOutcome::Overflowed;
        }

        self.chunks.push_back(chunk);
        outcome
    }

    /// Dequeue chunks for one processing tick.
    ///
    /// Under light load this is a single chunk. Above the batch threshold
    /// several chunks are drained at once and near-silent ones (RMS below
    /// half the silence threshold) are elided so processing catches up.
    pub fn pop_for_tick(&mut self) -> Vec<Vec<f32>> {
        if self.chunks.len() <= BATCH_OCCUPANCY {
            return self.chunks.pop_front().into_iter().collect();
        }

        let mut out = Vec::with_capacity(BATCH_DRAIN);
        while out.len() < BATCH_DRAIN {
            match self.chunks.pop_front() {
                Some(chunk) => {
                    if rms(&chunk) >= self.silence_threshold * 0.5 {
                        out.push(chunk);
                    }
                }
                None => break,
            }
        }
        out
    }

    /// Drop up to `max` of the oldest silent chunks; returns how many went.
    fn shed_oldest_silent(&mut self, max: usize) -> usize {
        let mut shed = 0;
        let mut idx = 0;
        while shed < max && idx < self.chunks.len() {
            if rms(&self.chunks[idx]) < self.silence_threshold {
                self.chunks.remove(idx);
                shed += 1;
            } else {
                idx += 1;
            }
        }
        shed
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn silent_chunk() -> Vec<f32> {
        vec![0.0; 160]
    }

    fn loud_chunk() -> Vec<f32> {
        vec![0.5; 160]
    }

    // --- rms ---

    #[test]
    fn rms_of_silence_is_zero() {
        assert_eq!(rms(&silent_chunk()), 0.0);
        assert_eq!(rms(&[]), 0.0);
    }

    #[test]
    fn rms_of_constant_signal() {
        assert!((rms(&loud_chunk()) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn tail_silence_detection() {
        let mut buf = vec![0.5f32; 16_000];
        buf.extend(vec![0.0f32; 16_000]);
        assert!(tail_is_silent(&buf, 16_000, 0.01));
        assert!(!tail_is_silent(&buf, 32_000, 0.01));
        assert!(!tail_is_silent(&buf[..100], 200, 0.01));
    }

    // --- phrase cut ---

    #[test]
    fn hard_limit_cut() {
        let buf = vec![0.5f32; 16_000 * 6];
        assert_eq!(
            phrase_cut(&buf, 16_000, 0.01, 1.0, 5.0),
            Some(PhraseCut::HardLimit)
        );
    }

    #[test]
    fn standard_silence_cut() {
        let mut buf = vec![0.5f32; 16_000 * 2];
        buf.extend(vec![0.0f32; 16_000]); // 1 s of trailing silence, 3 s total
        assert_eq!(
            phrase_cut(&buf, 16_000, 0.01, 1.0, 30.0),
            Some(PhraseCut::Silence)
        );
    }

    #[test]
    fn soft_limit_cut_on_long_phrase() {
        let mut buf = vec![0.5f32; 16_000 * 7];
        buf.extend(vec![0.0f32; (16_000.0 * 0.5) as usize]);
        assert_eq!(
            phrase_cut(&buf, 16_000, 0.01, 2.0, 30.0),
            Some(PhraseCut::SoftLimit)
        );
    }

    #[test]
    fn short_loud_phrase_not_cut() {
        let buf = vec![0.5f32; 16_000];
        assert_eq!(phrase_cut(&buf, 16_000, 0.01, 1.0, 30.0), None);
    }

    // --- AudioQueue ---

    #[test]
    fn push_below_pressure_just_queues() {
        let mut q = AudioQueue::new(0.01);
        for _ in 0..50 {
            assert_eq!(q.push(loud_chunk()), PushOutcome::Queued);
        }
        assert_eq!(q.occupancy(), 50);
    }

    #[test]
    fn push_above_pressure_sheds_silent_first() {
        let mut q = AudioQueue::new(0.01);
        // 40 old silent chunks followed by speech, past the shed threshold.
        for _ in 0..40 {
            q.push(silent_chunk());
        }
        for _ in 0..41 {
            q.push(loud_chunk());
        }
        assert_eq!(q.occupancy(), 81);

        let outcome = q.push(loud_chunk());
        assert_eq!(outcome, PushOutcome::ShedSilent(3));
        assert_eq!(q.occupancy(), 79);
    }

    #[test]
    fn full_queue_of_speech_overflows_oldest() {
        let mut q = AudioQueue::new(0.01);
        for _ in 0..100 {
            q.push(loud_chunk());
        }
        assert_eq!(q.push(loud_chunk()), PushOutcome::Overflowed);
        assert_eq!(q.occupancy(), 100);
    }

    #[test]
    fn pop_single_under_light_load() {
        let mut q = AudioQueue::new(0.01);
        q.push(loud_chunk());
        q.push(loud_chunk());
        assert_eq!(q.pop_for_tick().len(), 1);
        assert_eq!(q.occupancy(), 1);
    }

    #[test]
    fn pop_batches_and_elides_quiet_under_load() {
        let mut q = AudioQueue::new(0.01);
        for i in 0..70 {
            // Quiet-but-not-silent chunks (below half threshold) are elided.
            let chunk = if i % 2 == 0 {
                vec![0.004f32; 160]
            } else {
                loud_chunk()
            };
            q.push(chunk);
        }
        let batch = q.pop_for_tick();
        assert!(batch.len() > 1);
        assert!(batch.iter().all(|c| rms(c) >= 0.005));
    }

    #[test]
    fn pop_empty_queue_is_empty() {
        let mut q = AudioQueue::new(0.01);
        assert!(q.pop_for_tick().is_empty());
    }
}
