//! Phrase-level reconciler for the audio transcription path.
//!
//! Each `ingest` call corresponds to a fresh re-transcription of the
//! current audio buffer, so there is nothing to merge — the question is
//! only *when* to send. Within a bounded period the reconciler checks a
//! bounded number of times for sentence completion; whichever happens
//! first wins:
//!
//! * the transcript ends in sentence-terminal punctuation → send now;
//! * the period expires or the check budget is exhausted → send anyway.
//!
//! Transcripts below the word minimum are never sent. Once sent, the
//! buffer is discarded whole; audio commits are always final.

use std::time::Instant;

use crate::lang::count_words;

use super::Commit;

/// Sentence-ending punctuation, CJK and Latin. Commas are not enders.
const SENTENCE_ENDINGS: &[char] = &['.', '!', '?', '。', '！', '？'];

// ---------------------------------------------------------------------------
// AudioReconciler
// ---------------------------------------------------------------------------

/// Bounded-check phrase committer for re-transcribed audio.
///
/// # Example
///
/// ```
/// use std::time::Instant;
/// use live_translate::reconcile::AudioReconciler;
///
/// let mut rec = AudioReconciler::new(2.0, 4, 7);
/// let commit = rec
///     .ingest("Hello how are you doing today my friend.", Instant::now())
///     .unwrap();
/// assert!(commit.is_final);
/// ```
pub struct AudioReconciler {
    period_sec: f64,
    num_checks: u32,
    min_words: usize,
    buffer: String,
    period_start: Option<Instant>,
    check_count: u32,
}

impl AudioReconciler {
    /// Create a reconciler: force a send after `period_sec` seconds or
    /// `num_checks` completion checks, whichever comes first; never send
    /// fewer than `min_words` words.
    pub fn new(period_sec: f64, num_checks: u32, min_words: usize) -> Self {
        Self {
            period_sec,
            num_checks,
            min_words,
            buffer: String::new(),
            period_start: None,
            check_count: 0,
        }
    }

    /// Feed one re-transcription of the current audio buffer.
    pub fn ingest(&mut self, transcript: &str, now: Instant) -> Option<Commit> {
        let text = transcript.trim();
        if text.is_empty() {
            return None;
        }

        let period_start = *self.period_start.get_or_insert(now);
        self.buffer = text.to_string();
        self.check_count += 1;
        let elapsed = now.duration_since(period_start).as_secs_f64();

        if count_words(text) < self.min_words {
            return None;
        }

        // Sentence complete.
        if Self::is_sentence_complete(text) {
            return Some(Commit::final_unit(self.take_buffer()));
        }

        // Period expired or check budget exhausted.
        if elapsed >= self.period_sec || self.check_count >= self.num_checks {
            return Some(Commit::final_unit(self.take_buffer()));
        }

        None
    }

    /// Reset the phrase state (e.g. when capture starts a new phrase).
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.period_start = None;
        self.check_count = 0;
    }

    fn is_sentence_complete(text: &str) -> bool {
        text.chars()
            .last()
            .map(|c| SENTENCE_ENDINGS.contains(&c))
            .unwrap_or(false)
    }

    fn take_buffer(&mut self) -> String {
        let out = std::mem::take(&mut self.buffer);
        self.period_start = None;
        self.check_count = 0;
        out
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn at(t0: Instant, millis: u64) -> Instant {
        t0 + Duration::from_millis(millis)
    }

    /// Five words (< 7) never commit; eight words without a terminator wait;
    /// a terminator commits immediately.
    #[test]
    fn sentence_completion_scenario() {
        let mut rec = AudioReconciler::new(2.0, 4, 7);
        let t0 = Instant::now();

        assert!(rec.ingest("Hello how are you doing", t0).is_none());
        assert!(rec
            .ingest("Hello how are you doing today my friend", at(t0, 500))
            .is_none());
        let commit = rec
            .ingest("Hello how are you doing today my friend.", at(t0, 1_000))
            .expect("terminator commit");
        assert_eq!(commit.text, "Hello how are you doing today my friend.");
        assert!(commit.is_final);
    }

    /// The period cap forces a send even without a terminator.
    #[test]
    fn period_expiry_forces_send() {
        let mut rec = AudioReconciler::new(2.0, 99, 7);
        let t0 = Instant::now();

        assert!(rec
            .ingest("eight words are needed for this to send", t0)
            .is_none());
        let commit = rec
            .ingest("eight words are needed for this to send", at(t0, 2_100))
            .expect("period commit");
        assert!(commit.is_final);
    }

    /// The check budget forces a send even within the period.
    #[test]
    fn check_budget_forces_send() {
        let mut rec = AudioReconciler::new(60.0, 3, 7);
        let t0 = Instant::now();

        assert!(rec
            .ingest("one transcript with plenty of words inside it", t0)
            .is_none());
        assert!(rec
            .ingest("one transcript with plenty of words inside it", at(t0, 100))
            .is_none());
        assert!(rec
            .ingest("one transcript with plenty of words inside it", at(t0, 200))
            .is_some());
    }

    /// CJK sentence terminators are recognized.
    #[test]
    fn cjk_terminator_commits() {
        let mut rec = AudioReconciler::new(2.0, 4, 7);
        let commit = rec.ingest("我们今天一起去公园玩。", Instant::now());
        assert!(commit.is_some());
    }

    /// Below the word minimum nothing commits, even with a terminator and
    /// an expired period.
    #[test]
    fn below_min_words_never_commits() {
        let mut rec = AudioReconciler::new(0.1, 1, 7);
        let t0 = Instant::now();

        assert!(rec.ingest("Too short.", t0).is_none());
        assert!(rec.ingest("Too short.", at(t0, 5_000)).is_none());
    }

    /// After a send the state resets: the next phrase gets a fresh period
    /// and check budget.
    #[test]
    fn state_resets_after_send() {
        let mut rec = AudioReconciler::new(2.0, 2, 3);
        let t0 = Instant::now();

        assert!(rec.ingest("first phrase has words", t0).is_none());
        assert!(rec.ingest("first phrase has more words", at(t0, 100)).is_some());

        // New phrase: one check used, still under budget — no commit.
        assert!(rec.ingest("second phrase grows here", at(t0, 200)).is_none());
    }

    /// Blank transcripts are ignored without consuming the check budget.
    #[test]
    fn blank_transcripts_ignored() {
        let mut rec = AudioReconciler::new(2.0, 1, 1);
        assert!(rec.ingest("   ", Instant::now()).is_none());
        // Budget untouched: next real transcript is check #1 and commits
        // because num_checks = 1.
        assert!(rec.ingest("real words now", Instant::now()).is_some());
    }
}
