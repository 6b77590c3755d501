//! Text-to-speech interface.
//!
//! The synthesizer runs as a separate OS process with its own queue — the
//! recognizer and a co-located synthesizer together saturate the CPU and
//! the audio stream stutters. The pipeline treats speech as
//! fire-and-forget: `speak` enqueues and returns, `stop` drops the queue
//! without blocking, and `shutdown` joins the child process.

/// A TTS engine, as the core sees it.
pub trait TtsEngine: Send + Sync {
    /// Enqueue an utterance. Must not block on synthesis.
    fn speak(&self, text: &str, lang: &str);

    /// Drop all queued utterances and cut current playback at the next
    /// buffer boundary. Must not block shutdown.
    fn stop(&self);

    /// Stop and join the child process.
    fn shutdown(&self);
}

// ---------------------------------------------------------------------------
// RecordingTts (test-only)
// ---------------------------------------------------------------------------

/// Test double that records utterances and lifecycle calls.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingTts {
    pub spoken: std::sync::Mutex<Vec<(String, String)>>,
    pub stopped: std::sync::atomic::AtomicBool,
    pub shut_down: std::sync::atomic::AtomicBool,
}

#[cfg(test)]
impl TtsEngine for RecordingTts {
    fn speak(&self, text: &str, lang: &str) {
        self.spoken
            .lock()
            .unwrap()
            .push((text.to_string(), lang.to_string()));
    }

    fn stop(&self) {
        self.stopped
            .store(true, std::sync::atomic::Ordering::SeqCst);
    }

    fn shutdown(&self) {
        self.stop();
        self.shut_down
            .store(true, std::sync::atomic::Ordering::SeqCst);
    }
}
