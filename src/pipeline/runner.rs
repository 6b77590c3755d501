//! Pipeline runner — wires the stages together and owns the clock.
//!
//! # Topology (OCR mode)
//!
//! ```text
//! capture task ──capture_q(1)──▶ recognize task ──text_q(5)──▶ translate worker
//!                                                                  │
//!                                        keyword_q(3) ◀────────────┤
//!                                                                  ▼
//! UI tick (10 Hz) ◀──translated_q(5)──────────────────────────────┘
//!      │                                   health-check task (LLM mode)
//!      ▼
//!   Overlay
//! ```
//!
//! Audio mode swaps the first two tasks for an audio-capture task (chunk
//! queue with overflow shedding) and an audio-processing task
//! (re-transcription + phrase reconciler); queue capacities widen to 20
//! and the tick drains up to 25 items.
//!
//! Every queue is newest-wins; every worker blocks on its input with a
//! short timeout and re-checks the `running` flag, so cooperative
//! shutdown completes within three seconds.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::capture::{phrase_cut, rms, AudioQueue, AudioSource, Frame, FrameHash, FrameSource};
use crate::config::{AppConfig, TranscriptionMode};
use crate::display::{DisplayStack, StatusBoard, StatusMessage};
use crate::gate::{Gate, GateDecision, OverlapAction, OverlapPolicy};
use crate::lang::{count_words, has_cjk};
use crate::learn::{Dictionary, KeywordBatch, KeywordExtractor, Segmenter};
use crate::overlay::Overlay;
use crate::recognize::{correct, filter_transcript, Recognizer, TextScorer, Transcriber};
use crate::reconcile::{AudioReconciler, Commit, LlmReconciler, MtReconciler, StreamReconciler};
use crate::session::{SessionEntry, SessionLog};
use crate::translate::{Dispatcher, LlmTranslator, StatusSink};
use crate::tts::TtsEngine;

use super::dedup::RecentSources;
use super::queue::NewestWins;
use super::state::{new_shared_flags, SharedFlags};

/// Worker dequeue timeout — bounds shutdown latency.
const DEQUEUE_TIMEOUT: Duration = Duration::from_millis(400);
/// Capture loop period.
const CAPTURE_PERIOD: Duration = Duration::from_millis(100);
/// UI refresh period (10 Hz).
const TICK_PERIOD: Duration = Duration::from_millis(100);
/// Re-OCR an unchanged frame after this long.
const FORCE_REFRESH: Duration = Duration::from_millis(500);
/// Gate-trip status lifetime.
const GATE_STATUS_SECS: u64 = 10;
/// Rate limit for the audio-overflow status message.
const OVERFLOW_STATUS_PERIOD: Duration = Duration::from_secs(5);
/// Cooperative shutdown budget.
const SHUTDOWN_BUDGET: Duration = Duration::from_secs(3);

/// Queue capacities per mode.
const OCR_QUEUE_CAP: usize = 5;
const AUDIO_QUEUE_CAP: usize = 20;
const KEYWORD_QUEUE_CAP: usize = 3;
/// Items drained per UI tick.
const OCR_DRAIN_PER_TICK: usize = 1;
const AUDIO_DRAIN_PER_TICK: usize = 25;

// ---------------------------------------------------------------------------
// LearnChannel
// ---------------------------------------------------------------------------

/// Collaborators for the learn side-channel. The dispatcher here is a
/// separate instance with the learn-specific provider configuration so
/// word lookups never contend with subtitle translation.
pub struct LearnChannel {
    pub extractor: KeywordExtractor,
    pub segmenter: Arc<dyn Segmenter>,
    pub dictionary: Arc<dyn Dictionary>,
    pub dispatcher: Dispatcher,
    pub sink: mpsc::UnboundedSender<KeywordBatch>,
}

// ---------------------------------------------------------------------------
// PipelineParts
// ---------------------------------------------------------------------------

/// Everything the runner needs, assembled by `main` (or a test).
///
/// `frame_source`/`recognizer` drive OCR mode; `audio_source`/
/// `transcriber` drive audio mode — only the pair matching
/// `config.transcription_mode` is used.
pub struct PipelineParts {
    pub config: AppConfig,
    pub overlay: Arc<dyn Overlay>,
    pub dispatcher: Dispatcher,
    pub status_tx: StatusSink,
    pub status_rx: mpsc::UnboundedReceiver<StatusMessage>,
    /// Probe target for the health-check task (large-model mode).
    pub llm: Option<Arc<dyn LlmTranslator>>,
    pub tts: Option<Arc<dyn TtsEngine>>,
    pub session_log: Option<SessionLog>,
    pub learn: Option<LearnChannel>,
    /// Lexicon scorer for OCR candidate correction (MT path).
    pub scorer: Option<Arc<dyn TextScorer>>,
    /// Unwanted-pattern block list applied by the recognize stage.
    pub blocked_patterns: Vec<String>,

    pub frame_source: Option<Arc<dyn FrameSource>>,
    pub recognizer: Option<Arc<dyn Recognizer>>,
    pub audio_source: Option<Arc<dyn AudioSource>>,
    pub transcriber: Option<Arc<dyn Transcriber>>,
}

// ---------------------------------------------------------------------------
// PipelineHandle
// ---------------------------------------------------------------------------

/// Running pipeline. Call [`shutdown`](Self::shutdown) to stop it.
pub struct PipelineHandle {
    flags: SharedFlags,
    tasks: Vec<JoinHandle<()>>,
    health_task: Option<JoinHandle<()>>,
    overlay: Arc<dyn Overlay>,
    tts: Option<Arc<dyn TtsEngine>>,
}

impl PipelineHandle {
    /// Shared pause/run flags (the UI layer toggles pause through these).
    pub fn flags(&self) -> SharedFlags {
        Arc::clone(&self.flags)
    }

    /// Cooperative shutdown: clear `running`, stop TTS without waiting
    /// for its queue, join every worker within the 3 s budget, close the
    /// overlay.
    pub async fn shutdown(self) {
        self.flags.stop();
        if let Some(tts) = &self.tts {
            tts.stop();
        }
        if let Some(health) = self.health_task {
            health.abort();
        }

        let deadline = Instant::now() + SHUTDOWN_BUDGET;
        for task in self.tasks {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if tokio::time::timeout(remaining, task).await.is_err() {
                log::warn!("pipeline: worker did not stop within the shutdown budget");
            }
        }

        if let Some(tts) = &self.tts {
            tts.shutdown();
        }
        self.overlay.close();
        log::info!("pipeline: shut down");
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Stage-wiring entry point.
pub struct Pipeline;

impl Pipeline {
    /// Spawn all workers for the configured mode and return the handle.
    pub fn start(parts: PipelineParts) -> PipelineHandle {
        let flags = new_shared_flags();
        let mode = parts.config.transcription_mode;
        let queue_cap = match mode {
            TranscriptionMode::Ocr => OCR_QUEUE_CAP,
            TranscriptionMode::Audio => AUDIO_QUEUE_CAP,
        };
        let drain_per_tick = match mode {
            TranscriptionMode::Ocr => OCR_DRAIN_PER_TICK,
            TranscriptionMode::Audio => AUDIO_DRAIN_PER_TICK,
        };

        let text_q = Arc::new(NewestWins::<Commit>::new(queue_cap));
        let translated_q = Arc::new(NewestWins::new(queue_cap));
        let keyword_q = Arc::new(NewestWins::<String>::new(KEYWORD_QUEUE_CAP));
        let shown_texts: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let learn_text: Arc<Mutex<String>> = Arc::new(Mutex::new(String::new()));

        let counters = parts.dispatcher.counters();
        let fallback = parts.dispatcher.fallback_flag();
        let mut tasks = Vec::new();

        // ── Source stages ────────────────────────────────────────────────
        match mode {
            TranscriptionMode::Ocr => {
                let frame_source = parts
                    .frame_source
                    .expect("OCR mode requires a frame source");
                let recognizer = parts.recognizer.expect("OCR mode requires a recognizer");

                let capture_q = Arc::new(NewestWins::<Frame>::new(1));
                tasks.push(tokio::spawn(capture_task(
                    Arc::clone(&flags),
                    frame_source,
                    Arc::clone(&parts.overlay),
                    Arc::clone(&capture_q),
                    parts.config.gate.allow_overlap,
                )));
                tasks.push(tokio::spawn(recognize_task(
                    Arc::clone(&flags),
                    parts.config.clone(),
                    recognizer,
                    capture_q,
                    Arc::clone(&text_q),
                    parts.status_tx.clone(),
                    parts.scorer.clone(),
                    parts.blocked_patterns.clone(),
                    Arc::clone(&shown_texts),
                    Arc::clone(&learn_text),
                )));
            }
            TranscriptionMode::Audio => {
                let audio_source = parts
                    .audio_source
                    .expect("audio mode requires an audio source");
                let transcriber = parts
                    .transcriber
                    .expect("audio mode requires a transcriber");

                let chunk_queue = Arc::new(Mutex::new(AudioQueue::new(
                    parts.config.audio.silence_threshold,
                )));
                tasks.push(tokio::spawn(audio_capture_task(
                    Arc::clone(&flags),
                    audio_source,
                    Arc::clone(&chunk_queue),
                    parts.status_tx.clone(),
                )));
                tasks.push(tokio::spawn(audio_process_task(
                    Arc::clone(&flags),
                    parts.config.clone(),
                    transcriber,
                    chunk_queue,
                    Arc::clone(&text_q),
                    parts.blocked_patterns.clone(),
                )));
            }
        }

        // ── Translate worker ─────────────────────────────────────────────
        tasks.push(tokio::spawn(translate_task(
            Arc::clone(&flags),
            parts.dispatcher,
            Arc::clone(&text_q),
            Arc::clone(&translated_q),
            parts.learn.is_some().then(|| Arc::clone(&keyword_q)),
            parts.session_log,
            mode,
        )));

        // ── Learn side-channel ───────────────────────────────────────────
        if let Some(learn) = parts.learn {
            tasks.push(tokio::spawn(keyword_task(
                Arc::clone(&flags),
                learn,
                Arc::clone(&keyword_q),
                Arc::clone(&learn_text),
            )));
        }

        // ── UI tick ──────────────────────────────────────────────────────
        tasks.push(tokio::spawn(ui_tick_task(
            Arc::clone(&flags),
            parts.config.clone(),
            Arc::clone(&parts.overlay),
            Arc::clone(&translated_q),
            parts.status_rx,
            counters,
            Arc::clone(&shown_texts),
            parts.tts.clone(),
            drain_per_tick,
        )));

        // ── Health check ─────────────────────────────────────────────────
        let health_task = match (parts.config.translation.use_large_model, parts.llm) {
            (true, Some(llm)) => Some(tokio::spawn(Dispatcher::health_check_loop(
                llm,
                fallback,
                parts.status_tx.clone(),
                Duration::from_secs(parts.config.translation.health_check_interval_secs),
            ))),
            _ => None,
        };

        PipelineHandle {
            flags,
            tasks,
            health_task,
            overlay: parts.overlay,
            tts: parts.tts,
        }
    }
}

fn gate_status(sink: &StatusSink, text: &str) {
    let _ = sink.send(StatusMessage::new(
        text,
        Instant::now() + Duration::from_secs(GATE_STATUS_SECS),
        false,
    ));
}

// ---------------------------------------------------------------------------
// Capture task (OCR)
// ---------------------------------------------------------------------------

async fn capture_task(
    flags: SharedFlags,
    source: Arc<dyn FrameSource>,
    overlay: Arc<dyn Overlay>,
    capture_q: Arc<NewestWins<Frame>>,
    allow_overlap: bool,
) {
    let mut policy = OverlapPolicy::new(allow_overlap);

    while flags.is_running() {
        if flags.ocr_paused() {
            tokio::time::sleep(CAPTURE_PERIOD).await;
            continue;
        }

        let region = source.region();
        let overlay_rect = overlay.rect();
        let frame = match policy.decide(&region, overlay_rect.as_ref(), Instant::now()) {
            OverlapAction::Capture => {
                let src = Arc::clone(&source);
                tokio::task::spawn_blocking(move || src.capture())
                    .await
                    .ok()
                    .flatten()
            }
            OverlapAction::SnapAway(direction) => {
                overlay.snap_away_from_ocr(&region, direction);
                None
            }
            OverlapAction::HideAndCapture => {
                flags
                    .hiding_for_capture
                    .store(true, std::sync::atomic::Ordering::SeqCst);
                overlay.hide();
                let src = Arc::clone(&source);
                let frame = tokio::task::spawn_blocking(move || src.capture())
                    .await
                    .ok()
                    .flatten();
                overlay.show();
                flags
                    .hiding_for_capture
                    .store(false, std::sync::atomic::Ordering::SeqCst);
                frame
            }
            OverlapAction::Throttled => None,
        };

        if let Some(frame) = frame {
            capture_q.push(frame);
        }
        tokio::time::sleep(CAPTURE_PERIOD).await;
    }
}

// ---------------------------------------------------------------------------
// Recognize task (OCR)
// ---------------------------------------------------------------------------

#[allow(clippy::too_many_arguments)]
async fn recognize_task(
    flags: SharedFlags,
    config: AppConfig,
    recognizer: Arc<dyn Recognizer>,
    capture_q: Arc<NewestWins<Frame>>,
    text_q: Arc<NewestWins<Commit>>,
    status_tx: StatusSink,
    scorer: Option<Arc<dyn TextScorer>>,
    blocked_patterns: Vec<String>,
    shown_texts: Arc<Mutex<Vec<String>>>,
    learn_text: Arc<Mutex<String>>,
) {
    let use_large_model = config.translation.use_large_model;
    let mut gate = Gate::new(config.gate.clone(), config.source_lang.clone());
    let mut reconciler = if use_large_model {
        StreamReconciler::Llm(LlmReconciler::new(
            config.reconciler.ocr_llm_reconciler_stability,
            config.reconciler.ocr_llm_reconciler_max_buffer,
        ))
    } else {
        StreamReconciler::Mt(MtReconciler::new(
            config.reconciler.ocr_mt_reconciler_stability,
        ))
    };

    let mut last_hash: Option<FrameHash> = None;
    let mut last_ocr: Option<Instant> = None;

    while flags.is_running() {
        let frame = match capture_q.pop_timeout(DEQUEUE_TIMEOUT).await {
            Some(f) => f,
            None => continue,
        };
        if flags.ocr_paused() {
            continue;
        }

        // Temporal mixed-content detection runs on raw frames.
        if let Some(reason) = gate.observe_frame(&frame) {
            flags.pause_ocr();
            gate_status(&status_tx, reason.message());
            gate.reset();
            reconciler.reset();
            continue;
        }

        // Unchanged frames are skipped until the force-refresh timer.
        let now = Instant::now();
        let hash = frame.perceptual_hash();
        let changed = last_hash != Some(hash);
        let force = last_ocr
            .map(|t| now.duration_since(t) >= FORCE_REFRESH)
            .unwrap_or(true);
        if !changed && !force {
            continue;
        }
        last_hash = Some(hash);
        last_ocr = Some(now);

        // Crop to the estimated text band once it stabilizes.
        let frame = match gate.crop_band() {
            Some((top, bottom)) => frame.crop_rows(top, bottom).unwrap_or(frame),
            None => frame,
        };

        let want_boxes = config.gate.auto_detect_text_region || !use_large_model;
        let rec = Arc::clone(&recognizer);
        let mut result = tokio::task::spawn_blocking(move || rec.process(&frame, want_boxes))
            .await
            .unwrap_or_else(|_| crate::recognize::RecognitionResult::empty());

        result.text = filter_transcript(&result.text, None, &blocked_patterns);
        let raw_text = result.text.clone();

        // Candidate-based correction feeds the MT path only.
        if !use_large_model {
            if let Some(scorer) = &scorer {
                result.text = correct(&result.text, &result.candidates, scorer.as_ref());
            }
        }

        // The self-echo rule sees everything we draw: translations and the
        // learn panel.
        let mut displayed = shown_texts.lock().unwrap().clone();
        {
            let panel = learn_text.lock().unwrap();
            if !panel.is_empty() {
                displayed.push(panel.clone());
            }
        }
        match gate.check(
            &result,
            flags.ocr_paused(),
            displayed.iter().map(String::as_str),
        ) {
            GateDecision::Pass => {
                if let Some(mut commit) = reconciler.ingest(&result.text, Instant::now()) {
                    if count_words(&commit.text)
                        >= config.reconciler.ocr_min_words_before_translate
                    {
                        if raw_text != commit.text && !raw_text.is_empty() {
                            commit.raw_source = Some(raw_text);
                        }
                        text_q.push(commit);
                    }
                }
            }
            GateDecision::Drop(reason) => {
                log::trace!("gate: dropped recognition ({reason:?})");
            }
            GateDecision::Pause(reason) => {
                flags.pause_ocr();
                gate_status(&status_tx, reason.message());
                gate.reset();
                reconciler.reset();
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Audio capture task
// ---------------------------------------------------------------------------

async fn audio_capture_task(
    flags: SharedFlags,
    source: Arc<dyn AudioSource>,
    queue: Arc<Mutex<AudioQueue>>,
    status_tx: StatusSink,
) {
    let flags_blocking = Arc::clone(&flags);
    let result = tokio::task::spawn_blocking(move || {
        let mut last_overflow_status: Option<Instant> = None;
        while flags_blocking.is_running() {
            let chunk = match source.next_chunk() {
                Some(c) => c,
                None => break,
            };
            if flags_blocking.audio_paused() {
                continue;
            }
            let outcome = queue.lock().unwrap().push(chunk);
            if matches!(outcome, crate::capture::PushOutcome::Overflowed) {
                let now = Instant::now();
                let due = last_overflow_status
                    .map(|t| now.duration_since(t) >= OVERFLOW_STATUS_PERIOD)
                    .unwrap_or(true);
                if due {
                    last_overflow_status = Some(now);
                    gate_status(&status_tx, "Audio backlog — dropping oldest chunks");
                }
            }
        }
    })
    .await;

    if result.is_err() {
        log::warn!("pipeline: audio capture task panicked");
    }
}

// ---------------------------------------------------------------------------
// Audio process task
// ---------------------------------------------------------------------------

async fn audio_process_task(
    flags: SharedFlags,
    config: AppConfig,
    transcriber: Arc<dyn Transcriber>,
    queue: Arc<Mutex<AudioQueue>>,
    text_q: Arc<NewestWins<Commit>>,
    blocked_patterns: Vec<String>,
) {
    let audio = &config.audio;
    let sample_rate = audio.sample_rate;
    let min_samples = (sample_rate / 2) as usize; // 0.5 s before transcribing

    let mut reconciler = AudioReconciler::new(
        audio.audio_reconciler_period_sec,
        audio.audio_reconciler_num_checks,
        audio.audio_reconciler_min_words,
    );
    let mut phrase: Vec<f32> = Vec::new();
    let mut prompt: Option<String> = None;
    let mut last_transcribed_len = 0usize;

    let mut interval = tokio::time::interval(Duration::from_secs_f64(audio.chunk_duration));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    while flags.is_running() {
        interval.tick().await;

        for chunk in queue.lock().unwrap().pop_for_tick() {
            phrase.extend_from_slice(&chunk);
        }
        if phrase.is_empty() {
            continue;
        }
        if flags.audio_paused() {
            phrase.clear();
            last_transcribed_len = 0;
            reconciler.reset();
            continue;
        }

        let cut = phrase_cut(
            &phrase,
            sample_rate,
            audio.silence_threshold,
            audio.audio_silence_duration,
            audio.audio_max_phrase_duration,
        );

        let grown = phrase.len() != last_transcribed_len;
        if phrase.len() >= min_samples && (grown || cut.is_some()) {
            if rms(&phrase) >= audio.silence_threshold {
                let buf = phrase.clone();
                let p = prompt.clone();
                let t = Arc::clone(&transcriber);
                let raw = tokio::task::spawn_blocking(move || t.transcribe(&buf, p.as_deref()))
                    .await
                    .unwrap_or_default();
                let cleaned = filter_transcript(&raw, prompt.as_deref(), &blocked_patterns);
                if !cleaned.is_empty() {
                    if let Some(commit) = reconciler.ingest(&cleaned, Instant::now()) {
                        prompt = Some(commit.text.clone());
                        text_q.push(commit);
                        phrase.clear();
                        last_transcribed_len = 0;
                        continue;
                    }
                }
                last_transcribed_len = phrase.len();
            }
        }

        // Phrase boundary: whatever the reconciler did not take is over.
        if cut.is_some() {
            phrase.clear();
            last_transcribed_len = 0;
            reconciler.reset();
        }
    }
}

// ---------------------------------------------------------------------------
// Translate worker
// ---------------------------------------------------------------------------

async fn translate_task(
    flags: SharedFlags,
    mut dispatcher: Dispatcher,
    text_q: Arc<NewestWins<Commit>>,
    translated_q: Arc<NewestWins<crate::translate::TranslationResult>>,
    keyword_q: Option<Arc<NewestWins<String>>>,
    mut session_log: Option<SessionLog>,
    mode: TranscriptionMode,
) {
    let mut recent = RecentSources::new();

    while flags.is_running() {
        let commit = match text_q.pop_timeout(DEQUEUE_TIMEOUT).await {
            Some(c) => c,
            None => continue,
        };

        if recent.check_and_record(&commit.text, Instant::now()) {
            log::trace!("translate: deduplicated source variant");
            continue;
        }

        let result = dispatcher.translate(&commit).await;
        log::debug!(
            "translate: [{}] {:.40} -> {:.60}",
            result.provider_name,
            result.source_text,
            result.translated_text
        );

        if let Some(log_buf) = &mut session_log {
            log_buf.append(SessionEntry {
                ocr_raw: match mode {
                    TranscriptionMode::Ocr => commit.raw_source.clone(),
                    TranscriptionMode::Audio => None,
                },
                source_text: result.source_text.clone(),
                translation: result.translated_text.clone(),
                model: result.provider_name.clone(),
                timestamp: chrono::Utc::now().timestamp(),
            });
        }

        if let Some(kq) = &keyword_q {
            if has_cjk(&result.source_text) {
                kq.push(result.source_text.clone());
            }
        }

        translated_q.push(result);
    }

    if let Some(log_buf) = &mut session_log {
        if let Err(e) = log_buf.flush() {
            log::warn!("pipeline: final session flush failed: {e}");
        }
    }
}

// ---------------------------------------------------------------------------
// Keyword task (learn side-channel)
// ---------------------------------------------------------------------------

async fn keyword_task(
    flags: SharedFlags,
    learn: LearnChannel,
    keyword_q: Arc<NewestWins<String>>,
    learn_text: Arc<Mutex<String>>,
) {
    let LearnChannel {
        mut extractor,
        segmenter,
        dictionary,
        mut dispatcher,
        sink,
    } = learn;

    while flags.is_running() {
        let source = match keyword_q.pop_timeout(DEQUEUE_TIMEOUT).await {
            Some(s) => s,
            None => continue,
        };

        let words = extractor.select(&source, segmenter.as_ref());
        let mut keywords = Vec::with_capacity(words.len());
        for word in words {
            let fallback = if dictionary.lookup(&word).is_none() {
                dispatcher.translate_fragment(&word).await
            } else {
                None
            };
            keywords.push(KeywordExtractor::resolve(
                &word,
                dictionary.as_ref(),
                fallback,
            ));
        }

        if let Some(batch) = extractor.admit(keywords) {
            *learn_text.lock().unwrap() = batch.panel_text();
            let _ = sink.send(batch);
        }
    }
}

// ---------------------------------------------------------------------------
// UI tick task
// ---------------------------------------------------------------------------

#[allow(clippy::too_many_arguments)]
async fn ui_tick_task(
    flags: SharedFlags,
    config: AppConfig,
    overlay: Arc<dyn Overlay>,
    translated_q: Arc<NewestWins<crate::translate::TranslationResult>>,
    mut status_rx: mpsc::UnboundedReceiver<StatusMessage>,
    counters: crate::translate::WordCounters,
    shown_texts: Arc<Mutex<Vec<String>>>,
    tts: Option<Arc<dyn TtsEngine>>,
    drain_per_tick: usize,
) {
    let mut stack = DisplayStack::new(config.display.clone());
    let mut board = StatusBoard::new();
    let mut last_paused = flags.ocr_paused() || flags.audio_paused();
    let mut interval = tokio::time::interval(TICK_PERIOD);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    while flags.is_running() {
        interval.tick().await;
        let now = Instant::now();

        // Reflect pause-state changes (user or gate initiated).
        let paused = flags.ocr_paused() || flags.audio_paused();
        if paused != last_paused {
            last_paused = paused;
            overlay.update_play_pause_state();
        }

        // Transient statuses.
        let mut board_dirty = false;
        while let Ok(msg) = status_rx.try_recv() {
            board.push(msg);
            board_dirty = true;
        }
        let live = board.live(now);
        if board_dirty || !live.is_empty() {
            overlay.set_status_messages(&live);
        }

        // Translations.
        let mut stack_dirty = false;
        for _ in 0..drain_per_tick {
            let result = match translated_q.try_pop() {
                Some(r) => r,
                None => break,
            };
            if stack.push(&result, now) {
                stack_dirty = true;
                if result.is_final {
                    if let Some(tts) = &tts {
                        tts.speak(&result.translated_text, &config.target_lang);
                    }
                }
            }
        }

        if stack_dirty {
            let allow_show = !flags
                .hiding_for_capture
                .load(std::sync::atomic::Ordering::SeqCst);
            overlay.update_text(&stack.display_text(), allow_show, stack.bottom_is_partial());
            *shown_texts.lock().unwrap() = stack.shown_texts(now);
            overlay.set_info_pill_text(&counters.lock().unwrap());
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
