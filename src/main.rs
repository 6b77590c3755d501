//! Application entry point — live-translate demo shell.
//!
//! The platform capture primitives, OCR engine, and overlay toolkit live
//! outside this crate, so the binary wires the core against line-driven
//! stand-ins: every line typed on stdin plays the role of a recognition
//! frame (OCR mode) or a re-transcription (audio mode), and a console
//! overlay prints what the real overlay would draw. The full pipeline —
//! gate, reconciler, dispatcher with provider fallback, display stack,
//! session log — runs unmodified.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Build the provider chains and the [`Dispatcher`] from config and
//!    environment API keys.
//! 4. Assemble the pipeline parts for the configured mode.
//! 5. Spawn the pipeline and a stdin reader thread.
//! 6. Wait for ctrl-c, then shut down cooperatively.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tokio::sync::mpsc;

use live_translate::capture::{AudioSource, Frame, FrameSource, Region};
use live_translate::config::{AppConfig, TranscriptionMode};
use live_translate::display::StatusMessage;
use live_translate::gate::SnapDirection;
use live_translate::overlay::Overlay;
use live_translate::pipeline::{Pipeline, PipelineParts};
use live_translate::recognize::{RecognitionResult, Recognizer, Transcriber};
use live_translate::session::SessionLog;
use live_translate::translate::{
    build_llm, llm_client, llm_fallback_chain, mt_client, small_model_chain, Dispatcher,
    LlmTranslator,
};

// ---------------------------------------------------------------------------
// Line feed — stdin as the recognition stream
// ---------------------------------------------------------------------------

/// The most recent line typed on stdin. A steady value models a subtitle
/// holding still on screen, which is exactly what the reconcilers need to
/// see to commit.
#[derive(Clone, Default)]
struct LineFeed {
    current: Arc<Mutex<String>>,
}

impl LineFeed {
    fn start_reader(&self) {
        let current = Arc::clone(&self.current);
        std::thread::Builder::new()
            .name("stdin-reader".into())
            .spawn(move || {
                let stdin = std::io::stdin();
                let mut line = String::new();
                loop {
                    line.clear();
                    match stdin.read_line(&mut line) {
                        Ok(0) | Err(_) => break,
                        Ok(_) => {
                            *current.lock().unwrap() = line.trim().to_string();
                        }
                    }
                }
            })
            .expect("failed to spawn stdin reader");
    }

    fn read(&self) -> String {
        self.current.lock().unwrap().clone()
    }
}

/// Frame source feeding the OCR path: a tiny synthetic frame whose pixel
/// content tracks the current line, so the frame-change gate behaves as
/// it would on a real screen.
struct LineFrameSource {
    feed: LineFeed,
}

impl FrameSource for LineFrameSource {
    fn capture(&self) -> Option<Frame> {
        let line = self.feed.read();
        let mut seed = 0u8;
        for b in line.bytes() {
            seed = seed.wrapping_mul(31).wrapping_add(b);
        }
        Some(Frame::solid(seed, 64, 16, Instant::now()))
    }

    fn region(&self) -> Region {
        Region::new(0, 0, 800, 120)
    }
}

/// Recognizer that "reads" the current line off the synthetic frame.
struct LineRecognizer {
    feed: LineFeed,
}

impl Recognizer for LineRecognizer {
    fn process(&self, _frame: &Frame, _want_boxes: bool) -> RecognitionResult {
        RecognitionResult::text_only(self.feed.read())
    }
}

/// Audio-mode stand-ins: a quiet tone keeps the processing loop ticking,
/// and the "transcriber" returns the current line.
struct ToneSource;

impl AudioSource for ToneSource {
    fn next_chunk(&self) -> Option<Vec<f32>> {
        std::thread::sleep(std::time::Duration::from_millis(200));
        Some(vec![0.05f32; 3_200])
    }
}

struct LineTranscriber {
    feed: LineFeed,
}

impl Transcriber for LineTranscriber {
    fn transcribe(&self, _audio: &[f32], _prompt: Option<&str>) -> String {
        self.feed.read()
    }
}

// ---------------------------------------------------------------------------
// Console overlay
// ---------------------------------------------------------------------------

/// Prints what the real overlay would draw.
struct ConsoleOverlay;

impl Overlay for ConsoleOverlay {
    fn update_text(&self, text: &str, allow_show: bool, partial_last: bool) {
        if !allow_show {
            return;
        }
        let marker = if partial_last { "…" } else { "" };
        println!("──────────\n{text}{marker}");
    }

    fn set_status_messages(&self, messages: &[StatusMessage]) {
        for msg in messages {
            let tone = if msg.is_good_news { "ok" } else { "!" };
            println!("[{tone}] {}", msg.text);
        }
    }

    fn set_info_pill_text(&self, counters: &HashMap<String, u64>) {
        if counters.is_empty() {
            return;
        }
        let mut parts: Vec<String> =
            counters.iter().map(|(k, v)| format!("{k}: {v}w")).collect();
        parts.sort();
        println!("({})", parts.join(", "));
    }

    fn update_play_pause_state(&self) {}

    fn snap_away_from_ocr(&self, _region: &Region, direction: SnapDirection) {
        println!("[overlay would snap {direction:?}]");
    }

    fn hide(&self) {}
    fn show(&self) {}

    fn rect(&self) -> Option<Region> {
        None
    }

    fn close(&self) {}
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("live-translate starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3. Providers + dispatcher
    let (status_tx, status_rx) = mpsc::unbounded_channel();
    let mt = mt_client(config.translation.mt_timeout_secs);

    let llm: Option<Arc<dyn LlmTranslator>> = config.translation.use_large_model.then(|| {
        build_llm(
            config.translation.llm_provider,
            llm_client(config.translation.llm_timeout_secs),
            &config.source_lang,
            &config.target_lang,
        )
    });
    let mt_chain = if config.translation.use_large_model {
        llm_fallback_chain(&mt, &config.source_lang, &config.target_lang)
    } else {
        small_model_chain(&mt, &config.source_lang, &config.target_lang)
    };
    let dispatcher = Dispatcher::new(
        llm.clone(),
        mt_chain,
        config.target_lang.clone(),
        config.translation.llm_context_count,
        status_tx.clone(),
    );

    // 4. Session log
    let session_log = config.session.session_output_enabled.then(|| {
        let dir = config
            .session
            .session_output_path
            .clone()
            .map(std::path::PathBuf::from)
            .unwrap_or_else(|| live_translate::config::AppPaths::new().sessions_dir);
        SessionLog::new(dir, config.clone())
    });

    // 5. Mode sources (stdin-driven stand-ins; see module docs)
    if config.learn.enabled {
        log::warn!("learn channel needs a segmenter and dictionary; unavailable in the demo shell");
    }
    let feed = LineFeed::default();
    feed.start_reader();

    let mut parts = PipelineParts {
        config: config.clone(),
        overlay: Arc::new(ConsoleOverlay),
        dispatcher,
        status_tx,
        status_rx,
        llm,
        tts: None,
        session_log,
        learn: None,
        scorer: None,
        blocked_patterns: vec![],
        frame_source: None,
        recognizer: None,
        audio_source: None,
        transcriber: None,
    };
    match config.transcription_mode {
        TranscriptionMode::Ocr => {
            parts.frame_source = Some(Arc::new(LineFrameSource { feed: feed.clone() }));
            parts.recognizer = Some(Arc::new(LineRecognizer { feed }));
        }
        TranscriptionMode::Audio => {
            parts.audio_source = Some(Arc::new(ToneSource));
            parts.transcriber = Some(Arc::new(LineTranscriber { feed }));
        }
    }

    // 6. Run until ctrl-c
    let handle = Pipeline::start(parts);
    println!("Type source lines; ctrl-c to quit.");
    tokio::signal::ctrl_c().await?;

    log::info!("shutting down");
    handle.shutdown().await;
    Ok(())
}
