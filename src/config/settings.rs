//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// TranscriptionMode
// ---------------------------------------------------------------------------

/// Selects the source stage of the pipeline.
///
/// | Variant | Source                                   |
/// |---------|------------------------------------------|
/// | Ocr     | Screen-region capture → OCR              |
/// | Audio   | Live audio input → speech recognition    |
///
/// Everything downstream of the reconcilers is identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptionMode {
    Ocr,
    Audio,
}

impl Default for TranscriptionMode {
    fn default() -> Self {
        Self::Ocr
    }
}

// ---------------------------------------------------------------------------
// LlmProvider
// ---------------------------------------------------------------------------

/// Selects which LLM backend handles large-model translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// SiliconFlow (CN) — OpenAI-compatible. `SILICONFLOW_API_KEY`.
    SiliconFlow,
    /// OpenAI. `OPENAI_API_KEY`.
    OpenAi,
    /// DeepSeek (CN) — OpenAI-compatible. `DEEPSEEK_API_KEY`.
    DeepSeek,
    /// Anthropic Claude via the Messages API. `ANTHROPIC_API_KEY`.
    Anthropic,
}

impl LlmProvider {
    /// Display name used in status messages ("switching back to {LLM}").
    pub fn display_name(&self) -> &'static str {
        match self {
            LlmProvider::SiliconFlow => "SiliconFlow",
            LlmProvider::OpenAi => "OpenAI",
            LlmProvider::DeepSeek => "DeepSeek",
            LlmProvider::Anthropic => "Anthropic",
        }
    }
}

impl Default for LlmProvider {
    fn default() -> Self {
        Self::SiliconFlow
    }
}

// ---------------------------------------------------------------------------
// TranslationConfig
// ---------------------------------------------------------------------------

/// Settings for the translation dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationConfig {
    /// Route through the LLM provider instead of the classical MT chain.
    pub use_large_model: bool,
    /// Which LLM backend to use when `use_large_model` is on.
    pub llm_provider: LlmProvider,
    /// Number of recent `(source, translation)` pairs fed to the LLM as
    /// context.
    pub llm_context_count: usize,
    /// Seconds before an in-flight LLM call is abandoned.
    pub llm_timeout_secs: u64,
    /// Seconds before an MT provider call is abandoned.
    pub mt_timeout_secs: u64,
    /// Seconds between health-check probes while in MT-fallback state.
    pub health_check_interval_secs: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            use_large_model: false,
            llm_provider: LlmProvider::default(),
            llm_context_count: 3,
            llm_timeout_secs: 15,
            mt_timeout_secs: 10,
            health_check_interval_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// GateConfig
// ---------------------------------------------------------------------------

/// Settings for the obstruction gate in front of the reconcilers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Enable the temporal mixed-content detector (static banner next to
    /// moving subtitles pauses OCR).
    pub detect_mixed_content: bool,
    /// Enforce the word-count cap below.
    pub max_words_enabled: bool,
    /// Maximum word count (CJK chars + Latin tokens) per recognition.
    pub max_words_for_translation: usize,
    /// When the overlay overlaps the capture region: `true` hides the
    /// overlay for a throttled capture, `false` snaps the overlay away.
    pub allow_overlap: bool,
    /// Crop frames to the estimated text band after a short warm-up.
    pub auto_detect_text_region: bool,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            detect_mixed_content: true,
            max_words_enabled: false,
            max_words_for_translation: 50,
            allow_overlap: false,
            auto_detect_text_region: false,
        }
    }
}

// ---------------------------------------------------------------------------
// ReconcilerConfig
// ---------------------------------------------------------------------------

/// Stability and commit thresholds for the streaming reconcilers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    /// Seconds of stability before the MT-path reconciler commits.
    pub ocr_mt_reconciler_stability: f64,
    /// Seconds of stability before the LLM-path reconciler commits.
    pub ocr_llm_reconciler_stability: f64,
    /// Seconds after which the LLM-path reconciler commits regardless.
    pub ocr_llm_reconciler_max_buffer: f64,
    /// Minimum word count for a commit to reach the translation worker.
    pub ocr_min_words_before_translate: usize,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            ocr_mt_reconciler_stability: 0.2,
            ocr_llm_reconciler_stability: 0.12,
            ocr_llm_reconciler_max_buffer: 0.6,
            ocr_min_words_before_translate: 1,
        }
    }
}

// ---------------------------------------------------------------------------
// AudioConfig
// ---------------------------------------------------------------------------

/// Settings for audio capture and the audio reconciler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Sample rate in Hz fed to the transcriber (must be 16 000).
    pub sample_rate: u32,
    /// RMS amplitude below which a chunk counts as silence.
    pub silence_threshold: f32,
    /// Duration of each capture chunk in seconds.
    pub chunk_duration: f64,
    /// Seconds of trailing silence that finalizes a phrase.
    pub audio_silence_duration: f64,
    /// Seconds after which a phrase is finalized even without silence.
    pub audio_max_phrase_duration: f64,
    /// Max seconds the audio reconciler waits before forcing a send.
    pub audio_reconciler_period_sec: f64,
    /// Completion checks within that period before forcing a send.
    pub audio_reconciler_num_checks: u32,
    /// Minimum word count before the audio reconciler sends anything.
    pub audio_reconciler_min_words: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            silence_threshold: 0.01,
            chunk_duration: 0.2,
            audio_silence_duration: 1.0,
            audio_max_phrase_duration: 5.0,
            audio_reconciler_period_sec: 2.0,
            audio_reconciler_num_checks: 4,
            audio_reconciler_min_words: 7,
        }
    }
}

// ---------------------------------------------------------------------------
// DisplayConfig
// ---------------------------------------------------------------------------

/// Similarity thresholds for the display stack's duplicate suppression.
///
/// The overlap ratio and minimum token count are empirical; they are
/// exposed here rather than hard-coded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Minimum length (both sides) before the substring rule rejects a
    /// new translation contained in a previous one.
    pub ocr_similarity_substring_chars: usize,
    /// Token-set overlap ratio at or above which two translations are
    /// considered duplicates.
    pub token_overlap_ratio: f64,
    /// Both texts need at least this many content tokens for the overlap
    /// rule to apply.
    pub min_content_tokens: usize,
    /// Seconds a translation stays in the recent-translations window.
    pub recent_window_secs: f64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            ocr_similarity_substring_chars: 20,
            token_overlap_ratio: 0.65,
            min_content_tokens: 8,
            recent_window_secs: 12.0,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Session log settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Write a JSON session log of committed translations.
    pub session_output_enabled: bool,
    /// Directory for session files — `None` means the platform data dir.
    pub session_output_path: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_output_enabled: false,
            session_output_path: None,
        }
    }
}

// ---------------------------------------------------------------------------
// LearnConfig
// ---------------------------------------------------------------------------

/// Learn side-channel settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnConfig {
    /// Extract keywords from committed Chinese source text.
    pub enabled: bool,
    /// Maximum keywords per batch.
    pub max_keywords: usize,
}

impl Default for LearnConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_keywords: 8,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use live_translate::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Which source stage feeds the pipeline.
    pub transcription_mode: TranscriptionMode,
    /// Source language code, or `"auto"`.
    pub source_lang: String,
    /// Target language code.
    pub target_lang: String,
    /// Translation dispatcher settings.
    pub translation: TranslationConfig,
    /// Obstruction gate settings.
    pub gate: GateConfig,
    /// Streaming reconciler thresholds.
    pub reconciler: ReconcilerConfig,
    /// Audio capture and audio reconciler settings.
    pub audio: AudioConfig,
    /// Display stack similarity tunables.
    pub display: DisplayConfig,
    /// Session log settings.
    pub session: SessionConfig,
    /// Learn side-channel settings.
    pub learn: LearnConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            transcription_mode: TranscriptionMode::default(),
            source_lang: "auto".into(),
            target_lang: "en".into(),
            translation: TranslationConfig::default(),
            gate: GateConfig::default(),
            reconciler: ReconcilerConfig::default(),
            audio: AudioConfig::default(),
            display: DisplayConfig::default(),
            session: SessionConfig::default(),
            learn: LearnConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// (first-run scenario) so callers never need to special-case a missing
    /// file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// Verify that a default `AppConfig` can be serialised to TOML and
    /// deserialised back without any data loss.
    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = AppConfig::default();
        original.save_to(&path).expect("save");

        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(original.transcription_mode, loaded.transcription_mode);
        assert_eq!(original.source_lang, loaded.source_lang);
        assert_eq!(original.target_lang, loaded.target_lang);

        assert_eq!(
            original.translation.use_large_model,
            loaded.translation.use_large_model
        );
        assert_eq!(
            original.translation.llm_context_count,
            loaded.translation.llm_context_count
        );

        assert_eq!(
            original.gate.detect_mixed_content,
            loaded.gate.detect_mixed_content
        );
        assert_eq!(original.gate.allow_overlap, loaded.gate.allow_overlap);

        assert_eq!(
            original.reconciler.ocr_mt_reconciler_stability,
            loaded.reconciler.ocr_mt_reconciler_stability
        );
        assert_eq!(
            original.audio.audio_reconciler_min_words,
            loaded.audio.audio_reconciler_min_words
        );
        assert_eq!(
            original.display.ocr_similarity_substring_chars,
            loaded.display.ocr_similarity_substring_chars
        );
        assert_eq!(
            original.session.session_output_enabled,
            loaded.session.session_output_enabled
        );
    }

    /// `load_from` on a non-existent path must return `Default` without error.
    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        let default = AppConfig::default();

        assert_eq!(config.transcription_mode, default.transcription_mode);
        assert_eq!(config.target_lang, default.target_lang);
        assert_eq!(
            config.audio.audio_reconciler_period_sec,
            default.audio.audio_reconciler_period_sec
        );
    }

    /// Verify default values match the design numbers.
    #[test]
    fn default_values() {
        let cfg = AppConfig::default();

        assert_eq!(cfg.transcription_mode, TranscriptionMode::Ocr);
        assert_eq!(cfg.source_lang, "auto");
        assert_eq!(cfg.target_lang, "en");

        assert!(!cfg.translation.use_large_model);
        assert_eq!(cfg.translation.llm_context_count, 3);
        assert_eq!(cfg.translation.llm_timeout_secs, 15);
        assert_eq!(cfg.translation.mt_timeout_secs, 10);
        assert_eq!(cfg.translation.health_check_interval_secs, 30);

        assert_eq!(cfg.reconciler.ocr_mt_reconciler_stability, 0.2);
        assert_eq!(cfg.reconciler.ocr_llm_reconciler_stability, 0.12);
        assert_eq!(cfg.reconciler.ocr_llm_reconciler_max_buffer, 0.6);

        assert_eq!(cfg.audio.sample_rate, 16_000);
        assert_eq!(cfg.audio.audio_reconciler_num_checks, 4);
        assert_eq!(cfg.audio.audio_reconciler_min_words, 7);

        assert_eq!(cfg.display.token_overlap_ratio, 0.65);
        assert_eq!(cfg.display.min_content_tokens, 8);
    }

    /// Verify that modified non-default values survive a round trip.
    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("modified.toml");

        let mut cfg = AppConfig::default();
        cfg.transcription_mode = TranscriptionMode::Audio;
        cfg.source_lang = "zh".into();
        cfg.target_lang = "fr".into();
        cfg.translation.use_large_model = true;
        cfg.translation.llm_provider = LlmProvider::Anthropic;
        cfg.gate.max_words_enabled = true;
        cfg.gate.max_words_for_translation = 30;
        cfg.reconciler.ocr_mt_reconciler_stability = 0.4;
        cfg.session.session_output_enabled = true;
        cfg.session.session_output_path = Some("/tmp/sessions".into());

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded.transcription_mode, TranscriptionMode::Audio);
        assert_eq!(loaded.source_lang, "zh");
        assert_eq!(loaded.target_lang, "fr");
        assert!(loaded.translation.use_large_model);
        assert_eq!(loaded.translation.llm_provider, LlmProvider::Anthropic);
        assert!(loaded.gate.max_words_enabled);
        assert_eq!(loaded.gate.max_words_for_translation, 30);
        assert_eq!(loaded.reconciler.ocr_mt_reconciler_stability, 0.4);
        assert_eq!(
            loaded.session.session_output_path.as_deref(),
            Some("/tmp/sessions")
        );
    }
}
