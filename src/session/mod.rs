//! Session log — the append-only record of committed translations.
//!
//! Entries accumulate in memory; every tenth entry the whole session
//! (settings snapshot plus all entries so far) is rewritten to a single
//! JSON file whose name is fixed at first flush. Whole-file rewrite is
//! intentional — at ≤ 10 records per flush a database would be overkill,
//! and the file is always a complete, loadable session.
//!
//! A failed write logs and keeps the buffer; the next flush retries.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AppConfig;

/// Entries buffered between flushes.
const FLUSH_EVERY: usize = 10;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One committed translation record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionEntry {
    /// Raw OCR text when it differed from the committed source; `None`
    /// in audio mode.
    pub ocr_raw: Option<String>,
    pub source_text: String,
    pub translation: String,
    /// Provider name that produced the translation.
    pub model: String,
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
}

/// The on-disk session document.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionFile {
    pub session_start: String,
    pub source_lang: String,
    pub target_lang: String,
    pub transcription_mode: String,
    pub settings: AppConfig,
    pub entries: Vec<SessionEntry>,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("session serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// SessionLog
// ---------------------------------------------------------------------------

/// In-memory session buffer with periodic whole-file flushes.
pub struct SessionLog {
    output_dir: PathBuf,
    config: AppConfig,
    session_start: chrono::DateTime<chrono::Local>,
    entries: Vec<SessionEntry>,
    /// Entries appended since the last successful flush.
    unflushed: usize,
    /// Chosen at first flush; every later flush overwrites it.
    file_path: Option<PathBuf>,
}

impl SessionLog {
    /// Create a log writing into `output_dir`. The directory is created
    /// at first flush.
    pub fn new(output_dir: impl Into<PathBuf>, config: AppConfig) -> Self {
        Self {
            output_dir: output_dir.into(),
            config,
            session_start: chrono::Local::now(),
            entries: Vec::new(),
            unflushed: 0,
            file_path: None,
        }
    }

    /// Append one record; flushes automatically every tenth entry.
    pub fn append(&mut self, entry: SessionEntry) {
        self.entries.push(entry);
        self.unflushed += 1;
        if self.unflushed >= FLUSH_EVERY {
            if let Err(e) = self.flush() {
                // Keep the buffer; the next flush retries everything.
                log::warn!("session: flush failed ({e}); retaining buffer");
            }
        }
    }

    /// Number of entries recorded so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Path of the session file once the first flush has happened.
    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    /// Serialize the whole session to its file, choosing the name on the
    /// first call. Called automatically every tenth entry and once more
    /// at shutdown.
    pub fn flush(&mut self) -> Result<(), SessionError> {
        if self.entries.is_empty() {
            return Ok(());
        }

        std::fs::create_dir_all(&self.output_dir)?;
        let path = match &self.file_path {
            Some(p) => p.clone(),
            None => {
                let name = format!(
                    "session_{}.json",
                    self.session_start.format("%Y%m%d_%H%M%S")
                );
                let p = self.output_dir.join(name);
                self.file_path = Some(p.clone());
                p
            }
        };

        let doc = SessionFile {
            session_start: self.session_start.to_rfc3339(),
            source_lang: self.config.source_lang.clone(),
            target_lang: self.config.target_lang.clone(),
            transcription_mode: match self.config.transcription_mode {
                crate::config::TranscriptionMode::Ocr => "ocr".into(),
                crate::config::TranscriptionMode::Audio => "audio".into(),
            },
            settings: self.config.clone(),
            entries: self.entries.clone(),
        };

        let json = serde_json::to_string_pretty(&doc)?;
        std::fs::write(&path, json)?;
        self.unflushed = 0;
        Ok(())
    }
}

impl SessionFile {
    /// Reload a session document (round-trip checks, tooling).
    pub fn load(path: &Path) -> Result<Self, SessionError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn entry(i: usize) -> SessionEntry {
        SessionEntry {
            ocr_raw: None,
            source_text: format!("源{i}"),
            translation: format!("t{i}"),
            model: "DeepL".into(),
            timestamp: 1_700_000_000 + i as i64,
        }
    }

    #[test]
    fn no_file_before_ten_entries() {
        let dir = tempdir().unwrap();
        let mut log = SessionLog::new(dir.path(), AppConfig::default());
        for i in 0..9 {
            log.append(entry(i));
        }
        assert!(log.file_path().is_none());
    }

    #[test]
    fn tenth_entry_flushes_and_fixes_path() {
        let dir = tempdir().unwrap();
        let mut log = SessionLog::new(dir.path(), AppConfig::default());
        for i in 0..10 {
            log.append(entry(i));
        }
        let path = log.file_path().expect("flushed").to_path_buf();
        assert!(path.exists());
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("session_"));
        assert!(name.ends_with(".json"));

        // Ten more entries overwrite the same file.
        for i in 10..20 {
            log.append(entry(i));
        }
        assert_eq!(log.file_path().unwrap(), path);
        let doc = SessionFile::load(&path).unwrap();
        assert_eq!(doc.entries.len(), 20);
    }

    #[test]
    fn reload_yields_entries_in_order() {
        let dir = tempdir().unwrap();
        let mut log = SessionLog::new(dir.path(), AppConfig::default());
        let originals: Vec<SessionEntry> = (0..12).map(entry).collect();
        for e in &originals {
            log.append(e.clone());
        }
        log.flush().unwrap();

        let doc = SessionFile::load(log.file_path().unwrap()).unwrap();
        assert_eq!(doc.entries, originals);
        assert_eq!(doc.transcription_mode, "ocr");
    }

    #[test]
    fn flush_on_empty_log_is_noop() {
        let dir = tempdir().unwrap();
        let mut log = SessionLog::new(dir.path(), AppConfig::default());
        log.flush().unwrap();
        assert!(log.file_path().is_none());
    }

    #[test]
    fn failed_flush_retains_buffer() {
        // Point the log at a path that cannot be a directory.
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();

        let mut log = SessionLog::new(&blocker, AppConfig::default());
        for i in 0..10 {
            log.append(entry(i));
        }
        // Flush failed but nothing was lost.
        assert_eq!(log.len(), 10);
        assert!(log.flush().is_err());
    }
}
