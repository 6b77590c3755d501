//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir (settings):
//!   Windows: %APPDATA%\live-translate\
//!   macOS:   ~/Library/Application Support/live-translate/
//!   Linux:   ~/.config/live-translate/
//!
//! Data dir (session logs):
//!   Windows: %LOCALAPPDATA%\live-translate\
//!   macOS:   ~/Library/Application Support/live-translate/
//!   Linux:   ~/.local/share/live-translate/

use std::path::PathBuf;

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for `settings.toml`.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Default directory for session log files.
    pub sessions_dir: PathBuf,
}

impl AppPaths {
    /// Resolve all paths for the current platform.
    ///
    /// Falls back to the current directory when the platform dirs cannot be
    /// determined (e.g. in a stripped-down container).
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("live-translate");
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("live-translate");

        Self {
            settings_file: config_dir.join("settings.toml"),
            sessions_dir: data_dir.join("sessions"),
            config_dir,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_end_with_app_name() {
        let paths = AppPaths::new();
        assert!(paths.config_dir.ends_with("live-translate"));
        assert_eq!(
            paths.settings_file.file_name().unwrap().to_str().unwrap(),
            "settings.toml"
        );
        assert!(paths.sessions_dir.ends_with("sessions"));
    }
}
