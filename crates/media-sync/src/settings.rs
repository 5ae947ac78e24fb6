//! User settings, persisted as JSON.
//!
//! Settings are loaded once at startup, changed only through explicit edits
//! (`config set-*`), and saved on every change. Operations receive them as a
//! read-only value.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default number of note ids per `notesInfo` request.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Directory under the platform config dir holding the settings file.
const APP_DIR: &str = "anki-media-sync";
const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Folder checked first when a filename isn't found by name.
    /// Empty means no preferred folder.
    pub media_folder: String,
    /// Note ids per `notesInfo` request. Always at least 1.
    pub batch_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            media_folder: String::new(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl Settings {
    /// Preferred media folder, if one is set.
    pub fn preferred_folder(&self) -> Option<&str> {
        let folder = self.media_folder.trim();
        (!folder.is_empty()).then_some(folder)
    }

    pub fn set_media_folder(&mut self, folder: impl Into<String>) {
        self.media_folder = folder.into();
    }

    /// Set the batch size, rejecting 0.
    pub fn set_batch_size(&mut self, size: usize) -> Result<(), SettingsError> {
        if size == 0 {
            return Err(SettingsError::InvalidBatchSize(size));
        }
        self.batch_size = size;
        Ok(())
    }

    /// Load settings from `path`. A missing file yields the defaults.
    ///
    /// Properties absent from the file take their default values. A stored
    /// batch size of 0 is replaced by the default.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No settings at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(SettingsError::Io {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                });
            }
        };

        let mut settings: Settings =
            serde_json::from_str(&content).map_err(|e| SettingsError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        if settings.batch_size == 0 {
            tracing::warn!(
                "Ignoring batch size 0 in {}, using {}",
                path.display(),
                DEFAULT_BATCH_SIZE
            );
            settings.batch_size = DEFAULT_BATCH_SIZE;
        }

        Ok(settings)
    }

    /// Write settings to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let io_err = |e: std::io::Error| SettingsError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| SettingsError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        fs::write(path, json).map_err(io_err)
    }

    /// Platform settings location: `<config dir>/anki-media-sync/settings.json`.
    pub fn default_path() -> Result<PathBuf, SettingsError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(SETTINGS_FILE))
            .ok_or(SettingsError::NoConfigDir)
    }
}

/// Expand ~ or ~/ prefix to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"))
    } else if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path))
    } else {
        PathBuf::from(path)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Batch size must be greater than 0 (got {0})")]
    InvalidBatchSize(usize),

    #[error("Failed to access settings at {}: {message}", path.display())]
    Io { path: PathBuf, message: String },

    #[error("Invalid settings file {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Could not determine the platform config directory")]
    NoConfigDir,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults() {
        let settings = Settings::default();
        assert_eq!(settings.media_folder, "");
        assert_eq!(settings.batch_size, 50);
        assert_eq!(settings.preferred_folder(), None);
    }

    #[test]
    fn preferred_folder_trims() {
        let mut settings = Settings::default();
        settings.set_media_folder("  attachments ");
        assert_eq!(settings.preferred_folder(), Some("attachments"));
        settings.set_media_folder("   ");
        assert_eq!(settings.preferred_folder(), None);
    }

    #[test]
    fn batch_size_must_be_positive() {
        let mut settings = Settings::default();
        assert!(matches!(
            settings.set_batch_size(0),
            Err(SettingsError::InvalidBatchSize(0))
        ));
        assert_eq!(settings.batch_size, 50);

        settings.set_batch_size(10).unwrap();
        assert_eq!(settings.batch_size, 10);
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/settings.json");

        let mut settings = Settings::default();
        settings.set_media_folder("assets");
        settings.set_batch_size(7).unwrap();
        settings.save(&path).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw, serde_json::json!({"mediaFolder": "assets", "batchSize": 7}));

        assert_eq!(Settings::load(&path).unwrap(), settings);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn partial_file_merges_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"mediaFolder": "images"}"#).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.media_folder, "images");
        assert_eq!(settings.batch_size, DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn zero_batch_size_in_file_falls_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"batchSize": 0}"#).unwrap();

        assert_eq!(Settings::load(&path).unwrap().batch_size, DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn invalid_json_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{not json").unwrap();

        assert!(matches!(
            Settings::load(&path),
            Err(SettingsError::Parse { .. })
        ));
    }

    #[test]
    fn expand_tilde_leaves_plain_paths() {
        assert_eq!(expand_tilde("/abs/vault"), PathBuf::from("/abs/vault"));
        assert_eq!(expand_tilde("rel/vault"), PathBuf::from("rel/vault"));
    }
}
