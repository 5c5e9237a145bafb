//! Configuration management (config.toml)
//!
//! Handles loading and providing defaults for user settings.
//! Settings are stored in TOML format in the platform-specific config directory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::replay::MacroFormat;
use crate::session::DriftStepConditions;

const CONFIG_FILE: &str = "config.toml";

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// User configuration.
///
/// Contains all user-configurable settings organized into sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Autosave settings
    #[serde(default)]
    pub autosave: AutosaveConfig,
    /// Recording settings
    #[serde(default)]
    pub recording: RecordingConfig,
    /// Playback and frame-stepping settings
    #[serde(default)]
    pub playback: PlaybackConfig,
}

/// Autosave configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AutosaveConfig {
    /// Save the recording whenever a new checkpoint is reached (default: false)
    #[serde(default)]
    pub enabled: bool,
}

/// Recording configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingConfig {
    /// Frame rate a new recording is locked to (default: 240)
    #[serde(default = "default_frame_rate")]
    pub frame_rate: f64,
    /// Format used when the caller does not choose one (default: binary)
    #[serde(default)]
    pub default_format: MacroFormat,
}

/// Playback configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PlaybackConfig {
    /// Extra conditions that force a frame step (default: none)
    #[serde(default)]
    pub drift_step_conditions: DriftStepConditions,
}

fn default_frame_rate() -> f64 {
    crate::replay::DEFAULT_FRAME_RATE
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            frame_rate: default_frame_rate(),
            default_format: MacroFormat::default(),
        }
    }
}

/// Returns the platform-specific configuration directory.
///
/// On Windows: `%APPDATA%\macrobot\config`
/// On macOS: `~/Library/Application Support/io.macrobot.macrobot`
/// On Linux: `~/.config/macrobot`
///
/// Returns `None` if the home directory cannot be determined.
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("io", "macrobot", "macrobot")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Loads the configuration from disk.
///
/// Returns default values if the file doesn't exist or cannot be parsed.
pub fn load() -> Config {
    match config_dir() {
        Some(dir) => load_from(&dir.join(CONFIG_FILE)).unwrap_or_else(|e| {
            tracing::warn!("ignoring config: {e}");
            Config::default()
        }),
        None => Config::default(),
    }
}

/// Loads the configuration from a specific file.
///
/// A missing file yields the defaults; a malformed one is an error.
pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(!config.autosave.enabled);
        assert_eq!(config.recording.frame_rate, 240.0);
        assert_eq!(config.recording.default_format, MacroFormat::Binary);
        assert!(config.playback.drift_step_conditions.is_empty());
    }

    #[test]
    fn test_config_deserialize_empty() {
        // Empty TOML should produce defaults
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_deserialize_partial() {
        let toml_str = r#"
[autosave]
enabled = true

[recording]
default_format = "json"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert!(config.autosave.enabled);
        assert_eq!(config.recording.default_format, MacroFormat::Json);
        assert_eq!(config.recording.frame_rate, 240.0); // default
    }

    #[test]
    fn test_config_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);

        let mut config = Config::default();
        config.autosave.enabled = true;
        config.playback.drift_step_conditions =
            DriftStepConditions::IGNORE_FRAME | DriftStepConditions::DELAYED_RELEASE;

        std::fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();
        assert_eq!(load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_load_missing_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_from(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_malformed_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[autosave]\nenabled = 3\n").unwrap();
        assert!(matches!(load_from(&path), Err(ConfigError::Parse(_))));
    }
}
