// Application configuration

use crate::sequencer::{MAX_STEPS, MAX_TRACKS};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "TECHNOCOID_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub tracks: usize,
    pub steps_per_track: usize,
    pub initial_bpm: u32,
    /// Defaults to the user config directory
    pub bindings_path: Option<PathBuf>,
    pub device_poll_interval_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tracks: MAX_TRACKS,
            steps_per_track: 8,
            initial_bpm: 60,
            bindings_path: None,
            device_poll_interval_ms: 2000,
        }
    }
}

impl AppConfig {
    /// Load from a JSON file, a missing file gives the defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the first CLI argument or `TECHNOCOID_CONFIG`
    pub fn from_env(arg: Option<String>) -> Result<Self, ConfigError> {
        match arg.or_else(|| std::env::var(CONFIG_ENV_VAR).ok()) {
            Some(path) => Self::load(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_TRACKS).contains(&self.tracks) {
            return Err(ConfigError::Invalid(format!(
                "tracks must be between 1 and {}, got {}",
                MAX_TRACKS, self.tracks
            )));
        }
        if !(1..=MAX_STEPS).contains(&self.steps_per_track) {
            return Err(ConfigError::Invalid(format!(
                "steps_per_track must be between 1 and {}, got {}",
                MAX_STEPS, self.steps_per_track
            )));
        }
        if self.initial_bpm == 0 {
            return Err(ConfigError::Invalid("initial_bpm must be positive".into()));
        }
        if self.device_poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "device_poll_interval_ms must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.initial_bpm, 60);
        assert_eq!(config.device_poll_interval_ms, 2000);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(&dir.path().join("none.json")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "steps_per_track": 12, "initial_bpm": 128 }"#).unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.steps_per_track, 12);
        assert_eq!(config.initial_bpm, 128);
        assert_eq!(config.tracks, 4);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        for body in [
            r#"{ "tracks": 0 }"#,
            r#"{ "tracks": 5 }"#,
            r#"{ "steps_per_track": 13 }"#,
            r#"{ "initial_bpm": 0 }"#,
        ] {
            std::fs::write(&path, body).unwrap();
            assert!(matches!(
                AppConfig::load(&path),
                Err(ConfigError::Invalid(_))
            ));
        }
    }
}
