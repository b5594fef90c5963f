// Settings stores - flat key/value persistence backends

use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Settings error types
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No configuration directory available on this system")]
    NoConfigDirectory,
}

/// Flat key -> value settings, values kept raw so bad entries can be skipped
pub type SettingsMap = BTreeMap<String, Value>;

/// Persistence backend for settings
pub trait BindingStore: Send + Sync {
    /// Stored values, empty when nothing was saved yet
    fn load(&self) -> Result<SettingsMap, SettingsError>;
    fn save(&self, values: &SettingsMap) -> Result<(), SettingsError>;
}

/// Settings stored as a pretty-printed JSON object on disk
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<config dir>/technocoid/midi_bindings.json`
    pub fn default_location() -> Result<Self, SettingsError> {
        let path = dirs::config_dir()
            .ok_or(SettingsError::NoConfigDirectory)?
            .join("technocoid")
            .join("midi_bindings.json");
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BindingStore for JsonFileStore {
    fn load(&self) -> Result<SettingsMap, SettingsError> {
        if !self.path.exists() {
            return Ok(SettingsMap::new());
        }

        let content = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, values: &SettingsMap) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(values)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

/// In-memory store, clones share the same values
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<SettingsMap>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-filled with the given values
    pub fn with_values(values: SettingsMap) -> Self {
        Self {
            values: Arc::new(Mutex::new(values)),
        }
    }

    pub fn values(&self) -> SettingsMap {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl BindingStore for MemoryStore {
    fn load(&self) -> Result<SettingsMap, SettingsError> {
        Ok(self.values())
    }

    fn save(&self, values: &SettingsMap) -> Result<(), SettingsError> {
        *self.values.lock().unwrap_or_else(PoisonError::into_inner) = values.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("absent.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("bindings.json"));

        let mut values = SettingsMap::new();
        values.insert("8".to_string(), json!(21));
        store.save(&values).unwrap();

        assert!(store.path().exists());
        assert_eq!(store.load().unwrap(), values);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bindings.json");
        std::fs::write(&path, "{not json").unwrap();

        let result = JsonFileStore::new(path).load();
        assert!(matches!(result, Err(SettingsError::Json(_))));
    }

    #[test]
    fn test_memory_store_clones_share_values() {
        let store = MemoryStore::new();
        let other = store.clone();

        let mut values = SettingsMap::new();
        values.insert("0".to_string(), json!(7));
        store.save(&values).unwrap();

        assert_eq!(other.load().unwrap(), values);
    }
}
