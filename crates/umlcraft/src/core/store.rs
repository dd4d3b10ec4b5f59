//! Key-value storage for the provider configuration
//!
//! The pipeline only needs a `get`/`set` contract. [`load`] and [`save`] sit
//! on top of it and never surface storage problems to the caller: a missing
//! or broken record loads as the default configuration and a failed write is
//! logged.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::config::ProviderConfig;
use super::error::StoreError;

/// Key the configuration record is stored under
pub const SETTINGS_KEY: &str = "aiSettings";

/// Narrow capability over an external key-value store
pub trait ConfigStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: String) -> Result<(), StoreError>;
}

/// Read the configuration, falling back to defaults on any problem
pub fn load(store: &dyn ConfigStore) -> ProviderConfig {
    match store.get(SETTINGS_KEY) {
        Ok(Some(raw)) => match serde_json::from_str::<ProviderConfig>(&raw) {
            Ok(config) => {
                debug!(provider = %config.provider(), model = config.model(), "Loaded settings");
                config
            }
            Err(e) => {
                warn!(error = %e, "Stored settings are malformed, using defaults");
                ProviderConfig::default()
            }
        },
        Ok(None) => {
            debug!("No stored settings, using defaults");
            ProviderConfig::default()
        }
        Err(e) => {
            warn!(error = %e, "Could not read settings, using defaults");
            ProviderConfig::default()
        }
    }
}

/// Write the full record; failures are logged and otherwise ignored
pub fn save(store: &dyn ConfigStore, config: &ProviderConfig) {
    let result = serde_json::to_string(config)
        .map_err(StoreError::from)
        .and_then(|raw| store.set(SETTINGS_KEY, raw));

    match result {
        Ok(()) => info!(provider = %config.provider(), model = config.model(), "Settings saved"),
        Err(e) => warn!(error = %e, "Failed to save settings"),
    }
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with one raw entry
    pub fn with_entry(key: &str, value: impl Into<String>) -> Self {
        let store = Self::new();
        store
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.to_string(), value.into());
        store
    }
}

impl ConfigStore for MemoryConfigStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.to_string(), value);
        Ok(())
    }
}

/// Store backed by a single JSON object file
///
/// Values that are valid JSON are embedded as-is so the file stays readable;
/// anything else is kept as a JSON string.
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/umlcraft/settings.json`
    pub fn default_path() -> Result<PathBuf, StoreError> {
        dirs::config_dir()
            .map(|dir| dir.join("umlcraft").join("settings.json"))
            .ok_or(StoreError::NoConfigDir)
    }

    pub fn at_default_location() -> Result<Self, StoreError> {
        Ok(Self::new(Self::default_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_object(&self) -> Result<Map<String, Value>, StoreError> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&content)? {
            Value::Object(map) => Ok(map),
            other => {
                warn!(path = %self.path.display(), kind = json_kind(&other), "Settings file is not an object, starting over");
                Ok(Map::new())
            }
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl ConfigStore for FileConfigStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let map = self.read_object()?;
        Ok(map.get(key).map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }))
    }

    fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        // A corrupt file is replaced rather than blocking every save
        let mut map = self.read_object().unwrap_or_default();
        let value = serde_json::from_str::<Value>(&value).unwrap_or(Value::String(value));
        map.insert(key.to_string(), value);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&Value::Object(map))?)?;
        debug!(path = %self.path.display(), key, "Wrote settings file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Provider;

    #[test]
    fn test_load_absent_returns_default() {
        let store = MemoryConfigStore::new();
        assert_eq!(load(&store), ProviderConfig::default());
    }

    #[test]
    fn test_load_unparseable_returns_default() {
        let store = MemoryConfigStore::with_entry(SETTINGS_KEY, "{not json");
        assert_eq!(load(&store), ProviderConfig::default());
    }

    #[test]
    fn test_load_invalid_model_returns_default() {
        let store = MemoryConfigStore::with_entry(
            SETTINGS_KEY,
            r#"{"provider":"mistral","apiKey":"k","model":"gemini-2.0-flash","temperature":0.3}"#,
        );
        assert_eq!(load(&store), ProviderConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let store = MemoryConfigStore::new();
        let config = ProviderConfig::default()
            .set_provider(Provider::Gemini)
            .with_api_key("abc");
        save(&store, &config);
        assert_eq!(load(&store), config);
    }

    #[test]
    fn test_file_store_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileConfigStore::new(dir.path().join("nested").join("settings.json"));
        assert!(store.get(SETTINGS_KEY).unwrap().is_none());
    }

    #[test]
    fn test_file_store_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let store = FileConfigStore::new(&path);
        store.set("theme", "dark".to_string()).unwrap();
        assert!(path.exists());
        assert_eq!(store.get("theme").unwrap().as_deref(), Some("dark"));
    }
}
