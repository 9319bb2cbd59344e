//! JSON settings file, merged over built-in defaults.

use super::{ConfigProvider, DEFAULT_QUEUE_MAX_SIZE, QUEUE_MAX_SIZE_KEY};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Settings loaded from a JSON object on disk.
///
/// Keys the file does not mention keep their default values.
#[derive(Debug, Clone)]
pub struct JsonConfig {
    values: Map<String, Value>,
}

impl Default for JsonConfig {
    fn default() -> Self {
        let mut values = Map::new();
        values.insert(
            QUEUE_MAX_SIZE_KEY.to_string(),
            Value::from(DEFAULT_QUEUE_MAX_SIZE.get()),
        );
        Self { values }
    }
}

impl JsonConfig {
    /// `<config_dir>/snip-queue/config.json`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("snip-queue")
            .join("config.json")
    }

    /// Loads the settings file at `path`.
    ///
    /// A missing file yields the defaults. A malformed one also yields the
    /// defaults, with a warning, so a bad edit never stops the app starting.
    pub fn load_from(path: &Path) -> Self {
        match Self::try_load_from(path) {
            Ok(config) => config,
            Err(ConfigError::Read { .. }) if !path.exists() => {
                log::debug!("[CONFIG] No settings file at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                log::warn!("[CONFIG] {}; using defaults", e);
                Self::default()
            }
        }
    }

    /// Strict variant of [`load_from`](Self::load_from).
    pub fn try_load_from(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let user: Map<String, Value> =
            serde_json::from_str(&raw).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let mut config = Self::default();
        config.values.extend(user);
        Ok(config)
    }
}

impl ConfigProvider for JsonConfig {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read settings file {}: {reason}", path.display())]
    Read { path: PathBuf, reason: String },

    #[error("Settings file {} is not a JSON object: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QueueSettings;

    #[test]
    fn default_path_is_config_json() {
        let path = JsonConfig::default_path();
        let path_str = path.to_string_lossy();
        assert!(path_str.contains("snip-queue"));
        assert!(path_str.ends_with("config.json"));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = JsonConfig::load_from(&dir.path().join("config.json"));
        assert_eq!(config.get(QUEUE_MAX_SIZE_KEY), Some(Value::from(50)));
    }

    #[test]
    fn user_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"queue_max_size": 8, "theme": "dark"}"#).unwrap();

        let config = JsonConfig::load_from(&path);
        assert_eq!(QueueSettings::from_provider(&config).max_size.get(), 8);
        assert_eq!(config.get("theme"), Some(Value::from("dark")));
    }

    #[test]
    fn malformed_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            JsonConfig::try_load_from(&path),
            Err(ConfigError::Parse { .. })
        ));
        let config = JsonConfig::load_from(&path);
        assert_eq!(QueueSettings::from_provider(&config).max_size.get(), 50);
    }

    #[test]
    fn non_object_json_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();
        assert!(JsonConfig::try_load_from(&path).is_err());
    }
}
