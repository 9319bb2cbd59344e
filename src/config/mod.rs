//! Settings consumed by the capture queue.
//!
//! The queue reads exactly one option, `queue_max_size`, once at
//! construction through a [`ConfigProvider`]. Nothing here is global state:
//! providers are plain values handed to the queue's constructor.
//!
//! Settings live in the platform-appropriate config directory:
//!   Linux:   ~/.config/snip-queue/config.json
//!   macOS:   ~/Library/Application Support/snip-queue/config.json

mod json;

pub use json::{ConfigError, JsonConfig};

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// Key for the queue capacity setting.
pub const QUEUE_MAX_SIZE_KEY: &str = "queue_max_size";

/// Capacity used when the setting is absent or invalid.
pub const DEFAULT_QUEUE_MAX_SIZE: NonZeroUsize = match NonZeroUsize::new(50) {
    Some(n) => n,
    None => unreachable!(),
};

/// Source of configuration values.
pub trait ConfigProvider {
    /// Raw value for `key`, if the provider has one.
    fn get(&self, key: &str) -> Option<Value>;

    /// Typed lookup. Absent keys and values of the wrong shape yield `default`.
    fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T
    where
        Self: Sized,
    {
        self.get(key)
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or(default)
    }
}

/// In-memory provider, for embedding callers and tests.
#[derive(Debug, Clone, Default)]
pub struct MapConfig {
    values: HashMap<String, Value>,
}

impl MapConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl ConfigProvider for MapConfig {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }
}

/// Resolved queue settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueSettings {
    pub max_size: NonZeroUsize,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_QUEUE_MAX_SIZE,
        }
    }
}

impl QueueSettings {
    /// Reads `queue_max_size` from `provider`.
    ///
    /// Zero, negative, fractional and non-numeric values are rejected with a
    /// warning and the default of 50 is used instead.
    pub fn from_provider<P: ConfigProvider>(provider: &P) -> Self {
        let value: Value =
            provider.get_or(QUEUE_MAX_SIZE_KEY, Value::from(DEFAULT_QUEUE_MAX_SIZE.get()));
        let max_size = parse_max_size(&value).unwrap_or_else(|| {
            log::warn!(
                "[CONFIG] Ignoring invalid {} = {} (expected a positive integer), using {}",
                QUEUE_MAX_SIZE_KEY,
                value,
                DEFAULT_QUEUE_MAX_SIZE
            );
            DEFAULT_QUEUE_MAX_SIZE
        });
        Self { max_size }
    }
}

fn parse_max_size(value: &Value) -> Option<NonZeroUsize> {
    let n = value.as_u64()?;
    NonZeroUsize::new(usize::try_from(n).ok()?)
}

/// Base directory for the persisted queue.
pub fn default_queue_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("snip-queue")
        .join("queue")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_key_uses_default() {
        let settings = QueueSettings::from_provider(&MapConfig::new());
        assert_eq!(settings.max_size.get(), 50);
    }

    #[test]
    fn positive_integer_is_used() {
        let config = MapConfig::new().with(QUEUE_MAX_SIZE_KEY, 3);
        assert_eq!(QueueSettings::from_provider(&config).max_size.get(), 3);
    }

    #[test]
    fn invalid_values_fall_back_to_default() {
        for bad in [json!(0), json!(-4), json!(2.5), json!("10"), json!(null)] {
            let config = MapConfig::new().with(QUEUE_MAX_SIZE_KEY, bad.clone());
            assert_eq!(
                QueueSettings::from_provider(&config).max_size,
                DEFAULT_QUEUE_MAX_SIZE,
                "value {bad} should be rejected"
            );
        }
    }

    #[test]
    fn get_or_falls_back_on_type_mismatch() {
        let config = MapConfig::new().with("theme", "dark");
        assert_eq!(config.get_or("theme", String::from("system")), "dark");
        assert_eq!(config.get_or("theme", 7u32), 7);
        assert!(config.get_or("auto_save", true));
    }

    #[test]
    fn queue_dir_is_under_snip_queue() {
        let dir = default_queue_dir();
        let dir_str = dir.to_string_lossy();
        assert!(dir_str.contains("snip-queue"));
        assert!(dir_str.ends_with("queue"));
    }
}
