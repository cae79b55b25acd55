//! Harness configuration.
//!
//! Defaults are compile-time constants. A run can override them from an
//! optional config file and `CACHEBENCH_*` environment variables, and the
//! driver applies its command line flags on top.

use crate::backend::{BackendConfig, HashFunction};
use crate::error::{Error, Result};
use crate::workload::INDEX_WIDTH;

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Total entries written per population cycle.
pub const DEFAULT_ENTRIES: u64 = 20_000_000;

/// Bytes per generated value.
pub const DEFAULT_VALUE_SIZE: usize = 100;

/// Population cycles per backend.
pub const DEFAULT_REPEAT: u32 = 50;

/// Shards requested from backends that honour a shard count.
pub const DEFAULT_SHARDS: usize = 256;

/// Item lifetime window for the TTL backend.
pub const DEFAULT_LIFE_WINDOW: Duration = Duration::from_secs(100 * 60);

/// Upper bound used to size byte budgets per entry.
pub const DEFAULT_MAX_ENTRY_SIZE: usize = 200;

/// Pending garbage, as a percentage of the live heap, that triggers a
/// collection cycle.
pub const DEFAULT_GROWTH_PERCENT: u32 = 10;

/// Prefix for environment overrides, e.g. `CACHEBENCH_ENTRIES`.
pub const ENV_PREFIX: &str = "CACHEBENCH";

/// Top-level harness configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Entries per population cycle
    pub entries: u64,
    /// Value size in bytes
    pub value_size: usize,
    /// Population cycles per backend
    pub repeat: u32,
    /// Collector tuning, see [`DEFAULT_GROWTH_PERCENT`]
    pub growth_percent: u32,
    /// Shard count
    pub shards: usize,
    /// Item lifetime window in milliseconds
    pub life_window_ms: u64,
    /// Entries expected per backend; follows `entries` when unset
    #[serde(default)]
    pub max_entries: Option<u64>,
    /// Maximum single-entry size in bytes
    pub max_entry_size: usize,
    /// Hash function handed to backends
    pub hasher: HashFunction,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            entries: DEFAULT_ENTRIES,
            value_size: DEFAULT_VALUE_SIZE,
            repeat: DEFAULT_REPEAT,
            growth_percent: DEFAULT_GROWTH_PERCENT,
            shards: DEFAULT_SHARDS,
            life_window_ms: DEFAULT_LIFE_WINDOW.as_millis() as u64,
            max_entries: None,
            max_entry_size: DEFAULT_MAX_ENTRY_SIZE,
            hasher: HashFunction::Default,
        }
    }
}

impl Config {
    /// Load configuration from the defaults, an optional file and the
    /// environment, in that order of precedence.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = Self::default();
        let mut builder = config::Config::builder()
            .set_default("entries", defaults.entries as i64)?
            .set_default("value_size", defaults.value_size as i64)?
            .set_default("repeat", i64::from(defaults.repeat))?
            .set_default("growth_percent", i64::from(defaults.growth_percent))?
            .set_default("shards", defaults.shards as i64)?
            .set_default("life_window_ms", defaults.life_window_ms as i64)?
            .set_default("max_entry_size", defaults.max_entry_size as i64)?
            .set_default("hasher", defaults.hasher.as_str())?;

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        let config: Config = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Check the harness-level settings.
    ///
    /// Backend-specific limits (shard count shape, zero budgets) are checked
    /// when a backend is constructed, so a bad value skips only that backend.
    pub fn validate(&self) -> Result<()> {
        if self.entries == 0 {
            return Err(Error::config_key("must be greater than zero", "entries"));
        }
        if self.value_size < INDEX_WIDTH {
            return Err(Error::config_key(
                format!("must be at least {INDEX_WIDTH}"),
                "value_size",
            ));
        }
        if self.growth_percent == 0 {
            return Err(Error::config_key("must be greater than zero", "growth_percent"));
        }
        Ok(())
    }

    /// Item lifetime window.
    pub fn life_window(&self) -> Duration {
        Duration::from_millis(self.life_window_ms)
    }

    /// Backend configuration derived from this run's settings.
    pub fn backend(&self) -> BackendConfig {
        BackendConfig::new(self.max_entries.unwrap_or(self.entries))
            .with_shards(self.shards)
            .with_life_window(self.life_window())
            .with_max_entry_size(self.max_entry_size)
            .with_hasher(self.hasher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.entries, 20_000_000);
        assert_eq!(config.value_size, 100);
        assert_eq!(config.repeat, 50);
        assert!(config.validate().is_ok());

        let backend = config.backend();
        assert_eq!(backend.max_entries, 20_000_000);
        assert_eq!(backend.shards, 256);
        assert_eq!(backend.life_window, Duration::from_secs(6000));
        assert_eq!(backend.max_entry_size, 200);
    }

    #[test]
    fn test_max_entries_override() {
        let config = Config {
            entries: 1_000,
            max_entries: Some(4_000),
            ..Config::default()
        };
        assert_eq!(config.backend().max_entries, 4_000);
    }

    #[test]
    fn test_validate_rejects_short_values() {
        let config = Config {
            value_size: 4,
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::Config { key: Some(ref k), .. } if k == "value_size"));
    }

    #[test]
    fn test_validate_names_the_key() {
        for key in ["entries", "value_size", "growth_percent"] {
            let mut config = Config::default();
            match key {
                "entries" => config.entries = 0,
                "value_size" => config.value_size = 0,
                _ => config.growth_percent = 0,
            }
            let err = config.validate().unwrap_err();
            assert_eq!(err.category(), "config");
            assert!(matches!(err, Error::Config { key: Some(ref k), .. } if k == key));
        }
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("cachebench-{}.json", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, r#"{{"entries": 1000, "repeat": 3, "hasher": "xxhash"}}"#).unwrap();
        drop(file);

        let config = Config::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.entries, 1000);
        assert_eq!(config.repeat, 3);
        assert_eq!(config.hasher, HashFunction::XxHash);
        assert_eq!(config.value_size, DEFAULT_VALUE_SIZE);
    }
}
