//! Reader configuration.
//!
//! Configuration is plain serde data so it can be loaded from JSON (or TOML
//! with the `toml` feature) alongside the rest of an application's settings.

use serde::de::Error;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What a query does when a bin's arrays are inconsistent with the database index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CorruptBinPolicy {
    /// Log the bin, record a diagnostic and keep going without its features
    #[default]
    Skip,
    /// Fail the whole query
    Abort,
}

/// Reader configuration
///
/// # Example
///
/// ```rust
/// use gshhs_binned::{Config, CorruptBinPolicy};
///
/// let json = r#"{
///     "fetch_threads": 4,
///     "corrupt_bins": "abort"
/// }"#;
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.fetch_threads, 4);
/// assert_eq!(config.corrupt_bins, CorruptBinPolicy::Abort);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Size of the worker pool used for batched remote reads
    #[serde(default = "Config::default_fetch_threads")]
    pub fetch_threads: usize,

    #[serde(default)]
    pub corrupt_bins: CorruptBinPolicy,

    /// Directory that local database names are resolved against
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Initial minimum hierarchical level (inclusive)
    #[serde(default)]
    pub min_level: u8,

    /// Initial maximum hierarchical level (inclusive)
    #[serde(default = "Config::default_max_level")]
    pub max_level: u8,
}

impl Config {
    const fn default_fetch_threads() -> usize {
        8
    }

    const fn default_max_level() -> u8 {
        u8::MAX
    }

    pub fn with_fetch_threads(mut self, threads: usize) -> Self {
        assert!(threads > 0, "Fetch thread count must be greater than zero");
        self.fetch_threads = threads;
        self
    }

    pub fn with_corrupt_bins(mut self, policy: CorruptBinPolicy) -> Self {
        self.corrupt_bins = policy;
        self
    }

    pub fn with_data_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    pub fn with_level_range(mut self, min: u8, max: u8) -> Self {
        self.min_level = min;
        self.max_level = max;
        self
    }

    /// Resolve a local database name against `data_dir`.
    pub fn resolve_database(&self, name: &str) -> PathBuf {
        match &self.data_dir {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.fetch_threads == 0 {
            return Err("Fetch thread count must be greater than zero".to_string());
        }

        if self.fetch_threads > 256 {
            log::warn!(
                "Fetch thread count of {} is very large; each thread holds an open request",
                self.fetch_threads
            );
        }

        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(serde_json::Error::custom(e));
        }
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        let config: Config = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fetch_threads: Self::default_fetch_threads(),
            corrupt_bins: CorruptBinPolicy::default(),
            data_dir: None,
            min_level: 0,
            max_level: Self::default_max_level(),
        }
    }
}
