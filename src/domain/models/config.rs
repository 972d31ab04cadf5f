use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::domain::errors::ConfigError;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Cache sizing and eviction configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Eviction policy used when the cache reaches capacity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionPolicy {
    /// Least recently used
    #[default]
    Lru,
    /// Least frequently used
    Lfu,
}

impl EvictionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lru => "lru",
            Self::Lfu => "lfu",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "lru" => Some(Self::Lru),
            "lfu" => Some(Self::Lfu),
            _ => None,
        }
    }
}

impl fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cache configuration, validated once when the cache is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CacheConfig {
    /// Maximum number of live records
    #[serde(default = "default_max_items")]
    pub max_items: usize,

    /// Upper bound on records evicted in one capacity-triggered pass
    #[serde(default = "default_eviction_batch_size")]
    pub eviction_batch_size: usize,

    /// Eviction policy
    #[serde(default)]
    pub eviction_policy: EvictionPolicy,
}

const fn default_max_items() -> usize {
    10_000
}

const fn default_eviction_batch_size() -> usize {
    100
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_items: default_max_items(),
            eviction_batch_size: default_eviction_batch_size(),
            eviction_policy: EvictionPolicy::default(),
        }
    }
}

impl CacheConfig {
    /// Build a validated configuration.
    pub fn new(
        max_items: usize,
        eviction_batch_size: usize,
        eviction_policy: EvictionPolicy,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            max_items,
            eviction_batch_size,
            eviction_policy,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_items == 0 {
            return Err(ConfigError::InvalidMaxItems(self.max_items));
        }
        if self.eviction_batch_size == 0 {
            return Err(ConfigError::InvalidEvictionBatchSize(
                self.eviction_batch_size,
            ));
        }
        Ok(())
    }

    /// Number of records to evict when `count` records are cached and the
    /// cache is full: `max(1, min(eviction_batch_size, count / 10))`.
    pub fn eviction_batch_for(&self, count: usize) -> usize {
        self.eviction_batch_size.min(count / 10).max(1)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stdout only when unset
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
        }
    }
}
