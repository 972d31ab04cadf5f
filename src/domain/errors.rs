//! Domain errors for the metadata cache.

use thiserror::Error;

/// Errors surfaced by caller-visible cache operations.
///
/// Mutations (`update`, `remove`, `clear`) never return errors; invalid input
/// is logged and dropped. Only operations that reach the persistent store or
/// parse caller input can fail.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Persistent store error: {0}")]
    Sync(#[from] SyncError),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Errors raised by a persistent-store synchronizer.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Persistent store unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid source id: {0:?}")]
    InvalidSource(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed record at line {line}: {message}")]
    Malformed { line: usize, message: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type SyncResult<T> = Result<T, SyncError>;

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid max_items: {0}. Must be at least 1")]
    InvalidMaxItems(usize),

    #[error("Invalid eviction_batch_size: {0}. Must be at least 1")]
    InvalidEvictionBatchSize(usize),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),
}
