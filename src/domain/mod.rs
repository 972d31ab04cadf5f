//! Domain layer for the metadata cache
//!
//! Core models, errors and the ports the cache depends on.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{CacheError, CacheResult, ConfigError, SyncError, SyncResult};
