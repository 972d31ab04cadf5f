//! Synchronization with the persistent store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::metadata::MetadataRecord;

/// One change reported by an incremental sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SyncOperation {
    /// Insert or replace the record for its path
    Upsert { record: MetadataRecord },
    /// Drop the record for `path`
    Delete { path: String },
}

impl SyncOperation {
    pub fn upsert(record: MetadataRecord) -> Self {
        Self::Upsert { record }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::Delete { path: path.into() }
    }

    pub fn path(&self) -> &str {
        match self {
            Self::Upsert { record } => &record.path,
            Self::Delete { path } => path,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    Full,
    Incremental,
}

/// Outcome of `MetadataCache::synchronize_with_database`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub mode: SyncMode,
    pub source_id: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub upserted: usize,
    pub deleted: usize,
    /// Records evicted while applying the sync
    pub evicted: u64,
    /// True when an incremental sync failed and was skipped
    pub skipped: bool,
}
