//! Cache usage statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::config::EvictionPolicy;

/// Snapshot of cache statistics returned by `MetadataCache::stats`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub updates: u64,
    pub removals: u64,
    pub evictions: u64,
    /// Point lookups issued to the persistent store on a miss
    pub db_lookups: u64,
    /// Point lookups that found a record
    pub db_lookup_hits: u64,
    pub last_sync_time: Option<DateTime<Utc>>,
    pub last_sync_duration_ms: Option<u64>,
    pub items_count: usize,
    pub max_items: usize,
    pub eviction_policy: EvictionPolicy,
    pub index_stats: IndexStats,
}

impl CacheStats {
    /// Fraction of `get` calls served from memory, 0.0 when there were none.
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Size of one secondary index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSize {
    /// Distinct attribute values (buckets)
    pub values: usize,
    /// Total path memberships across all buckets
    pub entries: usize,
}

/// Sizes of every secondary index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub language: IndexSize,
    pub reference_doc: IndexSize,
    pub function: IndexSize,
    pub class: IndexSize,
}
