//! Primary key → record storage.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::domain::models::MetadataRecord;
use crate::sync_util::lock_or_recover;

/// Thread-safe map from path to record; the ground truth for what is cached.
///
/// Every operation takes the storage lock for its own duration only and no
/// method calls another while holding it.
#[derive(Debug, Default)]
pub struct MetadataStorage {
    items: Mutex<HashMap<String, Arc<MetadataRecord>>>,
}

impl MetadataStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Arc<MetadataRecord>> {
        lock_or_recover(&self.items).get(key).cloned()
    }

    /// Store `record` under `key`, replacing any previous record.
    ///
    /// A record whose path is empty or differs from `key` is rejected and
    /// logged; the map is left untouched and `false` is returned.
    pub fn put(&self, key: &str, record: Arc<MetadataRecord>) -> bool {
        if key.is_empty() || record.path != key {
            tracing::warn!(
                key = %key,
                record_path = %record.path,
                "rejected storage put: key does not match record path"
            );
            return false;
        }
        lock_or_recover(&self.items).insert(key.to_string(), record);
        true
    }

    pub fn remove(&self, key: &str) -> bool {
        lock_or_recover(&self.items).remove(key).is_some()
    }

    pub fn contains(&self, key: &str) -> bool {
        lock_or_recover(&self.items).contains_key(key)
    }

    pub fn count(&self) -> usize {
        lock_or_recover(&self.items).len()
    }

    pub fn clear(&self) {
        lock_or_recover(&self.items).clear();
    }

    pub fn all_keys(&self) -> HashSet<String> {
        lock_or_recover(&self.items).keys().cloned().collect()
    }

    /// Shallow copy of the whole map.
    ///
    /// Copies every key and record handle while holding the storage lock;
    /// expensive on large caches and not meant for hot paths.
    pub fn all_items(&self) -> HashMap<String, Arc<MetadataRecord>> {
        lock_or_recover(&self.items).clone()
    }
}
