//! In-process metadata store with a change journal.
//!
//! Stands in for the persistent store when the cache is embedded without a
//! database, and in tests. Every write is journaled with its timestamp so
//! incremental syncs can ask for the changes since their last sync point.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::domain::errors::{SyncError, SyncResult};
use crate::domain::models::{MetadataRecord, SyncOperation};
use crate::domain::ports::{MetadataSynchronizer, RecordStream};
use crate::sync_util::lock_or_recover;

#[derive(Debug, Clone)]
struct JournalEntry {
    at: DateTime<Utc>,
    operation: SyncOperation,
}

#[derive(Debug, Default)]
struct SourceState {
    records: BTreeMap<String, MetadataRecord>,
    /// At most one entry per path, in write order
    journal: Vec<JournalEntry>,
}

impl SourceState {
    /// Journal `operation`, superseding any earlier entry for its path.
    fn journal(&mut self, operation: SyncOperation) {
        self.journal.retain(|entry| entry.operation.path() != operation.path());
        self.journal.push(JournalEntry {
            at: Utc::now(),
            operation,
        });
    }
}

/// Thread-safe in-memory [`MetadataSynchronizer`].
#[derive(Debug, Default)]
pub struct InMemoryMetadataStore {
    sources: Mutex<HashMap<String, SourceState>>,
    lookups: AtomicUsize,
    offline: AtomicBool,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record of `source_id`.
    pub fn upsert(&self, source_id: &str, record: MetadataRecord) {
        let mut sources = lock_or_recover(&self.sources);
        let source = sources.entry(source_id.to_string()).or_default();
        source.journal(SyncOperation::upsert(record.clone()));
        source.records.insert(record.path.clone(), record);
    }

    /// Delete the record for `path`; returns whether it existed.
    pub fn delete(&self, source_id: &str, path: &str) -> bool {
        let mut sources = lock_or_recover(&self.sources);
        let Some(source) = sources.get_mut(source_id) else {
            return false;
        };
        if source.records.remove(path).is_none() {
            return false;
        }
        source.journal(SyncOperation::delete(path));
        true
    }

    /// Drop journal entries of `source_id` stamped before `before`.
    ///
    /// Only safe once every cache has synced past `before`; a later
    /// `changes_since` with an earlier checkpoint no longer sees them.
    /// Returns the number of entries dropped.
    pub fn compact_before(&self, source_id: &str, before: DateTime<Utc>) -> usize {
        let mut sources = lock_or_recover(&self.sources);
        let Some(source) = sources.get_mut(source_id) else {
            return 0;
        };
        let len = source.journal.len();
        source.journal.retain(|entry| entry.at >= before);
        len - source.journal.len()
    }

    /// Number of journal entries kept for `source_id`.
    pub fn journal_len(&self, source_id: &str) -> usize {
        lock_or_recover(&self.sources)
            .get(source_id)
            .map_or(0, |s| s.journal.len())
    }

    pub fn record_count(&self, source_id: &str) -> usize {
        lock_or_recover(&self.sources)
            .get(source_id)
            .map_or(0, |s| s.records.len())
    }

    /// Number of point lookups served so far.
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Make every call fail with [`SyncError::Unavailable`] while set.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> SyncResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(SyncError::Unavailable("in-memory store is offline".to_string()));
        }
        Ok(())
    }
}

impl MetadataSynchronizer for InMemoryMetadataStore {
    fn get_by_path(&self, path: &str, source_id: &str) -> SyncResult<Option<MetadataRecord>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.ensure_online()?;
        Ok(lock_or_recover(&self.sources)
            .get(source_id)
            .and_then(|s| s.records.get(path).cloned()))
    }

    fn full_reload(&self, source_id: &str) -> SyncResult<RecordStream<'_>> {
        self.ensure_online()?;
        let records: Vec<MetadataRecord> = lock_or_recover(&self.sources)
            .get(source_id)
            .map(|s| s.records.values().cloned().collect())
            .unwrap_or_default();
        Ok(Box::new(records.into_iter().map(Ok)))
    }

    /// Journal entries at or after `since`, one per path in write order.
    /// Entries stamped exactly at `since` are replayed; re-applying them is
    /// harmless.
    fn changes_since(
        &self,
        source_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> SyncResult<Vec<SyncOperation>> {
        self.ensure_online()?;
        let sources = lock_or_recover(&self.sources);
        let Some(source) = sources.get(source_id) else {
            return Ok(Vec::new());
        };

        Ok(source
            .journal
            .iter()
            .filter(|entry| since.is_none_or(|since| entry.at >= since))
            .map(|entry| entry.operation.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_counts_and_finds() {
        let store = InMemoryMetadataStore::new();
        store.upsert("repo", MetadataRecord::new("a.rs"));

        assert!(store.get_by_path("a.rs", "repo").unwrap().is_some());
        assert!(store.get_by_path("a.rs", "other").unwrap().is_none());
        assert_eq!(store.lookup_count(), 2);
    }

    #[test]
    fn test_changes_are_compacted_per_path() {
        let store = InMemoryMetadataStore::new();
        store.upsert("repo", MetadataRecord::new("a.rs"));
        store.upsert("repo", MetadataRecord::new("b.rs"));
        store.upsert("repo", MetadataRecord::new("a.rs").with_language("rust"));
        assert!(store.delete("repo", "b.rs"));
        assert!(!store.delete("repo", "b.rs"));

        let changes = store.changes_since("repo", None).unwrap();

        assert_eq!(
            changes,
            vec![
                SyncOperation::upsert(MetadataRecord::new("a.rs").with_language("rust")),
                SyncOperation::delete("b.rs"),
            ]
        );
    }

    #[test]
    fn test_changes_since_filters_old_entries() {
        let store = InMemoryMetadataStore::new();
        store.upsert("repo", MetadataRecord::new("old.rs"));
        std::thread::sleep(std::time::Duration::from_millis(5));
        let checkpoint = Utc::now();
        store.upsert("repo", MetadataRecord::new("new.rs"));

        let changes = store.changes_since("repo", Some(checkpoint)).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].path(), "new.rs");
    }

    #[test]
    fn test_rewrites_supersede_journal_entries() {
        let store = InMemoryMetadataStore::new();
        for _ in 0..50 {
            store.upsert("repo", MetadataRecord::new("a.rs"));
        }
        store.upsert("repo", MetadataRecord::new("b.rs"));
        store.delete("repo", "b.rs");

        assert_eq!(store.journal_len("repo"), 2);
    }

    #[test]
    fn test_compact_before_drops_old_entries() {
        let store = InMemoryMetadataStore::new();
        store.upsert("repo", MetadataRecord::new("old.rs"));
        store.upsert("repo", MetadataRecord::new("gone.rs"));
        store.delete("repo", "gone.rs");
        std::thread::sleep(std::time::Duration::from_millis(5));
        let checkpoint = Utc::now();
        store.upsert("repo", MetadataRecord::new("new.rs"));

        assert_eq!(store.compact_before("repo", checkpoint), 2);
        assert_eq!(store.compact_before("missing", checkpoint), 0);

        assert_eq!(store.journal_len("repo"), 1);
        assert_eq!(store.changes_since("repo", Some(checkpoint)).unwrap().len(), 1);
        // Records themselves are untouched.
        assert_eq!(store.record_count("repo"), 2);
    }

    #[test]
    fn test_offline_store_fails() {
        let store = InMemoryMetadataStore::new();
        store.set_offline(true);

        assert!(matches!(store.get_by_path("a.rs", "repo"), Err(SyncError::Unavailable(_))));
        assert!(store.full_reload("repo").is_err());
        assert!(store.changes_since("repo", None).is_err());

        store.set_offline(false);
        assert_eq!(store.full_reload("repo").unwrap().count(), 0);
    }
}
