//! Cache facade coordinating storage, indexes, eviction and synchronization.

use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::domain::errors::CacheResult;
use crate::domain::models::{
    CacheConfig, CacheStats, MetadataQuery, MetadataRecord, SyncMode, SyncOperation, SyncReport,
};
use crate::domain::ports::MetadataSynchronizer;
use crate::sync_util::lock_or_recover;

use super::eviction::{strategy_for, EvictionStrategy};
use super::index_manager::IndexManager;
use super::query_engine::QueryEngine;
use super::storage::MetadataStorage;

/// Cumulative counters, guarded by the facade's top-level lock.
#[derive(Debug, Default)]
struct CacheCounters {
    hits: u64,
    misses: u64,
    updates: u64,
    removals: u64,
    evictions: u64,
    db_lookups: u64,
    db_lookup_hits: u64,
    last_sync_time: Option<DateTime<Utc>>,
    last_sync_duration: Option<Duration>,
}

impl CacheCounters {
    /// Reset every counter, keeping the sync history.
    fn reset(&mut self) {
        *self = Self {
            last_sync_time: self.last_sync_time,
            last_sync_duration: self.last_sync_duration,
            ..Self::default()
        };
    }
}

/// Bounded in-memory cache of source-file metadata in front of a
/// persistent store.
///
/// Every public operation runs under one top-level lock, so a logical
/// operation is atomic across storage, indexes, eviction tracking and
/// statistics. Calls to the synchronizer (miss fallback and syncs) also run
/// under that lock; a slow persistent store stalls other callers for the
/// duration of the call.
///
/// Mutations never fail: invalid records are logged and dropped.
pub struct MetadataCache {
    config: CacheConfig,
    storage: Arc<MetadataStorage>,
    indexes: Arc<IndexManager>,
    eviction: Arc<dyn EvictionStrategy>,
    query_engine: QueryEngine,
    synchronizer: Arc<dyn MetadataSynchronizer>,
    counters: Mutex<CacheCounters>,
}

impl MetadataCache {
    /// Create a cache using the eviction policy named in `config`.
    ///
    /// The cache owns its storage, indexes and eviction strategy; none of
    /// them is reachable from outside.
    ///
    /// # Errors
    /// Returns [`CacheError::Config`](crate::domain::errors::CacheError::Config)
    /// if `config` is invalid.
    pub fn new(
        config: CacheConfig,
        synchronizer: Arc<dyn MetadataSynchronizer>,
    ) -> CacheResult<Self> {
        config.validate()?;

        let eviction = strategy_for(config.eviction_policy);
        let storage = Arc::new(MetadataStorage::new());
        let indexes = Arc::new(IndexManager::new());
        let query_engine = QueryEngine::new(storage.clone(), indexes.clone(), eviction.clone());

        tracing::debug!(
            max_items = config.max_items,
            eviction_batch_size = config.eviction_batch_size,
            policy = %eviction.policy(),
            "metadata cache created"
        );

        Ok(Self {
            config,
            storage,
            indexes,
            eviction,
            query_engine,
            synchronizer,
            counters: Mutex::new(CacheCounters::default()),
        })
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Look up `path`, falling back to the persistent store on a miss.
    ///
    /// A miss issues exactly one point lookup; a hit issues none. A record
    /// found in the store is cached through the same path as [`update`].
    /// A record returned for a different path is treated as not found.
    ///
    /// # Errors
    /// Propagates a failed point lookup.
    ///
    /// [`update`]: MetadataCache::update
    pub fn get(&self, path: &str, source_id: &str) -> CacheResult<Option<Arc<MetadataRecord>>> {
        if path.trim().is_empty() {
            tracing::warn!("ignoring get with empty path");
            return Ok(None);
        }

        let mut counters = lock_or_recover(&self.counters);

        if let Some(record) = self.storage.get(path) {
            self.eviction.record_access(path);
            counters.hits += 1;
            tracing::trace!(path = %path, "cache hit");
            return Ok(Some(record));
        }

        counters.misses += 1;
        counters.db_lookups += 1;
        tracing::debug!(
            path = %path,
            source_id = %source_id,
            "cache miss, querying persistent store"
        );

        let Some(record) = self.synchronizer.get_by_path(path, source_id)? else {
            tracing::debug!(path = %path, "not found in persistent store");
            return Ok(None);
        };
        if record.path != path {
            tracing::warn!(
                requested = %path,
                returned = %record.path,
                "persistent store returned a record for a different path, treating as not found"
            );
            return Ok(None);
        }
        counters.db_lookup_hits += 1;

        let record = Arc::new(record);
        self.update_locked(&mut counters, record.clone());
        Ok(Some(record))
    }

    /// Run `query` against the indexes.
    pub fn query(&self, query: &MetadataQuery) -> Vec<Arc<MetadataRecord>> {
        let _guard = lock_or_recover(&self.counters);
        self.query_engine.execute(query)
    }

    /// Insert or replace the record for `record.path`.
    ///
    /// When a new path arrives and the cache is full, a batch of
    /// `max(1, min(eviction_batch_size, count / 10))` records chosen by the
    /// eviction policy is dropped first.
    pub fn update(&self, record: MetadataRecord) {
        let mut counters = lock_or_recover(&self.counters);
        self.update_locked(&mut counters, Arc::new(record));
    }

    /// Remove the record for `path`; returns whether one was cached.
    pub fn remove(&self, path: &str) -> bool {
        let mut counters = lock_or_recover(&self.counters);
        self.remove_locked(&mut counters, path)
    }

    /// Drop every record and reset statistics, keeping the sync history.
    pub fn clear(&self) {
        let mut counters = lock_or_recover(&self.counters);
        self.clear_locked(&mut counters);
        tracing::info!("metadata cache cleared");
    }

    /// Synchronize with the persistent store.
    ///
    /// A full sync clears the cache and streams every record of `source_id`
    /// through [`update`], so a source larger than `max_items` evicts while
    /// loading. An incremental sync applies the store's changes since the
    /// last sync through the same update/remove paths; if fetching the
    /// changes fails the error is logged, the cache is left as-is and the
    /// report is marked `skipped`.
    ///
    /// # Errors
    /// Propagates a failed full reload. The cache then holds whatever was
    /// loaded before the failure.
    ///
    /// [`update`]: MetadataCache::update
    #[tracing::instrument(skip(self))]
    pub fn synchronize_with_database(
        &self,
        source_id: &str,
        full_sync: bool,
    ) -> CacheResult<SyncReport> {
        let mut counters = lock_or_recover(&self.counters);
        let started_at = Utc::now();
        let timer = Instant::now();

        let mut report = SyncReport {
            mode: if full_sync { SyncMode::Full } else { SyncMode::Incremental },
            source_id: source_id.to_string(),
            started_at,
            duration_ms: 0,
            upserted: 0,
            deleted: 0,
            evicted: 0,
            skipped: false,
        };

        if full_sync {
            self.clear_locked(&mut counters);
            let evictions_before = counters.evictions;

            let stream = self.synchronizer.full_reload(source_id).inspect_err(|e| {
                tracing::error!(error = %e, "full reload failed");
            })?;
            for item in stream {
                let record = item.inspect_err(|e| {
                    tracing::error!(error = %e, loaded = report.upserted, "full reload aborted");
                })?;
                if self.update_locked(&mut counters, Arc::new(record)) {
                    report.upserted += 1;
                }
            }
            report.evicted = counters.evictions - evictions_before;
        } else {
            let since = counters.last_sync_time;
            let operations = match self.synchronizer.changes_since(source_id, since) {
                Ok(operations) => operations,
                Err(e) => {
                    tracing::warn!(error = %e, "incremental sync failed, cache left unchanged");
                    report.skipped = true;
                    report.duration_ms = elapsed_ms(timer.elapsed());
                    return Ok(report);
                }
            };

            let evictions_before = counters.evictions;
            for operation in operations {
                match operation {
                    SyncOperation::Upsert { record } => {
                        if self.update_locked(&mut counters, Arc::new(record)) {
                            report.upserted += 1;
                        }
                    }
                    SyncOperation::Delete { path } => {
                        if self.remove_locked(&mut counters, &path) {
                            report.deleted += 1;
                        }
                    }
                }
            }
            report.evicted = counters.evictions - evictions_before;
        }

        let duration = timer.elapsed();
        counters.last_sync_time = Some(started_at);
        counters.last_sync_duration = Some(duration);
        report.duration_ms = elapsed_ms(duration);

        tracing::info!(
            mode = ?report.mode,
            upserted = report.upserted,
            deleted = report.deleted,
            evicted = report.evicted,
            duration_ms = report.duration_ms,
            items = self.storage.count(),
            "sync complete"
        );
        Ok(report)
    }

    pub fn stats(&self) -> CacheStats {
        let counters = lock_or_recover(&self.counters);
        CacheStats {
            hits: counters.hits,
            misses: counters.misses,
            updates: counters.updates,
            removals: counters.removals,
            evictions: counters.evictions,
            db_lookups: counters.db_lookups,
            db_lookup_hits: counters.db_lookup_hits,
            last_sync_time: counters.last_sync_time,
            last_sync_duration_ms: counters.last_sync_duration.map(elapsed_ms),
            items_count: self.storage.count(),
            max_items: self.config.max_items,
            eviction_policy: self.eviction.policy(),
            index_stats: self.indexes.stats(),
        }
    }

    /// True if `path` is cached. Does not count as an access.
    pub fn contains(&self, path: &str) -> bool {
        let _guard = lock_or_recover(&self.counters);
        self.storage.contains(path)
    }

    pub fn len(&self) -> usize {
        let _guard = lock_or_recover(&self.counters);
        self.storage.count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn update_locked(&self, counters: &mut CacheCounters, record: Arc<MetadataRecord>) -> bool {
        if let Err(reason) = record.validate() {
            tracing::warn!(
                path = %record.path,
                reason = %reason,
                "rejected invalid metadata record"
            );
            return false;
        }
        let path = record.path.as_str();

        if !self.storage.contains(path) && self.storage.count() >= self.config.max_items {
            self.evict_locked(counters);
        }

        if !self.storage.put(path, record.clone()) {
            return false;
        }
        self.indexes.index_metadata(&record);
        self.eviction.record_access(path);
        counters.updates += 1;
        true
    }

    fn evict_locked(&self, counters: &mut CacheCounters) {
        let count = self.storage.count();
        let batch_size = self.config.eviction_batch_for(count);
        let victims = self.eviction.select_for_eviction(batch_size);

        let mut evicted = 0;
        for key in &victims {
            // Already forgotten by the strategy.
            if self.storage.remove(key) {
                evicted += 1;
            } else {
                tracing::warn!(
                    path = %key,
                    "eviction tracker/storage divergence: selected key not in storage"
                );
            }
            self.indexes.remove_from_indexes(key);
        }
        counters.evictions += evicted;

        tracing::debug!(count, batch_size, evicted, "capacity reached, evicted batch");
    }

    fn remove_locked(&self, counters: &mut CacheCounters, path: &str) -> bool {
        if !self.storage.remove(path) {
            return false;
        }
        self.indexes.remove_from_indexes(path);
        self.eviction.remove_key(path);
        counters.removals += 1;
        true
    }

    fn clear_locked(&self, counters: &mut CacheCounters) {
        self.storage.clear();
        self.indexes.clear();
        self.eviction.clear();
        counters.reset();
    }
}

#[allow(clippy::cast_possible_truncation)]
fn elapsed_ms(duration: Duration) -> u64 {
    duration.as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::{CacheError, ConfigError, SyncError, SyncResult};
    use crate::domain::models::EvictionPolicy;
    use crate::domain::ports::RecordStream;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Store that knows a fixed set of records and counts lookups.
    #[derive(Default)]
    struct FixedStore {
        records: Vec<MetadataRecord>,
        lookups: AtomicUsize,
        fail_lookups: bool,
    }

    impl MetadataSynchronizer for FixedStore {
        fn get_by_path(&self, path: &str, _source_id: &str) -> SyncResult<Option<MetadataRecord>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            if self.fail_lookups {
                return Err(SyncError::Unavailable("store offline".into()));
            }
            Ok(self.records.iter().find(|r| r.path == path).cloned())
        }

        fn full_reload(&self, _source_id: &str) -> SyncResult<RecordStream<'_>> {
            Ok(Box::new(self.records.iter().cloned().map(Ok)))
        }

        fn changes_since(
            &self,
            _source_id: &str,
            _since: Option<DateTime<Utc>>,
        ) -> SyncResult<Vec<SyncOperation>> {
            Err(SyncError::Unavailable("no change feed".into()))
        }
    }

    fn cache_with(store: Arc<FixedStore>, max_items: usize) -> MetadataCache {
        let config = CacheConfig::new(max_items, 1, EvictionPolicy::Lru).unwrap();
        MetadataCache::new(config, store).unwrap()
    }

    #[test]
    fn test_cache_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MetadataCache>();
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = CacheConfig {
            max_items: 0,
            ..CacheConfig::default()
        };
        let result = MetadataCache::new(config, Arc::new(FixedStore::default()));
        assert!(matches!(
            result,
            Err(CacheError::Config(ConfigError::InvalidMaxItems(0)))
        ));
    }

    #[test]
    fn test_miss_then_hit() {
        let store = Arc::new(FixedStore {
            records: vec![MetadataRecord::new("a.rs").with_language("rust")],
            ..Default::default()
        });
        let cache = cache_with(store.clone(), 10);

        let first = cache.get("a.rs", "repo").unwrap().unwrap();
        let second = cache.get("a.rs", "repo").unwrap().unwrap();

        assert_eq!(first, second);
        assert_eq!(store.lookups.load(Ordering::SeqCst), 1);
        let stats = cache.stats();
        assert_eq!(
            (stats.hits, stats.misses, stats.db_lookups, stats.db_lookup_hits),
            (1, 1, 1, 1)
        );
        assert_eq!(stats.updates, 1);
    }

    #[test]
    fn test_strategy_follows_configured_policy() {
        let config = CacheConfig::new(10, 1, EvictionPolicy::Lfu).unwrap();
        let cache = MetadataCache::new(config, Arc::new(FixedStore::default())).unwrap();

        assert_eq!(cache.stats().eviction_policy, EvictionPolicy::Lfu);
    }

    /// Store that answers every lookup with a record for `other.rs`.
    struct WrongPathStore {
        lookups: AtomicUsize,
    }

    impl MetadataSynchronizer for WrongPathStore {
        fn get_by_path(
            &self,
            _path: &str,
            _source_id: &str,
        ) -> SyncResult<Option<MetadataRecord>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok(Some(MetadataRecord::new("other.rs")))
        }

        fn full_reload(&self, _source_id: &str) -> SyncResult<RecordStream<'_>> {
            Ok(Box::new(std::iter::empty()))
        }

        fn changes_since(
            &self,
            _source_id: &str,
            _since: Option<DateTime<Utc>>,
        ) -> SyncResult<Vec<SyncOperation>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_record_for_other_path_is_not_found() {
        let store = Arc::new(WrongPathStore {
            lookups: AtomicUsize::new(0),
        });
        let config = CacheConfig::new(1, 1, EvictionPolicy::Lru).unwrap();
        let cache = MetadataCache::new(config, store.clone()).unwrap();
        cache.update(MetadataRecord::new("kept.rs"));

        assert!(cache.get("asked.rs", "repo").unwrap().is_none());

        assert!(!cache.contains("asked.rs"));
        assert!(!cache.contains("other.rs"));
        assert!(cache.contains("kept.rs"), "no eviction for an unrequested path");
        let stats = cache.stats();
        assert_eq!(stats.db_lookups, 1);
        assert_eq!(stats.db_lookup_hits, 0);
        assert_eq!(stats.evictions, 0);
        assert_eq!(store.lookups.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_lookup_failure_propagates() {
        let store = Arc::new(FixedStore {
            fail_lookups: true,
            ..Default::default()
        });
        let cache = cache_with(store, 10);

        let result = cache.get("a.rs", "repo");
        assert!(matches!(result, Err(CacheError::Sync(SyncError::Unavailable(_)))));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_empty_path_skips_lookup() {
        let store = Arc::new(FixedStore::default());
        let cache = cache_with(store.clone(), 10);

        assert!(cache.get("", "repo").unwrap().is_none());
        assert_eq!(store.lookups.load(Ordering::SeqCst), 0);
        assert_eq!(cache.stats().misses, 0);
    }

    #[test]
    fn test_invalid_record_is_dropped() {
        let cache = cache_with(Arc::new(FixedStore::default()), 10);
        cache.update(MetadataRecord::new(""));

        assert!(cache.is_empty());
        assert_eq!(cache.stats().updates, 0);
    }

    #[test]
    fn test_replacing_at_capacity_does_not_evict() {
        let cache = cache_with(Arc::new(FixedStore::default()), 2);
        cache.update(MetadataRecord::new("a.rs"));
        cache.update(MetadataRecord::new("b.rs"));
        cache.update(MetadataRecord::new("a.rs").with_language("rust"));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn test_failed_incremental_sync_is_skipped() {
        let cache = cache_with(Arc::new(FixedStore::default()), 10);
        cache.update(MetadataRecord::new("a.rs"));

        let report = cache.synchronize_with_database("repo", false).unwrap();

        assert!(report.skipped);
        assert_eq!(report.mode, SyncMode::Incremental);
        assert!(cache.contains("a.rs"));
        assert!(cache.stats().last_sync_time.is_none());
    }

    #[test]
    fn test_full_sync_reloads_everything() {
        let store = Arc::new(FixedStore {
            records: vec![MetadataRecord::new("a.rs"), MetadataRecord::new("b.rs")],
            ..Default::default()
        });
        let cache = cache_with(store, 10);
        cache.update(MetadataRecord::new("stale.rs"));

        let report = cache.synchronize_with_database("repo", true).unwrap();

        assert_eq!(report.upserted, 2);
        assert!(!cache.contains("stale.rs"));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().last_sync_time, Some(report.started_at));
    }
}
