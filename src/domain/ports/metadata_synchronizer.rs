use chrono::{DateTime, Utc};

use crate::domain::errors::SyncResult;
use crate::domain::models::{MetadataRecord, SyncOperation};

/// Lazily produced records from a full reload.
pub type RecordStream<'a> = Box<dyn Iterator<Item = SyncResult<MetadataRecord>> + Send + 'a>;

/// Port to the persistent metadata store behind the cache.
///
/// Calls are synchronous and are made while the cache holds its top-level
/// lock, so implementations should return promptly. Timeouts and
/// cancellation are the implementation's responsibility.
pub trait MetadataSynchronizer: Send + Sync {
    /// Point lookup used on a cache miss.
    ///
    /// Returns `Ok(None)` if the store has no record for `path`.
    fn get_by_path(&self, path: &str, source_id: &str) -> SyncResult<Option<MetadataRecord>>;

    /// Every record of `source_id`, used for a full sync.
    fn full_reload(&self, source_id: &str) -> SyncResult<RecordStream<'_>>;

    /// Changes of `source_id` since `since` (everything when `None`).
    ///
    /// The cache applies the returned operations in order through its own
    /// update/remove paths, so capacity and index invariants hold.
    fn changes_since(
        &self,
        source_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> SyncResult<Vec<SyncOperation>>;
}
