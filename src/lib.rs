//! metacache - in-memory cache for source-file metadata
//!
//! Serves repeated lookups and attribute queries over extracted source-file
//! metadata without re-reading the persistent store, while staying bounded
//! in size and consistent with the store between syncs.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): records, queries, config, errors and the
//!   `MetadataSynchronizer` port to the persistent store
//! - **Service Layer** (`services`): storage, secondary indexes, eviction
//!   policies, query engine and the `MetadataCache` facade
//! - **Adapters** (`adapters`): store implementations of the port
//! - **Infrastructure Layer** (`infrastructure`): configuration loading and
//!   logging setup
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use metacache::{
//!     CacheConfig, InMemoryMetadataStore, MetadataCache, MetadataQuery, MetadataRecord,
//! };
//!
//! let store = Arc::new(InMemoryMetadataStore::new());
//! store.upsert("repo", MetadataRecord::new("src/lib.rs").with_language("rust"));
//!
//! let cache = MetadataCache::new(CacheConfig::default(), store).unwrap();
//! let record = cache.get("src/lib.rs", "repo").unwrap();
//! assert!(record.is_some());
//!
//! let rust_files = cache.query(&MetadataQuery::new().with_language("rust"));
//! assert_eq!(rust_files.len(), 1);
//! ```

pub mod adapters;
pub mod domain;
pub mod infrastructure;
pub mod services;
mod sync_util;

// Re-export commonly used types for convenience
pub use adapters::{InMemoryMetadataStore, JsonLinesMetadataStore};
pub use domain::errors::{CacheError, CacheResult, ConfigError, SyncError, SyncResult};
pub use domain::models::{
    CacheConfig, CacheStats, ClassMetadata, Config, EvictionPolicy, FunctionMetadata,
    MetadataQuery, MetadataRecord, SyncMode, SyncOperation, SyncReport,
};
pub use domain::ports::{MetadataSynchronizer, RecordStream};
pub use infrastructure::config::ConfigLoader;
pub use infrastructure::logging::{LogConfig, LoggerImpl};
pub use services::MetadataCache;
