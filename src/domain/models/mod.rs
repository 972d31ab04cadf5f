//! Domain models for the metadata cache.

pub mod config;
pub mod metadata;
pub mod query;
pub mod stats;
pub mod sync;

pub use config::{CacheConfig, Config, EvictionPolicy, LoggingConfig};
pub use metadata::{
    ChangeRecord, ClassMetadata, DocSections, FileHeader, FunctionMetadata, LineRange,
    MetadataRecord,
};
pub use query::MetadataQuery;
pub use stats::{CacheStats, IndexSize, IndexStats};
pub use sync::{SyncMode, SyncOperation, SyncReport};
