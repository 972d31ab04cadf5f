//! Port trait definitions (Hexagonal Architecture)
//!
//! - MetadataSynchronizer: point lookups, full reloads and incremental
//!   change sets from the persistent metadata store
//!
//! Adapters in `crate::adapters` implement these traits so the cache stays
//! independent of any specific store.

pub mod metadata_synchronizer;

pub use metadata_synchronizer::{MetadataSynchronizer, RecordStream};
