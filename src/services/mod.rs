//! Service layer.

pub mod metadata_cache;

pub use metadata_cache::{
    strategy_for, EvictionStrategy, IndexKind, IndexManager, LfuStrategy, LruStrategy,
    MetadataCache, MetadataStorage, QueryEngine,
};
