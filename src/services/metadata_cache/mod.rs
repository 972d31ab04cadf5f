//! In-memory metadata cache.
//!
//! [`MetadataCache`] is the facade the rest of the system talks to. It owns
//! the primary [`MetadataStorage`], the secondary [`IndexManager`], the active
//! [`EvictionStrategy`] and a [`QueryEngine`] over them, and falls back to a
//! [`MetadataSynchronizer`](crate::domain::ports::MetadataSynchronizer) on
//! misses and for full/incremental syncs.
//!
//! Locking is two-tiered: every component guards its own state with its own
//! mutex, and the facade serializes whole logical operations (including
//! statistics) under one top-level mutex. Component methods never call back
//! into each other, so the only lock order is facade → component.

pub mod cache;
pub mod eviction;
pub mod index_manager;
pub mod query_engine;
pub mod storage;

pub use cache::MetadataCache;
pub use eviction::{strategy_for, EvictionStrategy, LfuStrategy, LruStrategy};
pub use index_manager::{IndexKind, IndexManager};
pub use query_engine::QueryEngine;
pub use storage::MetadataStorage;
