//! Eviction policies.
//!
//! A strategy tracks every cached key and picks victims when the cache is
//! full. Tracking is 1:1 with storage membership: keys are touched on every
//! read, write and query hit, and untracked when they leave storage.
//!
//! Selection sorts all tracked keys, O(k log k) per batch. The cache evicts
//! in batches so the sort is amortized over several inserts.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::domain::models::EvictionPolicy;
use crate::sync_util::lock_or_recover;

/// Per-key usage tracking and victim selection.
pub trait EvictionStrategy: Send + Sync + fmt::Debug {
    /// Record a use of `key`, tracking it if it is new.
    fn record_access(&self, key: &str);

    /// Return up to `n` keys to evict and stop tracking them.
    ///
    /// Callers must not call [`EvictionStrategy::remove_key`] for returned
    /// keys; they are already forgotten.
    fn select_for_eviction(&self, n: usize) -> Vec<String>;

    /// Stop tracking `key` after it was removed outside eviction.
    fn remove_key(&self, key: &str);

    fn clear(&self);

    fn tracked_count(&self) -> usize;

    fn policy(&self) -> EvictionPolicy;
}

/// Build the strategy for `policy`.
pub fn strategy_for(policy: EvictionPolicy) -> Arc<dyn EvictionStrategy> {
    match policy {
        EvictionPolicy::Lru => Arc::new(LruStrategy::new()),
        EvictionPolicy::Lfu => Arc::new(LfuStrategy::new()),
    }
}

#[derive(Debug, Default)]
struct LruState {
    /// Logical clock, strictly increasing per access
    clock: u64,
    last_access: HashMap<String, u64>,
}

/// Least-recently-used eviction.
#[derive(Debug, Default)]
pub struct LruStrategy {
    state: Mutex<LruState>,
}

impl LruStrategy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EvictionStrategy for LruStrategy {
    fn record_access(&self, key: &str) {
        let mut state = lock_or_recover(&self.state);
        state.clock += 1;
        let stamp = state.clock;
        match state.last_access.get_mut(key) {
            Some(last) => *last = stamp,
            None => {
                state.last_access.insert(key.to_string(), stamp);
            }
        }
    }

    fn select_for_eviction(&self, n: usize) -> Vec<String> {
        let mut state = lock_or_recover(&self.state);
        if n == 0 || state.last_access.is_empty() {
            return Vec::new();
        }

        let mut by_age: Vec<(u64, &String)> = state
            .last_access
            .iter()
            .map(|(key, stamp)| (*stamp, key))
            .collect();
        // Stamps are unique, so an unstable sort is deterministic.
        by_age.sort_unstable_by_key(|(stamp, _)| *stamp);
        let victims: Vec<String> = by_age
            .into_iter()
            .take(n)
            .map(|(_, key)| key.clone())
            .collect();

        for key in &victims {
            state.last_access.remove(key);
        }
        victims
    }

    fn remove_key(&self, key: &str) {
        lock_or_recover(&self.state).last_access.remove(key);
    }

    fn clear(&self) {
        lock_or_recover(&self.state).last_access.clear();
    }

    fn tracked_count(&self) -> usize {
        lock_or_recover(&self.state).last_access.len()
    }

    fn policy(&self) -> EvictionPolicy {
        EvictionPolicy::Lru
    }
}

/// Least-frequently-used eviction.
///
/// Counters only grow; there is no aging, so a key that was hot long ago can
/// resist eviction indefinitely. Keys with equal counts are selected in
/// whatever order the sort leaves them.
#[derive(Debug, Default)]
pub struct LfuStrategy {
    counts: Mutex<HashMap<String, u64>>,
}

impl LfuStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current access count of `key`, if tracked.
    pub fn access_count(&self, key: &str) -> Option<u64> {
        lock_or_recover(&self.counts).get(key).copied()
    }
}

impl EvictionStrategy for LfuStrategy {
    fn record_access(&self, key: &str) {
        let mut counts = lock_or_recover(&self.counts);
        match counts.get_mut(key) {
            Some(count) => *count = count.saturating_add(1),
            None => {
                counts.insert(key.to_string(), 1);
            }
        }
    }

    fn select_for_eviction(&self, n: usize) -> Vec<String> {
        let mut counts = lock_or_recover(&self.counts);
        if n == 0 || counts.is_empty() {
            return Vec::new();
        }

        let mut by_count: Vec<(u64, &String)> =
            counts.iter().map(|(key, count)| (*count, key)).collect();
        by_count.sort_by_key(|(count, _)| *count);
        let victims: Vec<String> = by_count
            .into_iter()
            .take(n)
            .map(|(_, key)| key.clone())
            .collect();

        for key in &victims {
            counts.remove(key);
        }
        victims
    }

    fn remove_key(&self, key: &str) {
        lock_or_recover(&self.counts).remove(key);
    }

    fn clear(&self) {
        lock_or_recover(&self.counts).clear();
    }

    fn tracked_count(&self) -> usize {
        lock_or_recover(&self.counts).len()
    }

    fn policy(&self) -> EvictionPolicy {
        EvictionPolicy::Lfu
    }
}
