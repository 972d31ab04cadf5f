//! Index-backed query execution.

use std::collections::HashSet;
use std::sync::Arc;

use crate::domain::models::{MetadataQuery, MetadataRecord};

use super::eviction::EvictionStrategy;
use super::index_manager::{IndexKind, IndexManager};
use super::storage::MetadataStorage;

/// Answers [`MetadataQuery`] filters from the secondary indexes.
///
/// Indexed predicates are intersected, the optional path pattern filters the
/// candidates, and only the first `limit` paths (in path order) are read from
/// storage. Every returned record counts as a use for eviction purposes.
#[derive(Debug, Clone)]
pub struct QueryEngine {
    storage: Arc<MetadataStorage>,
    indexes: Arc<IndexManager>,
    eviction: Arc<dyn EvictionStrategy>,
}

impl QueryEngine {
    pub fn new(
        storage: Arc<MetadataStorage>,
        indexes: Arc<IndexManager>,
        eviction: Arc<dyn EvictionStrategy>,
    ) -> Self {
        Self {
            storage,
            indexes,
            eviction,
        }
    }

    pub fn execute(&self, query: &MetadataQuery) -> Vec<Arc<MetadataRecord>> {
        if query.is_unfiltered() {
            tracing::debug!("query without predicates matches nothing");
            return Vec::new();
        }

        let Some(candidates) = self.candidates(query) else {
            return Vec::new();
        };

        let mut paths: Vec<String> = match query.path_pattern() {
            Some(pattern) => candidates.into_iter().filter(|p| pattern.is_match(p)).collect(),
            None => candidates.into_iter().collect(),
        };
        paths.sort_unstable();

        let limit = query.limit().unwrap_or(usize::MAX);
        paths.truncate(limit);

        let mut results = Vec::with_capacity(paths.len());
        for path in &paths {
            match self.storage.get(path) {
                Some(record) => results.push(record),
                None => tracing::warn!(
                    path = %path,
                    "index/storage divergence: indexed path missing from storage"
                ),
            }
        }
        results.truncate(limit);

        for record in &results {
            self.eviction.record_access(&record.path);
        }

        tracing::debug!(matched = results.len(), "query executed");
        results
    }

    /// Candidate paths before the path-pattern filter, `None` when the
    /// indexed predicates already intersect to nothing.
    fn candidates(&self, query: &MetadataQuery) -> Option<HashSet<String>> {
        let predicates = [
            (IndexKind::Language, query.language()),
            (IndexKind::ReferenceDoc, query.reference_doc()),
            (IndexKind::Function, query.function_name()),
            (IndexKind::Class, query.class_name()),
        ];

        let mut candidates: Option<HashSet<String>> = None;
        for (kind, value) in predicates {
            let Some(value) = value else { continue };
            let paths = self.indexes.paths(kind, value);
            let next = match candidates {
                None => paths,
                Some(current) => current.into_iter().filter(|p| paths.contains(p)).collect(),
            };
            if next.is_empty() {
                tracing::debug!(
                    index = kind.as_str(),
                    value = %value,
                    "query predicates intersect to nothing"
                );
                return None;
            }
            candidates = Some(next);
        }

        // Pattern-only query: scan every cached key, O(cache size).
        Some(candidates.unwrap_or_else(|| self.storage.all_keys()))
    }
}
