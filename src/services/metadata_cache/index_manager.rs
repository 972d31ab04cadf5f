//! Secondary inverted indexes over cached records.
//!
//! Each index maps an attribute value to the set of paths whose record
//! carries that value. For every live record and every indexable value it
//! carries, the record's path is in exactly that value's bucket, and empty
//! buckets are pruned.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::domain::models::{IndexSize, IndexStats, MetadataRecord};
use crate::sync_util::lock_or_recover;

/// Indexable record attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    Language,
    ReferenceDoc,
    /// Function names, including class method names
    Function,
    Class,
}

impl IndexKind {
    pub const ALL: [Self; 4] = [Self::Language, Self::ReferenceDoc, Self::Function, Self::Class];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Language => "language",
            Self::ReferenceDoc => "reference_doc",
            Self::Function => "function",
            Self::Class => "class",
        }
    }
}

type Index = HashMap<String, HashSet<String>>;

#[derive(Debug, Default)]
struct Indexes {
    language: Index,
    reference_doc: Index,
    function: Index,
    class: Index,
}

impl Indexes {
    fn get(&self, kind: IndexKind) -> &Index {
        match kind {
            IndexKind::Language => &self.language,
            IndexKind::ReferenceDoc => &self.reference_doc,
            IndexKind::Function => &self.function,
            IndexKind::Class => &self.class,
        }
    }

    fn get_mut(&mut self, kind: IndexKind) -> &mut Index {
        match kind {
            IndexKind::Language => &mut self.language,
            IndexKind::ReferenceDoc => &mut self.reference_doc,
            IndexKind::Function => &mut self.function,
            IndexKind::Class => &mut self.class,
        }
    }

    fn insert(&mut self, kind: IndexKind, value: &str, path: &str) {
        self.get_mut(kind)
            .entry(value.to_string())
            .or_default()
            .insert(path.to_string());
    }

    /// Drop `path` from every bucket of every index, pruning empty buckets.
    fn remove_path(&mut self, path: &str) -> usize {
        let mut removed = 0;
        for kind in IndexKind::ALL {
            let index = self.get_mut(kind);
            index.retain(|_, paths| {
                if paths.remove(path) {
                    removed += 1;
                }
                !paths.is_empty()
            });
        }
        removed
    }

    fn size(&self, kind: IndexKind) -> IndexSize {
        let index = self.get(kind);
        IndexSize {
            values: index.len(),
            entries: index.values().map(HashSet::len).sum(),
        }
    }
}

/// Maintains the language, reference-doc, function and class indexes.
#[derive(Debug, Default)]
pub struct IndexManager {
    indexes: Mutex<Indexes>,
}

impl IndexManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index `record`, replacing whatever was indexed for its path before.
    pub fn index_metadata(&self, record: &MetadataRecord) {
        let path = record.path.as_str();
        let mut indexes = lock_or_recover(&self.indexes);

        indexes.remove_path(path);

        if let Some(language) = record.indexed_language() {
            indexes.insert(IndexKind::Language, language, path);
        }
        for doc in record.referenced_docs() {
            indexes.insert(IndexKind::ReferenceDoc, doc, path);
        }
        for function in record.function_names() {
            indexes.insert(IndexKind::Function, function, path);
        }
        for class in record.class_names() {
            indexes.insert(IndexKind::Class, class, path);
        }
    }

    /// Remove `path` from all indexes. Idempotent.
    pub fn remove_from_indexes(&self, path: &str) {
        let removed = lock_or_recover(&self.indexes).remove_path(path);
        if removed > 0 {
            tracing::trace!(path = %path, memberships = removed, "removed path from indexes");
        }
    }

    /// Copy of the path set for `value` in the `kind` index.
    pub fn paths(&self, kind: IndexKind, value: &str) -> HashSet<String> {
        lock_or_recover(&self.indexes)
            .get(kind)
            .get(value)
            .cloned()
            .unwrap_or_default()
    }

    pub fn paths_by_language(&self, language: &str) -> HashSet<String> {
        self.paths(IndexKind::Language, language)
    }

    pub fn paths_by_reference_doc(&self, doc_path: &str) -> HashSet<String> {
        self.paths(IndexKind::ReferenceDoc, doc_path)
    }

    pub fn paths_by_function(&self, name: &str) -> HashSet<String> {
        self.paths(IndexKind::Function, name)
    }

    pub fn paths_by_class(&self, name: &str) -> HashSet<String> {
        self.paths(IndexKind::Class, name)
    }

    pub fn clear(&self) {
        *lock_or_recover(&self.indexes) = Indexes::default();
    }

    pub fn stats(&self) -> IndexStats {
        let indexes = lock_or_recover(&self.indexes);
        IndexStats {
            language: indexes.size(IndexKind::Language),
            reference_doc: indexes.size(IndexKind::ReferenceDoc),
            function: indexes.size(IndexKind::Function),
            class: indexes.size(IndexKind::Class),
        }
    }
}
