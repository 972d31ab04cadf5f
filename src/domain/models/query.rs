//! Attribute filter for cache queries.

use regex::Regex;

use crate::domain::errors::{CacheError, CacheResult};

/// Immutable filter over cached metadata.
///
/// Each of `language`, `reference_doc`, `function_name` and `class_name` is
/// answered from a secondary index and the predicates are intersected.
/// `path_pattern` is a regex post-filter applied to candidate paths (search
/// semantics, anchor with `^`/`$` for a full match). A query without any
/// predicate matches nothing.
#[derive(Debug, Clone, Default)]
pub struct MetadataQuery {
    language: Option<String>,
    reference_doc: Option<String>,
    function_name: Option<String>,
    class_name: Option<String>,
    path_pattern: Option<Regex>,
    limit: Option<usize>,
}

impl MetadataQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_reference_doc(mut self, doc_path: impl Into<String>) -> Self {
        self.reference_doc = Some(doc_path.into());
        self
    }

    pub fn with_function_name(mut self, name: impl Into<String>) -> Self {
        self.function_name = Some(name.into());
        self
    }

    pub fn with_class_name(mut self, name: impl Into<String>) -> Self {
        self.class_name = Some(name.into());
        self
    }

    /// Restrict results to paths matching `pattern`.
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidQuery`] if `pattern` is not a valid regex.
    pub fn with_path_pattern(mut self, pattern: &str) -> CacheResult<Self> {
        let regex = Regex::new(pattern).map_err(|e| {
            CacheError::InvalidQuery(format!("invalid path pattern '{pattern}': {e}"))
        })?;
        self.path_pattern = Some(regex);
        Ok(self)
    }

    /// Cap the number of returned records.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn reference_doc(&self) -> Option<&str> {
        self.reference_doc.as_deref()
    }

    pub fn function_name(&self) -> Option<&str> {
        self.function_name.as_deref()
    }

    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    pub fn path_pattern(&self) -> Option<&Regex> {
        self.path_pattern.as_ref()
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// True if at least one index-backed predicate is set.
    pub fn has_index_predicate(&self) -> bool {
        self.language.is_some()
            || self.reference_doc.is_some()
            || self.function_name.is_some()
            || self.class_name.is_some()
    }

    pub fn is_unfiltered(&self) -> bool {
        !self.has_index_predicate() && self.path_pattern.is_none()
    }
}
