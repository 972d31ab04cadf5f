//! Common test utilities for integration tests
//!
//! Provides shared fixtures and helpers used across multiple integration
//! test files.

use std::sync::Arc;

use metacache::{
    CacheConfig, ClassMetadata, EvictionPolicy, FunctionMetadata, InMemoryMetadataStore,
    MetadataCache, MetadataRecord,
};

pub const SOURCE: &str = "repo";

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
#[allow(dead_code)]
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Build a cache backed by a fresh in-memory store.
#[allow(dead_code)]
pub fn cache_with_store(
    max_items: usize,
    batch_size: usize,
    policy: EvictionPolicy,
) -> (MetadataCache, Arc<InMemoryMetadataStore>) {
    let store = Arc::new(InMemoryMetadataStore::new());
    let config = CacheConfig::new(max_items, batch_size, policy).expect("valid test config");
    let cache = MetadataCache::new(config, store.clone()).expect("cache should build");
    (cache, store)
}

/// A record with a language and one function.
#[allow(dead_code)]
pub fn source_file(path: &str, language: &str, function: &str) -> MetadataRecord {
    MetadataRecord::new(path)
        .with_language(language)
        .with_function(
            FunctionMetadata::new(function)
                .with_parameter("input")
                .with_line_range(1, 20),
        )
}

/// A record exercising every indexable attribute.
#[allow(dead_code)]
pub fn rich_record(path: &str) -> MetadataRecord {
    MetadataRecord::new(path)
        .with_language("go")
        .with_intent("Parse configuration files")
        .with_reference_doc("docs/config.md")
        .with_function(FunctionMetadata::new("Parse"))
        .with_class(
            ClassMetadata::new("Parser")
                .with_method(FunctionMetadata::new("Reset").with_line_range(30, 40))
                .with_line_range(25, 80),
        )
        .with_size_bytes(4096)
        .with_content_hash("deadbeef")
}
