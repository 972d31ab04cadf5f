// Installs the global subscriber, so it lives in its own test binary.

use metacache::infrastructure::logging::{LogConfig, LogFormat, LoggerImpl, RotationPolicy};
use metacache::{CacheConfig, InMemoryMetadataStore, MetadataCache, MetadataRecord};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

#[test]
fn test_file_logging_captures_cache_events() {
    let temp_dir = TempDir::new().unwrap();
    let config = LogConfig {
        level: "debug".to_string(),
        format: LogFormat::Json,
        log_dir: Some(temp_dir.path().to_path_buf()),
        enable_stdout: false,
        rotation: RotationPolicy::Never,
    };

    let logger = LoggerImpl::init(&config).unwrap();

    let store = Arc::new(InMemoryMetadataStore::new());
    store.upsert("repo", MetadataRecord::new("src/main.rs").with_language("rust"));
    let cache = MetadataCache::new(CacheConfig::default(), store).unwrap();
    cache.synchronize_with_database("repo", true).unwrap();

    // A second subscriber cannot be installed.
    assert!(LoggerImpl::init(&config).is_err());

    // Dropping the guard flushes the background writer.
    drop(logger);

    let log_files: Vec<_> = fs::read_dir(temp_dir.path())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().contains("metacache.log"))
        .collect();
    assert_eq!(log_files.len(), 1, "log file should be created");

    let contents = fs::read_to_string(log_files[0].path()).unwrap();
    assert!(contents.contains("logger initialized"));
    assert!(contents.contains("sync complete"));
    for line in contents.lines().filter(|l| !l.trim().is_empty()) {
        assert!(
            serde_json::from_str::<serde_json::Value>(line).is_ok(),
            "file output should be JSON lines: {line}"
        );
    }
}
