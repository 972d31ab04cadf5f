//! JSON-lines snapshot store adapter.

pub mod jsonl_store;

pub use jsonl_store::JsonLinesMetadataStore;
