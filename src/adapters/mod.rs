//! Adapters implementing the metadata store port.

pub mod jsonl;
pub mod memory;

pub use jsonl::JsonLinesMetadataStore;
pub use memory::InMemoryMetadataStore;
