// qualis-core/src/infrastructure/store/mod.rs

pub mod jsonl;
pub mod memory;

pub use jsonl::JsonLinesStore;
pub use memory::{InMemoryActivityLog, InMemoryResultStore};
