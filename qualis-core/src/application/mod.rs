// qualis-core/src/application/mod.rs

pub mod analyzer;
pub mod engine;
pub mod executor;
pub mod history;
pub mod limiter;
pub mod orchestrator;
pub mod scoring;
pub mod service;

#[cfg(test)]
pub(crate) mod mock;

// Facade: the CLI only needs `use qualis_core::application::{QualisService, ...}`
pub use analyzer::{AnalyzeOptions, QueryExecutionResult};
pub use engine::execute_query;
pub use history::{PerformanceStats, SlowQueryAlert};
pub use orchestrator::{BatchError, BatchReport};
pub use service::QualisService;
