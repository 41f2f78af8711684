// qualis-core/src/lib.rs

#![allow(missing_docs)]
// Memory safety
#![deny(unsafe_code)]
// Robustness
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
// Performance
#![warn(clippy::perf)]

// --- HEXAGONAL MODULES ---

// 1. Ports (Interfaces / Traits)
// Contracts consumed from the outside world: source connector, result store, activity log.
pub mod ports;

// 2. Domain (pure evaluation logic)
// Rules, translation to SQL, scoring, query metrics and grading.
// Depends on nothing but itself.
pub mod domain;

// 3. Infrastructure (Adapters)
// DuckDB connector, project configuration, JSON-lines stores.
pub mod infrastructure;

// 4. Application (Use Cases)
// Rule execution, bulk orchestration, score cards, query analysis.
pub mod application;

// --- GLOBAL ERROR HANDLING ---
pub mod error;

// --- RE-EXPORTS (FACADE) ---
pub use application::QualisService;
pub use error::QualisError;
