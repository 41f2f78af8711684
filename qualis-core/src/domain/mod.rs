pub mod activity;
pub mod catalog;
pub mod error;
pub mod performance;
pub mod project;
pub mod rules;
pub mod scoring;

// Re-exports pratiques pour simplifier les imports ailleurs
pub use error::DomainError;
