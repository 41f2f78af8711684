// qualis-core/src/ports/mod.rs

pub mod connector;
pub mod store;

pub use connector::{Row, SourceConnector, SourceSession};
pub use store::{ActivityLog, ResultStore};
