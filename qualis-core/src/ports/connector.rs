// qualis-core/src/ports/connector.rs

// What the engine needs from a data source, without knowing how it's done.
// Connection lifecycle, SSL and credentials stay on the other side of this trait.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::domain::catalog::SourceDescriptor;
use crate::domain::performance::PlanNode;
use crate::error::QualisError;

/// One result row, keyed by column name.
pub type Row = Map<String, Value>;

#[async_trait]
pub trait SourceConnector: Send + Sync {
    /// Opens a short-lived connection dedicated to one execution.
    /// The connection is released when the returned session is dropped,
    /// whichever way the execution ends.
    async fn open(&self, source: &SourceDescriptor) -> Result<Box<dyn SourceSession>, QualisError>;
}

#[async_trait]
pub trait SourceSession: Send {
    async fn query(&mut self, sql: &str) -> Result<Vec<Row>, QualisError>;

    /// Execution plan of `sql` as reported by the source.
    async fn explain(&mut self, _sql: &str) -> Result<PlanNode, QualisError> {
        Err(QualisError::Connector(
            "this source does not provide execution plans".into(),
        ))
    }
}
