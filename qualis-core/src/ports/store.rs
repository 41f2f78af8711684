// qualis-core/src/ports/store.rs

use async_trait::async_trait;

use crate::domain::activity::ActivityEntry;
use crate::domain::rules::RuleExecutionResult;
use crate::error::QualisError;

/// Append-only log of rule executions. Rows are never updated.
#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn append(&self, result: &RuleExecutionResult) -> Result<(), QualisError>;

    /// Every stored result, in append order.
    async fn all(&self) -> Result<Vec<RuleExecutionResult>, QualisError>;

    async fn for_rule(&self, rule_id: &str) -> Result<Vec<RuleExecutionResult>, QualisError> {
        Ok(self
            .all()
            .await?
            .into_iter()
            .filter(|r| r.rule_id == rule_id)
            .collect())
    }
}

#[async_trait]
pub trait ActivityLog: Send + Sync {
    async fn record(&self, entry: ActivityEntry) -> Result<(), QualisError>;

    async fn entries(&self) -> Result<Vec<ActivityEntry>, QualisError>;
}
