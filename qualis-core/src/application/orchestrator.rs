// qualis-core/src/application/orchestrator.rs

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::application::executor::{RuleExecutor, rejected};
use crate::domain::rules::{Rule, RuleExecutionResult};
use crate::error::QualisError;

/// A rule the batch could not execute at all (structural error).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchError {
    pub rule_id: String,
    pub rule_name: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    /// Rules that produced a persisted result, failed ones included.
    pub executed_count: usize,
    pub errors: Vec<BatchError>,
    pub results: Vec<RuleExecutionResult>,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.results.iter().all(|r| r.passed)
    }
}

/// Runs many rules as one batch. A rule's failure never stops its siblings.
pub struct BulkOrchestrator {
    executor: Arc<RuleExecutor>,
    concurrency: usize,
}

impl BulkOrchestrator {
    /// `concurrency` is the per-source connection limit; the executor's limiter enforces it per source.
    pub fn new(executor: Arc<RuleExecutor>, concurrency: usize) -> Self {
        Self {
            executor,
            concurrency: concurrency.max(1),
        }
    }

    /// One result per active rule of the table. Rules that cannot be translated get a
    /// failed result in the returned list, which is not persisted.
    #[instrument(skip(self))]
    pub async fn execute_all_for_table(
        &self,
        table_id: &str,
    ) -> Result<Vec<RuleExecutionResult>, QualisError> {
        let catalog = self.executor.catalog();
        catalog.table(table_id)?;
        let rules: Vec<&Rule> = catalog
            .rules_for_table(table_id)
            .filter(|r| r.active)
            .collect();

        let outcomes = self.run(rules).await;
        let results = outcomes
            .into_iter()
            .map(|(rule, outcome)| match outcome {
                Ok(result) => result,
                Err(e) => rejected(&rule.id, &e),
            })
            .collect();
        Ok(results)
    }

    /// Every active rule in the catalog. Structural failures are reported by rule name.
    #[instrument(skip(self))]
    pub async fn execute_all_active(&self) -> BatchReport {
        let rules: Vec<&Rule> = self.executor.catalog().active_rules().collect();
        let mut report = BatchReport::default();

        for (rule, outcome) in self.run(rules).await {
            match outcome {
                Ok(result) => {
                    report.executed_count += 1;
                    report.results.push(result);
                }
                Err(e) => report.errors.push(BatchError {
                    rule_id: rule.id.clone(),
                    rule_name: rule.name.clone(),
                    message: e.to_string(),
                }),
            }
        }

        info!(
            executed = report.executed_count,
            errors = report.errors.len(),
            "Batch finished"
        );
        report
    }

    /// Runs `rules` with bounded concurrency and hands outcomes back in input order.
    async fn run<'a>(
        &self,
        rules: Vec<&'a Rule>,
    ) -> Vec<(&'a Rule, Result<RuleExecutionResult, QualisError>)> {
        let executor = &self.executor;
        let mut outcomes: Vec<_> = futures::stream::iter(rules.into_iter().enumerate())
            .map(|(idx, rule)| async move {
                let outcome = executor.execute_rule(rule).await;
                if let Err(e) = &outcome {
                    warn!(rule = %rule.id, error = %e, "Rule skipped");
                }
                (idx, rule, outcome)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        outcomes.sort_by_key(|(idx, _, _)| *idx);
        outcomes
            .into_iter()
            .map(|(_, rule, outcome)| (rule, outcome))
            .collect()
    }
}
