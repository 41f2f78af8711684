// qualis-core/src/application/executor.rs

use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

use crate::application::engine::{elapsed_ms, execute_query, within_timeout};
use crate::application::limiter::ConnectionLimiter;
use crate::domain::activity::ActivityEntry;
use crate::domain::catalog::{Catalog, SourceDescriptor};
use crate::domain::error::DomainError;
use crate::domain::rules::translator::{PASSED, TOTAL_COUNT, VIOLATION_COUNT};
use crate::domain::rules::{Rule, RuleExecutionResult, RuleQueries, RuleTranslator, TranslatedRule};
use crate::error::QualisError;
use crate::ports::connector::{Row, SourceConnector};
use crate::ports::store::{ActivityLog, ResultStore};

/// Counts read back from a source for one rule.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Counts {
    total: u64,
    violations: u64,
    passed: Option<bool>,
}

/// Runs single rules against their source and records the outcome.
pub struct RuleExecutor {
    catalog: Arc<Catalog>,
    connector: Arc<dyn SourceConnector>,
    results: Arc<dyn ResultStore>,
    activity: Arc<dyn ActivityLog>,
    limiter: Arc<ConnectionLimiter>,
    timeout: Duration,
}

impl RuleExecutor {
    pub fn new(
        catalog: Arc<Catalog>,
        connector: Arc<dyn SourceConnector>,
        results: Arc<dyn ResultStore>,
        activity: Arc<dyn ActivityLog>,
        limiter: Arc<ConnectionLimiter>,
        timeout: Duration,
    ) -> Self {
        Self {
            catalog,
            connector,
            results,
            activity,
            limiter,
            timeout,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub async fn execute(&self, rule_id: &str) -> Result<RuleExecutionResult, QualisError> {
        let rule = self.catalog.rule(rule_id)?;
        self.execute_rule(rule).await
    }

    /// Structural problems (unknown table or source, broken rule config) come back as `Err`
    /// before any connection is opened. Source failures are absorbed into a persisted
    /// failed result.
    #[instrument(skip(self, rule), fields(rule.id = %rule.id, rule.kind = %rule.kind))]
    pub async fn execute_rule(&self, rule: &Rule) -> Result<RuleExecutionResult, QualisError> {
        let (table, source) = self.catalog.target_of(rule)?;
        let translated = RuleTranslator::new(source.dialect()).translate(rule, &table.name)?;

        let _permit = self.limiter.acquire(&source.id).await?;
        let start = Instant::now();
        let outcome = within_timeout(self.timeout, self.read_counts(source, &translated)).await;
        let execution_time_ms = elapsed_ms(start);

        let result = match outcome.and_then(|c| {
            RuleExecutionResult::from_counts(
                &rule.id,
                c.total,
                c.violations,
                c.passed,
                translated.details.clone(),
                execution_time_ms,
            )
            .map_err(QualisError::from)
        }) {
            Ok(result) => result,
            Err(e) if e.is_operational() => {
                warn!(error = %e, "Rule execution failed at the source");
                RuleExecutionResult::failed(
                    &rule.id,
                    e.category(),
                    &e.to_string(),
                    translated.details,
                    execution_time_ms,
                )
            }
            Err(e) => return Err(e),
        };

        self.results.append(&result).await?;
        if !result.is_failure() {
            // the result is already stored; a lost log line must not turn it into an error
            if let Err(e) = self
                .activity
                .record(ActivityEntry::rule_executed(
                    &rule.id,
                    &rule.name,
                    &table.name,
                    result.score,
                ))
                .await
            {
                warn!(error = %e, "Activity entry not recorded");
            }
            info!(
                score = result.score,
                total = result.total_count,
                violations = result.violation_count,
                ms = execution_time_ms,
                "Rule executed"
            );
        }
        Ok(result)
    }

    async fn read_counts(
        &self,
        source: &SourceDescriptor,
        translated: &TranslatedRule,
    ) -> Result<Counts, QualisError> {
        let mut session = self.connector.open(source).await?;

        match &translated.queries {
            RuleQueries::Counts { total, violations } => {
                let total_rows = execute_query(session.as_mut(), total).await?;
                let violation_rows = execute_query(session.as_mut(), violations).await?;
                Ok(Counts {
                    total: scalar_count(&total_rows, TOTAL_COUNT)?,
                    violations: scalar_count(&violation_rows, VIOLATION_COUNT)?,
                    passed: None,
                })
            }
            RuleQueries::Combined { query } => {
                let rows = execute_query(session.as_mut(), query).await?;
                let first = rows.first().ok_or_else(|| {
                    DomainError::InvalidResult("custom query returned no rows".into())
                })?;
                let column = |name: &str| {
                    first.get(name).ok_or_else(|| {
                        DomainError::InvalidResult(format!("custom query has no `{}` column", name))
                    })
                };
                Ok(Counts {
                    total: as_count(TOTAL_COUNT, column(TOTAL_COUNT)?)?,
                    violations: as_count(VIOLATION_COUNT, column(VIOLATION_COUNT)?)?,
                    passed: first.get(PASSED).map(as_flag).transpose()?,
                })
            }
        }
    }
}

/// Failed result for a rule that never reached its source. Not persisted.
pub(crate) fn rejected(rule_id: &str, error: &QualisError) -> RuleExecutionResult {
    RuleExecutionResult::failed(rule_id, error.category(), &error.to_string(), Map::new(), 0)
}

/// Reads the single count of a generated query: the aliased column, or the first one.
fn scalar_count(rows: &[Row], alias: &str) -> Result<u64, QualisError> {
    let row = rows
        .first()
        .ok_or_else(|| DomainError::InvalidResult(format!("no row returned for {}", alias)))?;
    let value = row
        .get(alias)
        .or_else(|| row.values().next())
        .ok_or_else(|| DomainError::InvalidResult(format!("no column returned for {}", alias)))?;
    as_count(alias, value)
}

fn as_count(column: &str, value: &Value) -> Result<u64, QualisError> {
    let parsed = match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        DomainError::InvalidResult(format!(
            "`{}` must be a non-negative integer, got {}",
            column, value
        ))
        .into()
    })
}

fn as_flag(value: &Value) -> Result<bool, QualisError> {
    let parsed = match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "t" | "true" | "1" => Some(true),
            "f" | "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    };
    parsed.ok_or_else(|| {
        DomainError::InvalidResult(format!("`{}` must be boolean, got {}", PASSED, value)).into()
    })
}
