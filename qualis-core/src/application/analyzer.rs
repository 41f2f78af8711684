// qualis-core/src/application/analyzer.rs

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

use crate::application::engine::{elapsed_ms, execute_query, within_timeout};
use crate::application::history::{AlertBook, PerformanceStats, QueryHistory, SlowQueryAlert};
use crate::application::limiter::ConnectionLimiter;
use crate::domain::activity::ActivityEntry;
use crate::domain::catalog::{Catalog, SourceDescriptor};
use crate::domain::error::DomainError;
use crate::domain::performance::shape::{is_read_only, query_id};
use crate::domain::performance::{
    ExecutionPlan, PerformanceGrade, PerformanceGrader, QueryMetrics, QueryShape, heuristics,
};
use crate::error::QualisError;
use crate::ports::connector::{Row, SourceConnector};
use crate::ports::store::ActivityLog;

pub const FAILED_QUERY_SUGGESTION: &str =
    "Check query syntax and ensure all referenced tables and columns exist";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalyzeOptions {
    /// Ask the source for an execution plan before running the query.
    pub explain: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryExecutionResult {
    pub query_id: String,
    pub source_id: String,
    pub success: bool,
    pub rows: Vec<Row>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub metrics: QueryMetrics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<ExecutionPlan>,
    pub grade: PerformanceGrade,
    pub performance_score: u8,
    pub suggestions: Vec<String>,
}

impl QueryExecutionResult {
    /// The grade-F shape shared by rejected and failed analyses.
    pub fn failed(
        query_id: String,
        source_id: &str,
        error: &QualisError,
        execution_time_ms: u64,
        plan: Option<ExecutionPlan>,
    ) -> Self {
        Self {
            metrics: QueryMetrics::failed(query_id.clone(), execution_time_ms),
            query_id,
            source_id: source_id.to_string(),
            success: false,
            rows: Vec::new(),
            error: Some(error.to_string()),
            plan,
            grade: PerformanceGrade::F,
            performance_score: 0,
            suggestions: vec![FAILED_QUERY_SUGGESTION.to_string()],
        }
    }
}

/// Runs ad-hoc read-only queries, grades them and keeps their recent history.
pub struct QueryAnalyzer {
    catalog: Arc<Catalog>,
    connector: Arc<dyn SourceConnector>,
    activity: Arc<dyn ActivityLog>,
    limiter: Arc<ConnectionLimiter>,
    timeout: Duration,
    history: QueryHistory,
    alerts: AlertBook,
}

impl QueryAnalyzer {
    pub fn new(
        catalog: Arc<Catalog>,
        connector: Arc<dyn SourceConnector>,
        activity: Arc<dyn ActivityLog>,
        limiter: Arc<ConnectionLimiter>,
        timeout: Duration,
    ) -> Self {
        Self {
            catalog,
            connector,
            activity,
            limiter,
            timeout,
            history: QueryHistory::new(),
            alerts: AlertBook::new(),
        }
    }

    #[instrument(skip(self, query), fields(query.len = query.len()))]
    pub async fn analyze(
        &self,
        query: &str,
        source_id: &str,
        options: AnalyzeOptions,
    ) -> Result<QueryExecutionResult, QualisError> {
        let source = self.catalog.source(source_id)?;
        let id = query_id(query);
        if !is_read_only(query) {
            return Err(DomainError::configuration(
                &id,
                "only read-only queries (SELECT, WITH, VALUES, SHOW, DESCRIBE) can be analyzed",
            )
            .into());
        }

        let _permit = self.limiter.acquire(&source.id).await?;
        let plan = if options.explain {
            Some(self.fetch_plan(source, query).await)
        } else {
            None
        };

        let start = Instant::now();
        let outcome = within_timeout(self.timeout, async {
            let mut session = self.connector.open(source).await?;
            execute_query(session.as_mut(), query).await
        })
        .await;
        let execution_time_ms = elapsed_ms(start);

        match outcome {
            Ok(rows) => {
                let indexes = plan.as_ref().map(ExecutionPlan::indexes_used).unwrap_or_default();
                let mut metrics = heuristics::estimate(
                    &id,
                    QueryShape::from_sql(query),
                    rows.len() as u64,
                    execution_time_ms,
                    indexes,
                );
                let report = PerformanceGrader::grade(&metrics, plan.as_ref());
                metrics.suggestions = report.suggestions.clone();

                self.history.record(metrics.clone())?;
                if let Some(alert) = self.alerts.observe(&source.id, &metrics, report.grade)? {
                    warn!(query_id = %id, grade = %report.grade, occurrences = alert.occurrences, "Slow query alert");
                }
                if let Err(e) = self
                    .activity
                    .record(ActivityEntry::query_analyzed(&id, &source.name, report.grade))
                    .await
                {
                    warn!(query_id = %id, error = %e, "Activity entry not recorded");
                }
                info!(query_id = %id, grade = %report.grade, ms = execution_time_ms, "Query analyzed");

                Ok(QueryExecutionResult {
                    query_id: id,
                    source_id: source.id.clone(),
                    success: true,
                    rows,
                    error: None,
                    metrics,
                    plan,
                    grade: report.grade,
                    performance_score: report.score,
                    suggestions: report.suggestions,
                })
            }
            Err(e) if e.is_operational() => {
                warn!(query_id = %id, error = %e, "Query analysis failed at the source");
                Ok(QueryExecutionResult::failed(id, &source.id, &e, execution_time_ms, plan))
            }
            Err(e) => Err(e),
        }
    }

    /// Best effort: any failure degrades to a placeholder plan.
    async fn fetch_plan(&self, source: &SourceDescriptor, query: &str) -> ExecutionPlan {
        let fetched = within_timeout(self.timeout, async {
            let mut session = self.connector.open(source).await?;
            session.explain(query).await
        })
        .await;
        match fetched {
            Ok(root) => ExecutionPlan::from_source(root),
            Err(e) => {
                warn!(error = %e, "Execution plan unavailable, using placeholder");
                ExecutionPlan::placeholder(&e.to_string())
            }
        }
    }

    /// The last ten metrics recorded for `query_id`, oldest first.
    pub fn query_history(&self, query_id: &str) -> Result<Vec<QueryMetrics>, QualisError> {
        self.history.for_query(query_id)
    }

    pub fn performance_stats(&self) -> Result<PerformanceStats, QualisError> {
        self.history.stats()
    }

    pub fn alerts(&self) -> Result<Vec<SlowQueryAlert>, QualisError> {
        self.alerts.alerts()
    }

    pub fn clear_alert(&self, query_id: &str) -> Result<bool, QualisError> {
        self.alerts.clear(query_id)
    }
}
