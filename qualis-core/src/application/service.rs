// qualis-core/src/application/service.rs

use std::sync::Arc;
use tracing::warn;

use crate::application::analyzer::{AnalyzeOptions, QueryAnalyzer, QueryExecutionResult};
use crate::application::executor::{RuleExecutor, rejected};
use crate::application::history::{PerformanceStats, SlowQueryAlert};
use crate::application::limiter::ConnectionLimiter;
use crate::application::orchestrator::{BatchReport, BulkOrchestrator};
use crate::application::scoring::ScoreCardService;
use crate::domain::catalog::Catalog;
use crate::domain::performance::QueryMetrics;
use crate::domain::performance::shape::query_id;
use crate::domain::project::EngineSettings;
use crate::domain::rules::RuleExecutionResult;
use crate::domain::scoring::QualityScoreCard;
use crate::error::QualisError;
use crate::ports::connector::SourceConnector;
use crate::ports::store::{ActivityLog, ResultStore};

/// Entry point for the surrounding service layer (CLI, HTTP...).
/// Owns the analyzer's history and alert state; build one per process.
pub struct QualisService {
    catalog: Arc<Catalog>,
    executor: Arc<RuleExecutor>,
    orchestrator: BulkOrchestrator,
    scoring: ScoreCardService,
    analyzer: QueryAnalyzer,
}

impl QualisService {
    pub fn new(
        catalog: Catalog,
        settings: &EngineSettings,
        connector: Arc<dyn SourceConnector>,
        results: Arc<dyn ResultStore>,
        activity: Arc<dyn ActivityLog>,
    ) -> Self {
        let catalog = Arc::new(catalog);
        // one limiter shared by rule runs and analyses
        let limiter = Arc::new(ConnectionLimiter::new(settings.max_connections_per_source));
        let executor = Arc::new(RuleExecutor::new(
            catalog.clone(),
            connector.clone(),
            results.clone(),
            activity.clone(),
            limiter.clone(),
            settings.query_timeout(),
        ));

        Self {
            orchestrator: BulkOrchestrator::new(executor.clone(), settings.max_connections_per_source),
            scoring: ScoreCardService::new(catalog.clone(), results),
            analyzer: QueryAnalyzer::new(
                catalog.clone(),
                connector,
                activity,
                limiter,
                settings.query_timeout(),
            ),
            executor,
            catalog,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Unknown ids and broken rule configs come back as a failed result that is not
    /// persisted. `Err` is left for store and internal failures.
    pub async fn execute_rule(&self, rule_id: &str) -> Result<RuleExecutionResult, QualisError> {
        match self.executor.execute(rule_id).await {
            Err(e @ QualisError::Domain(_)) => {
                warn!(rule = rule_id, error = %e, "Rule rejected");
                Ok(rejected(rule_id, &e))
            }
            outcome => outcome,
        }
    }

    pub async fn execute_all_for_table(
        &self,
        table_id: &str,
    ) -> Result<Vec<RuleExecutionResult>, QualisError> {
        self.orchestrator.execute_all_for_table(table_id).await
    }

    pub async fn execute_all_active(&self) -> BatchReport {
        self.orchestrator.execute_all_active().await
    }

    pub async fn score_cards(&self) -> Result<Vec<QualityScoreCard>, QualisError> {
        self.scoring.score_cards().await
    }

    pub async fn analyze_query(
        &self,
        query: &str,
        source_id: &str,
        options: AnalyzeOptions,
    ) -> Result<QueryExecutionResult, QualisError> {
        match self.analyzer.analyze(query, source_id, options).await {
            Err(e @ QualisError::Domain(_)) => {
                warn!(source = source_id, error = %e, "Query rejected");
                Ok(QueryExecutionResult::failed(query_id(query), source_id, &e, 0, None))
            }
            outcome => outcome,
        }
    }

    pub fn query_history(&self, query_id: &str) -> Result<Vec<QueryMetrics>, QualisError> {
        self.analyzer.query_history(query_id)
    }

    pub fn performance_stats(&self) -> Result<PerformanceStats, QualisError> {
        self.analyzer.performance_stats()
    }

    pub fn alerts(&self) -> Result<Vec<SlowQueryAlert>, QualisError> {
        self.analyzer.alerts()
    }

    pub fn clear_alert(&self, query_id: &str) -> Result<bool, QualisError> {
        self.analyzer.clear_alert(query_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::mock::{MockConnector, catalog, rule};
    use crate::domain::performance::PerformanceGrade;
    use crate::domain::rules::{RuleConfig, RuleKind};
    use crate::infrastructure::store::{InMemoryActivityLog, InMemoryResultStore};
    use anyhow::Result;
    use serde_json::json;

    fn service(connector: Arc<MockConnector>) -> (QualisService, Arc<InMemoryResultStore>) {
        let results = Arc::new(InMemoryResultStore::new());
        let rules = vec![rule("r1", RuleKind::Range, Some("age"), RuleConfig::default())];
        let service = QualisService::new(
            catalog(rules),
            &EngineSettings::default(),
            connector,
            results.clone(),
            Arc::new(InMemoryActivityLog::new()),
        );
        (service, results)
    }

    #[tokio::test]
    async fn test_rejected_rules_come_back_as_failed_results() -> Result<()> {
        let connector = Arc::new(MockConnector::counts(1, 0));
        let (service, results) = service(connector.clone());

        // range without bounds
        let broken = service.execute_rule("r1").await?;
        assert!(broken.is_failure() && !broken.passed);
        assert_eq!(broken.score, 0);
        assert_eq!(broken.details["error_kind"], json!("configuration"));

        let unknown = service.execute_rule("nope").await?;
        assert_eq!(unknown.rule_id, "nope");
        assert_eq!(unknown.details["error_kind"], json!("rule_not_found"));

        assert!(connector.issued().is_empty());
        assert!(results.all().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_rejected_queries_grade_f() -> Result<()> {
        let connector = Arc::new(MockConnector::counts(1, 0));
        let (service, _) = service(connector.clone());

        let unknown = service
            .analyze_query("SELECT 1", "nowhere", AnalyzeOptions::default())
            .await?;
        assert!(!unknown.success);
        assert_eq!(unknown.grade, PerformanceGrade::F);
        assert_eq!(unknown.source_id, "nowhere");
        assert!(unknown.error.unwrap_or_default().contains("Source 'nowhere' not found"));

        let write = service
            .analyze_query("DELETE FROM people", "s1", AnalyzeOptions::default())
            .await?;
        assert!(!write.success);
        assert_eq!(write.suggestions.len(), 1);
        assert!(write.error.unwrap_or_default().contains("read-only"));

        assert!(connector.issued().is_empty());
        assert_eq!(service.performance_stats()?.total_queries, 0);
        Ok(())
    }
}
