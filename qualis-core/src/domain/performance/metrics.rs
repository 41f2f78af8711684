// qualis-core/src/domain/performance/metrics.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Derived execution metrics of one query run.
///
/// Only `execution_time_ms`, `rows_returned` and `indexes_used` are observed;
/// the rest are estimates from [`crate::domain::performance::heuristics`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryMetrics {
    pub query_id: String,
    pub executed_at: DateTime<Utc>,
    pub execution_time_ms: u64,
    pub rows_returned: u64,
    /// Estimated, never below `rows_returned`.
    pub rows_scanned: u64,
    pub memory_usage_mb: f64,
    pub cpu_time_ms: f64,
    pub io_operations: u64,
    pub cache_hits: u64,
    pub indexes_used: BTreeSet<String>,
    pub warnings: Vec<String>,
    pub suggestions: Vec<String>,
}

impl QueryMetrics {
    /// Metrics of a run that did not complete: everything zero except the elapsed time.
    pub fn failed(query_id: impl Into<String>, execution_time_ms: u64) -> Self {
        Self {
            query_id: query_id.into(),
            executed_at: Utc::now(),
            execution_time_ms,
            rows_returned: 0,
            rows_scanned: 0,
            memory_usage_mb: 0.0,
            cpu_time_ms: 0.0,
            io_operations: 0,
            cache_hits: 0,
            indexes_used: BTreeSet::new(),
            warnings: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    /// Rows scanned per row returned. An empty result counts as one returned row.
    pub fn scan_ratio(&self) -> f64 {
        self.rows_scanned as f64 / self.rows_returned.max(1) as f64
    }
}
