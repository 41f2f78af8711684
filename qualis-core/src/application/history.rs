// qualis-core/src/application/history.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use crate::domain::performance::{PerformanceGrade, QueryMetrics};
use crate::domain::performance::heuristics::SLOW_QUERY_MS;
use crate::error::QualisError;

/// Metrics kept per query id.
pub const HISTORY_LIMIT: usize = 10;
const TOP_N: usize = 5;

fn lock<'a, T>(mutex: &'a Mutex<T>, what: &str) -> Result<MutexGuard<'a, T>, QualisError> {
    mutex
        .lock()
        .map_err(|_| QualisError::InternalError(format!("{} Mutex Poisoned", what)))
}

/// Rolling window of the last [`HISTORY_LIMIT`] metrics of every query id.
#[derive(Default)]
pub struct QueryHistory {
    windows: Mutex<HashMap<String, VecDeque<QueryMetrics>>>,
}

impl QueryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append and trim happen under the same lock.
    pub fn record(&self, metrics: QueryMetrics) -> Result<(), QualisError> {
        let mut windows = lock(&self.windows, "History")?;
        let window = windows.entry(metrics.query_id.clone()).or_default();
        window.push_back(metrics);
        while window.len() > HISTORY_LIMIT {
            window.pop_front();
        }
        Ok(())
    }

    /// Oldest first.
    pub fn for_query(&self, query_id: &str) -> Result<Vec<QueryMetrics>, QualisError> {
        Ok(lock(&self.windows, "History")?
            .get(query_id)
            .map(|w| w.iter().cloned().collect())
            .unwrap_or_default())
    }

    pub fn stats(&self) -> Result<PerformanceStats, QualisError> {
        let windows = lock(&self.windows, "History")?;
        Ok(PerformanceStats::from_metrics(windows.values().flatten()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlowQuery {
    pub query_id: String,
    pub execution_time_ms: u64,
    pub executed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionCount {
    pub suggestion: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceStats {
    pub total_queries: usize,
    pub average_execution_time_ms: f64,
    pub slowest_queries: Vec<SlowQuery>,
    pub most_frequent_suggestions: Vec<SuggestionCount>,
}

impl PerformanceStats {
    pub fn from_metrics<'a>(metrics: impl Iterator<Item = &'a QueryMetrics>) -> Self {
        let mut total = 0usize;
        let mut time_sum = 0u64;
        let mut slowest = Vec::new();
        let mut counts: HashMap<&str, usize> = HashMap::new();

        for m in metrics {
            total += 1;
            time_sum = time_sum.saturating_add(m.execution_time_ms);
            slowest.push(SlowQuery {
                query_id: m.query_id.clone(),
                execution_time_ms: m.execution_time_ms,
                executed_at: m.executed_at,
            });
            for s in &m.suggestions {
                *counts.entry(s.as_str()).or_default() += 1;
            }
        }

        slowest.sort_by(|a, b| {
            b.execution_time_ms
                .cmp(&a.execution_time_ms)
                .then_with(|| b.executed_at.cmp(&a.executed_at))
        });
        slowest.truncate(TOP_N);

        let mut suggestions: Vec<SuggestionCount> = counts
            .into_iter()
            .map(|(s, count)| SuggestionCount {
                suggestion: s.to_string(),
                count,
            })
            .collect();
        // ties broken alphabetically so output is stable
        suggestions.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.suggestion.cmp(&b.suggestion)));
        suggestions.truncate(TOP_N);

        Self {
            total_queries: total,
            average_execution_time_ms: if total == 0 {
                0.0
            } else {
                time_sum as f64 / total as f64
            },
            slowest_queries: slowest,
            most_frequent_suggestions: suggestions,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlowQueryAlert {
    pub query_id: String,
    pub source_id: String,
    pub occurrences: u32,
    pub last_grade: PerformanceGrade,
    pub last_execution_time_ms: u64,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

/// Open alerts for queries that graded D/F or ran past the slow threshold.
#[derive(Default)]
pub struct AlertBook {
    alerts: Mutex<BTreeMap<String, SlowQueryAlert>>,
}

impl AlertBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_alarming(grade: PerformanceGrade, execution_time_ms: u64) -> bool {
        matches!(grade, PerformanceGrade::D | PerformanceGrade::F)
            || execution_time_ms > SLOW_QUERY_MS
    }

    /// Raises or refreshes the alert of `metrics.query_id` when warranted.
    pub fn observe(
        &self,
        source_id: &str,
        metrics: &QueryMetrics,
        grade: PerformanceGrade,
    ) -> Result<Option<SlowQueryAlert>, QualisError> {
        if !Self::is_alarming(grade, metrics.execution_time_ms) {
            return Ok(None);
        }
        let mut alerts = lock(&self.alerts, "Alert")?;
        let alert = alerts
            .entry(metrics.query_id.clone())
            .and_modify(|a| {
                a.occurrences += 1;
                a.last_grade = grade;
                a.last_execution_time_ms = metrics.execution_time_ms;
                a.last_seen = metrics.executed_at;
            })
            .or_insert_with(|| SlowQueryAlert {
                query_id: metrics.query_id.clone(),
                source_id: source_id.to_string(),
                occurrences: 1,
                last_grade: grade,
                last_execution_time_ms: metrics.execution_time_ms,
                first_seen: metrics.executed_at,
                last_seen: metrics.executed_at,
            });
        Ok(Some(alert.clone()))
    }

    pub fn alerts(&self) -> Result<Vec<SlowQueryAlert>, QualisError> {
        Ok(lock(&self.alerts, "Alert")?.values().cloned().collect())
    }

    /// Returns whether an alert was open.
    pub fn clear(&self, query_id: &str) -> Result<bool, QualisError> {
        Ok(lock(&self.alerts, "Alert")?.remove(query_id).is_some())
    }
}
