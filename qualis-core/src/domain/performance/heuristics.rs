// qualis-core/src/domain/performance/heuristics.rs
//
// Heuristic metric layer. These numbers are estimates computed from the query's
// static shape and the observed row count / elapsed time; they are not measured
// by the source. Plan-derived facts (index usage) are passed in separately.

use chrono::Utc;
use std::collections::BTreeSet;

use crate::domain::performance::metrics::QueryMetrics;
use crate::domain::performance::shape::QueryShape;

pub const SLOW_QUERY_MS: u64 = 5_000;
pub const LARGE_RESULT_ROWS: u64 = 10_000;
const MB_PER_ROW: f64 = 0.001;
const CPU_SHARE: f64 = 0.8;
const ROWS_PER_IO: u64 = 1_000;
const CACHE_MISS_SHARE: f64 = 0.3;

pub fn estimate(
    query_id: &str,
    shape: QueryShape,
    rows_returned: u64,
    execution_time_ms: u64,
    indexes_used: BTreeSet<String>,
) -> QueryMetrics {
    let rows_scanned = rows_returned
        .saturating_mul(shape.complexity_factor())
        .max(rows_returned);
    let io_operations = rows_scanned.div_ceil(ROWS_PER_IO);
    let misses = (io_operations as f64 * CACHE_MISS_SHARE).ceil() as u64;
    let cache_hits = io_operations.saturating_sub(misses);

    let mut warnings = Vec::new();
    let mut suggestions = Vec::new();

    if execution_time_ms > SLOW_QUERY_MS {
        warnings.push(format!(
            "Query took {} ms (over {} ms)",
            execution_time_ms, SLOW_QUERY_MS
        ));
        suggestions.push(
            "Review filters and indexes on the columns used in WHERE and JOIN clauses".to_string(),
        );
    }
    if shape.selects_all_columns {
        warnings.push("Query selects all columns (SELECT *)".to_string());
        suggestions.push("Select only the columns you need instead of SELECT *".to_string());
    }
    if rows_returned > LARGE_RESULT_ROWS {
        warnings.push(format!(
            "Large result set: {} rows returned",
            rows_returned
        ));
        suggestions.push("Add a LIMIT clause or paginate the result".to_string());
    }
    if shape.has_join && indexes_used.is_empty() {
        warnings.push("Join executed without any known index".to_string());
        suggestions.push("Add indexes on the join key columns".to_string());
    }

    QueryMetrics {
        query_id: query_id.to_string(),
        executed_at: Utc::now(),
        execution_time_ms,
        rows_returned,
        rows_scanned,
        memory_usage_mb: rows_returned as f64 * MB_PER_ROW,
        cpu_time_ms: execution_time_ms as f64 * CPU_SHARE,
        io_operations,
        cache_hits,
        indexes_used,
        warnings,
        suggestions,
    }
}
