// qualis-core/src/domain/performance/grader.rs

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::domain::performance::metrics::QueryMetrics;
use crate::domain::performance::plan::ExecutionPlan;

/// Nested loops above this many actual rows get a hash-join suggestion.
const NESTED_LOOP_ROWS: u64 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PerformanceGrade {
    A,
    B,
    C,
    D,
    F,
}

impl PerformanceGrade {
    pub fn from_score(score: u8) -> Self {
        match score {
            90.. => PerformanceGrade::A,
            80..=89 => PerformanceGrade::B,
            70..=79 => PerformanceGrade::C,
            60..=69 => PerformanceGrade::D,
            _ => PerformanceGrade::F,
        }
    }
}

impl fmt::Display for PerformanceGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            PerformanceGrade::A => "A",
            PerformanceGrade::B => "B",
            PerformanceGrade::C => "C",
            PerformanceGrade::D => "D",
            PerformanceGrade::F => "F",
        };
        f.write_str(letter)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeReport {
    pub grade: PerformanceGrade,
    /// Clamped to 0-100.
    pub score: u8,
    /// Metric suggestions followed by plan suggestions, without duplicates.
    pub suggestions: Vec<String>,
}

pub struct PerformanceGrader;

impl PerformanceGrader {
    pub fn grade(metrics: &QueryMetrics, plan: Option<&ExecutionPlan>) -> GradeReport {
        let score = Self::score(metrics);

        let mut seen = HashSet::new();
        let suggestions = metrics
            .suggestions
            .iter()
            .cloned()
            .chain(plan.map(Self::plan_suggestions).unwrap_or_default())
            .filter(|s| seen.insert(s.clone()))
            .collect();

        GradeReport {
            grade: PerformanceGrade::from_score(score),
            score,
            suggestions,
        }
    }

    pub fn score(metrics: &QueryMetrics) -> u8 {
        let mut score: i64 = 100;

        score -= match metrics.execution_time_ms {
            t if t > 10_000 => 40,
            t if t > 5_000 => 30,
            t if t > 1_000 => 20,
            t if t > 500 => 10,
            _ => 0,
        };

        let ratio = metrics.scan_ratio();
        score -= if ratio > 100.0 {
            30
        } else if ratio > 50.0 {
            20
        } else if ratio > 10.0 {
            10
        } else {
            0
        };

        score -= if metrics.memory_usage_mb > 500.0 {
            20
        } else if metrics.memory_usage_mb > 100.0 {
            10
        } else {
            0
        };

        score -= 5 * metrics.warnings.len() as i64;

        if !metrics.indexes_used.is_empty() {
            score += 5;
        }

        score.clamp(0, 100) as u8
    }

    fn plan_suggestions(plan: &ExecutionPlan) -> Vec<String> {
        if plan.degraded {
            return Vec::new();
        }
        let mut out = Vec::new();
        for node in plan.nodes() {
            if node.is_sequential_scan() {
                out.push(match &node.relation {
                    Some(rel) => format!(
                        "Full sequential scan on {}: consider adding an index on the filtered columns",
                        rel
                    ),
                    None => "Full sequential scan detected: consider adding an index".to_string(),
                });
            }
            if node.is_nested_loop()
                && node.actual_rows.is_some_and(|rows| rows > NESTED_LOOP_ROWS)
            {
                out.push(
                    "Nested loop join over more than 1000 rows: a hash join would likely be faster"
                        .to_string(),
                );
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::performance::plan::PlanNode;
    use std::collections::BTreeSet;

    fn metrics(time_ms: u64, returned: u64, scanned: u64, memory: f64) -> QueryMetrics {
        let mut m = QueryMetrics::failed("q_test", time_ms);
        m.rows_returned = returned;
        m.rows_scanned = scanned;
        m.memory_usage_mb = memory;
        m
    }

    #[test]
    fn test_indexed_fast_query_grades_a() {
        let mut m = metrics(600, 100, 500, 50.0);
        m.indexes_used = BTreeSet::from(["idx_orders_customer".to_string()]);
        let report = PerformanceGrader::grade(&m, None);
        assert_eq!(report.score, 95);
        assert_eq!(report.grade, PerformanceGrade::A);
    }

    #[test]
    fn test_time_thresholds_are_exclusive() {
        assert_eq!(PerformanceGrader::score(&metrics(500, 1, 1, 0.0)), 100);
        assert_eq!(PerformanceGrader::score(&metrics(501, 1, 1, 0.0)), 90);
        assert_eq!(PerformanceGrader::score(&metrics(1_001, 1, 1, 0.0)), 80);
        assert_eq!(PerformanceGrader::score(&metrics(5_001, 1, 1, 0.0)), 70);
        assert_eq!(PerformanceGrader::score(&metrics(10_001, 1, 1, 0.0)), 60);
    }

    #[test]
    fn test_scan_ratio_memory_and_warnings() {
        // ratio 101 -> -30, memory 600 -> -20, two warnings -> -10
        let mut m = metrics(0, 10, 1_010, 600.0);
        m.warnings = vec!["a".into(), "b".into()];
        assert_eq!(PerformanceGrader::score(&m), 40);
        assert_eq!(PerformanceGrader::grade(&m, None).grade, PerformanceGrade::F);

        // ratio 11 -> -10, memory 101 -> -10
        assert_eq!(PerformanceGrader::score(&metrics(0, 10, 110, 101.0)), 80);
    }

    #[test]
    fn test_score_is_clamped() {
        let mut m = metrics(20_000, 1, 1_000, 1_000.0);
        m.warnings = vec!["w".into(); 10];
        assert_eq!(PerformanceGrader::score(&m), 0);

        let mut m = metrics(1, 1, 1, 0.0);
        m.indexes_used = BTreeSet::from(["i".to_string()]);
        assert_eq!(PerformanceGrader::score(&m), 100);
    }

    #[test]
    fn test_letter_thresholds() {
        assert_eq!(PerformanceGrade::from_score(90), PerformanceGrade::A);
        assert_eq!(PerformanceGrade::from_score(89), PerformanceGrade::B);
        assert_eq!(PerformanceGrade::from_score(80), PerformanceGrade::B);
        assert_eq!(PerformanceGrade::from_score(70), PerformanceGrade::C);
        assert_eq!(PerformanceGrade::from_score(60), PerformanceGrade::D);
        assert_eq!(PerformanceGrade::from_score(59), PerformanceGrade::F);
    }

    #[test]
    fn test_plan_suggestions_are_deduplicated() {
        let mut join = PlanNode::new("Nested Loop");
        join.actual_rows = Some(1_500);
        let mut scan_a = PlanNode::new("Seq Scan");
        scan_a.relation = Some("orders".into());
        let mut scan_b = PlanNode::new("Seq Scan");
        scan_b.relation = Some("orders".into());
        join.children = vec![scan_a, scan_b];
        let plan = ExecutionPlan::from_source(join);

        let mut m = metrics(10, 10, 10, 0.0);
        m.suggestions = vec![
            "Add indexes on the join key columns".into(),
            "Add indexes on the join key columns".into(),
        ];
        let report = PerformanceGrader::grade(&m, Some(&plan));
        assert_eq!(report.suggestions.len(), 3);
        assert!(report.suggestions.iter().any(|s| s.contains("hash join")));
        assert!(report.suggestions.iter().any(|s| s.contains("sequential scan on orders")));
    }

    #[test]
    fn test_small_nested_loop_and_placeholder_are_quiet() {
        let mut join = PlanNode::new("Nested Loop");
        join.actual_rows = Some(10);
        let report =
            PerformanceGrader::grade(&metrics(1, 1, 1, 0.0), Some(&ExecutionPlan::from_source(join)));
        assert!(report.suggestions.is_empty());

        let report = PerformanceGrader::grade(
            &metrics(1, 1, 1, 0.0),
            Some(&ExecutionPlan::placeholder("explain failed")),
        );
        assert!(report.suggestions.is_empty());
    }
}
