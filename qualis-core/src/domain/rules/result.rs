// qualis-core/src/domain/rules/result.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::domain::error::DomainError;

/// One execution of one rule. Immutable, appended to the results store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleExecutionResult {
    pub rule_id: String,
    pub executed_at: DateTime<Utc>,
    pub passed: bool,
    pub violation_count: u64,
    pub total_count: u64,
    /// Percentage of non-violating rows, 0-100.
    pub score: u8,
    #[serde(default)]
    pub details: Map<String, Value>,
    pub execution_time_ms: u64,
}

/// `round((total - violations) / total * 100)`, or 100 when nothing was evaluated.
pub fn compute_score(total: u64, violations: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let ok = total.saturating_sub(violations) as f64;
    let pct = (ok / total as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}

impl RuleExecutionResult {
    /// Builds a result from counts read back from the source.
    /// `passed` is only supplied by custom rules; otherwise a rule passes with zero violations.
    pub fn from_counts(
        rule_id: impl Into<String>,
        total_count: u64,
        violation_count: u64,
        passed: Option<bool>,
        details: Map<String, Value>,
        execution_time_ms: u64,
    ) -> Result<Self, DomainError> {
        if violation_count > total_count {
            return Err(DomainError::InvalidResult(format!(
                "violation_count ({}) exceeds total_count ({})",
                violation_count, total_count
            )));
        }
        Ok(Self {
            rule_id: rule_id.into(),
            executed_at: Utc::now(),
            passed: passed.unwrap_or(violation_count == 0),
            violation_count,
            total_count,
            score: compute_score(total_count, violation_count),
            details,
            execution_time_ms,
        })
    }

    /// Result recorded when the source could not produce counts.
    pub fn failed(
        rule_id: impl Into<String>,
        category: &str,
        error: &str,
        mut details: Map<String, Value>,
        execution_time_ms: u64,
    ) -> Self {
        details.insert("error".into(), json!(error));
        details.insert("error_kind".into(), json!(category));
        Self {
            rule_id: rule_id.into(),
            executed_at: Utc::now(),
            passed: false,
            violation_count: 0,
            total_count: 0,
            score: 0,
            details,
            execution_time_ms,
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.details.get("error").and_then(Value::as_str)
    }

    pub fn is_failure(&self) -> bool {
        self.details.contains_key("error")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_formula() {
        assert_eq!(compute_score(4, 2), 50);
        assert_eq!(compute_score(5, 2), 60);
        assert_eq!(compute_score(6, 3), 50);
        assert_eq!(compute_score(3, 1), 67);
        assert_eq!(compute_score(1000, 0), 100);
        assert_eq!(compute_score(7, 7), 0);
    }

    #[test]
    fn test_empty_table_scores_full() {
        assert_eq!(compute_score(0, 0), 100);
    }

    #[test]
    fn test_from_counts_rejects_more_violations_than_rows() {
        let res = RuleExecutionResult::from_counts("r1", 3, 4, None, Map::new(), 5);
        assert!(matches!(res, Err(DomainError::InvalidResult(_))));
    }

    #[test]
    fn test_passed_defaults_to_zero_violations() -> Result<(), DomainError> {
        let clean = RuleExecutionResult::from_counts("r1", 10, 0, None, Map::new(), 1)?;
        assert!(clean.passed);
        let dirty = RuleExecutionResult::from_counts("r1", 10, 1, None, Map::new(), 1)?;
        assert!(!dirty.passed);
        assert_eq!(dirty.score, 90);
        // custom rules decide for themselves
        let custom = RuleExecutionResult::from_counts("r1", 10, 1, Some(true), Map::new(), 1)?;
        assert!(custom.passed);
        Ok(())
    }

    #[test]
    fn test_failed_result_shape() {
        let res = RuleExecutionResult::failed("r2", "timeout", "timed out", Map::new(), 42);
        assert!(!res.passed);
        assert_eq!(res.score, 0);
        assert_eq!((res.total_count, res.violation_count), (0, 0));
        assert_eq!(res.error(), Some("timed out"));
        assert_eq!(res.details.get("error_kind"), Some(&json!("timeout")));
        assert_eq!(res.execution_time_ms, 42);
        assert!(res.is_failure());
    }
}
