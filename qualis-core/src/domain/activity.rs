// qualis-core/src/domain/activity.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::performance::PerformanceGrade;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    RuleExecuted,
    QueryAnalyzed,
}

/// One line of the activity log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub at: DateTime<Utc>,
    pub kind: ActivityKind,
    /// Rule id or query id.
    pub subject: String,
    pub message: String,
}

impl ActivityEntry {
    pub fn rule_executed(rule_id: &str, rule_name: &str, table_name: &str, score: u8) -> Self {
        Self {
            at: Utc::now(),
            kind: ActivityKind::RuleExecuted,
            subject: rule_id.to_string(),
            message: format!(
                "rule '{}' executed on {} — score {}%",
                rule_name, table_name, score
            ),
        }
    }

    pub fn query_analyzed(query_id: &str, source_name: &str, grade: PerformanceGrade) -> Self {
        Self {
            at: Utc::now(),
            kind: ActivityKind::QueryAnalyzed,
            subject: query_id.to_string(),
            message: format!(
                "query {} analyzed on {} — grade {}",
                query_id, source_name, grade
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_message_format() {
        let entry = ActivityEntry::rule_executed("r1", "email_present", "customers", 60);
        assert_eq!(
            entry.message,
            "rule 'email_present' executed on customers — score 60%"
        );
        assert_eq!(entry.kind, ActivityKind::RuleExecuted);
    }
}
