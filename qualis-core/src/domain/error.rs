// qualis-core/src/domain/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DomainError {
    #[error("Configuration Error in rule '{rule}': {reason}")]
    #[diagnostic(
        code(qualis::domain::configuration),
        help("Check the rule's target field and its kind-specific config (pattern, min/max, query).")
    )]
    Configuration { rule: String, reason: String },

    #[error("Source '{0}' not found")]
    #[diagnostic(code(qualis::domain::source_not_found))]
    SourceNotFound(String),

    #[error("Table '{0}' not found")]
    #[diagnostic(code(qualis::domain::table_not_found))]
    TableNotFound(String),

    #[error("Rule '{0}' not found")]
    #[diagnostic(code(qualis::domain::rule_not_found))]
    RuleNotFound(String),

    #[error("Invalid rule result: {0}")]
    #[diagnostic(
        code(qualis::domain::invalid_result),
        help("Custom rules must return total_count, violation_count and passed.")
    )]
    InvalidResult(String),
}

impl DomainError {
    pub fn configuration(rule: impl Into<String>, reason: impl Into<String>) -> Self {
        DomainError::Configuration {
            rule: rule.into(),
            reason: reason.into(),
        }
    }
}
