// qualis-core/src/error.rs

use crate::domain::error::DomainError;
use crate::infrastructure::error::InfrastructureError;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum QualisError {
    // --- DOMAIN ERRORS (rule configuration, unknown ids, invalid results) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Domain(#[from] DomainError),

    // --- INFRASTRUCTURE ERRORS (IO, parsing, database) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Infrastructure(#[from] InfrastructureError),

    // --- EXTERNAL BOUNDARY ---
    #[error("Connector Error: {0}")]
    #[diagnostic(
        code(qualis::connector),
        help("The data source rejected the query or could not be reached.")
    )]
    Connector(String),

    #[error("Execution timed out after {0} ms")]
    #[diagnostic(
        code(qualis::timeout),
        help("Raise `engine.query_timeout_ms` or simplify the query.")
    )]
    Timeout(u64),

    // --- GENERIC / APPLICATION ---
    #[error("Internal Error: {0}")]
    InternalError(String),
}

impl QualisError {
    /// Operational failures are absorbed into a failed result object;
    /// everything else is structural and goes back to the caller.
    pub fn is_operational(&self) -> bool {
        match self {
            QualisError::Connector(_) | QualisError::Timeout(_) => true,
            QualisError::Infrastructure(InfrastructureError::Database(_)) => true,
            QualisError::Domain(DomainError::InvalidResult(_)) => true,
            _ => false,
        }
    }

    /// Short machine-readable category, stored in failed result details.
    pub fn category(&self) -> &'static str {
        match self {
            QualisError::Domain(DomainError::Configuration { .. }) => "configuration",
            QualisError::Domain(DomainError::SourceNotFound(_)) => "source_not_found",
            QualisError::Domain(DomainError::TableNotFound(_)) => "table_not_found",
            QualisError::Domain(DomainError::RuleNotFound(_)) => "rule_not_found",
            QualisError::Domain(DomainError::InvalidResult(_)) => "invalid_result",
            QualisError::Infrastructure(InfrastructureError::Database(_)) => "connector",
            QualisError::Infrastructure(_) => "infrastructure",
            QualisError::Connector(_) => "connector",
            QualisError::Timeout(_) => "timeout",
            QualisError::InternalError(_) => "internal",
        }
    }
}

// Manual implementation to avoid duplicate enum variant but keep ergonomics
impl From<std::io::Error> for QualisError {
    fn from(err: std::io::Error) -> Self {
        QualisError::Infrastructure(InfrastructureError::Io(err))
    }
}

impl From<duckdb::Error> for QualisError {
    fn from(err: duckdb::Error) -> Self {
        QualisError::Infrastructure(InfrastructureError::from(err))
    }
}
