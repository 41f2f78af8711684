// qualis-core/src/domain/performance/shape.rs
//
// Static inspection of query text. Nothing here executes or plans the query.

use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlparser::ast::Statement;
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;
use std::sync::LazyLock;

static JOIN: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)\bjoin\b"));
static SUBQUERY: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)\(\s*select\b"));
static AGGREGATE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)\b(count|sum|avg|min|max)\s*\(|\bgroup\s+by\b"));
static SELECT_ALL: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)\bselect\s+(distinct\s+)?(\w+\.)?\*"));

// Patterns are literals covered by tests; a failure here is a programming error.
#[allow(clippy::expect_used)]
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static query-shape pattern must compile")
}

/// Structural features of a query that drive the metric heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueryShape {
    pub has_join: bool,
    pub has_subquery: bool,
    pub has_aggregate: bool,
    pub selects_all_columns: bool,
}

impl QueryShape {
    pub fn from_sql(sql: &str) -> Self {
        Self {
            has_join: JOIN.is_match(sql),
            has_subquery: SUBQUERY.is_match(sql),
            has_aggregate: AGGREGATE.is_match(sql),
            selects_all_columns: SELECT_ALL.is_match(sql),
        }
    }

    /// `1 + 2·join + 3·subquery + 1·aggregate`
    pub fn complexity_factor(&self) -> u64 {
        1 + 2 * u64::from(self.has_join)
            + 3 * u64::from(self.has_subquery)
            + u64::from(self.has_aggregate)
    }
}

/// Trimmed, trailing `;` removed, whitespace collapsed, lower-cased.
/// Quoted literals and identifiers are kept verbatim.
pub fn normalize(sql: &str) -> String {
    let trimmed = sql.trim().trim_end_matches(';').trim();
    let mut out = String::with_capacity(trimmed.len());
    let mut quote: Option<char> = None;
    let mut pending_space = false;

    for c in trimmed.chars() {
        match quote {
            Some(q) => {
                out.push(c);
                // a doubled quote closes and reopens, which keeps `''` escapes intact
                if c == q {
                    quote = None;
                }
            }
            None if c.is_whitespace() => pending_space = true,
            None => {
                if pending_space {
                    out.push(' ');
                    pending_space = false;
                }
                if c == '\'' || c == '"' {
                    quote = Some(c);
                }
                out.extend(c.to_lowercase());
            }
        }
    }
    out
}

/// Deterministic id of a query: SHA-256 of the normalized text, first 16 hex digits.
pub fn query_id(sql: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize(sql).as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!("q_{}", &digest[..16])
}

/// True when every statement only reads.
/// Dialect-specific text the generic parser rejects falls back to its leading keyword.
pub fn is_read_only(sql: &str) -> bool {
    match Parser::parse_sql(&GenericDialect {}, sql) {
        Ok(statements) => {
            !statements.is_empty()
                && statements
                    .iter()
                    .all(|s| matches!(s, Statement::Query(_)))
        }
        Err(e) => {
            tracing::debug!("Generic parser rejected query ({}), using keyword check", e);
            let first = normalize(sql);
            let keyword = first.split(' ').next().unwrap_or_default();
            matches!(keyword, "select" | "with" | "values" | "show" | "describe")
                && !first.contains(';')
        }
    }
}
