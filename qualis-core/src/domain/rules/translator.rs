// qualis-core/src/domain/rules/translator.rs

use serde_json::{Map, Value, json};

use crate::domain::error::DomainError;
use crate::domain::rules::dialect::SqlDialect;
use crate::domain::rules::rule::{Bound, Rule, RuleCheck, RuleKind};

/// Column aliases every count query (and every custom query) must expose.
pub const TOTAL_COUNT: &str = "total_count";
pub const VIOLATION_COUNT: &str = "violation_count";
pub const PASSED: &str = "passed";

#[derive(Debug, Clone, PartialEq)]
pub enum RuleQueries {
    /// Two scalar queries: evaluated rows, then violating rows.
    Counts { total: String, violations: String },
    /// Operator-supplied query returning total_count, violation_count and passed.
    Combined { query: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedRule {
    pub kind: RuleKind,
    pub queries: RuleQueries,
    /// Kind-specific diagnostics, copied into the execution result.
    pub details: Map<String, Value>,
}

pub struct RuleTranslator {
    dialect: SqlDialect,
}

impl RuleTranslator {
    pub fn new(dialect: SqlDialect) -> Self {
        Self { dialect }
    }

    /// Turns a rule into source queries against `table_name`.
    /// Fails fast with a configuration error; nothing is generated for a broken rule.
    pub fn translate(&self, rule: &Rule, table_name: &str) -> Result<TranslatedRule, DomainError> {
        let check = RuleCheck::from_rule(rule)?;
        let table = self.dialect.quote_table(table_name);
        let mut details = Map::new();
        details.insert("kind".into(), json!(check.kind().as_str()));

        let queries = match check {
            RuleCheck::NonNull { field } => {
                let col = self.dialect.quote_ident(field);
                details.insert("field".into(), json!(field));
                RuleQueries::Counts {
                    total: self.count(&table, None),
                    violations: self.violations(&table, &format!("{} IS NULL", col)),
                }
            }
            RuleCheck::Format { field, pattern } => {
                let col = self.dialect.quote_ident(field);
                details.insert("field".into(), json!(field));
                details.insert("pattern".into(), json!(pattern));
                RuleQueries::Counts {
                    total: self.count(&table, Some(&format!("{} IS NOT NULL", col))),
                    violations: self.violations(
                        &table,
                        &format!(
                            "{} IS NOT NULL AND NOT {}",
                            col,
                            self.dialect.regex_match(&col, pattern)
                        ),
                    ),
                }
            }
            RuleCheck::Range {
                field,
                lower,
                upper,
            } => {
                let col = self.dialect.quote_ident(field);
                details.insert("field".into(), json!(field));
                if let Some(lo) = lower {
                    details.insert("min".into(), json!(lo.value));
                    details.insert("min_inclusive".into(), json!(lo.inclusive));
                }
                if let Some(hi) = upper {
                    details.insert("max".into(), json!(hi.value));
                    details.insert("max_inclusive".into(), json!(hi.inclusive));
                }
                let outside = out_of_range(&col, lower, upper);
                RuleQueries::Counts {
                    total: self.count(&table, Some(&format!("{} IS NOT NULL", col))),
                    violations: self.violations(
                        &table,
                        &format!("{} IS NOT NULL AND ({})", col, outside),
                    ),
                }
            }
            RuleCheck::Uniqueness { field } => {
                let col = self.dialect.quote_ident(field);
                details.insert("field".into(), json!(field));
                RuleQueries::Counts {
                    total: self.count(&table, Some(&format!("{} IS NOT NULL", col))),
                    violations: format!(
                        "SELECT COUNT({col}) - COUNT(DISTINCT {col}) AS {VIOLATION_COUNT} FROM {table}"
                    ),
                }
            }
            RuleCheck::Custom { query } => RuleQueries::Combined {
                query: query.trim().trim_end_matches(';').to_string(),
            },
        };

        Ok(TranslatedRule {
            kind: rule.kind,
            queries,
            details,
        })
    }

    fn count(&self, table: &str, filter: Option<&str>) -> String {
        match filter {
            Some(f) => format!("SELECT COUNT(*) AS {TOTAL_COUNT} FROM {table} WHERE {f}"),
            None => format!("SELECT COUNT(*) AS {TOTAL_COUNT} FROM {table}"),
        }
    }

    fn violations(&self, table: &str, condition: &str) -> String {
        format!("SELECT COUNT(*) AS {VIOLATION_COUNT} FROM {table} WHERE {condition}")
    }
}

/// Predicate matching values outside the configured bounds.
/// An inclusive bound accepts the bound itself, so only strictly-beyond values violate.
fn out_of_range(col: &str, lower: Option<Bound>, upper: Option<Bound>) -> String {
    let mut parts = Vec::with_capacity(2);
    if let Some(lo) = lower {
        let op = if lo.inclusive { "<" } else { "<=" };
        parts.push(format!("{} {} {}", col, op, lo.value));
    }
    if let Some(hi) = upper {
        let op = if hi.inclusive { ">" } else { ">=" };
        parts.push(format!("{} {} {}", col, op, hi.value));
    }
    parts.join(" OR ")
}
