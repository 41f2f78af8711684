// qualis-core/src/domain/rules/dialect.rs

use serde::{Deserialize, Serialize};

/// SQL flavour spoken by a data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialect {
    #[default]
    #[serde(rename = "duckdb")]
    DuckDb,
    Postgres,
    #[serde(rename = "mysql")]
    MySql,
}

impl SqlDialect {
    /// Quotes a (possibly schema-qualified) table name part by part.
    pub fn quote_table(&self, name: &str) -> String {
        name.split('.')
            .map(|part| self.quote_ident(part))
            .collect::<Vec<_>>()
            .join(".")
    }

    pub fn quote_ident(&self, ident: &str) -> String {
        match self {
            SqlDialect::MySql => format!("`{}`", ident.replace('`', "``")),
            SqlDialect::DuckDb | SqlDialect::Postgres => {
                format!("\"{}\"", ident.replace('"', "\"\""))
            }
        }
    }

    pub fn string_literal(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    /// Predicate that is true when `expr` matches the regular expression.
    pub fn regex_match(&self, expr: &str, pattern: &str) -> String {
        let literal = self.string_literal(pattern);
        match self {
            SqlDialect::DuckDb => format!("regexp_matches({}, {})", expr, literal),
            SqlDialect::Postgres => format!("{} ~ {}", expr, literal),
            SqlDialect::MySql => format!("{} REGEXP {}", expr, literal),
        }
    }
}
