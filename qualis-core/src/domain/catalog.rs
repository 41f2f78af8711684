// qualis-core/src/domain/catalog.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::error::DomainError;
use crate::domain::rules::{Rule, SqlDialect};

/// Kind of database behind a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceEngine {
    #[default]
    #[serde(rename = "duckdb")]
    DuckDB,
}

/// Previously-resolved connection descriptor for one registered source.
/// Credentials and connection strings are resolved before they reach the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub engine: SourceEngine,
    /// Overrides the engine's native dialect for rule translation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialect: Option<SqlDialect>,
    /// Database file path, or `:memory:`.
    pub location: String,
}

impl SourceDescriptor {
    pub fn dialect(&self) -> SqlDialect {
        self.dialect.unwrap_or(match self.engine {
            SourceEngine::DuckDB => SqlDialect::DuckDb,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRef {
    pub id: String,
    /// Physical name in the source, optionally schema-qualified.
    pub name: String,
    pub source: String,
}

/// Registry of sources, tables and rules the engine may evaluate.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    sources: BTreeMap<String, SourceDescriptor>,
    tables: BTreeMap<String, TableRef>,
    rules: Vec<Rule>,
}

impl Catalog {
    pub fn new(sources: Vec<SourceDescriptor>, tables: Vec<TableRef>, rules: Vec<Rule>) -> Self {
        Self {
            sources: sources.into_iter().map(|s| (s.id.clone(), s)).collect(),
            tables: tables.into_iter().map(|t| (t.id.clone(), t)).collect(),
            rules,
        }
    }

    pub fn source(&self, id: &str) -> Result<&SourceDescriptor, DomainError> {
        self.sources
            .get(id)
            .ok_or_else(|| DomainError::SourceNotFound(id.to_string()))
    }

    pub fn table(&self, id: &str) -> Result<&TableRef, DomainError> {
        self.tables
            .get(id)
            .ok_or_else(|| DomainError::TableNotFound(id.to_string()))
    }

    pub fn rule(&self, id: &str) -> Result<&Rule, DomainError> {
        self.rules
            .iter()
            .find(|r| r.id == id)
            .ok_or_else(|| DomainError::RuleNotFound(id.to_string()))
    }

    /// Resolves the table and source a rule runs against.
    pub fn target_of(&self, rule: &Rule) -> Result<(&TableRef, &SourceDescriptor), DomainError> {
        let table = self.table(&rule.table)?;
        let source = self.source(&table.source)?;
        Ok((table, source))
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableRef> {
        self.tables.values()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rules_for_table<'a>(&'a self, table_id: &'a str) -> impl Iterator<Item = &'a Rule> {
        self.rules.iter().filter(move |r| r.table == table_id)
    }

    pub fn active_rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(|r| r.active)
    }
}
