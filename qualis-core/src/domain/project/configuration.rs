// src/domain/project/configuration.rs

use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

use crate::domain::catalog::{Catalog, SourceDescriptor, TableRef};
use crate::domain::rules::Rule;

/// Execution limits shared by rule runs and query analysis.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Validate)]
pub struct EngineSettings {
    /// Upper bound of simultaneous connections opened against one source.
    #[validate(range(min = 1, max = 64))]
    #[serde(default = "default_max_connections")]
    pub max_connections_per_source: usize,

    /// Bound on a single execution, connection included.
    #[validate(range(min = 1))]
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
}

impl EngineSettings {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_connections_per_source: default_max_connections(),
            query_timeout_ms: default_query_timeout_ms(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProjectConfig {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(rename = "config-paths", default = "default_config_paths")]
    pub config_paths: Vec<String>,

    #[serde(rename = "target-path", default = "default_target_path")]
    pub target_path: String,

    #[serde(default)]
    pub engine: EngineSettings,

    // Hydrated from satellite files (sources.yml, tables.yml, rules.yml)
    #[serde(default)]
    pub sources: Vec<SourceDescriptor>,
    #[serde(default)]
    pub tables: Vec<TableRef>,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl ProjectConfig {
    /// Lookup view over the hydrated sources, tables and rules.
    pub fn catalog(&self) -> Catalog {
        Catalog::new(self.sources.clone(), self.tables.clone(), self.rules.clone())
    }
}

fn default_max_connections() -> usize {
    4
}
fn default_query_timeout_ms() -> u64 {
    30_000
}
fn default_version() -> String {
    "0.1.0".to_string()
}
fn default_config_paths() -> Vec<String> {
    vec!["config".to_string()]
}
fn default_target_path() -> String {
    "target".to_string()
}
