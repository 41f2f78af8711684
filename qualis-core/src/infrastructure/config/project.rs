// qualis-core/src/infrastructure/config/project.rs

use anyhow::Context;
use serde::{Deserialize, de::DeserializeOwned};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};
use validator::Validate;

use crate::domain::catalog::{SourceDescriptor, TableRef};
use crate::domain::project::configuration::ProjectConfig;
use crate::domain::rules::Rule;
use crate::infrastructure::error::InfrastructureError;

pub const MAIN_CONFIG_CANDIDATES: [&str; 2] = ["qualis.yaml", "qualis_project.yaml"];

#[instrument(skip(project_dir))]
pub fn load_project_config(project_dir: &Path) -> Result<ProjectConfig, InfrastructureError> {
    let config_path = find_main_config(project_dir)?;
    info!(path = ?config_path, "Loading project manifest");

    let content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read project config at {:?}", config_path))?;
    let mut config: ProjectConfig = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse project config YAML at {:?}", config_path))?;

    if let Some(config_folder) = config.config_paths.first() {
        let config_dir = project_dir.join(config_folder);
        if config_dir.exists() {
            load_satellite_configs(&mut config, &config_dir)?;
        }
    }

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    config.engine.validate()?;

    info!(
        sources = config.sources.len(),
        tables = config.tables.len(),
        rules = config.rules.len(),
        "Project configuration loaded"
    );
    Ok(config)
}

fn find_main_config(root: &Path) -> Result<PathBuf, InfrastructureError> {
    for filename in MAIN_CONFIG_CANDIDATES {
        let p = root.join(filename);
        if p.exists() {
            return Ok(p);
        }
    }
    Err(InfrastructureError::ConfigNotFound(format!(
        "No configuration file found in {:?}. Checked: {:?}",
        root, MAIN_CONFIG_CANDIDATES
    )))
}

/// Loads a typed fragment; `T` is the wrapper struct expected in the file.
fn load_fragment<T: DeserializeOwned>(path: &Path) -> Result<T, InfrastructureError> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config fragment at {:?}", path))?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse YAML fragment at {:?}", path))
        .map_err(Into::into)
}

fn load_satellite_configs(
    config: &mut ProjectConfig,
    config_dir: &Path,
) -> Result<(), InfrastructureError> {
    let sources_path = config_dir.join("sources.yml");
    if sources_path.exists() {
        #[derive(Deserialize)]
        struct SourcesWrapper {
            #[serde(default)]
            sources: Vec<SourceDescriptor>,
        }

        // A corrupt satellite aborts the load
        let wrapper: SourcesWrapper = load_fragment(&sources_path)?;
        config.sources.extend(wrapper.sources);
        info!("  🔌 Sources loaded");
    }

    let tables_path = config_dir.join("tables.yml");
    if tables_path.exists() {
        #[derive(Deserialize)]
        struct TablesWrapper {
            #[serde(default)]
            tables: Vec<TableRef>,
        }

        let wrapper: TablesWrapper = load_fragment(&tables_path)?;
        config.tables.extend(wrapper.tables);
        info!("  📋 Tables loaded");
    }

    let rules_path = config_dir.join("rules.yml");
    if rules_path.exists() {
        #[derive(Deserialize)]
        struct RulesWrapper {
            #[serde(default)]
            rules: Vec<Rule>,
        }

        let wrapper: RulesWrapper = load_fragment(&rules_path)?;
        config.rules.extend(wrapper.rules);
        info!("  ✅ Quality rules loaded");
    }

    Ok(())
}

/// Layers `QUALIS_*` variables over the file values. `lookup` is `std::env::var` outside tests.
fn apply_env_overrides<F>(config: &mut ProjectConfig, lookup: F) -> Result<(), InfrastructureError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup("QUALIS_TARGET_PATH") {
        info!(old = ?config.target_path, new = ?val, "Overriding target path via ENV");
        config.target_path = val;
    }
    if let Some(val) = lookup("QUALIS_MAX_CONNECTIONS") {
        config.engine.max_connections_per_source = val.trim().parse().map_err(|_| {
            InfrastructureError::ConfigError(format!(
                "QUALIS_MAX_CONNECTIONS must be a positive integer, got '{val}'"
            ))
        })?;
        info!(new = config.engine.max_connections_per_source, "Overriding connection limit via ENV");
    }
    if let Some(val) = lookup("QUALIS_QUERY_TIMEOUT_MS") {
        config.engine.query_timeout_ms = val.trim().parse().map_err(|_| {
            InfrastructureError::ConfigError(format!(
                "QUALIS_QUERY_TIMEOUT_MS must be a positive integer, got '{val}'"
            ))
        })?;
        info!(new = config.engine.query_timeout_ms, "Overriding query timeout via ENV");
    }
    Ok(())
}
