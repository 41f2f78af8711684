// qualis/src/commands/context.rs
//
// Wiring shared by every command: configuration, adapters, service.

use anyhow::Context;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use qualis_core::QualisService;
use qualis_core::domain::catalog::Catalog;
use qualis_core::domain::project::ProjectConfig;
use qualis_core::infrastructure::adapters::DuckDBConnector;
use qualis_core::infrastructure::config::load_project_config;
use qualis_core::infrastructure::store::JsonLinesStore;

pub struct Workspace {
    pub config: ProjectConfig,
    pub target_dir: PathBuf,
    pub service: QualisService,
}

pub fn load_config(project_dir: &Path) -> anyhow::Result<ProjectConfig> {
    load_project_config(project_dir).with_context(|| {
        format!(
            "Failed to load project configuration from {:?}",
            project_dir
        )
    })
}

/// Catalog with source locations resolved against the project directory.
pub fn catalog(config: &ProjectConfig, project_dir: &Path) -> Catalog {
    let sources = config
        .sources
        .iter()
        .cloned()
        .map(|mut s| {
            if s.location != ":memory:" && Path::new(&s.location).is_relative() {
                s.location = project_dir.join(&s.location).to_string_lossy().into_owned();
            }
            s
        })
        .collect();
    Catalog::new(sources, config.tables.clone(), config.rules.clone())
}

impl Workspace {
    pub fn open(project_dir: &Path) -> anyhow::Result<Self> {
        let config = load_config(project_dir)?;
        let target_dir = project_dir.join(&config.target_path);
        debug!(
            project = %config.name,
            sources = config.sources.len(),
            rules = config.rules.len(),
            target = ?target_dir,
            "Workspace ready"
        );

        // Results and activity are appended under target/
        let store = Arc::new(JsonLinesStore::new(&target_dir));
        let service = QualisService::new(
            catalog(&config, project_dir),
            &config.engine,
            Arc::new(DuckDBConnector::new()),
            store.clone(),
            store,
        );

        Ok(Self {
            config,
            target_dir,
            service,
        })
    }
}
