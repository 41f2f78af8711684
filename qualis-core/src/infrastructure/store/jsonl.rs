// qualis-core/src/infrastructure/store/jsonl.rs

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

use crate::domain::activity::ActivityEntry;
use crate::domain::rules::RuleExecutionResult;
use crate::error::QualisError;
use crate::infrastructure::error::InfrastructureError;
use crate::infrastructure::fs::append_line;
use crate::ports::store::{ActivityLog, ResultStore};

pub const RESULTS_FILE: &str = "results.jsonl";
pub const ACTIVITY_FILE: &str = "activity.jsonl";

/// File-backed results store and activity log: one JSON document per line,
/// appended, never rewritten.
pub struct JsonLinesStore {
    results_path: PathBuf,
    activity_path: PathBuf,
    // serializes appends issued from this process
    write_lock: Mutex<()>,
}

impl JsonLinesStore {
    pub fn new(dir: &Path) -> Self {
        Self {
            results_path: dir.join(RESULTS_FILE),
            activity_path: dir.join(ACTIVITY_FILE),
            write_lock: Mutex::new(()),
        }
    }

    fn append_record<T: Serialize>(&self, path: &Path, record: &T) -> Result<(), QualisError> {
        let line = serde_json::to_string(record).map_err(InfrastructureError::from)?;
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| QualisError::InternalError("Store Mutex Poisoned".into()))?;
        append_line(path, &line)?;
        debug!(path = ?path, "Appended record");
        Ok(())
    }

    fn read_all<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, QualisError> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(path)?;
        content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).map_err(|e| InfrastructureError::from(e).into()))
            .collect()
    }
}

#[async_trait]
impl ResultStore for JsonLinesStore {
    async fn append(&self, result: &RuleExecutionResult) -> Result<(), QualisError> {
        self.append_record(&self.results_path, result)
    }

    async fn all(&self) -> Result<Vec<RuleExecutionResult>, QualisError> {
        Self::read_all(&self.results_path)
    }
}

#[async_trait]
impl ActivityLog for JsonLinesStore {
    async fn record(&self, entry: ActivityEntry) -> Result<(), QualisError> {
        self.append_record(&self.activity_path, &entry)
    }

    async fn entries(&self) -> Result<Vec<ActivityEntry>, QualisError> {
        Self::read_all(&self.activity_path)
    }
}
