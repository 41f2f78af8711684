// qualis-core/src/infrastructure/store/memory.rs

use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};

use crate::domain::activity::ActivityEntry;
use crate::domain::rules::RuleExecutionResult;
use crate::error::QualisError;
use crate::ports::store::{ActivityLog, ResultStore};

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, QualisError> {
    mutex
        .lock()
        .map_err(|_| QualisError::InternalError("Store Mutex Poisoned".into()))
}

#[derive(Default)]
pub struct InMemoryResultStore {
    rows: Mutex<Vec<RuleExecutionResult>>,
}

impl InMemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResultStore for InMemoryResultStore {
    async fn append(&self, result: &RuleExecutionResult) -> Result<(), QualisError> {
        lock(&self.rows)?.push(result.clone());
        Ok(())
    }

    async fn all(&self) -> Result<Vec<RuleExecutionResult>, QualisError> {
        Ok(lock(&self.rows)?.clone())
    }
}

#[derive(Default)]
pub struct InMemoryActivityLog {
    entries: Mutex<Vec<ActivityEntry>>,
}

impl InMemoryActivityLog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ActivityLog for InMemoryActivityLog {
    async fn record(&self, entry: ActivityEntry) -> Result<(), QualisError> {
        lock(&self.entries)?.push(entry);
        Ok(())
    }

    async fn entries(&self) -> Result<Vec<ActivityEntry>, QualisError> {
        Ok(lock(&self.entries)?.clone())
    }
}
