// qualis-core/src/application/limiter.rs

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::trace;

use crate::error::QualisError;

/// Caps simultaneous connections per source. A permit is held for the
/// lifetime of one execution and released on drop.
pub struct ConnectionLimiter {
    per_source: usize,
    semaphores: Mutex<HashMap<String, Arc<Semaphore>>>,
}

impl ConnectionLimiter {
    pub fn new(per_source: usize) -> Self {
        Self {
            per_source: per_source.max(1),
            semaphores: Mutex::new(HashMap::new()),
        }
    }

    pub fn per_source(&self) -> usize {
        self.per_source
    }

    pub async fn acquire(&self, source_id: &str) -> Result<OwnedSemaphorePermit, QualisError> {
        let semaphore = {
            let mut map = self
                .semaphores
                .lock()
                .map_err(|_| QualisError::InternalError("Limiter Mutex Poisoned".into()))?;
            map.entry(source_id.to_string())
                .or_insert_with(|| Arc::new(Semaphore::new(self.per_source)))
                .clone()
        };
        trace!(source = source_id, available = semaphore.available_permits(), "Waiting for connection slot");
        semaphore
            .acquire_owned()
            .await
            .map_err(|_| QualisError::InternalError("Connection limiter closed".into()))
    }
}
