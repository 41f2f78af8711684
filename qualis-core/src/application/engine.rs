// qualis-core/src/application/engine.rs

use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, error, instrument};

use crate::error::QualisError;
use crate::ports::connector::{Row, SourceSession};

/// Runs one SQL statement on an open session with instrumentation (logs + timing).
/// Every query the engine issues goes through here.
#[instrument(skip(session, query), fields(query.len = query.len()))]
pub async fn execute_query(
    session: &mut dyn SourceSession,
    query: &str,
) -> Result<Vec<Row>, QualisError> {
    let start = Instant::now();
    debug!("⚡ Executing Query: {}", query);

    let result = session.query(query).await;
    let duration = start.elapsed();

    match result {
        Ok(rows) => {
            debug!(rows = rows.len(), "✅ Query finished in {:.2?}", duration);
            Ok(rows)
        }
        Err(e) => {
            // Logged here for the timing context; the caller decides whether to absorb it
            error!("❌ Query failed after {:.2?}: {}", duration, e);
            Err(e)
        }
    }
}

/// Bounds `work` by `limit`. Dropping the future on expiry releases any session it holds.
pub async fn within_timeout<T, F>(limit: Duration, work: F) -> Result<T, QualisError>
where
    F: Future<Output = Result<T, QualisError>>,
{
    match tokio::time::timeout(limit, work).await {
        Ok(outcome) => outcome,
        Err(_) => Err(QualisError::Timeout(limit.as_millis() as u64)),
    }
}

pub(crate) fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_timeout_maps_to_error() {
        let slow = async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok::<_, QualisError>(())
        };
        let outcome = within_timeout(Duration::from_millis(10), slow).await;
        assert!(matches!(outcome, Err(QualisError::Timeout(10))));
    }

    #[tokio::test]
    async fn test_fast_work_passes_through() {
        let outcome = within_timeout(Duration::from_secs(1), async { Ok::<_, QualisError>(7) }).await;
        assert!(matches!(outcome, Ok(7)));
    }
}
