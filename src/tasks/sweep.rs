//! TTL Sweep Task
//!
//! Background task that periodically purges expired store entries.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::store::ExpiringTaskStore;

/// Spawns a background task that purges expired entries every `interval`.
///
/// Reads already treat expired entries as absent and polls purge them first, so
/// the sweep only bounds how long expired payloads stay in memory. Each pass holds
/// the store's write lock, keeping both indexes in step.
///
/// Returns the `JoinHandle` so shutdown can abort the task.
///
/// # Example
/// ```ignore
/// let store: ExpiringTaskStore<String> = ExpiringTaskStore::default();
/// let sweep_handle = spawn_sweep_task(store.clone(), Duration::from_secs(30));
/// // Later, during shutdown:
/// sweep_handle.abort();
/// ```
pub fn spawn_sweep_task<V>(store: ExpiringTaskStore<V>, interval: Duration) -> JoinHandle<()>
where
    V: Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!(
            "Starting TTL sweep task with interval of {} ms",
            interval.as_millis()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = store.purge_expired();

            if removed > 0 {
                info!("TTL sweep: removed {} expired tasks", removed);
            } else {
                debug!("TTL sweep: no expired tasks found");
            }
        }
    })
}
