use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

use crate::tasks::TaskStore;

/// Background safety net against leaked storage: clients that never call
/// delete still get their tasks purged once the retention window passes.
#[derive(Clone)]
pub struct CleanupService {
    store: Arc<TaskStore>,
    sweep_interval: Duration,
}

impl CleanupService {
    pub fn new(store: Arc<TaskStore>, sweep_interval: Duration) -> Self {
        Self {
            store,
            sweep_interval,
        }
    }

    /// Start the periodic sweep task.
    /// Returns a JoinHandle for graceful shutdown.
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut sweep_interval = interval(self.sweep_interval);

            loop {
                sweep_interval.tick().await;

                tracing::debug!("Starting scheduled sweep of expired tasks");

                match self.store.sweep_expired().await {
                    Ok(deleted) if deleted > 0 => {
                        tracing::info!(deleted, "Expired task sweep completed");
                    }
                    Ok(_) => {
                        tracing::debug!("Expired task sweep completed, nothing expired");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Expired task sweep failed");
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use docpress_core::models::TaskStatus;
    use docpress_core::Config;
    use docpress_storage::LocalStorage;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_started_sweep_purges_expired_tasks() {
        let dir = tempdir().unwrap();
        let storage = Arc::new(LocalStorage::new(dir.path()).await.unwrap());
        let config = Config {
            task_retention_secs: 0,
            ..Config::default()
        };
        let store = Arc::new(TaskStore::new(storage, &config));

        let task_id = store
            .create(Bytes::from_static(b"%PDF-1.4 fixture"), "report.pdf")
            .await
            .unwrap();

        let cleanup = Arc::new(CleanupService::new(
            store.clone(),
            Duration::from_millis(10),
        ));
        let handle = cleanup.start();

        // Give the sweep a couple of ticks to observe the expired task
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.abort();

        assert!(matches!(
            store.status(task_id).await,
            Some(TaskStatus::Deleted) | None
        ));
    }
}
