//! Compression service: ties intake, orchestration, and the task store
//! into the upload → descriptor flow the caller sees.

use std::sync::Arc;

use bytes::Bytes;
use uuid::Uuid;

use docpress_core::models::TaskDescriptor;
use docpress_core::AppError;
use docpress_processing::CompressionOrchestrator;

use super::store::TaskStore;

#[derive(Clone)]
pub struct CompressionService {
    store: Arc<TaskStore>,
}

impl CompressionService {
    pub fn new(store: Arc<TaskStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<TaskStore> {
        &self.store
    }

    /// Handle one accepted upload end to end: create the task, run the
    /// three profiles, attach the outcomes, and return the descriptor.
    ///
    /// Recompression of large documents can take seconds; callers that
    /// need responsiveness run this off their request path and poll
    /// [`TaskStore::status`].
    pub async fn process_upload(
        &self,
        data: Bytes,
        filename: &str,
    ) -> Result<TaskDescriptor, AppError> {
        let task_id = self.store.create(data, filename).await?;
        let source = self.store.source(task_id).await?;

        let outcomes = CompressionOrchestrator::run(Arc::new(source)).await;

        let attached = self.store.attach_outcomes(task_id, outcomes).await?;
        if !attached {
            // Deleted mid-flight; the results were discarded.
            return Err(AppError::NotFound(format!(
                "Task {} was deleted during processing",
                task_id
            )));
        }

        self.store.describe(task_id).await
    }

    pub async fn describe(&self, task_id: Uuid) -> Result<TaskDescriptor, AppError> {
        self.store.describe(task_id).await
    }

    /// Serve one artifact verbatim; the caller sets the content
    /// disposition from the filename.
    pub async fn download(&self, task_id: Uuid, filename: &str) -> Result<Vec<u8>, AppError> {
        self.store.get_download(task_id, filename).await
    }

    /// Explicit client teardown.
    pub async fn delete(&self, task_id: Uuid) -> Result<(), AppError> {
        self.store.delete(task_id).await
    }
}
