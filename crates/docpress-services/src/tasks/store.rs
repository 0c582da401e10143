//! Task store: the single place holding shared mutable state.
//!
//! Each task owns one storage prefix (`tasks/{id}/`) containing the source
//! and up to three output variants. The id→entry map behind an `RwLock` is
//! the only synchronized structure; recompression work never holds it.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use docpress_core::models::{
    format_file_size, CompressionOutcome, DocumentFormat, ProfileOutcomes, QualityProfile,
    SourceDocument, TaskDescriptor, TaskStatus, VariantReport,
};
use docpress_core::{AppError, Config};
use docpress_processing::DocumentValidator;
use docpress_storage::{keys, Storage, StorageError};

struct TaskEntry {
    status: TaskStatus,
    format: DocumentFormat,
    /// Sanitized original filename (variant names derive from it).
    original_filename: String,
    /// Artifact name the source bytes are stored under.
    source_artifact: String,
    original_size: u64,
    created_at: DateTime<Utc>,
    /// filename → storage key, for every artifact the task owns.
    artifacts: HashMap<String, String>,
    variants: Vec<VariantReport>,
}

/// Allocates task identifiers, owns task-scoped storage, and serves or
/// discards artifacts on demand.
pub struct TaskStore {
    storage: Arc<dyn Storage>,
    validator: DocumentValidator,
    retention_secs: u64,
    tasks: RwLock<HashMap<Uuid, TaskEntry>>,
}

impl TaskStore {
    pub fn new(storage: Arc<dyn Storage>, config: &Config) -> Self {
        Self {
            storage,
            validator: DocumentValidator::new(config.max_upload_size_bytes),
            retention_secs: config.task_retention_secs,
            tasks: RwLock::new(HashMap::new()),
        }
    }

    /// Accept an upload: validate, persist the source, register the task.
    ///
    /// This is the single validation gate; everything downstream trusts
    /// documents that passed here. On rejection no task state exists.
    pub async fn create(&self, data: Bytes, filename: &str) -> Result<Uuid, AppError> {
        let format = self
            .validator
            .validate_all(filename, &data)
            .map_err(|e| AppError::Validation(e.to_string()))?;

        // Unguessable ids: download references are bearer-style, possession
        // of the id is the only access control.
        let task_id = Uuid::new_v4();
        let safe_filename = sanitize_filename(filename);
        let source_artifact = format!("original_{}", safe_filename);
        let source_key = keys::task_key(task_id, &source_artifact);
        let original_size = data.len() as u64;

        self.storage
            .put(&source_key, data.to_vec())
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        let entry = TaskEntry {
            status: TaskStatus::Processing,
            format,
            original_filename: safe_filename,
            source_artifact: source_artifact.clone(),
            original_size,
            created_at: Utc::now(),
            artifacts: HashMap::from([(source_artifact, source_key)]),
            variants: Vec::new(),
        };
        self.tasks.write().await.insert(task_id, entry);

        tracing::info!(
            task_id = %task_id,
            format = %format,
            size_bytes = original_size,
            "Task created"
        );

        Ok(task_id)
    }

    /// Load the immutable source document for orchestration.
    pub async fn source(&self, task_id: Uuid) -> Result<SourceDocument, AppError> {
        let (key, format, filename) = {
            let tasks = self.tasks.read().await;
            let entry = live_entry(&tasks, task_id)?;
            (
                keys::task_key(task_id, &entry.source_artifact),
                entry.format,
                entry.original_filename.clone(),
            )
        };

        let data = self.storage.get(&key).await.map_err(map_storage_err)?;
        Ok(SourceDocument::new(Bytes::from(data), format, filename))
    }

    /// Persist the per-profile outcomes and finish the task.
    ///
    /// Returns `false` when the task was deleted while processing: the
    /// outcomes are silently dropped and nothing is written. A storage
    /// failure while persisting variants marks the task `failed` and
    /// surfaces the error.
    pub async fn attach_outcomes(
        &self,
        task_id: Uuid,
        outcomes: ProfileOutcomes,
    ) -> Result<bool, AppError> {
        let original_filename = {
            let tasks = self.tasks.read().await;
            let entry = tasks
                .get(&task_id)
                .ok_or_else(|| AppError::NotFound(format!("Task {} not found", task_id)))?;
            if entry.status == TaskStatus::Deleted {
                tracing::debug!(task_id = %task_id, "Dropping outcomes for deleted task");
                return Ok(false);
            }
            entry.original_filename.clone()
        };

        let mut reports = Vec::with_capacity(QualityProfile::ALL.len());
        let mut written = Vec::new();
        let mut storage_failure: Option<String> = None;

        for (profile, outcome) in outcomes.iter() {
            match outcome {
                CompressionOutcome::Success {
                    data,
                    size,
                    compression_ratio,
                } => {
                    let filename = variant_filename(&original_filename, profile);
                    let key = keys::task_key(task_id, &filename);
                    match self.storage.put(&key, data.to_vec()).await {
                        Ok(()) => {
                            written.push((filename.clone(), key));
                            reports.push(VariantReport::Ready {
                                profile,
                                size: *size,
                                size_formatted: format_file_size(*size),
                                compression_ratio: *compression_ratio,
                                download_reference: format!("{}/{}", task_id, filename),
                                filename,
                            });
                        }
                        Err(e) => {
                            storage_failure = Some(e.to_string());
                            break;
                        }
                    }
                }
                CompressionOutcome::Failure { reason } => {
                    reports.push(VariantReport::Failed {
                        profile,
                        error: reason.clone(),
                    });
                }
            }
        }

        let mut tasks = self.tasks.write().await;
        let entry = match tasks.get_mut(&task_id) {
            Some(entry) => entry,
            None => return Ok(false),
        };

        // Deleted while variants were being written: purge them and drop.
        if entry.status == TaskStatus::Deleted {
            drop(tasks);
            if let Err(e) = self
                .storage
                .delete_prefix(&keys::task_prefix(task_id))
                .await
            {
                tracing::error!(task_id = %task_id, error = %e, "Failed to purge task deleted during processing");
            }
            tracing::debug!(task_id = %task_id, "Dropping outcomes for task deleted during processing");
            return Ok(false);
        }

        if let Some(reason) = storage_failure {
            entry.status = TaskStatus::Failed;
            return Err(AppError::Storage(reason));
        }

        let all_failed = reports.iter().all(|r| !r.is_ready());
        for (filename, key) in written {
            entry.artifacts.insert(filename, key);
        }
        entry.variants = reports;
        entry.status = if all_failed {
            TaskStatus::Failed
        } else {
            TaskStatus::Complete
        };

        tracing::info!(task_id = %task_id, status = %entry.status, "Task outcomes attached");

        Ok(true)
    }

    /// Resolve `(task_id, filename)` to exactly one artifact.
    ///
    /// Unknown task, deleted task, or unknown filename are all a definitive
    /// not-found, never a partial read.
    pub async fn get_download(&self, task_id: Uuid, filename: &str) -> Result<Vec<u8>, AppError> {
        let key = {
            let tasks = self.tasks.read().await;
            let entry = live_entry(&tasks, task_id)?;
            entry
                .artifacts
                .get(filename)
                .cloned()
                .ok_or_else(|| {
                    AppError::NotFound(format!("No artifact {} for task {}", filename, task_id))
                })?
        };

        self.storage.get(&key).await.map_err(map_storage_err)
    }

    /// The descriptor consumers render: per-profile reports plus identity.
    pub async fn describe(&self, task_id: Uuid) -> Result<TaskDescriptor, AppError> {
        let tasks = self.tasks.read().await;
        let entry = live_entry(&tasks, task_id)?;

        Ok(TaskDescriptor {
            task_id,
            status: entry.status,
            original_filename: entry.original_filename.clone(),
            original_size: entry.original_size,
            original_size_formatted: format_file_size(entry.original_size),
            created_at: entry.created_at,
            variants: entry.variants.clone(),
        })
    }

    pub async fn status(&self, task_id: Uuid) -> Option<TaskStatus> {
        self.tasks.read().await.get(&task_id).map(|e| e.status)
    }

    /// Remove all storage for the task and mark it deleted. Idempotent:
    /// deleting an already-deleted task is a no-op.
    pub async fn delete(&self, task_id: Uuid) -> Result<(), AppError> {
        {
            let mut tasks = self.tasks.write().await;
            let entry = tasks
                .get_mut(&task_id)
                .ok_or_else(|| AppError::NotFound(format!("Task {} not found", task_id)))?;
            if entry.status == TaskStatus::Deleted {
                return Ok(());
            }
            entry.status = TaskStatus::Deleted;
            entry.artifacts.clear();
            entry.variants.clear();
        }

        self.storage
            .delete_prefix(&keys::task_prefix(task_id))
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        tracing::info!(task_id = %task_id, "Task deleted");

        Ok(())
    }

    /// Delete every task older than the retention window and prune expired
    /// tombstones. Returns the number of tasks newly deleted.
    pub async fn sweep_expired(&self) -> Result<usize, AppError> {
        let now = Utc::now();
        let retention = chrono::Duration::seconds(self.retention_secs as i64);

        let mut expired = Vec::new();
        let mut tombstones = Vec::new();
        {
            let tasks = self.tasks.read().await;
            for (id, entry) in tasks.iter() {
                if now - entry.created_at <= retention {
                    continue;
                }
                if entry.status == TaskStatus::Deleted {
                    tombstones.push(*id);
                } else {
                    expired.push(*id);
                }
            }
        }

        for id in &expired {
            tracing::info!(task_id = %id, "Deleting expired task");
            if let Err(e) = self.delete(*id).await {
                tracing::error!(task_id = %id, error = %e, "Failed to delete expired task");
            }
        }

        if !tombstones.is_empty() {
            let mut tasks = self.tasks.write().await;
            for id in &tombstones {
                tasks.remove(id);
            }
        }

        Ok(expired.len())
    }
}

fn live_entry<'a>(
    tasks: &'a HashMap<Uuid, TaskEntry>,
    task_id: Uuid,
) -> Result<&'a TaskEntry, AppError> {
    tasks
        .get(&task_id)
        .filter(|entry| entry.status != TaskStatus::Deleted)
        .ok_or_else(|| AppError::NotFound(format!("Task {} not found", task_id)))
}

fn map_storage_err(err: StorageError) -> AppError {
    match err {
        StorageError::NotFound(key) => AppError::NotFound(format!("Artifact {} not found", key)),
        other => AppError::Storage(other.to_string()),
    }
}

/// Output name for one profile's variant: `report.pdf` → `report_extreme.pdf`.
fn variant_filename(original: &str, profile: QualityProfile) -> String {
    let path = Path::new(original);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document");
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}_{}.{}", stem, profile, ext),
        None => format!("{}_{}", stem, profile),
    }
}

fn sanitize_filename(filename: &str) -> String {
    const MAX: usize = 255;
    let path = Path::new(filename);
    let base = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);
    if base.contains("..") {
        return "invalid_filename".to_string();
    }
    let s: String = base
        .chars()
        .take(MAX)
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if s.trim().is_empty() || s.len() < 3 {
        "file".to_string()
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docpress_storage::LocalStorage;
    use tempfile::tempdir;

    async fn store_with(config: Config) -> (TaskStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let storage = Arc::new(LocalStorage::new(dir.path()).await.unwrap());
        (TaskStore::new(storage, &config), dir)
    }

    async fn test_store() -> (TaskStore, tempfile::TempDir) {
        store_with(Config::default()).await
    }

    fn pdf_bytes() -> Bytes {
        Bytes::from_static(b"%PDF-1.4 minimal fixture content")
    }

    fn sample_outcomes() -> ProfileOutcomes {
        let mut outcomes = ProfileOutcomes::default();
        outcomes.set(
            QualityProfile::Extreme,
            CompressionOutcome::success(Bytes::from_static(b"%PDF-extreme"), 32),
        );
        outcomes.set(
            QualityProfile::Medium,
            CompressionOutcome::success(Bytes::from_static(b"%PDF-medium-bytes"), 32),
        );
        outcomes.set(
            QualityProfile::Basic,
            CompressionOutcome::failure("reassembly failed"),
        );
        outcomes
    }

    #[tokio::test]
    async fn test_create_and_download_source() {
        let (store, _dir) = test_store().await;

        let task_id = store.create(pdf_bytes(), "report.pdf").await.unwrap();
        assert_eq!(store.status(task_id).await, Some(TaskStatus::Processing));

        let source = store.source(task_id).await.unwrap();
        assert_eq!(source.data, pdf_bytes());
        assert_eq!(source.format, DocumentFormat::Pdf);

        let bytes = store
            .get_download(task_id, "original_report.pdf")
            .await
            .unwrap();
        assert_eq!(bytes, pdf_bytes().to_vec());
    }

    #[tokio::test]
    async fn test_create_rejects_renamed_text_file() {
        let (store, _dir) = test_store().await;

        let result = store
            .create(Bytes::from_static(b"plain text content"), "fake.pdf")
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_oversized_upload() {
        let config = Config {
            max_upload_size_bytes: 16,
            ..Config::default()
        };
        let (store, _dir) = store_with(config).await;

        let result = store
            .create(Bytes::from_static(b"%PDF-1.4 far too large for the cap"), "big.pdf")
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_attach_outcomes_completes_task() {
        let (store, _dir) = test_store().await;
        let task_id = store.create(pdf_bytes(), "report.pdf").await.unwrap();

        let attached = store
            .attach_outcomes(task_id, sample_outcomes())
            .await
            .unwrap();
        assert!(attached);
        assert_eq!(store.status(task_id).await, Some(TaskStatus::Complete));

        let descriptor = store.describe(task_id).await.unwrap();
        assert_eq!(descriptor.variants.len(), 3);
        assert_eq!(
            descriptor.variants.iter().filter(|v| v.is_ready()).count(),
            2
        );

        let extreme = store
            .get_download(task_id, "report_extreme.pdf")
            .await
            .unwrap();
        assert_eq!(extreme, b"%PDF-extreme".to_vec());
    }

    #[tokio::test]
    async fn test_all_profiles_failing_marks_task_failed() {
        let (store, _dir) = test_store().await;
        let task_id = store.create(pdf_bytes(), "report.pdf").await.unwrap();

        let attached = store
            .attach_outcomes(task_id, ProfileOutcomes::default())
            .await
            .unwrap();
        assert!(attached);
        assert_eq!(store.status(task_id).await, Some(TaskStatus::Failed));
    }

    #[tokio::test]
    async fn test_delete_then_download_is_not_found() {
        let (store, _dir) = test_store().await;
        let task_id = store.create(pdf_bytes(), "report.pdf").await.unwrap();
        store.attach_outcomes(task_id, sample_outcomes()).await.unwrap();

        store.delete(task_id).await.unwrap();

        let result = store.get_download(task_id, "report_extreme.pdf").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
        let result = store.describe(task_id).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (store, _dir) = test_store().await;
        let task_id = store.create(pdf_bytes(), "report.pdf").await.unwrap();

        store.delete(task_id).await.unwrap();
        store.delete(task_id).await.unwrap();
        assert_eq!(store.status(task_id).await, Some(TaskStatus::Deleted));
    }

    #[tokio::test]
    async fn test_delete_unknown_task_is_not_found() {
        let (store, _dir) = test_store().await;
        let result = store.delete(Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_outcomes_dropped_after_delete() {
        let (store, _dir) = test_store().await;
        let task_id = store.create(pdf_bytes(), "report.pdf").await.unwrap();

        store.delete(task_id).await.unwrap();

        let attached = store
            .attach_outcomes(task_id, sample_outcomes())
            .await
            .unwrap();
        assert!(!attached);
        assert_eq!(store.status(task_id).await, Some(TaskStatus::Deleted));

        let result = store.get_download(task_id, "report_extreme.pdf").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_wrong_filename_is_not_found() {
        let (store, _dir) = test_store().await;
        let task_id = store.create(pdf_bytes(), "report.pdf").await.unwrap();

        let result = store.get_download(task_id, "other.pdf").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_sweep_deletes_only_expired_tasks() {
        let config = Config {
            task_retention_secs: 0,
            ..Config::default()
        };
        let (store, _dir) = store_with(config).await;
        let task_id = store.create(pdf_bytes(), "report.pdf").await.unwrap();

        // retention 0: anything older than "now" is expired
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        let deleted = store.sweep_expired().await.unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(store.status(task_id).await, Some(TaskStatus::Deleted));

        // next sweep prunes the tombstone and deletes nothing new
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        let deleted = store.sweep_expired().await.unwrap();
        assert_eq!(deleted, 0);
        assert_eq!(store.status(task_id).await, None);
    }

    #[tokio::test]
    async fn test_sweep_keeps_fresh_tasks() {
        let (store, _dir) = test_store().await;
        let task_id = store.create(pdf_bytes(), "report.pdf").await.unwrap();

        let deleted = store.sweep_expired().await.unwrap();
        assert_eq!(deleted, 0);
        assert_eq!(store.status(task_id).await, Some(TaskStatus::Processing));
    }

    #[test]
    fn test_variant_filename() {
        assert_eq!(
            variant_filename("report.pdf", QualityProfile::Extreme),
            "report_extreme.pdf"
        );
        assert_eq!(
            variant_filename("notes.docx", QualityProfile::Basic),
            "notes_basic.docx"
        );
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("report.pdf"), "report.pdf");
        assert_eq!(sanitize_filename("my report (v2).pdf"), "my_report__v2_.pdf");
        // Only the final path component survives
        assert_eq!(sanitize_filename("../../etc/passwd.pdf"), "passwd.pdf");
        assert_eq!(sanitize_filename("a..b.pdf"), "invalid_filename");
        assert_eq!(sanitize_filename(""), "file");
    }
}
