//! Storage abstraction trait
//!
//! This module defines the Storage trait the task store talks to. The only
//! shipped backend is the local filesystem; the trait keeps the store
//! decoupled from where artifact bytes actually live.

use async_trait::async_trait;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage abstraction trait
///
/// **Key format:** keys are task-scoped, `tasks/{task_id}/{filename}`. See
/// the crate root documentation. Keys must not contain `..` or a leading
/// `/`; backends reject such keys before touching the filesystem.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Write an artifact under the given key, creating parent directories.
    async fn put(&self, storage_key: &str, data: Vec<u8>) -> StorageResult<()>;

    /// Read an artifact by its storage key.
    async fn get(&self, storage_key: &str) -> StorageResult<Vec<u8>>;

    /// Delete a single artifact. Deleting a missing key is not an error.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Delete every artifact under a prefix (task teardown). Deleting a
    /// missing prefix is not an error.
    async fn delete_prefix(&self, prefix: &str) -> StorageResult<()>;

    /// Check whether an artifact exists.
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;
}
