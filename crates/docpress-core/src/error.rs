//! Error types module
//!
//! Service-level errors are unified under [`AppError`]. Errors local to one
//! stage of processing (image decode/encode, container parsing, intake
//! validation, storage I/O) live next to that stage and are converted at the
//! service boundary.

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("JSON error: {}", err))
    }
}

impl AppError {
    /// Whether the error maps to a definitive not-found (no retry).
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_predicate() {
        assert!(AppError::NotFound("task".to_string()).is_not_found());
        assert!(!AppError::Validation("bad".to_string()).is_not_found());
    }

    #[test]
    fn test_io_error_conversion() {
        let err: AppError = io::Error::new(io::ErrorKind::Other, "disk full").into();
        assert!(matches!(err, AppError::Internal(_)));
        assert!(err.to_string().contains("disk full"));
    }
}
