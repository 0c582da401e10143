//! Docpress Core Library
//!
//! This crate provides the domain models, error types, and configuration
//! shared across all docpress components.

pub mod config;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::Config;
pub use error::AppError;
pub use models::{
    ChromaSubsampling, CompressionOutcome, DocumentFormat, ProfileOutcomes, ProfileSettings,
    QualityProfile, SourceDocument, TaskDescriptor, TaskStatus, VariantReport,
};
