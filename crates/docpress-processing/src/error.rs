//! Processing error taxonomy.
//!
//! [`ImageError`] is scoped to one image inside a document: the caller
//! recovers by keeping that image unchanged. [`DocumentError`] is scoped to
//! one profile's document-level run: the orchestrator records it as that
//! profile's failure while the other profiles proceed.

use docpress_core::DocumentFormat;

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("Cannot parse {format} container: {reason}")]
    UnsupportedContainer {
        format: DocumentFormat,
        reason: String,
    },

    #[error("Failed to reassemble {format} container: {reason}")]
    Reassembly {
        format: DocumentFormat,
        reason: String,
    },
}
