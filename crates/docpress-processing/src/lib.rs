//! Docpress Processing Library
//!
//! Format-aware document recompression: the image recompressor, the PDF and
//! DOCX format adapters, the quality-profile orchestrator, and the upload
//! intake validator.

pub mod docx;
pub mod error;
pub mod image;
pub mod orchestrator;
pub mod pdf;
pub mod validator;

// Re-export commonly used types
pub use docx::DocxAdapter;
pub use error::{DocumentError, ImageError};
pub use orchestrator::CompressionOrchestrator;
pub use pdf::PdfAdapter;
pub use validator::{DocumentValidator, ValidationError};

pub use crate::image::{ImageOrientation, ImageRecompressor, RecompressedImage};
