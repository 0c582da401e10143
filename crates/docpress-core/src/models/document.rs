use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;
use std::str::FromStr;

/// Container formats the pipeline understands.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    Pdf,
    Docx,
}

impl DocumentFormat {
    /// Resolve the declared format from a filename extension.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())?;
        match extension.as_str() {
            "pdf" => Some(DocumentFormat::Pdf),
            "docx" => Some(DocumentFormat::Docx),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Docx => "docx",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "application/pdf",
            DocumentFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }

    /// Check the leading magic bytes against the declared format.
    ///
    /// A `.txt` renamed to `.pdf` fails here, at intake, before any task
    /// state is allocated. DOCX is a ZIP package, so the ZIP local-file
    /// signature is the strongest check available without unpacking.
    pub fn matches_signature(self, data: &[u8]) -> bool {
        match self {
            DocumentFormat::Pdf => data.starts_with(b"%PDF-"),
            DocumentFormat::Docx => data.starts_with(b"PK\x03\x04"),
        }
    }
}

impl Display for DocumentFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.extension())
    }
}

impl FromStr for DocumentFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pdf" => Ok(DocumentFormat::Pdf),
            "docx" => Ok(DocumentFormat::Docx),
            _ => Err(anyhow::anyhow!("Invalid document format: {}", s)),
        }
    }
}

/// The uploaded bytes plus their declared identity.
///
/// Owned by exactly one task for its lifetime and never mutated; the
/// orchestrator shares it read-only across concurrent profile runs.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub data: Bytes,
    pub format: DocumentFormat,
    pub filename: String,
}

impl SourceDocument {
    pub fn new(data: Bytes, format: DocumentFormat, filename: impl Into<String>) -> Self {
        Self {
            data,
            format,
            filename: filename.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}
