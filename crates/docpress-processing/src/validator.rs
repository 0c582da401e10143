use docpress_core::DocumentFormat;
use std::path::Path;

/// Intake validation errors, surfaced verbatim to the uploader.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("Invalid file extension: {extension} (allowed: pdf, docx)")]
    InvalidExtension { extension: String },

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("File content does not match the declared {format} format")]
    InvalidSignature { format: DocumentFormat },

    #[error("Empty file")]
    EmptyFile,
}

/// Upload intake validator.
///
/// This is the single validation gate: the orchestrator and the format
/// adapters trust any document that passed here. Validation is not repeated
/// per profile.
pub struct DocumentValidator {
    max_file_size: usize,
}

impl DocumentValidator {
    pub fn new(max_file_size: usize) -> Self {
        Self { max_file_size }
    }

    /// Validate file size
    pub fn validate_file_size(&self, size: usize) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }

        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        Ok(())
    }

    /// Validate the extension and resolve the declared format.
    pub fn validate_format(&self, filename: &str) -> Result<DocumentFormat, ValidationError> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .ok_or_else(|| ValidationError::InvalidFilename(filename.to_string()))?;

        DocumentFormat::from_filename(filename)
            .ok_or(ValidationError::InvalidExtension { extension })
    }

    /// Check the leading magic bytes against the declared format, so a
    /// renamed file is rejected before any task state exists.
    pub fn validate_signature(
        &self,
        format: DocumentFormat,
        data: &[u8],
    ) -> Result<(), ValidationError> {
        if format.matches_signature(data) {
            Ok(())
        } else {
            Err(ValidationError::InvalidSignature { format })
        }
    }

    /// Validate all aspects of an upload; returns the declared format.
    pub fn validate_all(
        &self,
        filename: &str,
        data: &[u8],
    ) -> Result<DocumentFormat, ValidationError> {
        self.validate_file_size(data.len())?;
        let format = self.validate_format(filename)?;
        self.validate_signature(format, data)?;
        Ok(format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_validator() -> DocumentValidator {
        DocumentValidator::new(1024 * 1024)
    }

    #[test]
    fn test_validate_file_size_ok() {
        assert!(test_validator().validate_file_size(512 * 1024).is_ok());
    }

    #[test]
    fn test_validate_file_size_too_large() {
        assert!(matches!(
            test_validator().validate_file_size(2 * 1024 * 1024),
            Err(ValidationError::FileTooLarge { .. })
        ));
    }

    #[test]
    fn test_validate_file_size_empty() {
        assert!(matches!(
            test_validator().validate_file_size(0),
            Err(ValidationError::EmptyFile)
        ));
    }

    #[test]
    fn test_validate_format_resolves_declared_format() {
        let validator = test_validator();
        assert_eq!(
            validator.validate_format("report.pdf").unwrap(),
            DocumentFormat::Pdf
        );
        assert_eq!(
            validator.validate_format("report.DOCX").unwrap(),
            DocumentFormat::Docx
        );
    }

    #[test]
    fn test_validate_format_rejects_other_extensions() {
        let validator = test_validator();
        assert!(matches!(
            validator.validate_format("notes.txt"),
            Err(ValidationError::InvalidExtension { .. })
        ));
        assert!(matches!(
            validator.validate_format("no_extension"),
            Err(ValidationError::InvalidFilename(_))
        ));
    }

    #[test]
    fn test_renamed_text_file_rejected_by_signature() {
        let validator = test_validator();
        let result = validator.validate_all("fake.pdf", b"just some text content");
        assert!(matches!(
            result,
            Err(ValidationError::InvalidSignature {
                format: DocumentFormat::Pdf
            })
        ));
    }

    #[test]
    fn test_validate_all_accepts_matching_content() {
        let validator = test_validator();
        assert_eq!(
            validator.validate_all("a.pdf", b"%PDF-1.7 ...").unwrap(),
            DocumentFormat::Pdf
        );
        assert_eq!(
            validator.validate_all("a.docx", b"PK\x03\x04rest").unwrap(),
            DocumentFormat::Docx
        );
    }
}
