//! Compression orchestration: one source document, three quality profiles.

use std::sync::Arc;

use bytes::Bytes;

use docpress_core::models::{
    CompressionOutcome, DocumentFormat, ProfileOutcomes, QualityProfile, SourceDocument,
};

use crate::docx::DocxAdapter;
use crate::error::DocumentError;
use crate::pdf::PdfAdapter;

/// Runs the quality profiles against one immutable source document.
///
/// Format validation already happened at intake; the orchestrator only
/// selects the matching adapter.
pub struct CompressionOrchestrator;

impl CompressionOrchestrator {
    /// Produce exactly one outcome per profile.
    ///
    /// Profiles run concurrently on the blocking pool and are fully
    /// isolated: a failure in one slot never aborts the others, and the
    /// outcomes do not depend on execution order.
    pub async fn run(source: Arc<SourceDocument>) -> ProfileOutcomes {
        let original_size = source.size();
        let mut outcomes = ProfileOutcomes::default();

        let handles: Vec<_> = QualityProfile::ALL
            .iter()
            .map(|&profile| {
                let source = Arc::clone(&source);
                let handle =
                    tokio::task::spawn_blocking(move || Self::run_profile(&source, profile));
                (profile, handle)
            })
            .collect();

        for (profile, handle) in handles {
            let outcome = match handle.await {
                Ok(Ok(data)) => CompressionOutcome::success(data, original_size),
                Ok(Err(err)) => {
                    tracing::warn!(
                        profile = %profile,
                        error = %err,
                        "Profile compression failed"
                    );
                    CompressionOutcome::failure(err.to_string())
                }
                Err(err) => {
                    tracing::error!(
                        profile = %profile,
                        error = %err,
                        "Profile compression task aborted"
                    );
                    CompressionOutcome::failure(format!("Compression task aborted: {}", err))
                }
            };
            outcomes.set(profile, outcome);
        }

        outcomes
    }

    fn run_profile(
        source: &SourceDocument,
        profile: QualityProfile,
    ) -> Result<Bytes, DocumentError> {
        let output = match source.format {
            DocumentFormat::Pdf => PdfAdapter::compress(&source.data, profile)?,
            DocumentFormat::Docx => DocxAdapter::compress(&source.data, profile)?,
        };

        tracing::info!(
            profile = %profile,
            format = %source.format,
            input_size = source.data.len(),
            output_size = output.len(),
            "Profile compression finished"
        );

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::FileOptions;
    use zip::ZipWriter;

    fn docx_source() -> Arc<SourceDocument> {
        let mut buffer = Vec::new();
        {
            let mut writer = ZipWriter::new(Cursor::new(&mut buffer));
            let options = FileOptions::default();
            writer.start_file("word/document.xml", options).unwrap();
            writer.write_all(b"<w:document/>").unwrap();

            let mut img = image::RgbaImage::new(600, 400);
            for (x, y, pixel) in img.enumerate_pixels_mut() {
                let v = ((x * 13 + y * 7) % 256) as u8;
                *pixel = image::Rgba([v, v.wrapping_add(60), v.wrapping_mul(2), 255]);
            }
            let mut png = Vec::new();
            image::DynamicImage::ImageRgba8(img)
                .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
                .unwrap();
            writer.start_file("word/media/image1.png", options).unwrap();
            writer.write_all(&png).unwrap();

            writer.finish().unwrap();
        }
        Arc::new(SourceDocument::new(
            Bytes::from(buffer),
            DocumentFormat::Docx,
            "fixture.docx",
        ))
    }

    #[tokio::test]
    async fn test_run_returns_three_outcomes() {
        let source = docx_source();
        let outcomes = CompressionOrchestrator::run(source.clone()).await;

        for (_, outcome) in outcomes.iter() {
            match outcome {
                CompressionOutcome::Success {
                    size,
                    compression_ratio,
                    ..
                } => {
                    assert!(*size <= source.size());
                    assert!(*compression_ratio >= 0.0);
                }
                CompressionOutcome::Failure { reason } => {
                    panic!("expected success, got failure: {}", reason)
                }
            }
        }
    }

    #[tokio::test]
    async fn test_outcomes_are_order_independent() {
        let source = docx_source();

        let first = CompressionOrchestrator::run(source.clone()).await;
        let second = CompressionOrchestrator::run(source).await;

        for profile in QualityProfile::ALL {
            match (first.get(profile), second.get(profile)) {
                (
                    CompressionOutcome::Success { size: a, .. },
                    CompressionOutcome::Success { size: b, .. },
                ) => assert_eq!(a, b),
                _ => panic!("expected success in both runs"),
            }
        }
    }

    #[tokio::test]
    async fn test_unparseable_source_fails_every_slot_independently() {
        // Bypasses intake on purpose: document-level errors must become
        // per-profile failures, not a crash.
        let source = Arc::new(SourceDocument::new(
            Bytes::from_static(b"PK\x03\x04 but truncated"),
            DocumentFormat::Docx,
            "broken.docx",
        ));

        let outcomes = CompressionOrchestrator::run(source).await;
        for (_, outcome) in outcomes.iter() {
            assert!(!outcome.is_success());
        }
    }
}
