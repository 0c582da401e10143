//! DOCX format adapter.
//!
//! A DOCX file is a ZIP package; raster images live under `word/media/`.
//! Eligible media entries are recompressed and written back under their
//! original entry names, so relationships and content types remain
//! byte-identical. Every other entry is copied through untouched.

use std::io::{Cursor, Read, Write};

use bytes::Bytes;
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

use docpress_core::models::{DocumentFormat, QualityProfile};

use crate::error::DocumentError;
use crate::image::ImageRecompressor;

/// Media entries smaller than this are not worth recompressing.
const MIN_IMAGE_BYTES: u64 = 1024;

/// Raster formats eligible for recompression inside the package.
const IMAGE_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "gif", "bmp", "tif", "tiff"];

/// DOCX format adapter: rewrites embedded raster images in place.
pub struct DocxAdapter;

impl DocxAdapter {
    /// Compress every eligible media image and repack the archive.
    ///
    /// Never returns bytes larger than the input: if the repacked archive
    /// did not shrink, the original bytes are returned unchanged.
    pub fn compress(source: &[u8], profile: QualityProfile) -> Result<Bytes, DocumentError> {
        let mut archive = ZipArchive::new(Cursor::new(source)).map_err(|e| {
            DocumentError::UnsupportedContainer {
                format: DocumentFormat::Docx,
                reason: e.to_string(),
            }
        })?;

        let mut output = Vec::new();
        let mut rewritten = 0usize;

        {
            let mut writer = ZipWriter::new(Cursor::new(&mut output));
            let options =
                FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

            for index in 0..archive.len() {
                let mut entry = archive.by_index(index).map_err(|e| {
                    DocumentError::UnsupportedContainer {
                        format: DocumentFormat::Docx,
                        reason: e.to_string(),
                    }
                })?;
                let name = entry.name().to_owned();

                if !is_media_image(&name) || entry.size() < MIN_IMAGE_BYTES {
                    writer
                        .raw_copy_file(entry)
                        .map_err(|e| reassembly(e.to_string()))?;
                    continue;
                }

                let mut data = Vec::with_capacity(entry.size() as usize);
                entry.read_to_end(&mut data).map_err(|e| {
                    DocumentError::UnsupportedContainer {
                        format: DocumentFormat::Docx,
                        reason: e.to_string(),
                    }
                })?;
                drop(entry);

                let replacement = match ImageRecompressor::recompress(&data, profile) {
                    // Substitute only when strictly smaller than the original entry
                    Ok(result) if result.data.len() < data.len() => {
                        rewritten += 1;
                        result.data.to_vec()
                    }
                    Ok(_) => data,
                    Err(err) => {
                        tracing::debug!(
                            entry = %name,
                            error = %err,
                            "Leaving media entry unchanged after recompression failure"
                        );
                        data
                    }
                };

                writer
                    .start_file(name.as_str(), options)
                    .map_err(|e| reassembly(e.to_string()))?;
                writer
                    .write_all(&replacement)
                    .map_err(|e| reassembly(e.to_string()))?;
            }

            writer.finish().map_err(|e| reassembly(e.to_string()))?;
        }

        tracing::debug!(
            profile = %profile,
            rewritten,
            input_size = source.len(),
            output_size = output.len(),
            "DOCX media pass finished"
        );

        // Non-expansion floor: a repacked archive that did not shrink is
        // discarded and the original bytes are served instead.
        if output.len() >= source.len() {
            return Ok(Bytes::copy_from_slice(source));
        }

        Ok(Bytes::from(output))
    }
}

fn reassembly(reason: String) -> DocumentError {
    DocumentError::Reassembly {
        format: DocumentFormat::Docx,
        reason,
    }
}

fn is_media_image(name: &str) -> bool {
    if !name.starts_with("word/media/") {
        return false;
    }
    let extension = match name.rsplit('.').next() {
        Some(ext) => ext.to_lowercase(),
        None => return false,
    };
    IMAGE_EXTENSIONS.contains(&extension.as_str())
}
