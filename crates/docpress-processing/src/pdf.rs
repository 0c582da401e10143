//! PDF format adapter.
//!
//! Walks every image XObject in the document, re-encodes the eligible ones
//! through the image recompressor, and substitutes them in place. All
//! non-image objects (text, fonts, layout) pass through untouched.

use std::collections::HashSet;
use std::io::Read;

use bytes::Bytes;
use flate2::read::ZlibDecoder;
use image::{DynamicImage, GrayImage, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use docpress_core::models::{DocumentFormat, QualityProfile};

use crate::error::{DocumentError, ImageError};
use crate::image::ImageRecompressor;

/// Minimum pixel area for an image to be eligible for recompression.
const MIN_PIXEL_AREA: u64 = 10_000;

/// PDF format adapter: rewrites embedded raster images in place.
pub struct PdfAdapter;

impl PdfAdapter {
    /// Compress every eligible embedded image and re-save the document.
    ///
    /// Never returns bytes larger than the input: if the rebuilt document
    /// did not shrink, the original bytes are returned unchanged.
    pub fn compress(source: &[u8], profile: QualityProfile) -> Result<Bytes, DocumentError> {
        let mut doc =
            Document::load_mem(source).map_err(|e| DocumentError::UnsupportedContainer {
                format: DocumentFormat::Pdf,
                reason: e.to_string(),
            })?;

        // Soft-mask streams are grayscale alpha data, not displayable
        // images; they must keep their color space and are never rewritten.
        let smask_ids: HashSet<ObjectId> = doc
            .objects
            .values()
            .filter_map(|object| match object {
                Object::Stream(stream) => match stream.dict.get(b"SMask") {
                    Ok(Object::Reference(id)) => Some(*id),
                    _ => None,
                },
                _ => None,
            })
            .collect();

        let image_ids: Vec<ObjectId> = doc
            .objects
            .iter()
            .filter_map(|(id, object)| match object {
                Object::Stream(stream) if is_image_stream(stream) && !smask_ids.contains(id) => {
                    Some(*id)
                }
                _ => None,
            })
            .collect();

        let mut rewritten = 0usize;
        let mut kept = 0usize;

        for object_id in image_ids {
            let stream = match doc.get_object(object_id) {
                Ok(Object::Stream(s)) => s.clone(),
                _ => continue,
            };

            match Self::recompress_stream(&doc, &stream, profile) {
                Some(new_stream) => {
                    doc.objects.insert(object_id, Object::Stream(new_stream));
                    rewritten += 1;
                }
                None => kept += 1,
            }
        }

        doc.compress();

        let mut output = Vec::new();
        doc.save_to(&mut output)
            .map_err(|e| DocumentError::Reassembly {
                format: DocumentFormat::Pdf,
                reason: e.to_string(),
            })?;

        tracing::debug!(
            profile = %profile,
            rewritten,
            kept,
            input_size = source.len(),
            output_size = output.len(),
            "PDF image pass finished"
        );

        // Non-expansion floor: a rebuilt document that did not shrink is
        // discarded and the original bytes are served instead.
        if output.len() >= source.len() {
            return Ok(Bytes::copy_from_slice(source));
        }

        Ok(Bytes::from(output))
    }

    /// Re-encode one image stream. `None` means the image stays unchanged
    /// (too small, unsupported encoding, per-image failure, or no gain).
    fn recompress_stream(
        doc: &Document,
        stream: &Stream,
        profile: QualityProfile,
    ) -> Option<Stream> {
        let width = dict_u32(&stream.dict, b"Width")?;
        let height = dict_u32(&stream.dict, b"Height")?;
        if u64::from(width) * u64::from(height) < MIN_PIXEL_AREA {
            return None;
        }

        let original_len = stream.content.len();

        let encoded = match primary_filter(&stream.dict).as_deref() {
            // DCTDecode streams are plain JPEG bytes
            Some("DCTDecode") => ImageRecompressor::recompress(&stream.content, profile),
            Some("FlateDecode") | None => Self::decode_raw(doc, stream, width, height)
                .and_then(|img| ImageRecompressor::encode(img, profile)),
            // CCITT, JBIG2, JPX and friends are left as-is
            Some(_) => return None,
        };

        let jpeg = match encoded {
            Ok(result) => result,
            Err(err) => {
                tracing::debug!(
                    error = %err,
                    width,
                    height,
                    "Leaving PDF image unchanged after recompression failure"
                );
                return None;
            }
        };

        // Substitute only when strictly smaller than the stored stream.
        if jpeg.data.len() >= original_len {
            return None;
        }

        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name(b"XObject".to_vec()));
        dict.set("Subtype", Object::Name(b"Image".to_vec()));
        dict.set("Width", Object::Integer(i64::from(jpeg.width)));
        dict.set("Height", Object::Integer(i64::from(jpeg.height)));
        dict.set("ColorSpace", Object::Name(b"DeviceRGB".to_vec()));
        dict.set("BitsPerComponent", Object::Integer(8));
        dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));
        // A soft mask may have different dimensions than its base image, so
        // an existing reference stays valid after downscaling.
        if let Ok(smask) = stream.dict.get(b"SMask") {
            dict.set("SMask", smask.clone());
        }

        Some(Stream::new(dict, jpeg.data.to_vec()))
    }

    /// Decode a raw (non-JPEG) image stream into pixels.
    ///
    /// Handles FlateDecode and unfiltered streams with 8-bit DeviceRGB,
    /// DeviceGray, DeviceCMYK, or ICCBased color; everything else is
    /// reported as a decode failure and the image is kept unchanged.
    fn decode_raw(
        doc: &Document,
        stream: &Stream,
        width: u32,
        height: u32,
    ) -> Result<DynamicImage, ImageError> {
        let data = match primary_filter(&stream.dict).as_deref() {
            Some("FlateDecode") => {
                let mut decoder = ZlibDecoder::new(stream.content.as_slice());
                let mut decoded = Vec::new();
                decoder
                    .read_to_end(&mut decoded)
                    .map_err(|e| ImageError::Decode(e.to_string()))?;
                decoded
            }
            None => stream.content.clone(),
            Some(other) => {
                return Err(ImageError::Decode(format!("Unsupported filter: {}", other)))
            }
        };

        let bits = dict_u32(&stream.dict, b"BitsPerComponent").unwrap_or(8);
        if bits != 8 {
            return Err(ImageError::Decode(format!(
                "Unsupported bit depth: {}",
                bits
            )));
        }

        let color_space = stream
            .dict
            .get(b"ColorSpace")
            .ok()
            .map(|cs| color_space_name(cs, doc))
            .unwrap_or_else(|| "DeviceRGB".to_string());

        let pixels = width as usize * height as usize;

        match color_space.as_str() {
            "DeviceRGB" | "CalRGB" => {
                if data.len() < pixels * 3 {
                    return Err(ImageError::Decode("Truncated RGB data".to_string()));
                }
                RgbImage::from_raw(width, height, data[..pixels * 3].to_vec())
                    .map(DynamicImage::ImageRgb8)
                    .ok_or_else(|| ImageError::Decode("Invalid RGB buffer".to_string()))
            }
            "DeviceGray" | "CalGray" => {
                if data.len() < pixels {
                    return Err(ImageError::Decode("Truncated grayscale data".to_string()));
                }
                GrayImage::from_raw(width, height, data[..pixels].to_vec())
                    .map(DynamicImage::ImageLuma8)
                    .ok_or_else(|| ImageError::Decode("Invalid grayscale buffer".to_string()))
            }
            "DeviceCMYK" => {
                if data.len() < pixels * 4 {
                    return Err(ImageError::Decode("Truncated CMYK data".to_string()));
                }
                let mut rgb_data = Vec::with_capacity(pixels * 3);
                for chunk in data[..pixels * 4].chunks_exact(4) {
                    let c = chunk[0] as f32 / 255.0;
                    let m = chunk[1] as f32 / 255.0;
                    let y = chunk[2] as f32 / 255.0;
                    let k = chunk[3] as f32 / 255.0;
                    rgb_data.push(((1.0 - c) * (1.0 - k) * 255.0) as u8);
                    rgb_data.push(((1.0 - m) * (1.0 - k) * 255.0) as u8);
                    rgb_data.push(((1.0 - y) * (1.0 - k) * 255.0) as u8);
                }
                RgbImage::from_raw(width, height, rgb_data)
                    .map(DynamicImage::ImageRgb8)
                    .ok_or_else(|| ImageError::Decode("Invalid CMYK buffer".to_string()))
            }
            // Component count is not recorded in the name; guess from size.
            "ICCBased" => {
                if data.len() >= pixels * 3 {
                    RgbImage::from_raw(width, height, data[..pixels * 3].to_vec())
                        .map(DynamicImage::ImageRgb8)
                        .ok_or_else(|| ImageError::Decode("Invalid ICC RGB buffer".to_string()))
                } else if data.len() >= pixels {
                    GrayImage::from_raw(width, height, data[..pixels].to_vec())
                        .map(DynamicImage::ImageLuma8)
                        .ok_or_else(|| ImageError::Decode("Invalid ICC gray buffer".to_string()))
                } else {
                    Err(ImageError::Decode(
                        "Could not determine ICCBased layout".to_string(),
                    ))
                }
            }
            other => Err(ImageError::Decode(format!(
                "Unsupported color space: {}",
                other
            ))),
        }
    }
}

fn is_image_stream(stream: &Stream) -> bool {
    matches!(
        stream.dict.get(b"Subtype"),
        Ok(Object::Name(name)) if name.as_slice() == b"Image"
    )
}

/// First entry of the /Filter chain, if any.
fn primary_filter(dict: &Dictionary) -> Option<String> {
    match dict.get(b"Filter") {
        Ok(Object::Name(n)) => Some(String::from_utf8_lossy(n).to_string()),
        Ok(Object::Array(arr)) => arr.first().and_then(|f| match f {
            Object::Name(n) => Some(String::from_utf8_lossy(n).to_string()),
            _ => None,
        }),
        _ => None,
    }
}

fn dict_u32(dict: &Dictionary, key: &[u8]) -> Option<u32> {
    match dict.get(key) {
        Ok(Object::Integer(n)) => u32::try_from(*n).ok(),
        _ => None,
    }
}

fn color_space_name(obj: &Object, doc: &Document) -> String {
    match obj {
        Object::Name(name) => String::from_utf8_lossy(name).to_string(),
        Object::Array(arr) => arr
            .first()
            .map(|o| color_space_name(o, doc))
            .unwrap_or_else(|| "Unknown".to_string()),
        Object::Reference(id) => doc
            .get_object(*id)
            .map(|o| color_space_name(o, doc))
            .unwrap_or_else(|_| "Unknown".to_string()),
        _ => "Unknown".to_string(),
    }
}
