use bytes::Bytes;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageReader, Rgb, RgbImage};
use jpeg_encoder::{ColorType, Encoder, SamplingFactor};
use std::io::Cursor;

use docpress_core::models::{ChromaSubsampling, QualityProfile};

use super::orientation::ImageOrientation;
use crate::error::ImageError;

/// A re-encoded image plus its final pixel dimensions.
///
/// Container adapters need the dimensions to rewrite size fields without
/// re-decoding the produced JPEG.
#[derive(Debug, Clone)]
pub struct RecompressedImage {
    pub data: Bytes,
    pub width: u32,
    pub height: u32,
}

/// Re-encodes a single raster image according to a quality profile.
///
/// Pure function over bytes, no shared state.
pub struct ImageRecompressor;

impl ImageRecompressor {
    /// Recompress encoded image bytes (JPEG, PNG, GIF, BMP, TIFF, WebP).
    ///
    /// Applies the rotation/flip implied by an EXIF orientation tag before
    /// encoding; the produced JPEG carries no EXIF, so viewers cannot
    /// double-apply the orientation.
    pub fn recompress(
        data: &[u8],
        profile: QualityProfile,
    ) -> Result<RecompressedImage, ImageError> {
        let reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| ImageError::Decode(e.to_string()))?;
        let img = reader
            .decode()
            .map_err(|e| ImageError::Decode(e.to_string()))?;

        let orientation = ImageOrientation::read_orientation(data);
        let img = ImageOrientation::apply(img, orientation);

        Self::encode(img, profile)
    }

    /// Encode already-decoded pixels with the profile's parameters.
    ///
    /// Entry point for callers that decode container-specific pixel data
    /// themselves (the PDF adapter's raw streams).
    pub fn encode(
        img: DynamicImage,
        profile: QualityProfile,
    ) -> Result<RecompressedImage, ImageError> {
        let settings = profile.settings();

        let img = Self::downscale(img, settings.max_dimension_px);
        let rgb = Self::flatten_to_rgb(img);
        let (width, height) = rgb.dimensions();

        if width > u16::MAX as u32 || height > u16::MAX as u32 {
            return Err(ImageError::Encode(format!(
                "Image dimensions {}x{} exceed encoder limits",
                width, height
            )));
        }

        let mut buffer = Vec::new();
        let mut encoder = Encoder::new(&mut buffer, settings.jpeg_quality);
        encoder.set_sampling_factor(sampling_factor(settings.chroma_subsampling));
        encoder
            .encode(rgb.as_raw(), width as u16, height as u16, ColorType::Rgb)
            .map_err(|e| ImageError::Encode(e.to_string()))?;

        Ok(RecompressedImage {
            data: Bytes::from(buffer),
            width,
            height,
        })
    }

    /// Downscale so neither dimension exceeds `max_dimension`, preserving
    /// aspect ratio. Never upscales.
    fn downscale(img: DynamicImage, max_dimension: u32) -> DynamicImage {
        let (width, height) = img.dimensions();
        if width <= max_dimension && height <= max_dimension {
            return img;
        }
        img.resize(max_dimension, max_dimension, FilterType::Lanczos3)
    }

    /// Collapse palette/alpha/CMYK variants into plain 8-bit RGB.
    /// Transparent pixels are composited over white.
    fn flatten_to_rgb(img: DynamicImage) -> RgbImage {
        if !img.color().has_alpha() {
            return img.to_rgb8();
        }

        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        let mut rgb = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));

        for (x, y, pixel) in rgba.enumerate_pixels() {
            let alpha = pixel[3] as u32;
            let out = rgb.get_pixel_mut(x, y);
            for channel in 0..3 {
                out[channel] = ((pixel[channel] as u32 * alpha + 255 * (255 - alpha)) / 255) as u8;
            }
        }

        rgb
    }
}

fn sampling_factor(mode: ChromaSubsampling) -> SamplingFactor {
    match mode {
        ChromaSubsampling::Cs444 => SamplingFactor::R_4_4_4,
        ChromaSubsampling::Cs422 => SamplingFactor::R_4_2_2,
        ChromaSubsampling::Cs420 => SamplingFactor::R_4_2_0,
    }
}
