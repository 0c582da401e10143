//! Image recompression module
//!
//! - Orientation handling (EXIF read + rotation/flip application)
//! - Profile-driven recompression (decode, normalize, downscale, encode)

pub mod orientation;
pub mod recompressor;

pub use orientation::ImageOrientation;
pub use recompressor::{ImageRecompressor, RecompressedImage};
