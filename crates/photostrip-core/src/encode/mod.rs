//! Image encoding for exported artifacts and persisted session records.
//!
//! This module provides functionality for:
//! - Encoding rasters to PNG (lossless, used for strips and stored photos)
//! - Encoding rasters to JPEG with configurable quality
//! - Encoding a frame sequence into an infinitely looping animated GIF
//!
//! # Examples
//!
//! ```ignore
//! use photostrip_core::encode::encode_png;
//!
//! let png_bytes = encode_png(&strip).unwrap();
//! println!("Encoded {} bytes", png_bytes.len());
//! ```

mod gif;
mod jpeg;
mod png;

pub use gif::encode_gif;
pub use jpeg::encode_jpeg;
pub use png::encode_png;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decode::{RasterImage, CHANNELS};

/// Errors that can occur during encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 4), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// An animation needs at least one frame
    #[error("Cannot encode an animation without frames")]
    NoFrames,

    /// All frames of an animation must share the first frame's size
    #[error("Frame {index} is {width}x{height}, expected {expected_width}x{expected_height}")]
    FrameSizeMismatch {
        index: usize,
        width: u32,
        height: u32,
        expected_width: u32,
        expected_height: u32,
    },

    /// The underlying codec failed
    #[error("{format} encoding failed: {reason}")]
    EncodingFailed {
        format: &'static str,
        reason: String,
    },
}

/// Still-image output format for exported strips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StillFormat {
    /// Lossless PNG.
    #[default]
    Png,
    /// JPEG at the given quality (1-100).
    Jpeg(u8),
}

impl StillFormat {
    /// MIME type for download/share hand-off.
    pub fn mime_type(self) -> &'static str {
        match self {
            StillFormat::Png => "image/png",
            StillFormat::Jpeg(_) => "image/jpeg",
        }
    }

    /// Encode an image in this format.
    pub fn encode(self, image: &RasterImage) -> Result<Vec<u8>, EncodeError> {
        match self {
            StillFormat::Png => encode_png(image),
            StillFormat::Jpeg(quality) => encode_jpeg(image, quality),
        }
    }
}

/// Validate that a raster's buffer matches its declared dimensions.
fn validate(image: &RasterImage) -> Result<(), EncodeError> {
    if image.width == 0 || image.height == 0 {
        return Err(EncodeError::InvalidDimensions {
            width: image.width,
            height: image.height,
        });
    }

    let expected = image.width as usize * image.height as usize * CHANNELS;
    if image.pixels.len() != expected {
        return Err(EncodeError::InvalidPixelData {
            expected,
            actual: image.pixels.len(),
        });
    }
    Ok(())
}
