//! Image decoding for the photostrip pipeline.
//!
//! This module provides functionality for:
//! - Decoding PNG, JPEG and GIF stills into RGBA rasters
//! - EXIF orientation correction for uploaded camera photos
//!
//! # Examples
//!
//! ```ignore
//! use photostrip_core::decode::decode_image;
//!
//! let bytes = std::fs::read("sticker.png").unwrap();
//! let image = decode_image(&bytes).unwrap();
//! println!("Decoded {}x{} image", image.width, image.height);
//! ```

mod decoder;
mod types;

pub use decoder::{decode_image, decode_image_no_orientation, get_orientation};
pub use types::{DecodeError, Orientation, RasterImage, CHANNELS};
