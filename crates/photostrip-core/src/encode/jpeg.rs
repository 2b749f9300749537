//! JPEG encoding for export.
//!
//! JPEG has no alpha channel, so transparent regions are flattened onto
//! white before encoding (the paper color a printed strip ends up on).

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};

use super::{validate, EncodeError};
use crate::decode::RasterImage;

/// Encode an RGBA raster to JPEG bytes.
///
/// # Quality Guidelines
///
/// * 90-100: High quality, suitable for printing
/// * 80-90: Good quality, recommended for sharing
/// * Below 60: Low quality, visible artifacts
pub fn encode_jpeg(image: &RasterImage, quality: u8) -> Result<Vec<u8>, EncodeError> {
    validate(image)?;

    let quality = quality.clamp(1, 100);
    let rgb = flatten_on_white(&image.pixels);

    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality)
        .write_image(&rgb, image.width, image.height, ExtendedColorType::Rgb8)
        .map_err(|e| EncodeError::EncodingFailed {
            format: "JPEG",
            reason: e.to_string(),
        })?;

    Ok(buffer)
}

/// Composite straight-alpha RGBA over opaque white, producing RGB.
fn flatten_on_white(rgba: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
    for px in rgba.chunks_exact(4) {
        let a = px[3] as u32;
        for &c in &px[..3] {
            let v = (c as u32 * a + 255 * (255 - a) + 127) / 255;
            rgb.push(v as u8);
        }
    }
    rgb
}
