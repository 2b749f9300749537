//! Image encoding WASM bindings for single photos.
//!
//! Strip and loop exports go through [`crate::compose::JsComposer`]; these
//! cover per-photo downloads and ad hoc conversions.
//!
//! ```typescript
//! import { encode_png, encode_jpeg } from '@photostrip/wasm';
//!
//! const png = encode_png(photo);
//! const jpeg = encode_jpeg(photo, 92);
//! ```

use crate::types::{to_js, JsRasterImage};
use photostrip_core::encode;
use wasm_bindgen::prelude::*;

/// Encode an image as PNG (lossless, keeps alpha).
#[wasm_bindgen]
pub fn encode_png(image: &JsRasterImage) -> Result<Vec<u8>, JsValue> {
    encode::encode_png(image.raster()).map_err(to_js)
}

/// Encode an image as JPEG at `quality` (1-100). Alpha is flattened onto white.
#[wasm_bindgen]
pub fn encode_jpeg(image: &JsRasterImage, quality: u8) -> Result<Vec<u8>, JsValue> {
    encode::encode_jpeg(image.raster(), quality).map_err(to_js)
}
