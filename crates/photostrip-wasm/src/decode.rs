//! Image decoding WASM bindings.
//!
//! - [`decode_image`] - Decode PNG/JPEG/GIF bytes with EXIF orientation applied
//! - [`get_orientation`] - Read the EXIF orientation tag
//!
//! # Example
//!
//! ```typescript
//! import { decode_image, get_orientation } from '@photostrip/wasm';
//!
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! const image = decode_image(bytes);
//! console.log(image.width, image.height, get_orientation(bytes));
//! ```

use crate::types::{to_js, JsRasterImage};
use photostrip_core::decode;
use wasm_bindgen::prelude::*;

/// Decode an image file (uploads, stored photos, template and sticker
/// assets) into RGBA, applying EXIF orientation.
#[wasm_bindgen]
pub fn decode_image(bytes: &[u8]) -> Result<JsRasterImage, JsValue> {
    decode::decode_image(bytes)
        .map(JsRasterImage::from_raster)
        .map_err(to_js)
}

/// EXIF orientation tag value (1-8); 1 when absent.
#[wasm_bindgen]
pub fn get_orientation(bytes: &[u8]) -> u8 {
    decode::get_orientation(bytes) as u8
}


/// Tests for functions returning `Result<T, JsValue>`; wasm32 only.
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use photostrip_core::decode::RasterImage;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_decode_invalid() {
        assert!(decode_image(&[0, 1, 2, 3]).is_err());
        assert!(decode_image(&[]).is_err());
    }

    #[wasm_bindgen_test]
    fn test_decode_png() {
        let png = photostrip_core::encode::encode_png(&RasterImage::filled(4, 3, [1, 2, 3, 255])).unwrap();
        let image = decode_image(&png).unwrap();
        assert_eq!((image.width(), image.height()), (4, 3));
    }
}
