//! Pixel sampling for inverse-mapped rendering.
//!
//! Rendering walks destination pixels, maps each pixel center back into the
//! source through the inverse transform, and samples there:
//! ```text
//! src = inverse(transform) * (dst_x + 0.5, dst_y + 0.5)
//! ```
//! Sample coordinates use the pixel-center convention: pixel `(i, j)` has
//! its center at `(i + 0.5, j + 0.5)`. An untransformed render therefore
//! samples exactly at centers and reproduces the source bit-for-bit.

use crate::decode::{RasterImage, CHANNELS};

/// Integer pixel window that sampling is confined to (inclusive-exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleWindow {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl SampleWindow {
    pub fn full(image: &RasterImage) -> Self {
        Self {
            x0: 0,
            y0: 0,
            x1: image.width,
            y1: image.height,
        }
    }

    fn is_empty(&self) -> bool {
        self.x1 <= self.x0 || self.y1 <= self.y0
    }
}

#[inline]
fn get_pixel_f32(image: &RasterImage, px: u32, py: u32) -> [f32; 4] {
    let idx = (py as usize * image.width as usize + px as usize) * CHANNELS;
    [
        image.pixels[idx] as f32,
        image.pixels[idx + 1] as f32,
        image.pixels[idx + 2] as f32,
        image.pixels[idx + 3] as f32,
    ]
}

/// Sample `image` at continuous coordinates `(x, y)` with bilinear
/// interpolation, clamping neighbours to `window`.
///
/// Returns `None` when the point lies outside the window's pixel area, so
/// callers leave those destination pixels untouched.
pub fn sample_bilinear(image: &RasterImage, window: SampleWindow, x: f64, y: f64) -> Option<[u8; 4]> {
    if window.is_empty()
        || x < window.x0 as f64
        || y < window.y0 as f64
        || x >= window.x1 as f64
        || y >= window.y1 as f64
    {
        return None;
    }

    // Shift into center space: pixel i spans [i, i+1) and has its center at i + 0.5
    let cx = x - 0.5;
    let cy = y - 0.5;

    let fx0 = cx.floor();
    let fy0 = cy.floor();
    let fx = (cx - fx0) as f32;
    let fy = (cy - fy0) as f32;

    let clamp_x = |v: f64| (v.max(window.x0 as f64) as u32).min(window.x1 - 1);
    let clamp_y = |v: f64| (v.max(window.y0 as f64) as u32).min(window.y1 - 1);

    let x0 = clamp_x(fx0);
    let x1 = clamp_x(fx0 + 1.0);
    let y0 = clamp_y(fy0);
    let y1 = clamp_y(fy0 + 1.0);

    // Exact hit on a pixel center: no blending, no rounding drift
    if fx == 0.0 && fy == 0.0 {
        let idx = (y0 as usize * image.width as usize + x0 as usize) * CHANNELS;
        return Some([
            image.pixels[idx],
            image.pixels[idx + 1],
            image.pixels[idx + 2],
            image.pixels[idx + 3],
        ]);
    }

    let p00 = get_pixel_f32(image, x0, y0);
    let p10 = get_pixel_f32(image, x1, y0);
    let p01 = get_pixel_f32(image, x0, y1);
    let p11 = get_pixel_f32(image, x1, y1);

    let mut result = [0u8; 4];
    for i in 0..CHANNELS {
        let v = p00[i] * (1.0 - fx) * (1.0 - fy)
            + p10[i] * fx * (1.0 - fy)
            + p01[i] * (1.0 - fx) * fy
            + p11[i] * fx * fy;
        result[i] = v.clamp(0.0, 255.0).round() as u8;
    }
    Some(result)
}
