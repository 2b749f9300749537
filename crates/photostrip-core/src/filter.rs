//! Per-photo color filters baked into the composed strip.
//!
//! Each filter is a deterministic pixel transform over the RGB channels
//! (alpha untouched), matching the CSS filter functions of the same name:
//!
//! | Filter | CSS equivalent |
//! |---|---|
//! | `Grayscale` | `grayscale(1)` |
//! | `Sepia` | `sepia(1)` |
//! | `Contrast` | `contrast(1.5)` |
//! | `Brightness` | `brightness(1.2)` |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::decode::{RasterImage, CHANNELS};

/// Contrast factor of [`PhotoFilter::Contrast`].
pub const CONTRAST_FACTOR: f32 = 1.5;
/// Brightness factor of [`PhotoFilter::Brightness`].
pub const BRIGHTNESS_FACTOR: f32 = 1.2;

/// Filter applied to every photo in the strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhotoFilter {
    #[default]
    None,
    Grayscale,
    Sepia,
    Contrast,
    Brightness,
}

impl PhotoFilter {
    pub const ALL: [PhotoFilter; 5] = [
        PhotoFilter::None,
        PhotoFilter::Grayscale,
        PhotoFilter::Sepia,
        PhotoFilter::Contrast,
        PhotoFilter::Brightness,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PhotoFilter::None => "none",
            PhotoFilter::Grayscale => "grayscale",
            PhotoFilter::Sepia => "sepia",
            PhotoFilter::Contrast => "contrast",
            PhotoFilter::Brightness => "brightness",
        }
    }

    pub fn is_identity(self) -> bool {
        self == PhotoFilter::None
    }
}

impl fmt::Display for PhotoFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PhotoFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PhotoFilter::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown filter '{s}'"))
    }
}

/// Apply `filter` to RGBA pixel data in place.
pub fn apply_filter(pixels: &mut [u8], filter: PhotoFilter) {
    if filter.is_identity() {
        return;
    }

    for chunk in pixels.chunks_exact_mut(CHANNELS) {
        let r = chunk[0] as f32 / 255.0;
        let g = chunk[1] as f32 / 255.0;
        let b = chunk[2] as f32 / 255.0;

        let (r, g, b) = match filter {
            PhotoFilter::None => (r, g, b),
            PhotoFilter::Grayscale => apply_grayscale(r, g, b),
            PhotoFilter::Sepia => apply_sepia(r, g, b),
            PhotoFilter::Contrast => apply_contrast(r, g, b, CONTRAST_FACTOR),
            PhotoFilter::Brightness => apply_brightness(r, g, b, BRIGHTNESS_FACTOR),
        };

        chunk[0] = to_byte(r);
        chunk[1] = to_byte(g);
        chunk[2] = to_byte(b);
    }
}

/// Return a filtered copy of `image`.
pub fn filtered(image: &RasterImage, filter: PhotoFilter) -> RasterImage {
    let mut out = image.clone();
    apply_filter(&mut out.pixels, filter);
    out
}

#[inline]
fn to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Rec. 709 luma replicated into every channel.
#[inline]
fn apply_grayscale(r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    let y = 0.2126 * r + 0.7152 * g + 0.0722 * b;
    (y, y, y)
}

#[inline]
fn apply_sepia(r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    (
        0.393 * r + 0.769 * g + 0.189 * b,
        0.349 * r + 0.686 * g + 0.168 * b,
        0.272 * r + 0.534 * g + 0.131 * b,
    )
}

/// Formula: `output = (input - 0.5) * factor + 0.5`
#[inline]
fn apply_contrast(r: f32, g: f32, b: f32, factor: f32) -> (f32, f32, f32) {
    (
        (r - 0.5) * factor + 0.5,
        (g - 0.5) * factor + 0.5,
        (b - 0.5) * factor + 0.5,
    )
}

#[inline]
fn apply_brightness(r: f32, g: f32, b: f32, factor: f32) -> (f32, f32, f32) {
    (r * factor, g * factor, b * factor)
}
