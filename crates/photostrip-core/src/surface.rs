//! In-memory raster surface used for every render in the pipeline.
//!
//! The surface is a straight-alpha RGBA buffer with a small retained-mode
//! API: `fill`, `draw_image(src, src_rect, dst_rect, transform)`,
//! `clip_rounded_rect` and `encode`. All drawing honours the current clip,
//! which carries antialiased coverage so rounded corners come out smooth.
//!
//! Rendering is deterministic: the same calls on the same inputs always
//! produce identical bytes.

use kurbo::{Affine, Point};

use crate::color::Color;
use crate::decode::{RasterImage, CHANNELS};
use crate::encode::{EncodeError, StillFormat};
use crate::transform::{sample_bilinear, Rect, SampleWindow};

/// Rectangle with uniformly rounded corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundedRect {
    pub rect: Rect,
    pub radius: f64,
}

impl RoundedRect {
    pub fn new(rect: Rect, radius: f64) -> Self {
        let max_radius = (rect.width.min(rect.height) / 2.0).max(0.0);
        Self {
            rect,
            radius: radius.clamp(0.0, max_radius),
        }
    }

    /// Fraction of the pixel centered at `(cx, cy)` covered by the shape.
    ///
    /// Uses the signed distance to the rounded rectangle, so straight edges
    /// on integer boundaries give exact 0/1 coverage.
    pub fn coverage(&self, cx: f64, cy: f64) -> f32 {
        let (mx, my) = self.rect.center();
        let half_w = self.rect.width / 2.0;
        let half_h = self.rect.height / 2.0;
        let r = self.radius;

        let qx = (cx - mx).abs() - (half_w - r);
        let qy = (cy - my).abs() - (half_h - r);
        let outside = (qx.max(0.0).powi(2) + qy.max(0.0).powi(2)).sqrt();
        let inside = qx.max(qy).min(0.0);
        let distance = outside + inside - r;

        (0.5 - distance).clamp(0.0, 1.0) as f32
    }
}

/// Mutable RGBA drawing surface.
#[derive(Debug, Clone)]
pub struct RasterSurface {
    image: RasterImage,
    clip: Option<RoundedRect>,
}

impl RasterSurface {
    /// Create a fully transparent surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RasterImage::filled(width, height, [0, 0, 0, 0]),
            clip: None,
        }
    }

    /// Wrap an existing raster as a drawable surface.
    pub fn from_image(image: RasterImage) -> Self {
        Self { image, clip: None }
    }

    pub fn width(&self) -> u32 {
        self.image.width
    }

    pub fn height(&self) -> u32 {
        self.image.height
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_size(self.image.width, self.image.height)
    }

    pub fn image(&self) -> &RasterImage {
        &self.image
    }

    pub fn into_image(self) -> RasterImage {
        self.image
    }

    /// Restrict subsequent drawing to a rounded rectangle.
    pub fn clip_rounded_rect(&mut self, rect: Rect, radius: f64) {
        self.clip = Some(RoundedRect::new(rect, radius));
    }

    pub fn reset_clip(&mut self) {
        self.clip = None;
    }

    #[inline]
    fn clip_coverage(&self, x: u32, y: u32) -> f32 {
        match &self.clip {
            Some(clip) => clip.coverage(x as f64 + 0.5, y as f64 + 0.5),
            None => 1.0,
        }
    }

    /// Pixel range `[x0, x1) x [y0, y1)` touched by `rect`, clamped to the surface.
    fn pixel_span(&self, rect: &Rect) -> Option<(u32, u32, u32, u32)> {
        let x0 = rect.x.floor().max(0.0) as u32;
        let y0 = rect.y.floor().max(0.0) as u32;
        let x1 = (rect.right().ceil().max(0.0) as u32).min(self.image.width);
        let y1 = (rect.bottom().ceil().max(0.0) as u32).min(self.image.height);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some((x0, y0, x1, y1))
    }

    #[inline]
    fn blend(&mut self, x: u32, y: u32, src: [u8; 4], coverage: f32) {
        if coverage <= 0.0 || src[3] == 0 {
            return;
        }
        let idx = (y as usize * self.image.width as usize + x as usize) * CHANNELS;
        let dst = [
            self.image.pixels[idx],
            self.image.pixels[idx + 1],
            self.image.pixels[idx + 2],
            self.image.pixels[idx + 3],
        ];
        let out = over(dst, src, coverage);
        self.image.pixels[idx..idx + CHANNELS].copy_from_slice(&out);
    }

    /// Paint `color` over the whole surface (within the clip).
    pub fn fill(&mut self, color: Color) {
        let bounds = self.bounds();
        self.fill_rect(&bounds, color);
    }

    /// Paint `color` over `rect` (within the clip).
    pub fn fill_rect(&mut self, rect: &Rect, color: Color) {
        let Some((x0, y0, x1, y1)) = self.pixel_span(rect) else {
            return;
        };
        let area = RoundedRect::new(*rect, 0.0);
        for y in y0..y1 {
            for x in x0..x1 {
                let coverage = area.coverage(x as f64 + 0.5, y as f64 + 0.5)
                    * self.clip_coverage(x, y);
                self.blend(x, y, color.0, coverage);
            }
        }
    }

    /// Draw the `src_rect` region of `src` into `dst_rect`, then apply
    /// `transform` (in surface space) to the placed image.
    ///
    /// Each covered destination pixel is inverse-mapped into the source and
    /// sampled bilinearly; samples never read outside `src_rect`.
    pub fn draw_image(&mut self, src: &RasterImage, src_rect: Rect, dst_rect: Rect, transform: Affine) {
        if src.is_empty() || src_rect.width <= 0.0 || src_rect.height <= 0.0 {
            return;
        }
        if dst_rect.width <= 0.0 || dst_rect.height <= 0.0 {
            return;
        }

        let placement = Affine::translate((dst_rect.x, dst_rect.y))
            * Affine::scale_non_uniform(
                dst_rect.width / src_rect.width,
                dst_rect.height / src_rect.height,
            )
            * Affine::translate((-src_rect.x, -src_rect.y));
        let forward = crate::transform::snap(transform * placement);
        if forward.determinant().abs() < 1e-12 {
            return;
        }
        let inverse = forward.inverse();

        let window = SampleWindow {
            x0: src_rect.x.floor().max(0.0) as u32,
            y0: src_rect.y.floor().max(0.0) as u32,
            x1: (src_rect.right().ceil().max(0.0) as u32).min(src.width),
            y1: (src_rect.bottom().ceil().max(0.0) as u32).min(src.height),
        };

        // Destination bounding box of the transformed placement
        let corners = [
            Point::new(src_rect.x, src_rect.y),
            Point::new(src_rect.right(), src_rect.y),
            Point::new(src_rect.x, src_rect.bottom()),
            Point::new(src_rect.right(), src_rect.bottom()),
        ]
        .map(|p| forward * p);
        let min_x = corners.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let min_y = corners.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let max_x = corners.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
        let max_y = corners.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
        let footprint = Rect::new(min_x, min_y, max_x - min_x, max_y - min_y);

        let Some((x0, y0, x1, y1)) = self.pixel_span(&footprint) else {
            return;
        };

        for y in y0..y1 {
            for x in x0..x1 {
                let coverage = self.clip_coverage(x, y);
                if coverage <= 0.0 {
                    continue;
                }
                let p = inverse * Point::new(x as f64 + 0.5, y as f64 + 0.5);
                if !src_rect.contains(p.x, p.y) {
                    continue;
                }
                if let Some(sample) = sample_bilinear(src, window, p.x, p.y) {
                    self.blend(x, y, sample, coverage);
                }
            }
        }
    }

    /// Darken everything outside `rect` by blending black at `alpha`.
    pub fn dim_outside(&mut self, rect: &Rect, alpha: u8) {
        let veil = [0, 0, 0, alpha];
        let keep = RoundedRect::new(*rect, 0.0);
        for y in 0..self.image.height {
            for x in 0..self.image.width {
                let outside = 1.0 - keep.coverage(x as f64 + 0.5, y as f64 + 0.5);
                self.blend(x, y, veil, outside);
            }
        }
    }

    /// Outline `rect` with a border of `thickness` pixels drawn inward.
    pub fn stroke_rect(&mut self, rect: &Rect, thickness: f64, color: Color) {
        let t = thickness.min(rect.width / 2.0).min(rect.height / 2.0).max(0.0);
        let edges = [
            Rect::new(rect.x, rect.y, rect.width, t),
            Rect::new(rect.x, rect.bottom() - t, rect.width, t),
            Rect::new(rect.x, rect.y + t, t, rect.height - 2.0 * t),
            Rect::new(rect.right() - t, rect.y + t, t, rect.height - 2.0 * t),
        ];
        for edge in &edges {
            self.fill_rect(edge, color);
        }
    }

    /// Encode the current contents.
    pub fn encode(&self, format: StillFormat) -> Result<Vec<u8>, EncodeError> {
        format.encode(&self.image)
    }
}

/// Straight-alpha source-over compositing with an extra coverage factor.
#[inline]
fn over(dst: [u8; 4], src: [u8; 4], coverage: f32) -> [u8; 4] {
    let sa = src[3] as f32 / 255.0 * coverage.clamp(0.0, 1.0);
    if sa <= 0.0 {
        return dst;
    }
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return [0, 0, 0, 0];
    }

    let mut out = [0u8; 4];
    for i in 0..3 {
        let c = (src[i] as f32 * sa + dst[i] as f32 * da * (1.0 - sa)) / out_a;
        out[i] = c.clamp(0.0, 255.0).round() as u8;
    }
    out[3] = (out_a * 255.0).clamp(0.0, 255.0).round() as u8;
    out
}
