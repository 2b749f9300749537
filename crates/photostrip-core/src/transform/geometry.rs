//! Pure geometry for cropping and layout.
//!
//! All rectangles are axis-aligned, `f64`, and expressed in the pixel space
//! of whatever image they refer to (source pixels for crop boxes, surface
//! pixels for layout slots). Origin is the top-left corner.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle: origin plus size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle covering a whole `width x height` image.
    pub fn from_size(width: u32, height: u32) -> Self {
        Self::new(0.0, 0.0, width as f64, height as f64)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }

    /// Whether `(px, py)` lies inside the rectangle (edges inclusive).
    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px <= self.right() && py >= self.y && py <= self.bottom()
    }

    /// Whether `other` lies entirely inside `self`, with a small tolerance
    /// for floating-point drift.
    pub fn contains_rect(&self, other: &Rect) -> bool {
        const EPS: f64 = 1e-9;
        other.x >= self.x - EPS
            && other.y >= self.y - EPS
            && other.right() <= self.right() + EPS
            && other.bottom() <= self.bottom() + EPS
    }
}

/// One of the four crop-box corner handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Handle {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Handle {
    pub const ALL: [Handle; 4] = [
        Handle::TopLeft,
        Handle::TopRight,
        Handle::BottomLeft,
        Handle::BottomRight,
    ];

    /// Position of this handle on `rect`.
    pub fn position(self, rect: &Rect) -> (f64, f64) {
        match self {
            Handle::TopLeft => (rect.x, rect.y),
            Handle::TopRight => (rect.right(), rect.y),
            Handle::BottomLeft => (rect.x, rect.bottom()),
            Handle::BottomRight => (rect.right(), rect.bottom()),
        }
    }

    fn is_left(self) -> bool {
        matches!(self, Handle::TopLeft | Handle::BottomLeft)
    }

    fn is_top(self) -> bool {
        matches!(self, Handle::TopLeft | Handle::TopRight)
    }
}

/// Largest centered region of a `source_w x source_h` image whose aspect
/// ratio equals `target_ratio`.
///
/// Wider sources lose columns symmetrically, taller sources lose rows
/// symmetrically and matching sources come back whole. Non-positive inputs
/// yield the full source rectangle.
pub fn center_crop_rect(source_w: f64, source_h: f64, target_ratio: f64) -> Rect {
    let full = Rect::new(0.0, 0.0, source_w.max(0.0), source_h.max(0.0));
    if source_w <= 0.0 || source_h <= 0.0 || target_ratio <= 0.0 || !target_ratio.is_finite() {
        return full;
    }

    let source_ratio = source_w / source_h;
    if source_ratio > target_ratio {
        let sw = source_h * target_ratio;
        Rect::new((source_w - sw) / 2.0, 0.0, sw, source_h)
    } else if source_ratio < target_ratio {
        let sh = source_w / target_ratio;
        Rect::new(0.0, (source_h - sh) / 2.0, source_w, sh)
    } else {
        full
    }
}

/// Apply a drag delta to one corner handle of `rect`.
///
/// The opposite corner stays anchored. Each dimension is clamped to
/// `min_size`; with `locked_ratio` the height is re-derived from the width
/// (`height = width / ratio`) after the free update, and the width minimum
/// is raised so the derived height also honours `min_size`.
pub fn constrain_box(
    rect: Rect,
    dx: f64,
    dy: f64,
    handle: Handle,
    min_size: f64,
    locked_ratio: Option<f64>,
) -> Rect {
    let right = rect.right();
    let bottom = rect.bottom();

    let mut width = if handle.is_left() {
        rect.width - dx
    } else {
        rect.width + dx
    };
    let mut height = if handle.is_top() {
        rect.height - dy
    } else {
        rect.height + dy
    };

    match locked_ratio.filter(|r| *r > 0.0 && r.is_finite()) {
        Some(ratio) => {
            width = width.max(min_size).max(min_size * ratio);
            height = width / ratio;
        }
        None => {
            width = width.max(min_size);
            height = height.max(min_size);
        }
    }

    let x = if handle.is_left() { right - width } else { rect.x };
    let y = if handle.is_top() { bottom - height } else { rect.y };

    Rect::new(x, y, width, height)
}

/// Move `rect` by `(dx, dy)`, clamped so it stays fully inside `bounds`.
///
/// A rectangle larger than `bounds` on some axis is pinned to the bounds'
/// origin on that axis.
pub fn translate_box(rect: Rect, dx: f64, dy: f64, bounds: &Rect) -> Rect {
    let max_x = (bounds.right() - rect.width).max(bounds.x);
    let max_y = (bounds.bottom() - rect.height).max(bounds.y);
    Rect::new(
        (rect.x + dx).clamp(bounds.x, max_x),
        (rect.y + dy).clamp(bounds.y, max_y),
        rect.width,
        rect.height,
    )
}

/// Aspect-preserving fit of a `src_w x src_h` image inside a
/// `dst_w x dst_h` area, centered with letterbox bars on the slack axis.
pub fn contain_rect(src_w: f64, src_h: f64, dst_w: f64, dst_h: f64) -> Rect {
    if src_w <= 0.0 || src_h <= 0.0 || dst_w <= 0.0 || dst_h <= 0.0 {
        return Rect::new(0.0, 0.0, dst_w.max(0.0), dst_h.max(0.0));
    }

    let scale = (dst_w / src_w).min(dst_h / src_h);
    let width = src_w * scale;
    let height = src_h * scale;
    Rect::new((dst_w - width) / 2.0, (dst_h - height) / 2.0, width, height)
}
