//! Interactive crop/transform editor for a single photo.
//!
//! The editor owns one [`CropState`] while it is open. Pointer input arrives
//! in on-screen coordinates and is converted to source-pixel space before
//! any hit-testing, so handle behaviour is identical on every pixel density.
//!
//! Preview and commit render through the same [`compose_transform`] onto a
//! canvas the size of the source image; the crop box is interpreted in that
//! canvas. With zoom 1 and no rotation the commit is an exact pixel copy of
//! the box, which makes re-committing an untouched edit a no-op.

use kurbo::Point;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::color::Color;
use crate::config::EditorConfig;
use crate::decode::{RasterImage, CHANNELS};
use crate::session::Photo;
use crate::surface::RasterSurface;
use crate::transform::{compose_transform, constrain_box, snap, translate_box, Handle, Rect};

const DIM_ALPHA: u8 = 128;
const BORDER_WIDTH: f64 = 2.0;
const HANDLE_SIZE: f64 = 12.0;

/// Editor request errors. The state is left untouched on error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditorError {
    #[error("Only quarter turns are supported, got {0}°")]
    UnsupportedRotation(i32),

    #[error("Aspect ratio must be a positive number, got {0}")]
    InvalidAspectRatio(f64),

    #[error("Display size must be positive, got {width}x{height}")]
    InvalidDisplaySize { width: f64, height: f64 },

    #[error("Crop box {0:?} must lie inside the image and respect the minimum size")]
    InvalidCropBox(Rect),
}

/// Fixed aspect ratios offered by the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AspectPreset {
    #[default]
    Free,
    Square,
    FourThree,
    ThreeFour,
    SixteenNine,
}

impl AspectPreset {
    pub fn ratio(self) -> Option<f64> {
        match self {
            AspectPreset::Free => None,
            AspectPreset::Square => Some(1.0),
            AspectPreset::FourThree => Some(4.0 / 3.0),
            AspectPreset::ThreeFour => Some(3.0 / 4.0),
            AspectPreset::SixteenNine => Some(16.0 / 9.0),
        }
    }
}

/// Geometry of one edit session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropState {
    /// Crop box in source-pixel space
    pub crop_box: Rect,
    pub zoom: f64,
    /// Multiple of 90 in `[0, 360)`
    pub rotation_degrees: u16,
    pub aspect_ratio: Option<f64>,
}

impl CropState {
    /// Whether the current zoom/rotation leaves pixels where they are.
    pub fn is_untransformed(&self) -> bool {
        self.rotation_degrees == 0 && self.zoom == 1.0
    }
}

/// What the current pointer gesture is doing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragMode {
    None,
    Dragging { last: (f64, f64) },
    Resizing { handle: Handle, last: (f64, f64) },
}

/// Crop/rotate/zoom editor bound to one photo.
#[derive(Debug, Clone)]
pub struct CropEditor {
    photo: Photo,
    config: EditorConfig,
    state: CropState,
    display_size: Option<(f64, f64)>,
    mode: DragMode,
}

impl CropEditor {
    /// Open the editor with the box covering the whole photo.
    pub fn open(photo: Photo, config: &EditorConfig) -> Self {
        let state = CropState {
            crop_box: Rect::from_size(photo.image.width, photo.image.height),
            zoom: 1.0,
            rotation_degrees: 0,
            aspect_ratio: None,
        };
        log::debug!("Crop editor opened on photo {}", photo.ordinal);
        Self {
            photo,
            config: config.clone(),
            state,
            display_size: None,
            mode: DragMode::None,
        }
    }

    pub fn state(&self) -> &CropState {
        &self.state
    }

    pub fn mode(&self) -> DragMode {
        self.mode
    }

    pub fn photo(&self) -> &Photo {
        &self.photo
    }

    fn bounds(&self) -> Rect {
        Rect::from_size(self.photo.image.width, self.photo.image.height)
    }

    /// Record the on-screen size the preview is displayed at.
    pub fn set_display_size(&mut self, width: f64, height: f64) -> Result<(), EditorError> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(EditorError::InvalidDisplaySize { width, height });
        }
        self.display_size = Some((width, height));
        Ok(())
    }

    /// Convert an on-screen pointer position to source pixels.
    pub fn to_source(&self, pointer_x: f64, pointer_y: f64) -> (f64, f64) {
        match self.display_size {
            Some((dw, dh)) => (
                pointer_x * self.photo.image.width as f64 / dw,
                pointer_y * self.photo.image.height as f64 / dh,
            ),
            None => (pointer_x, pointer_y),
        }
    }

    /// Replace the crop box directly (keyboard entry, restored state).
    pub fn set_crop_box(&mut self, rect: Rect) -> Result<(), EditorError> {
        let min = self.config.min_box_size.min(self.bounds().width).min(self.bounds().height);
        if rect.width < min || rect.height < min || !self.bounds().contains_rect(&rect) {
            return Err(EditorError::InvalidCropBox(rect));
        }
        self.state.crop_box = rect;
        if let Some(ratio) = self.state.aspect_ratio {
            self.state.crop_box = self.fit_ratio(rect, ratio);
        }
        Ok(())
    }

    /// Hit-test the pointer against the handles, then the box interior.
    pub fn begin_drag(&mut self, pointer_x: f64, pointer_y: f64) -> DragMode {
        let (x, y) = self.to_source(pointer_x, pointer_y);
        let tolerance = self.config.handle_tolerance;
        let crop_box = self.state.crop_box;

        let nearest = Handle::ALL
            .into_iter()
            .map(|handle| {
                let (hx, hy) = handle.position(&crop_box);
                (handle, (hx - x).abs().max((hy - y).abs()))
            })
            .filter(|(_, distance)| *distance <= tolerance)
            .min_by(|a, b| a.1.total_cmp(&b.1));

        self.mode = match nearest {
            Some((handle, _)) => DragMode::Resizing {
                handle,
                last: (x, y),
            },
            None if crop_box.contains(x, y) => DragMode::Dragging { last: (x, y) },
            None => DragMode::None,
        };
        self.mode
    }

    /// Continue the current gesture.
    ///
    /// Translation is clamped to the image. A resize that would leave the
    /// image is ignored, keeping the previous box.
    pub fn on_drag(&mut self, pointer_x: f64, pointer_y: f64) {
        let (x, y) = self.to_source(pointer_x, pointer_y);
        match self.mode {
            DragMode::None => {}
            DragMode::Dragging { last } => {
                let bounds = self.bounds();
                self.state.crop_box =
                    translate_box(self.state.crop_box, x - last.0, y - last.1, &bounds);
                self.mode = DragMode::Dragging { last: (x, y) };
            }
            DragMode::Resizing { handle, last } => {
                let candidate = constrain_box(
                    self.state.crop_box,
                    x - last.0,
                    y - last.1,
                    handle,
                    self.config.min_box_size,
                    self.state.aspect_ratio,
                );
                if self.bounds().contains_rect(&candidate) {
                    self.state.crop_box = candidate;
                    self.mode = DragMode::Resizing {
                        handle,
                        last: (x, y),
                    };
                }
            }
        }
    }

    pub fn end_drag(&mut self) {
        self.mode = DragMode::None;
    }

    /// Rotate by a quarter turn; returns the new rotation.
    pub fn rotate(&mut self, delta_degrees: i32) -> Result<u16, EditorError> {
        if delta_degrees != 90 && delta_degrees != -90 {
            return Err(EditorError::UnsupportedRotation(delta_degrees));
        }
        let next = (self.state.rotation_degrees as i32 + delta_degrees).rem_euclid(360);
        self.state.rotation_degrees = next as u16;
        Ok(self.state.rotation_degrees)
    }

    pub fn rotate_left(&mut self) -> u16 {
        self.state.rotation_degrees = (self.state.rotation_degrees + 270) % 360;
        self.state.rotation_degrees
    }

    pub fn rotate_right(&mut self) -> u16 {
        self.state.rotation_degrees = (self.state.rotation_degrees + 90) % 360;
        self.state.rotation_degrees
    }

    /// Set the zoom, clamped to the configured range; returns the applied value.
    pub fn set_zoom(&mut self, zoom: f64) -> f64 {
        if zoom.is_finite() {
            self.state.zoom = zoom.clamp(self.config.min_zoom, self.config.max_zoom);
        }
        self.state.zoom
    }

    /// Lock (or unlock with `None`) the box aspect ratio.
    ///
    /// The height is recomputed from the width. The box only shrinks when
    /// the derived height cannot fit inside the image.
    pub fn set_aspect_ratio(&mut self, ratio: Option<f64>) -> Result<(), EditorError> {
        if let Some(r) = ratio {
            if !(r.is_finite() && r > 0.0) {
                return Err(EditorError::InvalidAspectRatio(r));
            }
        }
        self.apply_ratio(ratio);
        Ok(())
    }

    pub fn set_preset(&mut self, preset: AspectPreset) {
        self.apply_ratio(preset.ratio());
    }

    /// `ratio` must be finite and positive.
    fn apply_ratio(&mut self, ratio: Option<f64>) {
        if let Some(r) = ratio {
            self.state.crop_box = self.fit_ratio(self.state.crop_box, r);
        }
        self.state.aspect_ratio = ratio;
    }

    fn fit_ratio(&self, rect: Rect, ratio: f64) -> Rect {
        let bounds = self.bounds();
        let min = self.config.min_box_size;

        let mut width = rect.width.max(min).max(min * ratio).min(bounds.width);
        let mut height = width / ratio;
        if height > bounds.height {
            width = bounds.height * ratio;
            height = width / ratio;
        }

        let x = rect.x.min(bounds.right() - width).max(bounds.x);
        let y = rect.y.min(bounds.bottom() - height).max(bounds.y);
        Rect::new(x, y, width, height)
    }

    /// Source image rendered through the current zoom/rotation onto a
    /// canvas of the source's size.
    fn render_canvas(&self) -> RasterImage {
        let source = &self.photo.image;
        if self.state.is_untransformed() {
            return source.as_ref().clone();
        }

        let bounds = self.bounds();
        let (cx, cy) = bounds.center();
        let transform = snap(compose_transform(
            Point::new(cx, cy),
            self.state.rotation_degrees as f64,
            self.state.zoom,
        ));

        let mut surface = RasterSurface::new(source.width, source.height);
        surface.draw_image(source, bounds, bounds, transform);
        surface.into_image()
    }

    /// Live preview: transformed image, everything outside the box dimmed,
    /// box border and four corner handles.
    pub fn render_preview(&self) -> RasterImage {
        let mut surface = RasterSurface::from_image(self.render_canvas());
        let crop_box = self.state.crop_box;

        surface.dim_outside(&crop_box, DIM_ALPHA);
        surface.stroke_rect(&crop_box, BORDER_WIDTH, Color::WHITE);
        for handle in Handle::ALL {
            let (hx, hy) = handle.position(&crop_box);
            let half = HANDLE_SIZE / 2.0;
            surface.fill_rect(&Rect::new(hx - half, hy - half, HANDLE_SIZE, HANDLE_SIZE), Color::WHITE);
        }
        surface.into_image()
    }

    /// Render the crop and close the editor, producing the replacement photo.
    pub fn commit(self) -> Photo {
        let canvas = self.render_canvas();
        let cropped = crop_pixels(&canvas, &self.state.crop_box);
        log::debug!(
            "Committed crop of photo {}: {}x{}",
            self.photo.ordinal,
            cropped.width,
            cropped.height
        );
        Photo::new(self.photo.ordinal, cropped)
    }

    /// Close the editor without touching the photo.
    pub fn cancel(self) -> Photo {
        self.photo
    }
}

/// Copy the pixels under `rect` (snapped to whole pixels).
fn crop_pixels(image: &RasterImage, rect: &Rect) -> RasterImage {
    let x0 = (rect.x.round().max(0.0) as u32).min(image.width.saturating_sub(1));
    let y0 = (rect.y.round().max(0.0) as u32).min(image.height.saturating_sub(1));
    let width = (rect.width.round().max(1.0) as u32).min(image.width - x0);
    let height = (rect.height.round().max(1.0) as u32).min(image.height - y0);

    let mut pixels = Vec::with_capacity(width as usize * height as usize * CHANNELS);
    for y in y0..y0 + height {
        let start = (y as usize * image.width as usize + x0 as usize) * CHANNELS;
        let end = start + width as usize * CHANNELS;
        pixels.extend_from_slice(&image.pixels[start..end]);
    }
    RasterImage::new(width, height, pixels)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn ratio() -> impl Strategy<Value = f64> {
        prop_oneof![
            Just(1.0),
            Just(4.0 / 3.0),
            Just(3.0 / 4.0),
            Just(16.0 / 9.0),
        ]
    }

    proptest! {
        #[test]
        fn prop_locked_drags_keep_ratio_min_and_bounds(
            r in ratio(),
            handle_idx in 0usize..4,
            steps in proptest::collection::vec((-60.0f64..60.0, -60.0f64..60.0), 1..20),
        ) {
            let config = EditorConfig::default();
            let mut ed = CropEditor::open(
                Photo::new(0, RasterImage::filled(400, 300, [0, 0, 0, 255])),
                &config,
            );
            ed.set_aspect_ratio(Some(r)).unwrap();

            let handle = Handle::ALL[handle_idx];
            let (mut px, mut py) = handle.position(&ed.state().crop_box);
            ed.begin_drag(px, py);

            for (dx, dy) in steps {
                px += dx;
                py += dy;
                ed.on_drag(px, py);

                let b = ed.state().crop_box;
                prop_assert!((b.height - b.width / r).abs() < 1e-6);
                prop_assert!(b.width >= config.min_box_size - 1e-9);
                prop_assert!(b.height >= config.min_box_size - 1e-9);
                prop_assert!(Rect::from_size(400, 300).contains_rect(&b));
            }
        }

        #[test]
        fn prop_rotation_stays_quarter_turns(turns in proptest::collection::vec(any::<bool>(), 0..20)) {
            let mut ed = CropEditor::open(
                Photo::new(0, RasterImage::filled(4, 4, [0, 0, 0, 255])),
                &EditorConfig::default(),
            );
            for right in turns {
                let rot = if right { ed.rotate(90) } else { ed.rotate(-90) };
                let rot = rot.unwrap();
                prop_assert!(rot < 360 && rot % 90 == 0);
            }
        }
    }
}
