//! Composition parameters: frame styling and the sticker layer.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::color::Color;
use crate::filter::PhotoFilter;

/// Global styling applied by the compositor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StyleState {
    pub frame_color: Color,
    /// Image URL of a frame template drawn instead of the flat color
    pub frame_template: Option<String>,
    pub filter: PhotoFilter,
    pub photo_gap_px: u32,
    pub frame_border_radius_px: f64,
    pub photo_border_radius_px: f64,
    /// Blank caption area below the last photo
    pub bottom_space_px: u32,
}

impl Default for StyleState {
    fn default() -> Self {
        Self {
            frame_color: Color::WHITE,
            frame_template: None,
            filter: PhotoFilter::None,
            photo_gap_px: 8,
            frame_border_radius_px: 0.0,
            photo_border_radius_px: 0.0,
            bottom_space_px: 85,
        }
    }
}

/// Largest accepted `photo_gap_px`.
pub const MAX_PHOTO_GAP_PX: u32 = 200;
/// Largest accepted `bottom_space_px`.
pub const MAX_BOTTOM_SPACE_PX: u32 = 1000;
/// Largest accepted frame or photo corner radius.
pub const MAX_BORDER_RADIUS_PX: u32 = 500;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StyleError {
    #[error("Photo gap of {value}px exceeds the {max}px limit")]
    GapTooLarge { value: u32, max: u32 },

    #[error("Bottom space of {value}px exceeds the {max}px limit")]
    BottomSpaceTooLarge { value: u32, max: u32 },

    #[error("{field} must be between 0 and {max}px")]
    InvalidRadius { field: &'static str, max: u32 },
}

impl StyleState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Reject values that would produce an unreasonably large strip.
    pub fn validate(&self) -> Result<(), StyleError> {
        if self.photo_gap_px > MAX_PHOTO_GAP_PX {
            return Err(StyleError::GapTooLarge {
                value: self.photo_gap_px,
                max: MAX_PHOTO_GAP_PX,
            });
        }
        if self.bottom_space_px > MAX_BOTTOM_SPACE_PX {
            return Err(StyleError::BottomSpaceTooLarge {
                value: self.bottom_space_px,
                max: MAX_BOTTOM_SPACE_PX,
            });
        }
        let radii = [
            ("Frame border radius", self.frame_border_radius_px),
            ("Photo border radius", self.photo_border_radius_px),
        ];
        for (field, radius) in radii {
            // NaN fails the range check
            if !(0.0..=MAX_BORDER_RADIUS_PX as f64).contains(&radius) {
                return Err(StyleError::InvalidRadius {
                    field,
                    max: MAX_BORDER_RADIUS_PX,
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StickerId(pub u64);

impl fmt::Display for StickerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StickerError {
    #[error("No sticker with id {0}")]
    UnknownSticker(StickerId),
}

/// A decorative overlay on the strip.
///
/// `(x, y)` is the top-left corner in strip pixels and `size` the drawn
/// width; the height follows the sticker image's aspect ratio. Rotation is
/// about the sticker's own center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sticker {
    pub id: StickerId,
    pub src: String,
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub rotation_degrees: f64,
}

/// Result of [`StickerLayer::resize`].
#[derive(Debug, Clone, PartialEq)]
pub enum ResizeOutcome {
    Resized,
    /// A size of zero or less deletes the sticker
    Removed(Sticker),
}

/// Ordered sticker list; later stickers draw on top.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StickerLayer {
    stickers: Vec<Sticker>,
    next_id: u64,
}

impl StickerLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.stickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stickers.is_empty()
    }

    /// Stickers in render order.
    pub fn iter(&self) -> impl Iterator<Item = &Sticker> {
        self.stickers.iter()
    }

    pub fn get(&self, id: StickerId) -> Option<&Sticker> {
        self.stickers.iter().find(|s| s.id == id)
    }

    fn get_mut(&mut self, id: StickerId) -> Result<&mut Sticker, StickerError> {
        self.stickers
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(StickerError::UnknownSticker(id))
    }

    /// Add a sticker of width `size` centered on `center`.
    pub fn add(&mut self, src: impl Into<String>, center: (f64, f64), size: f64) -> StickerId {
        let id = StickerId(self.next_id);
        self.next_id += 1;
        self.stickers.push(Sticker {
            id,
            src: src.into(),
            x: center.0 - size / 2.0,
            y: center.1 - size / 2.0,
            size,
            rotation_degrees: 0.0,
        });
        id
    }

    pub fn move_to(&mut self, id: StickerId, x: f64, y: f64) -> Result<(), StickerError> {
        let sticker = self.get_mut(id)?;
        sticker.x = x;
        sticker.y = y;
        Ok(())
    }

    pub fn move_by(&mut self, id: StickerId, dx: f64, dy: f64) -> Result<(), StickerError> {
        let sticker = self.get_mut(id)?;
        sticker.x += dx;
        sticker.y += dy;
        Ok(())
    }

    /// Change the drawn width; zero or less removes the sticker.
    pub fn resize(&mut self, id: StickerId, size: f64) -> Result<ResizeOutcome, StickerError> {
        if size.is_nan() || size <= 0.0 {
            return self.remove(id).map(ResizeOutcome::Removed);
        }
        self.get_mut(id)?.size = size;
        Ok(ResizeOutcome::Resized)
    }

    /// Rotate by `delta_degrees`, wrapped into `[0, 360)`.
    pub fn rotate(&mut self, id: StickerId, delta_degrees: f64) -> Result<f64, StickerError> {
        let sticker = self.get_mut(id)?;
        if delta_degrees.is_finite() {
            sticker.rotation_degrees = (sticker.rotation_degrees + delta_degrees).rem_euclid(360.0);
        }
        Ok(sticker.rotation_degrees)
    }

    pub fn remove(&mut self, id: StickerId) -> Result<Sticker, StickerError> {
        let index = self
            .stickers
            .iter()
            .position(|s| s.id == id)
            .ok_or(StickerError::UnknownSticker(id))?;
        Ok(self.stickers.remove(index))
    }

    pub fn clear(&mut self) {
        self.stickers.clear();
    }
}
