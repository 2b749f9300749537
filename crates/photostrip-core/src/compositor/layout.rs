//! Strip geometry.
//!
//! ```text
//! +---------------------+
//! |      padding        |
//! |   +-------------+   |
//! |   |  photo 0    |   |
//! |   +-------------+   |
//! |        gap          |
//! |   +-------------+   |
//! |   |  photo n-1  |   |
//! |   +-------------+   |
//! |    bottom space     |
//! |      padding        |
//! +---------------------+
//! ```

use serde::Serialize;

use crate::config::StripConfig;
use crate::style::StyleState;
use crate::transform::Rect;

/// Pixel layout of a composed strip.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StripLayout {
    pub width: u32,
    pub height: u32,
    /// One slot per photo, top to bottom
    pub slots: Vec<Rect>,
    /// Blank caption area below the last photo
    pub caption_area: Rect,
}

impl StripLayout {
    /// Arithmetic saturates; [`StyleState::validate`] keeps real strips
    /// far below `u32::MAX`.
    pub fn compute(photo_count: usize, style: &StyleState, config: &StripConfig) -> Self {
        let padding = config.padding_px;
        let photo_w = config.photo_width;
        let photo_h = config.photo_height;
        let gap = style.photo_gap_px;
        let n = u32::try_from(photo_count).unwrap_or(u32::MAX);

        let stack_height = n
            .saturating_mul(photo_h)
            .saturating_add(n.saturating_sub(1).saturating_mul(gap));
        let width = padding.saturating_mul(2).saturating_add(photo_w);
        let height = padding
            .saturating_mul(2)
            .saturating_add(stack_height)
            .saturating_add(style.bottom_space_px);

        let pitch = photo_h.saturating_add(gap);
        let slots = (0..n)
            .map(|i| {
                Rect::new(
                    padding as f64,
                    padding.saturating_add(i.saturating_mul(pitch)) as f64,
                    photo_w as f64,
                    photo_h as f64,
                )
            })
            .collect();

        let caption_area = Rect::new(
            padding as f64,
            padding.saturating_add(stack_height) as f64,
            photo_w as f64,
            style.bottom_space_px as f64,
        );

        Self {
            width,
            height,
            slots,
            caption_area,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }

    pub fn center(&self) -> (f64, f64) {
        self.bounds().center()
    }

    pub fn slot(&self, index: usize) -> Option<Rect> {
        self.slots.get(index).copied()
    }
}
