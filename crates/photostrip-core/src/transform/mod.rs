//! Transform math: crop geometry, editor transforms and pixel sampling.
//!
//! # Coordinate System
//!
//! - Crop boxes are in source-pixel space of the image being edited
//! - Rotation angles are in degrees, positive = clockwise on screen
//!   (y axis points down)
//! - Origin is the top-left corner

mod affine;
mod geometry;
mod sampling;

pub use affine::{compose_transform, is_identity, snap};
pub use geometry::{center_crop_rect, constrain_box, contain_rect, translate_box, Handle, Rect};
pub use sampling::{sample_bilinear, SampleWindow};
