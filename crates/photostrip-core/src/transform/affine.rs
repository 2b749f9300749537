//! Rotation/zoom composition shared by the crop preview and the crop commit.
//!
//! Both renders must go through [`compose_transform`] so that what the user
//! sees in the editor is exactly what gets saved.

use kurbo::{Affine, Point};

/// Build the editor transform: translate to `center`, rotate by
/// `rotation_degrees` (clockwise on screen, y axis pointing down), scale by
/// `zoom`, translate back.
///
/// Canonical order: `T(center) * R(θ) * S(zoom) * T(-center)`.
pub fn compose_transform(center: Point, rotation_degrees: f64, zoom: f64) -> Affine {
    let to_center = Affine::translate(center.to_vec2());
    let from_center = Affine::translate(-center.to_vec2());
    let rotate = Affine::rotate(rotation_degrees.to_radians());
    let scale = Affine::scale(zoom);

    to_center * rotate * scale * from_center
}

/// Whether `transform` leaves every point where it is (within `1e-9`).
pub fn is_identity(transform: &Affine) -> bool {
    transform
        .as_coeffs()
        .iter()
        .zip(Affine::IDENTITY.as_coeffs())
        .all(|(a, b)| (a - b).abs() < 1e-9)
}

/// Snap near-integer coefficients produced by quarter-turn rotations
/// (`cos 90° ≈ 6e-17`) so sampling lands exactly on pixel centers.
pub fn snap(transform: Affine) -> Affine {
    let mut coeffs = transform.as_coeffs();
    for c in coeffs.iter_mut() {
        let rounded = c.round();
        if (*c - rounded).abs() < 1e-9 {
            *c = rounded;
        }
    }
    Affine::new(coeffs)
}
