//! Annular masks.
//!
//! A ring keeps the cells whose distance from the matrix center lies in
//! `[r_min, r_max]`. The same definition serves as a spatial window on image
//! patches and as the ρ/θ neighbourhood of the enhancement stage.
use crate::Matrix;

#[inline]
fn in_ring(dx: f32, dy: f32, r_min: f32, r_max: f32) -> bool {
    let d = dx.hypot(dy);
    d >= r_min && d <= r_max
}

/// Copy of `img` with every cell outside the `[r_min, r_max]` annulus set to 0.
///
/// Distances are measured from `((w - 1) / 2, (h - 1) / 2)` in cell units.
pub fn ring(img: &Matrix, r_min: f32, r_max: f32) -> Matrix {
    let cx = (img.w as f32 - 1.0) * 0.5;
    let cy = (img.h as f32 - 1.0) * 0.5;

    let mut out = img.clone();
    for y in 0..img.h {
        let dy = y as f32 - cy;
        for x in 0..img.w {
            if !in_ring(x as f32 - cx, dy, r_min, r_max) {
                *out.at_mut(x, y) = 0.0;
            }
        }
    }
    out
}

/// Offsets `(dx, dy)` of the cells whose distance from the center cell lies
/// in `[r_min, r_max]`, within a `w × h` box around it.
///
/// The box reaches `w / 2` cells either way along x and `h / 2` along y, so
/// the kernel is symmetric about the center cell for every size; odd sizes
/// match [`ring`] on an all-ones `w × h` kernel. Order is row-major.
pub fn ring_offsets(w: usize, h: usize, r_min: f32, r_max: f32) -> Vec<(i32, i32)> {
    if w == 0 || h == 0 {
        return Vec::new();
    }
    let rx = (w / 2) as i32;
    let ry = (h / 2) as i32;

    let mut offsets = Vec::new();
    for dy in -ry..=ry {
        for dx in -rx..=rx {
            if in_ring(dx as f32, dy as f32, r_min, r_max) {
                offsets.push((dx, dy));
            }
        }
    }
    offsets
}
