//! Enhanced Hough transform.
//!
//! Each accumulator cell `C` is replaced by `C² / mean(neighbourhood)`, where
//! the neighbourhood is the disk inscribed in an `h × w` box of ρ/θ cells
//! centered on it (see [`ring_offsets`]). Peaks produced by long, isolated
//! straight edges dominate their neighbourhood and are amplified, while the
//! diffuse butterflies of noise and line crossings are flattened.
use crate::error::HoughError;
use crate::hough::HoughRectangle;
use crate::ring::ring_offsets;
use crate::Matrix;

#[cfg(feature = "rayon")]
use rayon::prelude::*;
#[cfg(feature = "tracing")]
use tracing::instrument;

/// Enhance an accumulator without θ wraparound.
///
/// `h` is the neighbourhood extent along ρ (rows), `w` along θ (columns).
/// Neighbours outside the accumulator are skipped.
pub fn enhance_hough(hough: &Matrix, h: usize, w: usize) -> Result<Matrix, HoughError> {
    enhance_with(hough, h, w, false)
}

impl HoughRectangle {
    /// Enhance an accumulator produced by this context.
    ///
    /// When the θ axis spans a full half-turn, neighbours past either θ end
    /// continue on the opposite end with ρ mirrored.
    pub fn enhance_hough(&self, hough: &Matrix, h: usize, w: usize) -> Result<Matrix, HoughError> {
        enhance_with(hough, h, w, self.wraps_around())
    }
}

#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(hough), fields(rows = hough.h, cols = hough.w))
)]
fn enhance_with(hough: &Matrix, h: usize, w: usize, wrap: bool) -> Result<Matrix, HoughError> {
    if h == 0 || w == 0 {
        return Err(HoughError::InvalidConfiguration(format!(
            "enhancement neighbourhood must be non-empty, got {h}x{w}"
        )));
    }
    if hough.is_empty() {
        return Ok(hough.clone());
    }

    let radius = h.min(w) as f32 * 0.5;
    let offsets = ring_offsets(w, h, 0.0, radius);
    let rows = hough.h as i32;
    let cols = hough.w as i32;

    // The two θ end bins hold the same lines, so a full turn is cols - 1 bins.
    let period = cols - 1;

    let enhance_row = |r: usize, out_row: &mut [f32]| {
        for (t, out) in out_row.iter_mut().enumerate() {
            let c = hough.at(t, r);
            if c == 0.0 {
                continue;
            }

            let mut sum = 0.0f32;
            let mut count = 0u32;
            for &(dt, dr) in &offsets {
                let mut tt = t as i32 + dt;
                let mut rr = r as i32 + dr;
                if wrap && period > 0 {
                    if tt < 0 {
                        tt += period;
                        rr = rows - 1 - rr;
                    } else if tt >= cols {
                        tt -= period;
                        rr = rows - 1 - rr;
                    }
                }
                if tt < 0 || rr < 0 || tt >= cols || rr >= rows {
                    continue;
                }
                sum += hough.at(tt as usize, rr as usize);
                count += 1;
            }

            if count == 0 || sum <= 0.0 {
                continue;
            }
            let mean = sum / count as f32;
            *out = c * c / mean;
        }
    };

    let mut out = Matrix::zeros(hough.w, hough.h);

    #[cfg(feature = "rayon")]
    out.data
        .par_chunks_mut(hough.w)
        .enumerate()
        .for_each(|(r, row)| enhance_row(r, row));

    #[cfg(not(feature = "rayon"))]
    for (r, row) in out.data.chunks_mut(hough.w).enumerate() {
        enhance_row(r, row);
    }

    Ok(out)
}
