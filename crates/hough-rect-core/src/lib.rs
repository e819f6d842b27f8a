//! Core primitives for Hough-based rectangle detection on binary edge images.
//!
//! # Overview
//!
//! This crate exposes the building blocks of the windowed Hough rectangle
//! detector (Jung & Schramm, "Rectangle detection based on a windowed Hough
//! transform"):
//!
//! - [`axis`] – linearly spaced angle sets and the quantized ρ axis.
//! - [`normalise`] – clamping a float matrix to the binary `{0, 255}` range.
//! - [`hough`] – the [`HoughRectangle`] context and the classic transform.
//! - [`ring`] – annular masks used both on image patches and as the
//!   neighbourhood of the enhancement stage.
//! - [`enhance`] – enhanced Hough transform that favours long, isolated
//!   straight edges.
//! - [`detect`] – thresholding of accumulators into integer peaks.
//! - [`windowed`] – ring-masked transforms on patches and tiled composition.
//! - [`matching`] – grouping line peaks into parallel side pairs and
//!   rectangle hypotheses.
//! - [`detector`] – the full per-window pipeline.
//!
//! Accumulators are [`Matrix`] values with ρ bins along rows and θ bins along
//! columns. Angles are expressed in degrees throughout the public API.
//!
//! # Features
//!
//! - `rayon` – parallelizes voting, enhancement and tiling. Numerical results
//!   are unchanged; only the time to produce them differs.
//! - `tracing` – adds `tracing` spans to the heavy entry points.
//! - `serde` – derives `Serialize`/`Deserialize` on parameter and result
//!   types so they can be loaded from configuration files.

pub mod axis;
pub mod detect;
pub mod detector;
pub mod enhance;
pub mod error;
pub mod hough;
pub mod matching;
pub mod normalise;
pub mod ring;
pub mod windowed;

pub use crate::detect::{find_local_maximum, Peak, PeakParams};
pub use crate::detector::{DetectorParams, RectangleDetector};
pub use crate::error::HoughError;
pub use crate::hough::{HoughParams, HoughRectangle};
pub use crate::matching::{match_maximums, LinePeak, MatchParams, RectangleHypothesis, SidePair};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Dense `f32` matrix in row-major layout.
///
/// Used for edge images, image patches and Hough accumulators alike.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Matrix {
    pub w: usize,
    pub h: usize,
    pub data: Vec<f32>,
}

impl Matrix {
    /// All-zero matrix of the given size.
    pub fn zeros(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            data: vec![0.0; w * h],
        }
    }

    /// Wrap an existing buffer; returns `None` if the length does not match.
    pub fn from_vec(w: usize, h: usize, data: Vec<f32>) -> Option<Self> {
        if data.len() != w * h {
            return None;
        }
        Some(Self { w, h, data })
    }

    #[inline]
    /// Value at an integer coordinate.
    pub fn at(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.w + x]
    }

    #[inline]
    pub fn at_mut(&mut self, x: usize, y: usize) -> &mut f32 {
        &mut self.data[y * self.w + x]
    }

    #[inline]
    pub fn row(&self, y: usize) -> &[f32] {
        &self.data[y * self.w..(y + 1) * self.w]
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// Largest entry, or `None` for an empty matrix.
    pub fn max_value(&self) -> Option<f32> {
        self.data.iter().copied().reduce(f32::max)
    }

    /// Copy out the `w × h` block starting at `(x0, y0)`.
    ///
    /// The block is clipped to the matrix bounds, so the result may be
    /// smaller than requested (or empty). Nothing is padded.
    pub fn crop(&self, x0: usize, y0: usize, w: usize, h: usize) -> Matrix {
        let x1 = (x0 + w).min(self.w);
        let y1 = (y0 + h).min(self.h);
        if x0 >= x1 || y0 >= y1 {
            return Matrix::zeros(0, 0);
        }
        let cw = x1 - x0;
        let mut data = Vec::with_capacity(cw * (y1 - y0));
        for y in y0..y1 {
            data.extend_from_slice(&self.row(y)[x0..x1]);
        }
        Matrix {
            w: cw,
            h: y1 - y0,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crop_clips_to_bounds() {
        let m = Matrix::from_vec(3, 2, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        let c = m.crop(1, 1, 5, 5);
        assert_eq!((c.w, c.h), (2, 1));
        assert_eq!(c.data, vec![4.0, 5.0]);

        let empty = m.crop(3, 0, 2, 2);
        assert!(empty.is_empty());
    }

    #[test]
    fn from_vec_rejects_mismatched_length() {
        assert!(Matrix::from_vec(2, 2, vec![0.0; 3]).is_none());
        assert_eq!(Matrix::zeros(0, 4).max_value(), None);
    }
}
