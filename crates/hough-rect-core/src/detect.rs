//! Peak extraction from accumulators and other response matrices.
use crate::Matrix;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Integer cell of a matrix together with its value.
///
/// For accumulators `row` is the ρ bin and `col` the θ bin.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Peak {
    pub row: usize,
    pub col: usize,
    pub value: f32,
}

/// Threshold selection for [`detect_peaks`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PeakParams {
    /// Relative threshold as a fraction of the matrix maximum.
    pub threshold_rel: f32,
    /// Absolute threshold override; if `Some`, this is used instead of `threshold_rel`.
    pub threshold_abs: Option<f32>,
}

impl Default for PeakParams {
    fn default() -> Self {
        Self {
            threshold_rel: 0.5,
            threshold_abs: None,
        }
    }
}

/// Every cell strictly greater than `threshold`, in row-major order.
///
/// No suppression is applied; neighbouring cells of the same maximum are all
/// reported and left for the caller to merge.
pub fn find_local_maximum(m: &Matrix, threshold: f32) -> Vec<Peak> {
    let mut peaks = Vec::new();
    for row in 0..m.h {
        for (col, &value) in m.row(row).iter().enumerate() {
            if value > threshold {
                peaks.push(Peak { row, col, value });
            }
        }
    }
    peaks
}

/// Threshold a matrix relative to its maximum (or absolutely) and collect peaks.
///
/// Empty and all-zero matrices produce no peaks.
pub fn detect_peaks(m: &Matrix, params: &PeakParams) -> Vec<Peak> {
    let max_v = match m.max_value() {
        Some(v) if v.is_finite() && v > 0.0 => v,
        _ => return Vec::new(),
    };

    let mut thr = params.threshold_abs.unwrap_or(params.threshold_rel * max_v);
    if thr < 0.0 {
        // a negative threshold would accept every empty cell
        thr = 0.0;
    }
    find_local_maximum(m, thr)
}
