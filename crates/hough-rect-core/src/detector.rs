//! Per-window rectangle detection.
//!
//! Chains the stages of the windowed Hough rectangle detector on a single
//! square window:
//!
//! ring mask → Hough transform → enhancement → thresholding → decoding →
//! matching.
//!
//! Hypotheses are reported relative to the window center.
use crate::detect::{detect_peaks, PeakParams};
use crate::error::HoughError;
use crate::hough::{HoughParams, HoughRectangle};
use crate::matching::{match_maximums, MatchParams, RectangleHypothesis};
use crate::Matrix;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "tracing")]
use tracing::instrument;

/// Tunable parameters of the per-window detector.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DetectorParams {
    /// Side of the square analysis window, in pixels.
    pub window: usize,
    /// Inner radius of the ring applied to each window.
    pub r_min: f32,
    /// Outer radius of the ring applied to each window.
    pub r_max: f32,
    /// Hough space quantization of the window transform.
    pub hough: HoughParams,
    /// Enhancement neighbourhood along ρ, in bins.
    pub enhance_h: usize,
    /// Enhancement neighbourhood along θ, in bins.
    pub enhance_w: usize,
    /// Threshold applied to the enhanced accumulator.
    ///
    /// Enhancement squares the votes, so a side of length `l` peaks at about
    /// `(l / l_max)²` of the strongest side. The default relative threshold of
    /// 0.2 keeps rectangles up to roughly 3.5 : 1.
    pub peaks: PeakParams,
    pub matching: MatchParams,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            window: 41,
            r_min: 0.0,
            r_max: 20.5,
            // 1° θ bins and ~1 px ρ bins for a 41 px window
            hough: HoughParams {
                theta_bins: 181,
                rho_bins: 59,
                theta_min: -90.0,
                theta_max: 90.0,
            },
            enhance_h: 5,
            enhance_w: 5,
            peaks: PeakParams {
                threshold_rel: 0.2,
                threshold_abs: None,
            },
            matching: MatchParams::default(),
        }
    }
}

/// Detector bound to one window size.
#[derive(Clone, Debug)]
pub struct RectangleDetector {
    params: DetectorParams,
    ctx: HoughRectangle,
}

impl RectangleDetector {
    pub fn new(params: DetectorParams) -> Result<Self, HoughError> {
        if params.window < 2 {
            return Err(HoughError::InvalidConfiguration(format!(
                "window size must be at least 2, got {}",
                params.window
            )));
        }
        if params.enhance_h == 0 || params.enhance_w == 0 {
            return Err(HoughError::InvalidConfiguration(format!(
                "enhancement neighbourhood must be non-empty, got {}x{}",
                params.enhance_h, params.enhance_w
            )));
        }
        let ctx = HoughRectangle::new(params.window, params.window, params.hough.clone())?;
        Ok(Self { params, ctx })
    }

    #[inline]
    pub fn params(&self) -> &DetectorParams {
        &self.params
    }

    /// Enhanced windowed accumulator of a window-sized patch.
    pub fn enhanced_hough(&self, patch: &Matrix) -> Result<Matrix, HoughError> {
        let acc = self
            .ctx
            .windowed_hough(patch, self.params.r_min, self.params.r_max);
        self.ctx
            .enhance_hough(&acc, self.params.enhance_h, self.params.enhance_w)
    }

    /// Run the full pipeline on a window-sized patch.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "trace", skip(self, patch), fields(w = patch.w, h = patch.h))
    )]
    pub fn detect_window(&self, patch: &Matrix) -> Result<Vec<RectangleHypothesis>, HoughError> {
        let enhanced = self.enhanced_hough(patch)?;
        let peaks = detect_peaks(&enhanced, &self.params.peaks);
        if peaks.is_empty() {
            return Ok(Vec::new());
        }
        let lines = self.ctx.index_rho_theta(&peaks);
        Ok(match_maximums(&lines, &self.params.matching))
    }

    /// Top-left corner of the window centered on `(cx, cy)`, if it fits in a
    /// `w × h` image.
    pub fn window_origin(&self, w: usize, h: usize, cx: usize, cy: usize) -> Option<(usize, usize)> {
        let half = self.params.window / 2;
        let x0 = cx.checked_sub(half)?;
        let y0 = cy.checked_sub(half)?;
        if x0 + self.params.window > w || y0 + self.params.window > h {
            return None;
        }
        Some((x0, y0))
    }

    /// Geometric center of a window whose top-left corner is `(x0, y0)`.
    pub fn window_center(&self, x0: usize, y0: usize) -> [f32; 2] {
        let half = (self.params.window as f32 - 1.0) * 0.5;
        [x0 as f32 + half, y0 as f32 + half]
    }

    /// Run the pipeline on the window centered at `(cx, cy)`.
    ///
    /// Windows that do not fit inside the image produce no hypotheses.
    pub fn detect_at(
        &self,
        img: &Matrix,
        cx: usize,
        cy: usize,
    ) -> Result<Vec<RectangleHypothesis>, HoughError> {
        let Some((x0, y0)) = self.window_origin(img.w, img.h, cx, cy) else {
            return Ok(Vec::new());
        };
        let patch = img.crop(x0, y0, self.params.window, self.params.window);
        self.detect_window(&patch)
    }
}
