//! The Hough context and the classic (θ, ρ) voting transform.
use crate::axis::{linear_spaced_array, RhoAxis};
use crate::error::HoughError;
use crate::matching::LinePeak;
use crate::{Matrix, Peak};

#[cfg(feature = "rayon")]
use rayon::prelude::*;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "tracing")]
use tracing::instrument;

/// Quantization of the Hough space.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HoughParams {
    /// Number of θ bins (accumulator columns).
    pub theta_bins: usize,
    /// Number of ρ bins (accumulator rows).
    pub rho_bins: usize,
    /// First angle of the θ axis, in degrees.
    pub theta_min: f32,
    /// Last angle of the θ axis, in degrees (inclusive).
    pub theta_max: f32,
}

impl Default for HoughParams {
    fn default() -> Self {
        Self {
            theta_bins: 256,
            rho_bins: 256,
            theta_min: -90.0,
            theta_max: 90.0,
        }
    }
}

impl HoughParams {
    pub fn validate(&self) -> Result<(), HoughError> {
        if self.theta_bins < 2 || self.rho_bins < 2 {
            return Err(HoughError::InvalidConfiguration(format!(
                "need at least 2 bins per axis, got theta_bins={} rho_bins={}",
                self.theta_bins, self.rho_bins
            )));
        }
        if !self.theta_min.is_finite() || !self.theta_max.is_finite() {
            return Err(HoughError::InvalidConfiguration(
                "theta range must be finite".to_string(),
            ));
        }
        if self.theta_min >= self.theta_max {
            return Err(HoughError::InvalidConfiguration(format!(
                "theta_min ({}) must be below theta_max ({})",
                self.theta_min, self.theta_max
            )));
        }
        Ok(())
    }
}

/// Immutable Hough configuration for images of a fixed size.
///
/// Holds the angle set, its trigonometric tables and the ρ axis. Every
/// transform is a pure function of its input image and this context.
#[derive(Clone, Debug)]
pub struct HoughRectangle {
    params: HoughParams,
    thetas: Vec<f32>,
    trig: Vec<(f32, f32)>,
    rho_axis: RhoAxis,
}

impl HoughRectangle {
    pub fn new(w: usize, h: usize, params: HoughParams) -> Result<Self, HoughError> {
        params.validate()?;
        if w == 0 || h == 0 {
            return Err(HoughError::EmptyImage { w, h });
        }

        let thetas = linear_spaced_array(params.theta_min, params.theta_max, params.theta_bins);
        let trig = thetas
            .iter()
            .map(|t| {
                let rad = t.to_radians();
                (rad.cos(), rad.sin())
            })
            .collect();
        let rho_axis = RhoAxis::for_image(w, h, params.rho_bins);

        Ok(Self {
            params,
            thetas,
            trig,
            rho_axis,
        })
    }

    /// Context sized for `img`.
    pub fn for_image(img: &Matrix, params: HoughParams) -> Result<Self, HoughError> {
        Self::new(img.w, img.h, params)
    }

    #[inline]
    pub fn params(&self) -> &HoughParams {
        &self.params
    }

    /// The angle set, in degrees.
    #[inline]
    pub fn thetas(&self) -> &[f32] {
        &self.thetas
    }

    #[inline]
    pub fn rho_axis(&self) -> &RhoAxis {
        &self.rho_axis
    }

    /// Whether the θ axis covers a full half-turn, so that its two ends
    /// describe the same lines with opposite ρ.
    pub fn wraps_around(&self) -> bool {
        ((self.params.theta_max - self.params.theta_min) - 180.0).abs() < 1e-3
    }

    /// Classic Hough transform of a binary edge image.
    ///
    /// Every non-zero pixel votes once per θ bin. Coordinates are measured
    /// from the center of `img` with y pointing down. The result has
    /// `rho_bins` rows and `theta_bins` columns.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, img), fields(w = img.w, h = img.h))
    )]
    pub fn hough_transform(&self, img: &Matrix) -> Matrix {
        let theta_bins = self.params.theta_bins;
        let rho_bins = self.params.rho_bins;
        let cx = (img.w as f32 - 1.0) * 0.5;
        let cy = (img.h as f32 - 1.0) * 0.5;

        let vote_row = |acc: &mut [f32], y: usize| {
            let yc = y as f32 - cy;
            for (x, &v) in img.row(y).iter().enumerate() {
                if v == 0.0 {
                    continue;
                }
                let xc = x as f32 - cx;
                for (t, &(cos_t, sin_t)) in self.trig.iter().enumerate() {
                    let r = self.rho_axis.index_of(xc * cos_t + yc * sin_t);
                    acc[r * theta_bins + t] += 1.0;
                }
            }
        };

        #[cfg(feature = "rayon")]
        let data = (0..img.h)
            .into_par_iter()
            .fold(
                || vec![0.0f32; rho_bins * theta_bins],
                |mut acc, y| {
                    vote_row(acc.as_mut_slice(), y);
                    acc
                },
            )
            .reduce(
                || vec![0.0f32; rho_bins * theta_bins],
                |mut a, b| {
                    for (dst, src) in a.iter_mut().zip(b) {
                        *dst += src;
                    }
                    a
                },
            );

        #[cfg(not(feature = "rayon"))]
        let data = {
            let mut acc = vec![0.0f32; rho_bins * theta_bins];
            for y in 0..img.h {
                vote_row(acc.as_mut_slice(), y);
            }
            acc
        };

        Matrix {
            w: theta_bins,
            h: rho_bins,
            data,
        }
    }

    /// Decode accumulator peaks into `(ρ, θ)` lines.
    ///
    /// `peak.row` is the ρ bin and `peak.col` the θ bin; indices past the
    /// axes decode to the last bin.
    pub fn index_rho_theta(&self, peaks: &[Peak]) -> Vec<LinePeak> {
        let last_theta = self.thetas.len() - 1;
        peaks
            .iter()
            .map(|p| LinePeak {
                rho: self.rho_axis.value_at(p.row),
                theta: self.thetas[p.col.min(last_theta)],
                votes: p.value,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(theta_bins: usize, rho_bins: usize) -> HoughParams {
        HoughParams {
            theta_bins,
            rho_bins,
            ..HoughParams::default()
        }
    }

    #[test]
    fn rejects_bad_configuration() {
        assert!(matches!(
            HoughRectangle::new(10, 10, params(1, 10)),
            Err(HoughError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            HoughRectangle::new(10, 10, params(10, 0)),
            Err(HoughError::InvalidConfiguration(_))
        ));
        let inverted = HoughParams {
            theta_min: 10.0,
            theta_max: 10.0,
            ..HoughParams::default()
        };
        assert!(HoughRectangle::new(10, 10, inverted).is_err());
        assert_eq!(
            HoughRectangle::new(0, 5, HoughParams::default()).unwrap_err(),
            HoughError::EmptyImage { w: 0, h: 5 }
        );
    }

    #[test]
    fn default_context_matches_declared_axes() {
        let ctx = HoughRectangle::new(64, 48, HoughParams::default()).unwrap();
        assert_eq!(ctx.thetas().len(), 256);
        assert_eq!(ctx.thetas()[0], -90.0);
        assert_eq!(ctx.thetas()[255], 90.0);
        assert!(ctx.thetas().windows(2).all(|p| p[1] > p[0]));
        assert_eq!(ctx.rho_axis().bins, 256);
        assert_eq!(ctx.rho_axis().rho_max, 40.0);
        assert!(ctx.wraps_around());
    }

    #[test]
    fn empty_image_gives_zero_accumulator() {
        let ctx = HoughRectangle::new(20, 15, params(37, 41)).unwrap();
        let acc = ctx.hough_transform(&Matrix::zeros(20, 15));
        assert_eq!((acc.w, acc.h), (37, 41));
        assert!(acc.data.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn single_pixel_traces_a_sinusoid() {
        let (w, h) = (64usize, 64usize);
        let ctx = HoughRectangle::new(w, h, params(181, 181)).unwrap();
        let mut img = Matrix::zeros(w, h);
        *img.at_mut(50, 10) = 255.0;
        let acc = ctx.hough_transform(&img);

        // exactly one vote per θ column
        for t in 0..acc.w {
            let col_sum: f32 = (0..acc.h).map(|r| acc.at(t, r)).sum();
            assert_eq!(col_sum, 1.0, "column {t}");
        }

        let x = 50.0 - 31.5f32;
        let y = 10.0 - 31.5f32;
        for &t in &[0usize, 45, 90, 120, 180] {
            let theta = ctx.thetas()[t].to_radians();
            let expected = x * theta.cos() + y * theta.sin();
            let r = ctx.rho_axis().index_of(expected);
            assert_eq!(acc.at(t, r), 1.0, "theta bin {t}");
            let decoded = ctx.rho_axis().value_at(r);
            assert!((decoded - expected).abs() <= ctx.rho_axis().step() * 0.5 + 1e-4);
        }
    }

    #[test]
    fn center_pixel_votes_at_zero_rho() {
        let ctx = HoughRectangle::new(33, 33, params(181, 181)).unwrap();
        let mut img = Matrix::zeros(33, 33);
        *img.at_mut(16, 16) = 255.0;
        let acc = ctx.hough_transform(&img);
        let zero = ctx.rho_axis().index_of(0.0);
        assert_eq!(zero, 90);
        assert!((0..acc.w).all(|t| acc.at(t, zero) == 1.0));
    }

    #[test]
    fn index_rho_theta_decodes_bins() {
        let ctx = HoughRectangle::new(30, 40, params(181, 101)).unwrap();
        let lines = ctx.index_rho_theta(&[
            Peak {
                row: 50,
                col: 90,
                value: 7.0,
            },
            Peak {
                row: 0,
                col: 0,
                value: 1.0,
            },
        ]);
        assert!(lines[0].rho.abs() < 1e-5);
        assert_eq!(lines[0].theta, 0.0);
        assert_eq!(lines[0].votes, 7.0);
        assert_eq!(lines[1].rho, -25.0);
        assert_eq!(lines[1].theta, -90.0);
    }
}
