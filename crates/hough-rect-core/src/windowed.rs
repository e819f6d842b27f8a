//! Windowed Hough transform.
//!
//! A patch is masked to an annulus around its center before voting, so only
//! edges at a bounded distance from the window center contribute. Applied
//! over a whole image, the window is tiled without overlap (stride equal to
//! the window size, starting at the top-left corner). Tiles at the right and
//! bottom borders are clipped to the image.
use crate::error::HoughError;
use crate::hough::{HoughParams, HoughRectangle};
use crate::ring::ring;
use crate::Matrix;

#[cfg(feature = "rayon")]
use rayon::prelude::*;
#[cfg(feature = "tracing")]
use tracing::instrument;

/// Placement of one tile in the source image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tile {
    pub x0: usize,
    pub y0: usize,
    pub w: usize,
    pub h: usize,
}

/// Non-overlapping `l_window` tiles covering a `w × h` image, row-major.
pub fn tiles(w: usize, h: usize, l_window: usize) -> Vec<Tile> {
    if l_window == 0 {
        return Vec::new();
    }
    let mut out = Vec::new();
    for y0 in (0..h).step_by(l_window) {
        for x0 in (0..w).step_by(l_window) {
            out.push(Tile {
                x0,
                y0,
                w: l_window.min(w - x0),
                h: l_window.min(h - y0),
            });
        }
    }
    out
}

impl HoughRectangle {
    /// Ring-mask `patch` to `[r_min, r_max]` and run the Hough transform on it.
    ///
    /// The result has this context's `rho_bins × theta_bins` shape.
    pub fn windowed_hough(&self, patch: &Matrix, r_min: f32, r_max: f32) -> Matrix {
        let masked = ring(patch, r_min, r_max);
        self.hough_transform(&masked)
    }

    /// Context used for one tile of [`apply_windowed_hough`](Self::apply_windowed_hough).
    ///
    /// Shares this context's θ range, has `l_window` bins on both axes and
    /// the (possibly clipped) tile's own dimensions.
    pub fn tile_context(
        &self,
        tile_w: usize,
        tile_h: usize,
        l_window: usize,
    ) -> Result<HoughRectangle, HoughError> {
        HoughRectangle::new(
            tile_w,
            tile_h,
            HoughParams {
                theta_bins: l_window,
                rho_bins: l_window,
                ..self.params().clone()
            },
        )
    }

    /// Windowed Hough transform over the whole image.
    ///
    /// Each tile's `l_window × l_window` accumulator is cropped to the tile's
    /// size and written at the tile's position, so the response has the
    /// image's shape and every pixel depends only on its own tile.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, img), fields(w = img.w, h = img.h))
    )]
    pub fn apply_windowed_hough(
        &self,
        img: &Matrix,
        l_window: usize,
        r_min: f32,
        r_max: f32,
    ) -> Result<Matrix, HoughError> {
        if l_window < 2 {
            return Err(HoughError::InvalidConfiguration(format!(
                "window size must be at least 2, got {l_window}"
            )));
        }

        let placements = tiles(img.w, img.h, l_window);

        let run_tile = |t: &Tile| -> Result<Matrix, HoughError> {
            let ctx = self.tile_context(t.w, t.h, l_window)?;
            let patch = img.crop(t.x0, t.y0, t.w, t.h);
            let acc = ctx.windowed_hough(&patch, r_min, r_max);
            Ok(acc.crop(0, 0, t.w, t.h))
        };

        #[cfg(feature = "rayon")]
        let responses: Vec<Matrix> = placements
            .par_iter()
            .map(run_tile)
            .collect::<Result<_, _>>()?;

        #[cfg(not(feature = "rayon"))]
        let responses: Vec<Matrix> = placements
            .iter()
            .map(run_tile)
            .collect::<Result<_, _>>()?;

        let mut out = Matrix::zeros(img.w, img.h);
        for (t, resp) in placements.iter().zip(&responses) {
            for y in 0..resp.h {
                let dst = (t.y0 + y) * out.w + t.x0;
                out.data[dst..dst + resp.w].copy_from_slice(resp.row(y));
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noisy_edges(w: usize, h: usize) -> Matrix {
        let mut m = Matrix::zeros(w, h);
        for y in 0..h {
            for x in 0..w {
                if (x * 7 + y * 3) % 5 == 0 || x == y {
                    *m.at_mut(x, y) = 255.0;
                }
            }
        }
        m
    }

    #[test]
    fn tiles_cover_image_and_clip_borders() {
        let t = tiles(10, 7, 4);
        assert_eq!(t.len(), 6);
        assert_eq!(t[0], Tile { x0: 0, y0: 0, w: 4, h: 4 });
        assert_eq!(t[2], Tile { x0: 8, y0: 0, w: 2, h: 4 });
        assert_eq!(t[5], Tile { x0: 8, y0: 4, w: 2, h: 3 });
        let area: usize = t.iter().map(|t| t.w * t.h).sum();
        assert_eq!(area, 70);
    }

    #[test]
    fn windowed_hough_ignores_pixels_outside_the_ring() {
        let ctx = HoughRectangle::new(11, 11, HoughParams::default()).unwrap();
        let mut patch = Matrix::zeros(11, 11);
        *patch.at_mut(0, 0) = 255.0;
        let acc = ctx.windowed_hough(&patch, 0.0, 5.0);
        assert!(acc.data.iter().all(|&v| v == 0.0));

        *patch.at_mut(5, 2) = 255.0;
        let acc = ctx.windowed_hough(&patch, 0.0, 5.0);
        assert_eq!(acc.data.iter().sum::<f32>(), 256.0);
    }

    #[test]
    fn composition_matches_each_tile_alone() {
        let img = noisy_edges(23, 17);
        let ctx = HoughRectangle::for_image(&img, HoughParams::default()).unwrap();
        let l = 8;
        let (r_min, r_max) = (1.0, 4.5);
        let out = ctx.apply_windowed_hough(&img, l, r_min, r_max).unwrap();
        assert_eq!((out.w, out.h), (23, 17));
        assert!(out.data.iter().any(|&v| v > 0.0));

        for t in tiles(img.w, img.h, l) {
            let tile_ctx = ctx.tile_context(t.w, t.h, l).unwrap();
            let alone = tile_ctx.windowed_hough(&img.crop(t.x0, t.y0, t.w, t.h), r_min, r_max);
            for y in 0..t.h {
                for x in 0..t.w {
                    assert_eq!(out.at(t.x0 + x, t.y0 + y), alone.at(x, y));
                }
            }
        }
    }

    #[test]
    fn rejects_degenerate_window() {
        let img = Matrix::zeros(4, 4);
        let ctx = HoughRectangle::for_image(&img, HoughParams::default()).unwrap();
        assert!(ctx.apply_windowed_hough(&img, 1, 0.0, 2.0).is_err());
    }
}
