//! Whole-image rectangle search.
//!
//! The per-window detector only finds rectangles centered (within `t_rho / 2`)
//! on its window. The scanner therefore slides the window center across the
//! image on a regular grid, places every hypothesis in image coordinates
//! (window center plus the side pairs' offsets along their normals) and merges
//! detections of the same rectangle from neighbouring windows.

use hough_rect_core::{DetectorParams, HoughError, Matrix, RectangleDetector, RectangleHypothesis};
#[cfg(feature = "rayon")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
#[cfg(feature = "tracing")]
use tracing::{debug_span, instrument};

/// A rectangle in image coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    /// Center `(x, y)` in pixels.
    pub center: [f32; 2],
    /// Normal orientation of the sides spanning `width`, in degrees.
    pub orientation: f32,
    pub width: f32,
    pub height: f32,
    /// Sum of the side pairs' vote heights.
    pub score: f32,
}

impl Rectangle {
    fn from_hypothesis(h: &RectangleHypothesis, window_center: [f32; 2]) -> Self {
        let off = h.center_offset();
        Self {
            center: [window_center[0] + off[0], window_center[1] + off[1]],
            orientation: h.orientation(),
            width: h.width(),
            height: h.height(),
            score: h.score(),
        }
    }
}

/// Grid of window centers and duplicate merging.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanParams {
    /// Distance between neighbouring window centers, in pixels.
    pub stride: usize,
    /// Rectangles whose centers are closer than this are merged.
    pub merge_radius: f32,
}

impl Default for ScanParams {
    fn default() -> Self {
        Self {
            stride: 2,
            merge_radius: 3.0,
        }
    }
}

/// Detector and scan parameters together.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RectangleConfig {
    pub detector: DetectorParams,
    pub scan: ScanParams,
}

/// Detect rectangles anywhere in a binary edge image.
///
/// Algorithm:
/// 1. Place a window at every `stride` pixels where it fits in the image.
/// 2. Run the per-window detector on it.
/// 3. Convert hypotheses to image coordinates.
/// 4. Merge rectangles within `merge_radius`, keeping the strongest.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(img, cfg), fields(w = img.w, h = img.h, window = cfg.detector.window))
)]
pub fn find_rectangles(img: &Matrix, cfg: &RectangleConfig) -> Result<Vec<Rectangle>, HoughError> {
    if cfg.scan.stride == 0 {
        return Err(HoughError::InvalidConfiguration(
            "scan stride must be at least 1".to_string(),
        ));
    }
    let det = RectangleDetector::new(cfg.detector.clone())?;
    let window = cfg.detector.window;
    if img.w < window || img.h < window {
        return Ok(Vec::new());
    }

    let xs = window_offsets(img.w, window, cfg.scan.stride);
    let ys = window_offsets(img.h, window, cfg.scan.stride);
    let origins: Vec<(usize, usize)> = ys
        .iter()
        .flat_map(|&y0| xs.iter().map(move |&x0| (x0, y0)))
        .collect();

    #[cfg(feature = "tracing")]
    let windows_span = debug_span!("windows", count = origins.len()).entered();

    let run_window = |&(x0, y0): &(usize, usize)| -> Result<Vec<Rectangle>, HoughError> {
        let patch = img.crop(x0, y0, window, window);
        let center = det.window_center(x0, y0);
        let found = det.detect_window(&patch)?;
        Ok(found
            .iter()
            .map(|h| Rectangle::from_hypothesis(h, center))
            .collect())
    };

    #[cfg(feature = "rayon")]
    let per_window: Vec<Vec<Rectangle>> = origins
        .par_iter()
        .map(run_window)
        .collect::<Result<_, _>>()?;

    #[cfg(not(feature = "rayon"))]
    let per_window: Vec<Vec<Rectangle>> = origins
        .iter()
        .map(run_window)
        .collect::<Result<_, _>>()?;

    #[cfg(feature = "tracing")]
    drop(windows_span);

    #[cfg(feature = "tracing")]
    let merge_span = debug_span!("merge").entered();
    let mut all: Vec<Rectangle> = per_window.into_iter().flatten().collect();
    let merged = merge_rectangles(&mut all, cfg.scan.merge_radius);
    #[cfg(feature = "tracing")]
    drop(merge_span);

    Ok(merged)
}

/// Window start positions along one image axis: every `stride` pixels, plus
/// the last position that still fits so the far border is always covered.
fn window_offsets(len: usize, window: usize, stride: usize) -> Vec<usize> {
    let last = len - window;
    let mut out: Vec<usize> = (0..=last).step_by(stride).collect();
    if out.last() != Some(&last) {
        out.push(last);
    }
    out
}

/// Merge rectangles within a given center distance, keeping the strongest.
pub fn merge_rectangles(rects: &mut Vec<Rectangle>, radius: f32) -> Vec<Rectangle> {
    let r2 = radius * radius;
    let mut out: Vec<Rectangle> = Vec::new();

    // naive O(N^2); only a handful of windows see any given rectangle
    'outer: for r in rects.drain(..) {
        for o in &mut out {
            let dx = r.center[0] - o.center[0];
            let dy = r.center[1] - o.center[1];
            if dx * dx + dy * dy <= r2 {
                if r.score > o.score {
                    *o = r;
                }
                continue 'outer;
            }
        }
        out.push(r);
    }

    out
}
