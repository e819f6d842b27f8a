//! Ergonomic rectangle detection over `hough-rect-core`.
//!
//! This crate is organized into a few focused modules:
//! - [`scan`] – sliding the per-window detector over a whole image and
//!   merging duplicate detections.
//! - [`image`] – helpers on `image::GrayImage` inputs.
//! - [`config`] – JSON configuration with optional parameter overrides.

pub mod config;
#[cfg(feature = "image")]
pub mod image;
pub mod scan;

// Re-export a focused subset of core types for convenience. Consumers that
// need lower-level primitives (rings, raw transforms, matching) are
// encouraged to depend on `hough-rect-core` directly.
pub use hough_rect_core::{
    DetectorParams, HoughError, HoughParams, HoughRectangle, MatchParams, Matrix, PeakParams,
    RectangleDetector, RectangleHypothesis,
};

#[cfg(feature = "image")]
pub use crate::image::{find_rectangles_image, matrix_from_gray, normalised_matrix};

pub use crate::config::{load_config, DetectionConfig};
pub use crate::scan::{find_rectangles, merge_rectangles, Rectangle, RectangleConfig, ScanParams};
