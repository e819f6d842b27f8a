//! Optional `image::GrayImage` helpers for the rectangle detector.

use crate::scan::{find_rectangles, Rectangle, RectangleConfig};
use hough_rect_core::normalise::normalise_img;
use hough_rect_core::{HoughError, Matrix};
use image::GrayImage;

/// Copy a grayscale image into a float matrix, keeping raw intensities.
pub fn matrix_from_gray(img: &GrayImage) -> Matrix {
    Matrix {
        w: img.width() as usize,
        h: img.height() as usize,
        data: img.as_raw().iter().map(|&v| v as f32).collect(),
    }
}

/// Float matrix of `img` binarized to `{0, 255}`.
pub fn normalised_matrix(img: &GrayImage) -> Matrix {
    let mut m = matrix_from_gray(img);
    normalise_img(&mut m);
    m
}

/// Detect rectangles in a grayscale edge image.
///
/// The image is normalised first, so any pixel brighter than mid-gray counts
/// as an edge.
pub fn find_rectangles_image(
    img: &GrayImage,
    cfg: &RectangleConfig,
) -> Result<Vec<Rectangle>, HoughError> {
    find_rectangles(&normalised_matrix(img), cfg)
}
