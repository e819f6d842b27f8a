use thiserror::Error;

/// Errors reported when a transform is configured with unusable parameters.
///
/// Everything past construction is total: out-of-range indices are clamped
/// and degenerate geometry resolves to zero or is skipped.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HoughError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("image must be non-empty, got {w}x{h}")]
    EmptyImage { w: usize, h: usize },
}
