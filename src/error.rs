use thiserror::Error;

use crate::sepfilter::validate::ComparisonReport;

/// Error type for filter pipeline runs
///
/// Every variant is a precondition or configuration problem surfaced before
/// any tile is scheduled; the pipelines themselves are pure and cannot fail
/// mid-run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// Image dimensions are zero on at least one axis
    #[error("image dimensions must be non-zero, got {width}x{height}")]
    EmptyImage { width: usize, height: usize },

    /// The input is smaller than the kernel support
    ///
    /// Only the shrunk output convention requires this; the same-size
    /// convention synthesizes boundary samples instead.
    #[error("input extent {width}x{height} is smaller than the kernel support ({min}x{min})")]
    ExtentTooSmall {
        width: usize,
        height: usize,
        min: usize,
    },

    /// The caller-allocated output does not match the expected extent
    #[error("output extent mismatch: expected {expected_width}x{expected_height}, got {actual_width}x{actual_height}")]
    DimensionMismatch {
        expected_width: usize,
        expected_height: usize,
        actual_width: usize,
        actual_height: usize,
    },

    /// Tile geometry the vectorized variant cannot honor
    #[error("invalid tile configuration: {0}")]
    InvalidTileConfig(#[from] TileConfigError),
}

/// Error type for tile geometry validation
///
/// The naive reference variants take no tile configuration and never
/// produce these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TileConfigError {
    /// Band height of zero rows
    #[error("band height must be non-zero")]
    ZeroBandRows,

    /// Block width of zero columns
    #[error("block width must be non-zero")]
    ZeroBlockCols,

    /// Block width that does not divide into whole lane steps
    #[error("block width {block_cols} must be a multiple of the lane width {lanes}")]
    BlockColsNotLaneAligned { block_cols: usize, lanes: usize },
}

/// Error type for cross-implementation validation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A variant failed before producing an output
    #[error("pipeline '{name}' failed: {source}")]
    Pipeline {
        name: String,
        source: FilterError,
    },

    /// A candidate's output does not crop to the reference comparison region
    #[error("candidate '{name}' region {actual_width}x{actual_height} does not match the reference region {expected_width}x{expected_height}")]
    Region {
        name: String,
        expected_width: usize,
        expected_height: usize,
        actual_width: usize,
        actual_height: usize,
    },

    /// Outputs diverged beyond the configured tolerance
    #[error("{report}")]
    Mismatch { report: ComparisonReport },
}
