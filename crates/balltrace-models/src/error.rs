//! Error types for model construction and parsing.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while building or parsing model values.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Unknown shot shape: {0}")]
    UnknownShotShape(String),

    #[error("Unknown shot type: {0}")]
    UnknownShotType(String),

    #[error("Spline segments are not contiguous at index {index}: {prev_end} != {next_start}")]
    DiscontiguousSegments {
        index: usize,
        prev_end: f64,
        next_start: f64,
    },

    #[error("Invalid time span: start {start} must be before end {end}")]
    InvalidTimeSpan { start: f64, end: f64 },

    #[error("Empty spline")]
    EmptySpline,

    #[error("Trajectory timestamps must be strictly increasing (index {index})")]
    NonMonotonicTimestamps { index: usize },

    #[error("Trajectory has no points")]
    EmptyTrajectory,
}
