//! Error types for flight reconstruction.
//!
//! Expected absence of signal (no origin, no track, too few points) is
//! reported through `Option` or tagged result enums, never through this
//! type. `FlightError` is reserved for contract violations, collaborator
//! failures and cancellation.

use thiserror::Error;

/// Result type for flight operations.
pub type FlightResult<T> = Result<T, FlightError>;

/// Errors that can occur during flight reconstruction.
#[derive(Debug, Error)]
pub enum FlightError {
    #[error("Kalman update called without a preceding predict")]
    NotPredicted,

    #[error("Kalman filter used before initialize")]
    NotInitialized,

    #[error("Input length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Insufficient points: need {required}, got {actual}")]
    InsufficientPoints { required: usize, actual: usize },

    #[error("Frame source failed: {0}")]
    FrameSource(String),

    #[error("Object detector failed: {0}")]
    Detector(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Stage '{stage}' failed: {source}")]
    Stage {
        stage: &'static str,
        #[source]
        source: Box<FlightError>,
    },

    #[error("Model error: {0}")]
    Model(#[from] balltrace_models::ModelError),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl FlightError {
    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Create a frame source failure error.
    pub fn frame_source(message: impl Into<String>) -> Self {
        Self::FrameSource(message.into())
    }

    /// Create an object detector failure error.
    pub fn detector(message: impl Into<String>) -> Self {
        Self::Detector(message.into())
    }

    /// Wrap an error with the name of the pipeline stage that raised it.
    ///
    /// Cancellation passes through unwrapped.
    pub fn in_stage(self, stage: &'static str) -> Self {
        match self {
            FlightError::Cancelled | FlightError::Stage { .. } => self,
            other => FlightError::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// Check if the error is a cancellation (possibly wrapped).
    pub fn is_cancelled(&self) -> bool {
        match self {
            FlightError::Cancelled => true,
            FlightError::Stage { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }

    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            FlightError::FrameSource(_) | FlightError::Detector(_) => true,
            FlightError::Stage { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    /// Name of the failing stage, if the error was wrapped.
    pub fn stage(&self) -> Option<&'static str> {
        match self {
            FlightError::Stage { stage, .. } => Some(stage),
            _ => None,
        }
    }
}
