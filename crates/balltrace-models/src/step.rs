//! Processing steps reported through progress callbacks.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Stage of per-shot processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStep {
    /// Reading the frame window around the strike
    Extracting,
    /// Localizing the ball at address
    LocalizingOrigin,
    /// Tracking the first frames of flight
    TrackingEarlyFlight,
    /// Refining or extrapolating the flight
    RefiningFlight,
    /// Estimating the landing
    EstimatingLanding,
    /// Assembling and smoothing the trajectory
    Assembling,
    /// Classifying the shot type
    Classifying,
    /// Emitting the shot record
    Emitting,
}

impl ProcessingStep {
    /// All steps in execution order.
    pub const ALL: &'static [ProcessingStep] = &[
        ProcessingStep::Extracting,
        ProcessingStep::LocalizingOrigin,
        ProcessingStep::TrackingEarlyFlight,
        ProcessingStep::RefiningFlight,
        ProcessingStep::EstimatingLanding,
        ProcessingStep::Assembling,
        ProcessingStep::Classifying,
        ProcessingStep::Emitting,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStep::Extracting => "extracting",
            ProcessingStep::LocalizingOrigin => "localizing_origin",
            ProcessingStep::TrackingEarlyFlight => "tracking_early_flight",
            ProcessingStep::RefiningFlight => "refining_flight",
            ProcessingStep::EstimatingLanding => "estimating_landing",
            ProcessingStep::Assembling => "assembling",
            ProcessingStep::Classifying => "classifying",
            ProcessingStep::Emitting => "emitting",
        }
    }

    /// Fixed percentage band `[start, end]` of this step within a shot.
    pub fn band(&self) -> (f64, f64) {
        match self {
            ProcessingStep::Extracting => (0.0, 10.0),
            ProcessingStep::LocalizingOrigin => (10.0, 25.0),
            ProcessingStep::TrackingEarlyFlight => (25.0, 45.0),
            ProcessingStep::RefiningFlight => (45.0, 65.0),
            ProcessingStep::EstimatingLanding => (65.0, 75.0),
            ProcessingStep::Assembling => (75.0, 90.0),
            ProcessingStep::Classifying => (90.0, 95.0),
            ProcessingStep::Emitting => (95.0, 100.0),
        }
    }
}

impl std::fmt::Display for ProcessingStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bands_are_contiguous() {
        let mut expected_start = 0.0;
        for step in ProcessingStep::ALL {
            let (start, end) = step.band();
            assert_eq!(start, expected_start, "{step} band starts late");
            assert!(end > start);
            expected_start = end;
        }
        assert_eq!(expected_start, 100.0);
    }
}
