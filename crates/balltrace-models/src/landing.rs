//! Landing estimates.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Estimator that produced a landing candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LandingMethod {
    /// Low-frequency "thud" transient after the strike.
    Audio,
    /// Ball left the frame or dropped into the ground band.
    FrameExit,
    /// Closed-form projectile flight time.
    Physics,
}

impl LandingMethod {
    /// Selection priority (higher wins).
    pub fn priority(&self) -> u8 {
        match self {
            LandingMethod::Audio => 3,
            LandingMethod::FrameExit => 2,
            LandingMethod::Physics => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LandingMethod::Audio => "audio",
            LandingMethod::FrameExit => "frame_exit",
            LandingMethod::Physics => "physics",
        }
    }
}

/// Screen edge the ball exited through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExitEdge {
    Left,
    Right,
    Top,
    Bottom,
    /// Descended into the near-ground band without leaving the frame.
    Ground,
}

/// One candidate landing event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LandingEstimate {
    /// Landing time in seconds from the start of the video.
    pub timestamp: f64,
    /// Normalized landing x.
    pub x: f64,
    /// Normalized landing y.
    pub y: f64,
    /// Estimator confidence (0-1).
    pub confidence: f64,
    pub method: LandingMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_edge: Option<ExitEdge>,
}
