//! Detected shot records.
//!
//! A [`DetectedShot`] is produced once per confirmed strike and is the
//! record surfaced to persistence and the API layer.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ModelError;
use crate::landing::LandingEstimate;
use crate::origin::OriginPoint;

/// Unique shot identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ShotId(pub Uuid);

impl ShotId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ShotId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ShotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lateral curvature of the ball flight (right-handed golfer, DTL view).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ShotShape {
    Straight,
    /// Curves right to left.
    Draw,
    /// Curves left to right.
    Fade,
}

impl ShotShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShotShape::Straight => "straight",
            ShotShape::Draw => "draw",
            ShotShape::Fade => "fade",
        }
    }

    /// Sign of the lateral curve acceleration (-1 left, +1 right).
    pub fn curve_sign(&self) -> f64 {
        match self {
            ShotShape::Straight => 0.0,
            ShotShape::Draw => -1.0,
            ShotShape::Fade => 1.0,
        }
    }
}

impl fmt::Display for ShotShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ShotShape {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "straight" => Ok(ShotShape::Straight),
            "draw" => Ok(ShotShape::Draw),
            "fade" => Ok(ShotShape::Fade),
            _ => Err(ModelError::UnknownShotShape(s.to_string())),
        }
    }
}

/// Coarse shot category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShotType {
    /// Full swing with a high, long flight.
    FullSwing,
    /// Short, low lofted shot.
    Chip,
    /// Ball rolls without leaving the ground.
    Putt,
    /// Not enough flight data to decide.
    #[default]
    Unknown,
}

impl ShotType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShotType::FullSwing => "full_swing",
            ShotType::Chip => "chip",
            ShotType::Putt => "putt",
            ShotType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ShotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ShotType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full_swing" | "full" => Ok(ShotType::FullSwing),
            "chip" => Ok(ShotType::Chip),
            "putt" => Ok(ShotType::Putt),
            "unknown" => Ok(ShotType::Unknown),
            _ => Err(ModelError::UnknownShotType(s.to_string())),
        }
    }
}

/// Final per-shot output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DetectedShot {
    pub id: ShotId,
    /// Strike time in seconds.
    pub strike_time: f64,
    /// Chosen landing time in seconds, if any estimate was available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub landing_time: Option<f64>,
    /// Clip start in seconds.
    pub clip_start: f64,
    /// Clip end in seconds.
    pub clip_end: f64,
    /// Product of the sub-confidences below.
    pub confidence: f64,
    /// Human-readable explanation of each confidence factor.
    pub confidence_reasons: Vec<String>,
    pub shot_type: ShotType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shot_shape: Option<ShotShape>,
    /// Confidence of the audio (or visual) strike.
    pub audio_confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trajectory_confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<OriginPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub landing: Option<LandingEstimate>,
}

impl DetectedShot {
    /// Whether a trajectory was reconstructed for this shot.
    pub fn has_trajectory(&self) -> bool {
        self.trajectory_confidence.is_some()
    }

    /// Clip duration in seconds.
    pub fn clip_duration(&self) -> f64 {
        (self.clip_end - self.clip_start).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_round_trip_names() {
        for shape in [ShotShape::Straight, ShotShape::Draw, ShotShape::Fade] {
            assert_eq!(shape.as_str().parse::<ShotShape>().unwrap(), shape);
        }
        assert!("hook".parse::<ShotShape>().is_err());
    }

    #[test]
    fn test_shot_type_aliases() {
        assert_eq!("FULL".parse::<ShotType>().unwrap(), ShotType::FullSwing);
        assert_eq!(ShotType::default(), ShotType::Unknown);
    }

    #[test]
    fn test_shot_serializes_snake_case() {
        let shot = DetectedShot {
            id: ShotId::new(),
            strike_time: 10.0,
            landing_time: None,
            clip_start: 8.0,
            clip_end: 16.0,
            confidence: 0.5,
            confidence_reasons: vec!["audio 0.50".to_string()],
            shot_type: ShotType::FullSwing,
            shot_shape: Some(ShotShape::Draw),
            audio_confidence: 0.5,
            origin_confidence: None,
            trajectory_confidence: None,
            origin: None,
            landing: None,
        };
        let json = serde_json::to_value(&shot).unwrap();
        assert_eq!(json["shot_type"], "full_swing");
        assert_eq!(json["shot_shape"], "draw");
        assert!(json.get("landing_time").is_none());
        assert!(!shot.has_trajectory());
        assert_eq!(shot.clip_duration(), 8.0);
    }
}
