//! Ball origin (address position) models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::rect::BoundingBox;

/// Method that produced an origin position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum OriginMethod {
    /// Object detector found the ball directly.
    BallDetection,
    /// Ball placed at the clubhead end of a detected club shaft.
    ShaftDetection,
    /// Ball offset from a bright clubhead blob.
    ClubheadDetection,
    /// Two methods agreed and their positions were averaged.
    Consensus,
}

impl OriginMethod {
    /// Selection priority (higher wins) when methods disagree.
    pub fn priority(&self) -> u8 {
        match self {
            OriginMethod::Consensus => 4,
            OriginMethod::BallDetection => 3,
            OriginMethod::ShaftDetection => 2,
            OriginMethod::ClubheadDetection => 1,
        }
    }

    /// Returns the method name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OriginMethod::BallDetection => "ball_detection",
            OriginMethod::ShaftDetection => "shaft_detection",
            OriginMethod::ClubheadDetection => "clubhead_detection",
            OriginMethod::Consensus => "consensus",
        }
    }
}

/// Ball position at address.
///
/// Only ever constructed from at least one successful detection method.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OriginPoint {
    /// X position in pixels
    pub x: f64,
    /// Y position in pixels
    pub y: f64,
    /// Localization confidence (0-1)
    pub confidence: f64,
    /// Method that produced the position
    pub method: OriginMethod,
    /// Golfer bounding box used to derive the search zone
    #[serde(skip_serializing_if = "Option::is_none")]
    pub golfer_bbox: Option<BoundingBox>,
}

impl OriginPoint {
    /// Normalized position for a frame of the given size.
    pub fn normalized(&self, width: u32, height: u32) -> (f64, f64) {
        (self.x / width.max(1) as f64, self.y / height.max(1) as f64)
    }
}
