//! Coarse shot-type classification from the assembled flight.

use balltrace_models::{AssembledTrajectory, ShotType};
use serde::{Deserialize, Serialize};

/// Shot-type thresholds, in normalized screen units.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShotTypeConfig {
    /// Largest apex rise above the origin still counted as a putt
    pub putt_max_rise: f64,
    /// Largest apex rise still counted as a chip
    pub chip_max_rise: f64,
    /// Shorter visible flights are chips regardless of rise (s)
    pub min_full_swing_duration: f64,
}

impl Default for ShotTypeConfig {
    fn default() -> Self {
        Self {
            putt_max_rise: 0.03,
            chip_max_rise: 0.15,
            min_full_swing_duration: 1.0,
        }
    }
}

/// Classify a shot from its trajectory.
///
/// Rise is measured from `origin_y` (normalized) when known, otherwise
/// from the first trajectory point.
pub fn classify_shot_type(
    trajectory: Option<&AssembledTrajectory>,
    origin_y: Option<f64>,
    config: &ShotTypeConfig,
) -> ShotType {
    let Some(traj) = trajectory else {
        return ShotType::Unknown;
    };
    let Some(first) = traj.points().first() else {
        return ShotType::Unknown;
    };

    let base_y = origin_y.unwrap_or(first.y);
    let rise = base_y - traj.apex().y;

    if rise < config.putt_max_rise {
        ShotType::Putt
    } else if rise < config.chip_max_rise || traj.duration() < config.min_full_swing_duration {
        ShotType::Chip
    } else {
        ShotType::FullSwing
    }
}
