//! Launch-parameter extraction, projectile extrapolation and the
//! down-the-line camera model.
//!
//! All quantities are in normalized screen units. Gravity and the speed
//! and depth scales are empirical tuning values chosen for visually
//! plausible tracers, not metric physics.

mod launch;
mod perspective;
mod projectile;

pub use launch::{classify_shot_shape, LaunchParameters};
pub use perspective::{PerspectiveCamera, PerspectiveConfig};
pub use projectile::{Point3, ProjectileModel, Trajectory3D};

use serde::{Deserialize, Serialize};

/// Physics tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Gravity in normalized height units per s^2
    pub gravity: f64,
    /// Maps the steep on-screen launch direction of a DTL view to a
    /// plausible vertical launch angle
    pub dtl_angle_scale: f64,
    pub min_launch_angle_deg: f64,
    pub max_launch_angle_deg: f64,
    /// Launch angle assumed when no flight was observed (deg)
    pub default_launch_angle_deg: f64,
    /// Screen speed assumed when no flight was observed (normalized/s)
    pub default_screen_speed: f64,
    /// Screen speed (normalized/s) to launch speed multiplier
    pub launch_speed_scale: f64,
    /// |lateral + curve_rate * weight| at or below this is straight (deg)
    pub straight_threshold_deg: f64,
    /// Degrees of lateral angle per unit curve rate
    pub curve_rate_weight: f64,
    /// Lateral curve acceleration for draw/fade (normalized/s^2)
    pub curve_acceleration: f64,
    pub min_flight_time: f64,
    pub max_flight_time: f64,
    /// Minimum apex height so short shots still draw a visible arc
    pub min_apex_height: f64,
    pub max_apex_height: f64,
    /// Launch speed to depth-travel multiplier
    pub depth_scale: f64,
    pub max_depth: f64,
    /// Sampling rate of generated trajectories
    pub sample_fps: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 2.0,
            dtl_angle_scale: 0.35,
            min_launch_angle_deg: 5.0,
            max_launch_angle_deg: 45.0,
            default_launch_angle_deg: 14.0,
            default_screen_speed: 0.6,
            launch_speed_scale: 2.5,
            straight_threshold_deg: 2.0,
            curve_rate_weight: 10.0,
            curve_acceleration: 0.04,
            min_flight_time: 1.5,
            max_flight_time: 7.0,
            min_apex_height: 0.15,
            max_apex_height: 0.8,
            depth_scale: 0.6,
            max_depth: 6.0,
            sample_fps: 30.0,
        }
    }
}
