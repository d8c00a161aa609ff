use balltrace_models::ShotShape;
use serde::{Deserialize, Serialize};

use super::PhysicsConfig;
use crate::error::{FlightError, FlightResult};

/// Initial-flight characteristics extracted from early detections.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaunchParameters {
    /// First detection, normalized
    pub origin_x: f64,
    pub origin_y: f64,
    /// Vertical launch angle, clamped to the configured range
    pub launch_angle_deg: f64,
    /// Horizontal start direction, positive to the right
    pub lateral_angle_deg: f64,
    /// On-screen speed (normalized/s)
    pub initial_speed: f64,
    /// Rate of change of lateral velocity (normalized/s^2), positive right
    pub curve_rate: f64,
    /// Estimated flight time (s)
    pub flight_time: f64,
    pub shot_shape: ShotShape,
}

impl LaunchParameters {
    /// Extract launch parameters from `(timestamp, x, y)` samples in
    /// normalized coordinates, ordered by time.
    pub fn from_detections(points: &[(f64, f64, f64)], config: &PhysicsConfig) -> FlightResult<Self> {
        if points.len() < 2 {
            return Err(FlightError::InsufficientPoints {
                required: 2,
                actual: points.len(),
            });
        }
        if points.windows(2).any(|w| w[1].0 <= w[0].0) {
            return Err(FlightError::invalid_input(
                "launch detections must have strictly increasing timestamps",
            ));
        }

        let ts: Vec<f64> = points.iter().map(|p| p.0).collect();
        let xs: Vec<f64> = points.iter().map(|p| p.1).collect();
        let ys: Vec<f64> = points.iter().map(|p| p.2).collect();
        let vx = linear_slope(&ts, &xs);
        // Screen y grows downward
        let vy_up = -linear_slope(&ts, &ys);

        let raw_angle = vy_up.atan2(vx.abs()).to_degrees();
        let launch_angle_deg = (raw_angle * config.dtl_angle_scale)
            .clamp(config.min_launch_angle_deg, config.max_launch_angle_deg);
        let lateral_angle_deg = vx.atan2(vy_up.max(1e-9)).to_degrees();

        // Curve rate from the drift of per-step lateral velocity
        let curve_rate = if points.len() >= 3 {
            let mids: Vec<f64> = points.windows(2).map(|w| (w[0].0 + w[1].0) / 2.0).collect();
            let step_vx: Vec<f64> = points
                .windows(2)
                .map(|w| (w[1].1 - w[0].1) / (w[1].0 - w[0].0))
                .collect();
            linear_slope(&mids, &step_vx)
        } else {
            0.0
        };

        let initial_speed = (vx * vx + vy_up * vy_up).sqrt();
        let v0 = initial_speed * config.launch_speed_scale;
        let flight_time = (2.0 * v0 * launch_angle_deg.to_radians().sin() / config.gravity)
            .clamp(config.min_flight_time, config.max_flight_time);

        Ok(Self {
            origin_x: xs[0],
            origin_y: ys[0],
            launch_angle_deg,
            lateral_angle_deg,
            initial_speed,
            curve_rate,
            flight_time,
            shot_shape: classify_shot_shape(lateral_angle_deg, curve_rate, config),
        })
    }

    /// Straight launch from a normalized origin with the configured default
    /// angle and speed, for strikes where no flight was observed.
    pub fn default_from_origin(origin_x: f64, origin_y: f64, config: &PhysicsConfig) -> Self {
        let launch_angle_deg = config
            .default_launch_angle_deg
            .clamp(config.min_launch_angle_deg, config.max_launch_angle_deg);
        let v0 = config.default_screen_speed * config.launch_speed_scale;
        let flight_time = (2.0 * v0 * launch_angle_deg.to_radians().sin() / config.gravity)
            .clamp(config.min_flight_time, config.max_flight_time);

        Self {
            origin_x,
            origin_y,
            launch_angle_deg,
            lateral_angle_deg: 0.0,
            initial_speed: config.default_screen_speed,
            curve_rate: 0.0,
            flight_time,
            shot_shape: ShotShape::Straight,
        }
    }

    /// Launch speed in physics units.
    pub fn launch_speed(&self, config: &PhysicsConfig) -> f64 {
        self.initial_speed * config.launch_speed_scale
    }
}

/// Classify draw/fade/straight from start direction and curvature.
///
/// The straight band is inclusive: exactly `±straight_threshold_deg` is
/// straight.
pub fn classify_shot_shape(lateral_angle_deg: f64, curve_rate: f64, config: &PhysicsConfig) -> ShotShape {
    let combined = lateral_angle_deg + curve_rate * config.curve_rate_weight;
    if combined.abs() <= config.straight_threshold_deg {
        ShotShape::Straight
    } else if combined < 0.0 {
        ShotShape::Draw
    } else {
        ShotShape::Fade
    }
}

/// Least-squares slope of `ys` against `xs`.
fn linear_slope(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len() as f64;
    let mx = xs.iter().sum::<f64>() / n;
    let my = ys.iter().sum::<f64>() / n;
    let num: f64 = xs.iter().zip(ys).map(|(x, y)| (x - mx) * (y - my)).sum();
    let den: f64 = xs.iter().map(|x| (x - mx).powi(2)).sum();
    if den.abs() < 1e-15 {
        0.0
    } else {
        num / den
    }
}
