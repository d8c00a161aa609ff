//! Assembled flight trajectories.
//!
//! An [`AssembledTrajectory`] is the merged, smoothed, normalized flight
//! path of one shot. Its summary fields (time span, apex, distance,
//! average confidence) are derived from the points at construction and
//! cannot drift from them afterwards.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::spline::TrajectorySpline;

/// One normalized flight sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TrajectoryPoint {
    /// Time in seconds from the start of the video.
    pub timestamp: f64,
    /// Normalized x (0 = left, 1 = right).
    pub x: f64,
    /// Normalized y (0 = top, 1 = bottom).
    pub y: f64,
    /// Confidence of the underlying detection (0-1).
    pub confidence: f64,
    /// True when the point was filled in between two detections.
    pub interpolated: bool,
    /// Normalized x velocity (units per second).
    #[serde(default)]
    pub vx: f64,
    /// Normalized y velocity (units per second).
    #[serde(default)]
    pub vy: f64,
}

impl TrajectoryPoint {
    /// Create a detected (non-interpolated) point with zero velocity.
    pub fn new(timestamp: f64, x: f64, y: f64, confidence: f64) -> Self {
        Self {
            timestamp,
            x,
            y,
            confidence,
            interpolated: false,
            vx: 0.0,
            vy: 0.0,
        }
    }

    /// Euclidean distance to another point in normalized units.
    pub fn distance_to(&self, other: &TrajectoryPoint) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Source of the points in an assembled trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TrajectoryMethod {
    /// Early-flight seed refined frame by frame with the Kalman estimator.
    KalmanRefined,
    /// Early-flight seed extrapolated with the projectile model.
    PhysicsExtrapolated,
    /// Longer-window clustering of raw detections.
    FlightScan,
    /// Early-flight seed only.
    EarlyFlight,
}

impl TrajectoryMethod {
    /// Returns the method name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            TrajectoryMethod::KalmanRefined => "kalman_refined",
            TrajectoryMethod::PhysicsExtrapolated => "physics_extrapolated",
            TrajectoryMethod::FlightScan => "flight_scan",
            TrajectoryMethod::EarlyFlight => "early_flight",
        }
    }
}

/// Final merged and smoothed flight path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AssembledTrajectory {
    points: Vec<TrajectoryPoint>,
    start_time: f64,
    end_time: f64,
    avg_confidence: f64,
    gap_count: usize,
    apex_index: usize,
    total_distance: f64,
    method: TrajectoryMethod,
}

impl AssembledTrajectory {
    /// Build a trajectory from ordered points, deriving all summary fields.
    ///
    /// Fails when `points` is empty or timestamps are not strictly increasing.
    pub fn from_points(
        points: Vec<TrajectoryPoint>,
        gap_count: usize,
        method: TrajectoryMethod,
    ) -> ModelResult<Self> {
        let (first, last) = match (points.first(), points.last()) {
            (Some(first), Some(last)) => (first.timestamp, last.timestamp),
            _ => return Err(ModelError::EmptyTrajectory),
        };

        if let Some(index) = points
            .windows(2)
            .position(|w| w[1].timestamp <= w[0].timestamp)
        {
            return Err(ModelError::NonMonotonicTimestamps { index: index + 1 });
        }

        let detected: Vec<f64> = points
            .iter()
            .filter(|p| !p.interpolated)
            .map(|p| p.confidence)
            .collect();
        let avg_confidence = if detected.is_empty() {
            0.0
        } else {
            detected.iter().sum::<f64>() / detected.len() as f64
        };

        // First occurrence of the minimum y (highest point on screen)
        let apex_index = points
            .iter()
            .enumerate()
            .fold(0, |best, (i, p)| if p.y < points[best].y { i } else { best });

        let total_distance = points.windows(2).map(|w| w[0].distance_to(&w[1])).sum();

        Ok(Self {
            points,
            start_time: first,
            end_time: last,
            avg_confidence,
            gap_count,
            apex_index,
            total_distance,
            method,
        })
    }

    pub fn points(&self) -> &[TrajectoryPoint] {
        &self.points
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn end_time(&self) -> f64 {
        self.end_time
    }

    /// Average confidence over detected (non-interpolated) points.
    pub fn avg_confidence(&self) -> f64 {
        self.avg_confidence
    }

    pub fn gap_count(&self) -> usize {
        self.gap_count
    }

    /// Index of the highest point on screen (minimum y).
    pub fn apex_index(&self) -> usize {
        self.apex_index
    }

    pub fn apex(&self) -> &TrajectoryPoint {
        &self.points[self.apex_index]
    }

    /// Path length in normalized units.
    pub fn total_distance(&self) -> f64 {
        self.total_distance
    }

    pub fn method(&self) -> TrajectoryMethod {
        self.method
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// Number of interpolated points.
    pub fn interpolated_count(&self) -> usize {
        self.points.iter().filter(|p| p.interpolated).count()
    }
}

/// Trajectory data handed to storage and the tracer renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TrajectoryPayload {
    pub trajectory: AssembledTrajectory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spline: Option<TrajectorySpline>,
    pub frame_width: u32,
    pub frame_height: u32,
    pub fps: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(t: f64, x: f64, y: f64) -> TrajectoryPoint {
        TrajectoryPoint::new(t, x, y, 0.8)
    }

    #[test]
    fn test_summary_fields() {
        let mut interp = point(0.2, 0.5, 0.4);
        interp.interpolated = true;
        interp.confidence = 0.1;
        let points = vec![point(0.0, 0.5, 0.8), point(0.1, 0.5, 0.5), interp, point(0.3, 0.5, 0.6)];

        let traj =
            AssembledTrajectory::from_points(points, 1, TrajectoryMethod::KalmanRefined).unwrap();

        assert_eq!(traj.apex_index(), 2);
        assert!((traj.avg_confidence() - 0.8).abs() < 1e-12);
        assert!((traj.total_distance() - 0.6).abs() < 1e-12);
        assert!((traj.duration() - 0.3).abs() < 1e-12);
        assert_eq!(traj.interpolated_count(), 1);
    }

    #[test]
    fn test_rejects_non_increasing_timestamps() {
        let points = vec![point(0.0, 0.1, 0.1), point(0.0, 0.2, 0.2)];
        let err = AssembledTrajectory::from_points(points, 0, TrajectoryMethod::FlightScan);
        assert!(matches!(err, Err(ModelError::NonMonotonicTimestamps { index: 1 })));
    }

    #[test]
    fn test_rejects_empty() {
        let err = AssembledTrajectory::from_points(Vec::new(), 0, TrajectoryMethod::FlightScan);
        assert!(matches!(err, Err(ModelError::EmptyTrajectory)));
    }
}
