//! Time-parameterized cubic Bezier splines for tracer rendering.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Tolerance for segment time contiguity checks.
const TIME_EPSILON: f64 = 1e-9;

/// 2D point in normalized screen units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point2) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// One cubic Bezier segment spanning `[t_start, t_end]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BezierCurve {
    /// Control points p0..p3; the curve passes through p0 and p3.
    pub control_points: [Point2; 4],
    pub t_start: f64,
    pub t_end: f64,
}

impl BezierCurve {
    pub fn new(control_points: [Point2; 4], t_start: f64, t_end: f64) -> ModelResult<Self> {
        if t_end <= t_start {
            return Err(ModelError::InvalidTimeSpan {
                start: t_start,
                end: t_end,
            });
        }
        Ok(Self {
            control_points,
            t_start,
            t_end,
        })
    }

    pub fn duration(&self) -> f64 {
        self.t_end - self.t_start
    }

    /// Evaluate at curve parameter `u` in [0, 1].
    pub fn evaluate(&self, u: f64) -> Point2 {
        let u = u.clamp(0.0, 1.0);
        let v = 1.0 - u;
        let b0 = v * v * v;
        let b1 = 3.0 * v * v * u;
        let b2 = 3.0 * v * u * u;
        let b3 = u * u * u;
        let [p0, p1, p2, p3] = self.control_points;
        Point2::new(
            b0 * p0.x + b1 * p1.x + b2 * p2.x + b3 * p3.x,
            b0 * p0.y + b1 * p1.y + b2 * p2.y + b3 * p3.y,
        )
    }

    /// Evaluate at absolute time `t`.
    pub fn point_at_time(&self, t: f64) -> Point2 {
        self.evaluate((t - self.t_start) / self.duration())
    }

    /// Velocity (d/dt) at absolute time `t`.
    pub fn velocity_at_time(&self, t: f64) -> Point2 {
        let u = ((t - self.t_start) / self.duration()).clamp(0.0, 1.0);
        let v = 1.0 - u;
        let [p0, p1, p2, p3] = self.control_points;
        let scale = 3.0 / self.duration();
        let dx = v * v * (p1.x - p0.x) + 2.0 * v * u * (p2.x - p1.x) + u * u * (p3.x - p2.x);
        let dy = v * v * (p1.y - p0.y) + 2.0 * v * u * (p2.y - p1.y) + u * u * (p3.y - p2.y);
        Point2::new(dx * scale, dy * scale)
    }
}

/// Ordered, time-contiguous sequence of Bezier segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TrajectorySpline {
    segments: Vec<BezierCurve>,
}

impl TrajectorySpline {
    /// Build a spline, checking that segments join end-to-start in time.
    pub fn new(segments: Vec<BezierCurve>) -> ModelResult<Self> {
        if segments.is_empty() {
            return Err(ModelError::EmptySpline);
        }
        for (i, pair) in segments.windows(2).enumerate() {
            if (pair[0].t_end - pair[1].t_start).abs() > TIME_EPSILON {
                return Err(ModelError::DiscontiguousSegments {
                    index: i + 1,
                    prev_end: pair[0].t_end,
                    next_start: pair[1].t_start,
                });
            }
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[BezierCurve] {
        &self.segments
    }

    pub fn t_start(&self) -> f64 {
        self.segments[0].t_start
    }

    pub fn t_end(&self) -> f64 {
        self.segments[self.segments.len() - 1].t_end
    }

    /// Index of the segment owning time `t` (clamped to the spline span).
    pub fn segment_index(&self, t: f64) -> usize {
        // First segment whose end is >= t
        let idx = self.segments.partition_point(|s| s.t_end < t);
        idx.min(self.segments.len() - 1)
    }

    /// Evaluate the spline at absolute time `t` (clamped to the span).
    pub fn evaluate(&self, t: f64) -> Point2 {
        let t = t.clamp(self.t_start(), self.t_end());
        self.segments[self.segment_index(t)].point_at_time(t)
    }

    /// Uniformly resample at `fps`, always including both endpoints.
    pub fn resample(&self, fps: f64) -> Vec<(f64, Point2)> {
        let start = self.t_start();
        let end = self.t_end();
        let duration = end - start;
        let count = ((duration * fps.max(1.0)).ceil() as usize).max(1) + 1;
        let dt = duration / (count - 1) as f64;

        (0..count)
            .map(|i| {
                let t = if i == count - 1 { end } else { start + i as f64 * dt };
                (t, self.evaluate(t))
            })
            .collect()
    }
}
