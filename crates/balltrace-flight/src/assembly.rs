//! Trajectory assembly: merge sparse detections into one smoothed,
//! normalized trajectory.

use balltrace_models::{AssembledTrajectory, TrajectoryMethod, TrajectoryPoint};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FlightError, FlightResult};

/// Assembly tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyConfig {
    /// Largest gap (missing frames) that is filled by interpolation
    pub max_gap_frames: usize,
    /// Minimum detected + interpolated points for a trajectory
    pub min_points: usize,
    /// Confidence-weighted moving-average window (odd)
    pub smoothing_window: usize,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            max_gap_frames: 5,
            min_points: 6,
            smoothing_window: 5,
        }
    }
}

/// One ball detection in frame pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameDetection {
    pub frame_index: usize,
    pub x: f64,
    pub y: f64,
    pub confidence: f64,
}

impl FrameDetection {
    pub fn new(frame_index: usize, x: f64, y: f64, confidence: f64) -> Self {
        Self {
            frame_index,
            x,
            y,
            confidence,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct RawPoint {
    frame: usize,
    x: f64,
    y: f64,
    confidence: f64,
    interpolated: bool,
}

/// Builds [`AssembledTrajectory`] values from per-frame detections.
#[derive(Debug, Clone, Default)]
pub struct TrajectoryAssembler {
    config: AssemblyConfig,
}

impl TrajectoryAssembler {
    pub fn new(config: AssemblyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AssemblyConfig {
        &self.config
    }

    /// Assemble detections into a trajectory.
    ///
    /// `no_detection_frames` lists frames that were searched without a
    /// hit; they are never interpolated across beyond `max_gap_frames`.
    /// Fails with [`FlightError::InsufficientPoints`] below `min_points`.
    pub fn assemble(
        &self,
        detections: &[FrameDetection],
        no_detection_frames: &[usize],
        fps: f64,
        width: u32,
        height: u32,
        method: TrajectoryMethod,
    ) -> FlightResult<AssembledTrajectory> {
        if fps <= 0.0 || width == 0 || height == 0 {
            return Err(FlightError::invalid_input(format!(
                "assembly needs positive fps and frame size, got fps={fps} {width}x{height}"
            )));
        }

        let mut sorted: Vec<FrameDetection> = detections.to_vec();
        sorted.sort_by(|a, b| {
            a.frame_index
                .cmp(&b.frame_index)
                .then(b.confidence.total_cmp(&a.confidence))
        });
        // Keep the most confident detection per frame
        sorted.dedup_by_key(|d| d.frame_index);

        let (points, gap_count) = self.fill_gaps(&sorted);

        if points.len() < self.config.min_points {
            debug!(
                points = points.len(),
                required = self.config.min_points,
                missed = no_detection_frames.len(),
                "Trajectory assembly rejected"
            );
            return Err(FlightError::InsufficientPoints {
                required: self.config.min_points,
                actual: points.len(),
            });
        }

        let smoothed = self.smooth(&points);

        let mut out: Vec<TrajectoryPoint> = smoothed
            .iter()
            .map(|p| TrajectoryPoint {
                timestamp: p.frame as f64 / fps,
                x: p.x / width as f64,
                y: p.y / height as f64,
                confidence: p.confidence,
                interpolated: p.interpolated,
                vx: 0.0,
                vy: 0.0,
            })
            .collect();
        compute_velocities(&mut out);

        let trajectory = AssembledTrajectory::from_points(out, gap_count, method)?;
        debug!(
            points = trajectory.len(),
            gaps = gap_count,
            interpolated = trajectory.interpolated_count(),
            method = method.as_str(),
            "Trajectory assembled"
        );
        Ok(trajectory)
    }

    /// Linearly interpolate position and confidence across short gaps.
    ///
    /// Returns the filled points and the number of gaps seen.
    fn fill_gaps(&self, sorted: &[FrameDetection]) -> (Vec<RawPoint>, usize) {
        let mut points = Vec::with_capacity(sorted.len());
        let mut gap_count = 0;

        for (i, det) in sorted.iter().enumerate() {
            if i > 0 {
                let prev = &sorted[i - 1];
                let missing = det.frame_index - prev.frame_index - 1;
                if missing > 0 {
                    gap_count += 1;
                }
                if missing > 0 && missing <= self.config.max_gap_frames {
                    let span = (missing + 1) as f64;
                    for k in 1..=missing {
                        let t = k as f64 / span;
                        points.push(RawPoint {
                            frame: prev.frame_index + k,
                            x: prev.x + (det.x - prev.x) * t,
                            y: prev.y + (det.y - prev.y) * t,
                            confidence: prev.confidence + (det.confidence - prev.confidence) * t,
                            interpolated: true,
                        });
                    }
                }
            }
            points.push(RawPoint {
                frame: det.frame_index,
                x: det.x,
                y: det.y,
                confidence: det.confidence,
                interpolated: false,
            });
        }

        (points, gap_count)
    }

    /// Confidence-weighted moving average over positions.
    fn smooth(&self, points: &[RawPoint]) -> Vec<RawPoint> {
        let half = self.config.smoothing_window / 2;
        if half == 0 {
            return points.to_vec();
        }

        (0..points.len())
            .map(|i| {
                let lo = i.saturating_sub(half);
                let hi = (i + half).min(points.len() - 1);
                let (mut sx, mut sy, mut sw) = (0.0, 0.0, 0.0);
                for p in &points[lo..=hi] {
                    let w = p.confidence.max(1e-6);
                    sx += p.x * w;
                    sy += p.y * w;
                    sw += w;
                }
                RawPoint {
                    x: sx / sw,
                    y: sy / sw,
                    ..points[i]
                }
            })
            .collect()
    }
}

/// Finite-difference velocities (central inside, one-sided at the ends).
pub(crate) fn compute_velocities(points: &mut [TrajectoryPoint]) {
    let n = points.len();
    if n < 2 {
        return;
    }
    for i in 0..n {
        let (a, b) = match i {
            0 => (0, 1),
            _ if i == n - 1 => (n - 2, n - 1),
            _ => (i - 1, i + 1),
        };
        let dt = points[b].timestamp - points[a].timestamp;
        if dt > 0.0 {
            points[i].vx = (points[b].x - points[a].x) / dt;
            points[i].vy = (points[b].y - points[a].y) / dt;
        }
    }
}
