use serde::{Deserialize, Serialize};

use crate::assembly::FrameDetection;

/// One per-frame blob or feature match.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionCandidate {
    pub frame_index: usize,
    pub timestamp: f64,
    pub x: f64,
    pub y: f64,
    pub color_score: f64,
    pub motion_score: f64,
    pub physics_score: f64,
    pub combined_score: f64,
}

/// How a track was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackSource {
    /// Frame differencing at the given expansion level
    FrameDiff { level: usize },
    OpticalFlow,
}

/// Ordered candidates believed to be one ball.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    candidates: Vec<DetectionCandidate>,
    /// Pixels per second, least-squares over the track
    velocity: (f64, f64),
    source: TrackSource,
}

impl Track {
    /// Minimum length for a track to carry a confidence.
    pub const MIN_SCORED_LEN: usize = 3;

    pub fn new(candidates: Vec<DetectionCandidate>, source: TrackSource) -> Self {
        let velocity = estimate_velocity(&candidates);
        Self {
            candidates,
            velocity,
            source,
        }
    }

    pub fn candidates(&self) -> &[DetectionCandidate] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn velocity(&self) -> (f64, f64) {
        self.velocity
    }

    pub fn source(&self) -> TrackSource {
        self.source
    }

    /// Mean combined score; `None` for tracks shorter than three.
    pub fn confidence(&self) -> Option<f64> {
        if self.candidates.len() < Self::MIN_SCORED_LEN {
            return None;
        }
        let sum: f64 = self.candidates.iter().map(|c| c.combined_score).sum();
        Some((sum / self.candidates.len() as f64).clamp(0.0, 1.0))
    }

    /// Candidates as pixel detections for refinement and assembly.
    pub fn detections(&self) -> Vec<FrameDetection> {
        self.candidates
            .iter()
            .map(|c| FrameDetection::new(c.frame_index, c.x, c.y, c.combined_score))
            .collect()
    }

    /// Samples as normalized `(timestamp, x, y)`.
    pub fn normalized(&self, width: u32, height: u32) -> Vec<(f64, f64, f64)> {
        self.candidates
            .iter()
            .map(|c| (c.timestamp, c.x / width as f64, c.y / height as f64))
            .collect()
    }
}

fn estimate_velocity(candidates: &[DetectionCandidate]) -> (f64, f64) {
    if candidates.len() < 2 {
        return (0.0, 0.0);
    }
    let n = candidates.len() as f64;
    let mt = candidates.iter().map(|c| c.timestamp).sum::<f64>() / n;
    let mx = candidates.iter().map(|c| c.x).sum::<f64>() / n;
    let my = candidates.iter().map(|c| c.y).sum::<f64>() / n;
    let den: f64 = candidates.iter().map(|c| (c.timestamp - mt).powi(2)).sum();
    if den < 1e-15 {
        return (0.0, 0.0);
    }
    let sx: f64 = candidates.iter().map(|c| (c.timestamp - mt) * (c.x - mx)).sum();
    let sy: f64 = candidates.iter().map(|c| (c.timestamp - mt) * (c.y - my)).sum();
    (sx / den, sy / den)
}

#[cfg(test)]
pub(crate) fn candidate(frame_index: usize, x: f64, y: f64) -> DetectionCandidate {
    DetectionCandidate {
        frame_index,
        timestamp: frame_index as f64 / 30.0,
        x,
        y,
        color_score: 1.0,
        motion_score: 1.0,
        physics_score: 1.0,
        combined_score: 0.9,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_confidence_requires_three_points() {
        let short = Track::new(
            vec![candidate(0, 0.0, 0.0), candidate(1, 0.0, -10.0)],
            TrackSource::OpticalFlow,
        );
        assert_eq!(short.confidence(), None);

        let long = Track::new(
            (0..4).map(|i| candidate(i, 0.0, -10.0 * i as f64)).collect(),
            TrackSource::FrameDiff { level: 0 },
        );
        assert_relative_eq!(long.confidence().unwrap(), 0.9);
    }

    #[test]
    fn test_velocity_in_pixels_per_second() {
        let track = Track::new(
            (0..5).map(|i| candidate(i, 2.0 * i as f64, -10.0 * i as f64)).collect(),
            TrackSource::FrameDiff { level: 0 },
        );
        let (vx, vy) = track.velocity();
        assert_relative_eq!(vx, 60.0, epsilon = 1e-9);
        assert_relative_eq!(vy, -300.0, epsilon = 1e-9);
    }
}
