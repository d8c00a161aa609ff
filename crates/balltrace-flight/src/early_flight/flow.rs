//! Sparse optical-flow ball tracker.
//!
//! Feature points are seeded in a small window around the ball and
//! tracked frame to frame with Lucas-Kanade. Only points whose motion
//! direction agrees with the median direction count; the ball estimate is
//! their centroid and the step confidence is the consistent fraction.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::validation::angle_between;
use crate::error::FlightResult;
use crate::source::FrameSource;
use crate::vision::{good_features, to_gray, track_points, LucasKanadeConfig, Region};

/// Optical-flow tracker tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowTrackerConfig {
    /// Half-size of the seeding window around the ball (px)
    pub seed_radius: f64,
    pub max_features: usize,
    /// FAST intensity threshold for seed corners
    pub fast_threshold: u8,
    pub quality_level: f64,
    pub min_feature_distance: f64,
    /// Allowed deviation from the median direction (deg)
    pub direction_tolerance_deg: f64,
    /// Displacements shorter than this carry no direction (px)
    pub min_motion_px: f64,
    /// Stop once fewer points than this stay consistent
    pub min_consistent_points: usize,
    pub lucas_kanade: LucasKanadeConfig,
}

impl Default for FlowTrackerConfig {
    fn default() -> Self {
        Self {
            seed_radius: 8.0,
            max_features: 20,
            fast_threshold: 20,
            quality_level: 0.05,
            min_feature_distance: 2.0,
            direction_tolerance_deg: 30.0,
            min_motion_px: 0.5,
            min_consistent_points: 2,
            lucas_kanade: LucasKanadeConfig::default(),
        }
    }
}

/// One tracked ball position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowStep {
    pub frame_index: usize,
    pub x: f64,
    pub y: f64,
    /// Fraction of tracked points moving consistently
    pub confidence: f64,
}

/// Lucas-Kanade ball tracker.
#[derive(Debug, Clone, Default)]
pub struct FlowTracker {
    config: FlowTrackerConfig,
}

impl FlowTracker {
    pub fn new(config: FlowTrackerConfig) -> Self {
        Self { config }
    }

    /// Track the ball from `(x, y)` at `start_frame` for up to `max_frames`.
    pub fn track(
        &self,
        frames: &dyn FrameSource,
        start_frame: usize,
        x: f64,
        y: f64,
        max_frames: usize,
    ) -> FlightResult<Vec<FlowStep>> {
        let c = &self.config;
        let meta = frames.metadata();
        let Some(first) = frames.frame(start_frame)? else {
            return Ok(Vec::new());
        };

        let mut prev = to_gray(&first);
        let (mut bx, mut by) = (x, y);
        let mut steps = Vec::new();

        for offset in 1..=max_frames {
            let frame_index = start_frame + offset;
            let Some(frame) = frames.frame(frame_index)? else {
                break;
            };
            let cur = to_gray(&frame);

            let region = Region::around(bx, by, c.seed_radius, meta.width, meta.height);
            let seeds = good_features(
                &prev,
                region,
                c.max_features,
                c.fast_threshold,
                c.quality_level,
                c.min_feature_distance,
            );
            if seeds.len() < c.min_consistent_points {
                debug!(frame_index, seeds = seeds.len(), "Too few flow features");
                break;
            }

            let tracked = track_points(&prev, &cur, &seeds, &c.lucas_kanade);
            let Some((cx, cy, consistent)) = self.consistent_centroid(&seeds, &tracked) else {
                break;
            };
            if consistent < c.min_consistent_points {
                break;
            }

            let confidence = consistent as f64 / seeds.len() as f64;
            // Shift the ball estimate by the mean consistent displacement
            bx += cx;
            by += cy;
            steps.push(FlowStep {
                frame_index,
                x: bx,
                y: by,
                confidence,
            });
            prev = cur;
        }

        Ok(steps)
    }

    /// Mean displacement of points within the direction tolerance of the
    /// median direction, with their count.
    fn consistent_centroid(
        &self,
        seeds: &[(f64, f64)],
        tracked: &[Option<(f64, f64)>],
    ) -> Option<(f64, f64, usize)> {
        let moves: Vec<(f64, f64)> = seeds
            .iter()
            .zip(tracked)
            .filter_map(|(s, t)| t.map(|(tx, ty)| (tx - s.0, ty - s.1)))
            .filter(|(dx, dy)| (dx * dx + dy * dy).sqrt() >= self.config.min_motion_px)
            .collect();
        if moves.is_empty() {
            return None;
        }

        let mut angles: Vec<f64> = moves.iter().map(|(dx, dy)| dy.atan2(*dx)).collect();
        angles.sort_by(|a, b| a.total_cmp(b));
        let median = angles[angles.len() / 2];
        let median_dir = (median.cos(), median.sin());

        let consistent: Vec<&(f64, f64)> = moves
            .iter()
            .filter(|m| angle_between(**m, median_dir) <= self.config.direction_tolerance_deg)
            .collect();
        if consistent.is_empty() {
            return None;
        }

        let n = consistent.len() as f64;
        let dx = consistent.iter().map(|m| m.0).sum::<f64>() / n;
        let dy = consistent.iter().map(|m| m.1).sum::<f64>() / n;
        Some((dx, dy, consistent.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::VideoMetadata;
    use crate::test_support::fill_disc;
    use image::{Rgb, RgbImage};

    /// Ball drifting up 2 px per frame.
    struct Drifting;

    impl FrameSource for Drifting {
        fn metadata(&self) -> VideoMetadata {
            VideoMetadata {
                fps: 30.0,
                width: 80,
                height: 80,
                duration: 1.0,
            }
        }

        fn frame_at(&self, timestamp: f64) -> FlightResult<Option<RgbImage>> {
            let idx = self.metadata().frame_index(timestamp);
            let mut img = RgbImage::from_pixel(80, 80, Rgb([60, 140, 60]));
            fill_disc(&mut img, 40.0, 60.0 - 2.0 * idx as f64, 4.0, Rgb([240, 240, 240]));
            Ok(Some(img))
        }
    }

    #[test]
    fn test_follows_rising_ball() {
        let steps = FlowTracker::default().track(&Drifting, 0, 40.0, 60.0, 5).unwrap();
        assert!(!steps.is_empty());
        let last = steps.last().unwrap();
        let expected_y = 60.0 - 2.0 * last.frame_index as f64;
        assert!((last.x - 40.0).abs() < 1.5, "x = {}", last.x);
        assert!((last.y - expected_y).abs() < 1.5, "y = {} vs {}", last.y, expected_y);
        assert!(steps.iter().all(|s| s.confidence > 0.0 && s.confidence <= 1.0));
    }

    #[test]
    fn test_static_scene_stops() {
        let flat = crate::test_support::IndexedFrames::new(80, 80, 30.0, 1.0);
        let steps = FlowTracker::default().track(&flat, 0, 40.0, 40.0, 5).unwrap();
        assert!(steps.is_empty());
    }
}
