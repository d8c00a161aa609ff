//! Frame-by-frame refinement of an early-flight seed with the Kalman
//! estimator and the ball detector.

use tracing::debug;

use crate::assembly::FrameDetection;
use crate::error::FlightResult;
use crate::kalman::{BallKalmanFilter, KalmanConfig};
use crate::source::{FrameSource, ObjectDetector};

/// Detections accepted by the refiner plus the frames searched without a hit.
#[derive(Debug, Clone, Default)]
pub struct RefinedTrack {
    /// Seed detections followed by gated detector hits
    pub detections: Vec<FrameDetection>,
    /// Frames where the detector produced nothing plausible
    pub missed_frames: Vec<usize>,
}

impl RefinedTrack {
    /// Number of detections added beyond the seed.
    pub fn extension_len(&self, seed_len: usize) -> usize {
        self.detections.len().saturating_sub(seed_len)
    }
}

/// Drives a [`BallKalmanFilter`] over frames following a seed track.
pub struct KalmanRefiner<'a> {
    config: &'a KalmanConfig,
    frames: &'a dyn FrameSource,
    detector: &'a dyn ObjectDetector,
}

impl<'a> KalmanRefiner<'a> {
    pub fn new(
        config: &'a KalmanConfig,
        frames: &'a dyn FrameSource,
        detector: &'a dyn ObjectDetector,
    ) -> Self {
        Self {
            config,
            frames,
            detector,
        }
    }

    /// Extend `seed` (pixel detections, ascending frames, at least two)
    /// until the ball is lost or leaves the frame.
    pub fn refine(&self, seed: &[FrameDetection]) -> FlightResult<RefinedTrack> {
        let meta = self.frames.metadata();
        let dt = meta.frame_interval();
        let mut track = RefinedTrack {
            detections: seed.to_vec(),
            missed_frames: Vec::new(),
        };

        let (Some(first), Some(second)) = (seed.first(), seed.get(1)) else {
            return Ok(track);
        };

        let steps = (second.frame_index - first.frame_index).max(1) as f64;
        let vx = (second.x - first.x) / (steps * dt);
        let vy = (second.y - first.y) / (steps * dt);

        let mut kf = BallKalmanFilter::new(self.config.clone(), dt);
        kf.initialize(first.x, first.y, vx, vy);

        // Run the seed through the filter so velocity and acceleration settle
        let mut frame = first.frame_index;
        for det in &seed[1..] {
            while frame < det.frame_index {
                kf.predict()?;
                frame += 1;
                if frame == det.frame_index {
                    kf.update(det.x, det.y, det.confidence)?;
                } else {
                    kf.update_no_measurement()?;
                }
            }
        }

        let last_frame = meta.last_frame_index();
        let margin = self.config.exit_margin;
        let mut misses = 0;

        for _ in 0..self.config.max_refine_frames {
            frame += 1;
            if frame > last_frame {
                break;
            }

            let pred = kf.predict()?;
            if pred.x < -margin
                || pred.y < -margin
                || pred.x > meta.width as f64 + margin
                || pred.y > meta.height as f64 + margin
            {
                kf.update_no_measurement()?;
                debug!(frame, x = pred.x, y = pred.y, "Prediction left the frame");
                break;
            }

            let Some(image) = self.frames.frame(frame)? else {
                kf.update_no_measurement()?;
                break;
            };

            let mut best: Option<(f64, FrameDetection)> = None;
            for det in self.detector.detect(&image)? {
                let (x, y) = det.center();
                let distance = ((x - pred.x).powi(2) + (y - pred.y).powi(2)).sqrt();
                if distance > pred.search_radius || !kf.is_measurement_plausible(x, y)? {
                    continue;
                }
                let score = kf.mahalanobis_distance(x, y)?.unwrap_or(distance);
                if best.as_ref().map_or(true, |(s, _)| score < *s) {
                    best = Some((score, FrameDetection::new(frame, x, y, det.confidence)));
                }
            }

            match best {
                Some((_, det)) => {
                    kf.update(det.x, det.y, det.confidence)?;
                    track.detections.push(det);
                    misses = 0;
                }
                None => {
                    kf.update_no_measurement()?;
                    track.missed_frames.push(frame);
                    misses += 1;
                    if misses >= self.config.max_consecutive_misses {
                        debug!(frame, misses, "Refinement lost the ball");
                        break;
                    }
                }
            }
        }

        // Trailing misses carry no information about the flight
        while track
            .missed_frames
            .last()
            .zip(track.detections.last())
            .is_some_and(|(m, d)| *m > d.frame_index)
        {
            track.missed_frames.pop();
        }

        debug!(
            seed = seed.len(),
            detections = track.detections.len(),
            missed = track.missed_frames.len(),
            "Kalman refinement finished"
        );
        Ok(track)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{IndexedFrames, ScriptedDetector};

    fn ball_at(frame: usize) -> (f64, f64) {
        let t = frame as f64 / 30.0;
        (100.0 + 300.0 * t, 400.0 - 600.0 * t + 300.0 * t * t)
    }

    #[test]
    fn test_refines_until_ball_lost() {
        let frames = IndexedFrames::new(640, 480, 30.0, 10.0);
        let detector = ScriptedDetector {
            class: "sports ball",
            size: 6.0,
            script: |idx: usize| {
                let mut out = vec![(600.0, 20.0, 0.9)];
                if idx <= 40 {
                    let (x, y) = ball_at(idx);
                    out.push((x, y, 0.8));
                }
                out
            },
        };
        let seed: Vec<FrameDetection> = (0..4)
            .map(|f| {
                let (x, y) = ball_at(f);
                FrameDetection::new(f, x, y, 0.9)
            })
            .collect();

        let config = KalmanConfig::default();
        let track = KalmanRefiner::new(&config, &frames, &detector)
            .refine(&seed)
            .unwrap();

        assert_eq!(track.detections.len(), 41);
        assert_eq!(track.detections.last().unwrap().frame_index, 40);
        assert!(track.missed_frames.is_empty());
        assert_eq!(track.extension_len(seed.len()), 37);
    }

    #[test]
    fn test_single_point_seed_is_returned_unchanged() {
        let frames = IndexedFrames::new(640, 480, 30.0, 10.0);
        let detector = ScriptedDetector {
            class: "sports ball",
            size: 6.0,
            script: |_: usize| Vec::new(),
        };
        let config = KalmanConfig::default();
        let seed = [FrameDetection::new(0, 10.0, 10.0, 0.9)];
        let track = KalmanRefiner::new(&config, &frames, &detector)
            .refine(&seed)
            .unwrap();
        assert_eq!(track.detections.len(), 1);
    }
}
