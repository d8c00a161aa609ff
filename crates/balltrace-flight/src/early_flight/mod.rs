//! Early-flight candidate tracking.
//!
//! Covers the first ~0.5 s after the strike, when the ball is too small
//! and fast for the generic detector. Frame differencing inside a
//! physics-bounded cone proposes blobs; each is scored by color match to
//! the pre-strike ball template, motion strength and directional
//! continuity. Among plausible blobs the one with the smallest angular
//! deviation from the established direction wins, not the nearest one.
//!
//! Failed or invalid tracks escalate through a fixed number of expansion
//! levels, then fall back to the sparse optical-flow tracker.

mod flow;
mod track;
mod validation;

pub use flow::{FlowStep, FlowTracker, FlowTrackerConfig};
pub use track::{DetectionCandidate, Track, TrackSource};
pub use validation::{angle_between, validate_track, TrackRejection};

use balltrace_models::OriginPoint;
use image::GrayImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::FlightResult;
use crate::source::{FrameSource, VideoMetadata};
use crate::vision::{diff_mask, find_blobs, to_gray, ColorTemplate, Region};

/// Early-flight tracking tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EarlyFlightConfig {
    /// Tracking window after the strike (s)
    pub window_secs: f64,
    /// Template sampled this long before the strike (s)
    pub template_offset_secs: f64,
    pub template_radius: f64,
    pub max_color_distance: f64,
    /// Grayscale difference threshold
    pub diff_threshold: u8,
    pub min_blob_area: usize,
    pub max_blob_area: usize,
    /// Cone radius around the last point at zero elapsed frames (px)
    pub cone_initial_radius: f64,
    /// Cone growth per elapsed frame since the last accepted point (px)
    pub cone_growth_per_frame: f64,
    /// Angular half-spread before a direction is established (deg)
    pub initial_spread_deg: f64,
    /// Angular half-spread once the track has a direction (deg)
    pub track_spread_deg: f64,
    /// Minimum displacement from the last point (px)
    pub min_step_px: f64,
    /// Maximum displacement per elapsed frame (px)
    pub max_step_px: f64,
    pub weight_color: f64,
    pub weight_motion: f64,
    pub weight_physics: f64,
    /// Candidates below this combined score are dropped
    pub min_combined_score: f64,
    /// Consecutive empty frames that end a track
    pub max_misses: usize,
    /// Multipliers applied to cone size, spread and step bounds
    pub expansion_levels: Vec<f64>,
    pub min_track_length: usize,
    /// Relative speed increase tolerated per step
    pub speedup_tolerance: f64,
    /// Reject when more than this fraction of steps speed up
    pub max_speedup_fraction: f64,
    pub max_direction_change_deg: f64,
    pub use_optical_flow_fallback: bool,
    pub flow: FlowTrackerConfig,
}

impl Default for EarlyFlightConfig {
    fn default() -> Self {
        Self {
            window_secs: 0.5,
            template_offset_secs: 0.1,
            template_radius: 6.0,
            max_color_distance: 150.0,
            diff_threshold: 25,
            min_blob_area: 2,
            max_blob_area: 400,
            cone_initial_radius: 30.0,
            cone_growth_per_frame: 20.0,
            initial_spread_deg: 60.0,
            track_spread_deg: 20.0,
            min_step_px: 1.5,
            max_step_px: 40.0,
            weight_color: 0.35,
            weight_motion: 0.25,
            weight_physics: 0.4,
            min_combined_score: 0.3,
            max_misses: 3,
            expansion_levels: vec![1.0, 1.6, 2.5],
            min_track_length: 4,
            speedup_tolerance: 0.10,
            max_speedup_fraction: 0.33,
            max_direction_change_deg: 25.0,
            use_optical_flow_fallback: true,
            flow: FlowTrackerConfig::default(),
        }
    }
}

/// Screen-up, the expected launch direction in a down-the-line view.
const LAUNCH_DIRECTION: (f64, f64) = (0.0, -1.0);

/// Builds a validated early-flight [`Track`] for one strike.
#[derive(Debug, Clone, Default)]
pub struct EarlyFlightTracker {
    config: EarlyFlightConfig,
}

impl EarlyFlightTracker {
    pub fn new(config: EarlyFlightConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EarlyFlightConfig {
        &self.config
    }

    /// Track the ball leaving `origin`. `Ok(None)` when no level and no
    /// fallback produced a valid track.
    pub fn track(
        &self,
        frames: &dyn FrameSource,
        origin: &OriginPoint,
        strike_time: f64,
    ) -> FlightResult<Option<Track>> {
        let c = &self.config;
        let meta = frames.metadata();

        let template = frames
            .frame_at((strike_time - c.template_offset_secs).max(0.0))?
            .and_then(|f| ColorTemplate::extract(&f, origin.x, origin.y, c.template_radius, c.max_color_distance))
            .unwrap_or_else(|| ColorTemplate::white_ball(c.max_color_distance));

        let start = meta.frame_index(strike_time);
        let count = (c.window_secs * meta.fps).ceil() as usize;

        for (level, &scale) in c.expansion_levels.iter().enumerate() {
            let candidates = self.track_level(frames, &meta, &template, origin, start, count, scale)?;
            match validate_track(&candidates, c) {
                Ok(()) => {
                    let track = Track::new(candidates, TrackSource::FrameDiff { level });
                    info!(
                        level,
                        len = track.len(),
                        confidence = track.confidence(),
                        "Early-flight track found"
                    );
                    return Ok(Some(track));
                }
                Err(reason) => {
                    debug!(level, scale, ?reason, "Early-flight level rejected");
                }
            }
        }

        if !c.use_optical_flow_fallback {
            return Ok(None);
        }

        let flow = FlowTracker::new(c.flow.clone());
        let steps = flow.track(frames, start.saturating_sub(1), origin.x, origin.y, count)?;
        let candidates: Vec<DetectionCandidate> = steps
            .iter()
            .map(|s| DetectionCandidate {
                frame_index: s.frame_index,
                timestamp: meta.timestamp(s.frame_index),
                x: s.x,
                y: s.y,
                color_score: 0.0,
                motion_score: 0.0,
                physics_score: s.confidence,
                combined_score: s.confidence,
            })
            .collect();

        match validate_track(&candidates, c) {
            Ok(()) => {
                let track = Track::new(candidates, TrackSource::OpticalFlow);
                info!(len = track.len(), "Early-flight track from optical flow");
                Ok(Some(track))
            }
            Err(reason) => {
                debug!(?reason, "Optical-flow fallback rejected");
                Ok(None)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn track_level(
        &self,
        frames: &dyn FrameSource,
        meta: &VideoMetadata,
        template: &ColorTemplate,
        origin: &OriginPoint,
        start: usize,
        count: usize,
        scale: f64,
    ) -> FlightResult<Vec<DetectionCandidate>> {
        let c = &self.config;
        let Some(first) = frames.frame(start.saturating_sub(1))? else {
            return Ok(Vec::new());
        };
        let mut prev: GrayImage = to_gray(&first);

        let mut track: Vec<DetectionCandidate> = Vec::new();
        let (mut last_x, mut last_y) = (origin.x, origin.y);
        let mut last_frame = start.saturating_sub(1);
        let mut misses = 0;

        for frame_index in start..start + count {
            let Some(frame) = frames.frame(frame_index)? else {
                break;
            };
            let cur = to_gray(&frame);
            let elapsed = (frame_index - last_frame) as f64;

            let radius = (c.cone_initial_radius + c.cone_growth_per_frame * elapsed) * scale;
            let region = Region::around(last_x, last_y, radius, meta.width, meta.height);
            let mask = diff_mask(&prev, &cur, region, c.diff_threshold);

            let direction = match track.len() {
                0 | 1 => None,
                n => Some((track[n - 1].x - track[n - 2].x, track[n - 1].y - track[n - 2].y)),
            };
            let (expected, spread) = match direction {
                Some(d) => (d, c.track_spread_deg * scale),
                None => (LAUNCH_DIRECTION, c.initial_spread_deg * scale),
            };
            let spread = spread.min(90.0);

            let mut best: Option<(f64, DetectionCandidate)> = None;
            for blob in find_blobs(&mask, c.min_blob_area, c.max_blob_area) {
                let step = (blob.cx - last_x, blob.cy - last_y);
                let distance = (step.0 * step.0 + step.1 * step.1).sqrt();
                if distance < c.min_step_px || distance > c.max_step_px * scale * elapsed {
                    continue;
                }

                let deviation = angle_between(step, expected);
                if deviation > spread {
                    continue;
                }

                let color_score = template.score_blob(&frame, &blob);
                let motion_score = (blob.mean_value / 100.0).min(1.0);
                let physics_score = 1.0 - deviation / spread.max(1e-9);
                let combined_score = c.weight_color * color_score
                    + c.weight_motion * motion_score
                    + c.weight_physics * physics_score;
                if combined_score < c.min_combined_score {
                    continue;
                }

                let better = match &best {
                    None => true,
                    Some((d, b)) => {
                        deviation < *d - 1e-9
                            || ((deviation - *d).abs() <= 1e-9 && combined_score > b.combined_score)
                    }
                };
                if better {
                    best = Some((
                        deviation,
                        DetectionCandidate {
                            frame_index,
                            timestamp: meta.timestamp(frame_index),
                            x: blob.cx,
                            y: blob.cy,
                            color_score,
                            motion_score,
                            physics_score,
                            combined_score,
                        },
                    ));
                }
            }

            match best {
                Some((_, candidate)) => {
                    last_x = candidate.x;
                    last_y = candidate.y;
                    last_frame = frame_index;
                    track.push(candidate);
                    misses = 0;
                }
                None if !track.is_empty() => {
                    misses += 1;
                    if misses >= c.max_misses {
                        break;
                    }
                }
                // Ball may still be at address for the first frames
                None => {}
            }

            prev = cur;
        }

        debug!(scale, len = track.len(), "Early-flight level finished");
        Ok(track)
    }
}
