//! Ball origin (address position) localization.
//!
//! Three independent methods propose candidates: direct ball detection,
//! club-shaft geometry and a bright clubhead blob. Candidates that agree
//! are averaged; otherwise the highest-priority method wins. When no
//! method produces a candidate the result is a definite
//! [`OriginResult::NotFound`]; the position is never guessed from the
//! golfer's bounding box.

mod clubhead;
mod consensus;
mod shaft;

pub use consensus::{resolve_candidates, OriginCandidate};

use balltrace_models::{BoundingBox, OriginMethod, OriginPoint};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::FlightResult;
use crate::source::{FrameSource, ObjectDetector};
use crate::vision::{to_gray, LineDetectorConfig, Region};

/// Origin localization tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OriginConfig {
    /// Seconds before the strike at which the address frame is sampled
    pub lookback_secs: f64,
    /// Search zone bounds as fractions of the golfer box
    pub zone_left: f64,
    pub zone_right: f64,
    pub zone_top: f64,
    pub zone_bottom: f64,

    pub min_shaft_angle_deg: f64,
    pub max_shaft_angle_deg: f64,
    pub preferred_shaft_angle_deg: f64,
    /// Max vertical distance of the clubhead endpoint from ground (px)
    pub ground_tolerance_px: f64,
    /// Expected shaft length as a fraction of golfer height
    pub expected_shaft_fraction: f64,
    pub shaft_weight_darkness: f64,
    pub shaft_weight_length: f64,
    pub shaft_weight_angle: f64,
    pub shaft_weight_ground: f64,
    /// Below this best shaft score the clubhead fallback runs
    pub shaft_quality_floor: f64,
    /// Ball distance past the clubhead along the shaft (px)
    pub shaft_ball_offset_px: f64,
    pub lines: LineDetectorConfig,

    pub clubhead_min_brightness: f64,
    pub clubhead_max_saturation: f64,
    pub clubhead_min_area: usize,
    pub clubhead_max_area: usize,
    /// Ball offset from the clubhead toward the golfer (px)
    pub clubhead_offset_px: f64,

    pub ball_min_confidence: f64,

    pub agreement_radius_px: f64,
    pub ball_base_confidence: f64,
    pub shaft_base_confidence: f64,
    pub clubhead_base_confidence: f64,
    pub agreement_boost: f64,
    pub max_confidence: f64,
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            lookback_secs: 1.5,
            zone_left: 0.2,
            zone_right: 1.0,
            zone_top: 0.25,
            zone_bottom: 0.12,
            min_shaft_angle_deg: 15.0,
            max_shaft_angle_deg: 60.0,
            preferred_shaft_angle_deg: 40.0,
            ground_tolerance_px: 100.0,
            expected_shaft_fraction: 0.45,
            shaft_weight_darkness: 0.3,
            shaft_weight_length: 0.25,
            shaft_weight_angle: 0.25,
            shaft_weight_ground: 0.2,
            shaft_quality_floor: 0.45,
            shaft_ball_offset_px: 6.0,
            lines: LineDetectorConfig::default(),
            clubhead_min_brightness: 180.0,
            clubhead_max_saturation: 0.25,
            clubhead_min_area: 6,
            clubhead_max_area: 400,
            clubhead_offset_px: 18.0,
            ball_min_confidence: 0.25,
            agreement_radius_px: 25.0,
            ball_base_confidence: 0.85,
            shaft_base_confidence: 0.7,
            clubhead_base_confidence: 0.5,
            agreement_boost: 0.1,
            max_confidence: 0.95,
        }
    }
}

impl OriginConfig {
    pub fn base_confidence(&self, method: OriginMethod) -> f64 {
        match method {
            OriginMethod::BallDetection => self.ball_base_confidence,
            OriginMethod::ShaftDetection => self.shaft_base_confidence,
            OriginMethod::ClubheadDetection => self.clubhead_base_confidence,
            OriginMethod::Consensus => self.max_confidence,
        }
    }
}

/// Why no origin was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginFailure {
    /// The address frame could not be decoded
    FrameUnavailable,
    GolferNotDetected,
    /// Every detection method came back empty
    NoCandidates,
}

impl OriginFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            OriginFailure::FrameUnavailable => "frame_unavailable",
            OriginFailure::GolferNotDetected => "golfer_not_detected",
            OriginFailure::NoCandidates => "no_candidates",
        }
    }
}

/// Outcome of origin localization.
#[derive(Debug, Clone, PartialEq)]
pub enum OriginResult {
    Found(OriginPoint),
    NotFound(OriginFailure),
}

impl OriginResult {
    pub fn point(&self) -> Option<&OriginPoint> {
        match self {
            OriginResult::Found(point) => Some(point),
            OriginResult::NotFound(_) => None,
        }
    }
}

/// Locates the ball at address for one strike.
#[derive(Debug, Clone, Default)]
pub struct OriginLocator {
    config: OriginConfig,
}

impl OriginLocator {
    pub fn new(config: OriginConfig) -> Self {
        Self { config }
    }

    /// Ball search zone in front of the golfer's feet.
    pub fn search_zone(&self, golfer: &BoundingBox, width: u32, height: u32) -> Region {
        let c = &self.config;
        Region::clamped(
            golfer.x + golfer.width * c.zone_left,
            golfer.y2() - golfer.height * c.zone_top,
            golfer.x2() + golfer.width * c.zone_right,
            golfer.y2() + golfer.height * c.zone_bottom,
            width,
            height,
        )
    }

    pub fn locate(
        &self,
        frames: &dyn FrameSource,
        person: &dyn ObjectDetector,
        ball: &dyn ObjectDetector,
        strike_time: f64,
    ) -> FlightResult<OriginResult> {
        let c = &self.config;
        let meta = frames.metadata();
        let address_time = (strike_time - c.lookback_secs).max(0.0);

        let Some(frame) = frames.frame_at(address_time)? else {
            debug!(address_time, "Address frame unavailable");
            return Ok(OriginResult::NotFound(OriginFailure::FrameUnavailable));
        };

        let golfer = person
            .detect(&frame)?
            .into_iter()
            .max_by(|a, b| a.bbox.area().total_cmp(&b.bbox.area()));
        let Some(golfer) = golfer else {
            debug!(address_time, "No golfer detected");
            return Ok(OriginResult::NotFound(OriginFailure::GolferNotDetected));
        };
        let golfer_bbox = golfer.bbox.clamp_to(meta.width, meta.height);
        let zone = self.search_zone(&golfer_bbox, meta.width, meta.height);

        let mut candidates = Vec::new();

        let gray = to_gray(&frame);
        let shaft = shaft::detect_shaft(&gray, &golfer_bbox, c);
        let shaft_score = shaft.as_ref().map_or(0.0, |s| s.score);
        if let Some(candidate) = shaft.filter(|s| s.score >= c.shaft_quality_floor) {
            candidates.push(candidate);
        } else if let Some(candidate) = clubhead::detect_clubhead(&frame, zone, &golfer_bbox, c) {
            debug!(shaft_score, "Shaft below quality floor, using clubhead");
            candidates.push(candidate);
        }

        let direct = ball
            .detect(&frame)?
            .into_iter()
            .filter(|d| d.confidence >= c.ball_min_confidence)
            .filter(|d| {
                let (x, y) = d.center();
                zone.contains(x.max(0.0) as u32, y.max(0.0) as u32)
            })
            .max_by(|a, b| a.confidence.total_cmp(&b.confidence));
        if let Some(det) = direct {
            let (x, y) = det.center();
            candidates.push(OriginCandidate {
                x,
                y,
                method: OriginMethod::BallDetection,
                score: det.confidence,
            });
        }

        let Some((x, y, method, confidence)) = resolve_candidates(&candidates, c) else {
            debug!(shaft_score, "No origin candidates");
            return Ok(OriginResult::NotFound(OriginFailure::NoCandidates));
        };

        info!(
            x,
            y,
            confidence,
            method = method.as_str(),
            candidates = candidates.len(),
            "Origin localized"
        );
        Ok(OriginResult::Found(OriginPoint {
            x,
            y,
            confidence,
            method,
            golfer_bbox: Some(golfer_bbox),
        }))
    }
}
