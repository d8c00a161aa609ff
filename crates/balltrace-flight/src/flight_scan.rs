//! Longer-window flight analysis used when early-flight tracking fails.
//!
//! Raw ball detections over several seconds after the strike are
//! clustered into candidate segments. A segment survives only if it fits
//! a parabola in time (quadratic R^2), travels monotonically in x and
//! starts within a plausible zone around the origin.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::assembly::FrameDetection;
use crate::error::FlightResult;
use crate::source::{FrameSource, ObjectDetector};

/// Flight-scan tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightScanConfig {
    /// Scan window after the strike (s)
    pub window_secs: f64,
    /// Detect on every n-th frame
    pub frame_stride: usize,
    pub min_detection_confidence: f64,
    /// Largest frame gap inside one segment
    pub max_gap_frames: usize,
    /// Largest jump per elapsed frame inside one segment (px)
    pub max_jump_px: f64,
    pub min_segment_points: usize,
    pub min_r_squared: f64,
    /// Backwards x motion tolerated before monotonicity fails (px)
    pub monotonic_tolerance_px: f64,
    /// Minimum vertical travel of a segment (px)
    pub min_travel_px: f64,
    /// Origin-zone radius at the strike (px)
    pub origin_zone_radius_px: f64,
    /// Origin-zone growth per second after the strike (px/s)
    pub origin_zone_growth_px_s: f64,
}

impl Default for FlightScanConfig {
    fn default() -> Self {
        Self {
            window_secs: 4.0,
            frame_stride: 1,
            min_detection_confidence: 0.2,
            max_gap_frames: 6,
            max_jump_px: 60.0,
            min_segment_points: 5,
            min_r_squared: 0.9,
            monotonic_tolerance_px: 3.0,
            min_travel_px: 20.0,
            origin_zone_radius_px: 120.0,
            origin_zone_growth_px_s: 400.0,
        }
    }
}

/// A clustered run of detections accepted as a flight.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightSegment {
    pub detections: Vec<FrameDetection>,
    /// Quadratic fit quality of y over time
    pub r_squared: f64,
}

impl FlightSegment {
    pub fn confidence(&self) -> f64 {
        let mean = self.detections.iter().map(|d| d.confidence).sum::<f64>()
            / self.detections.len().max(1) as f64;
        (mean * self.r_squared).clamp(0.0, 1.0)
    }
}

/// Why a segment was rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SegmentRejection {
    TooShort,
    NoTravel,
    FitFailed,
    PoorFit { r_squared: f64 },
    NotMonotonic,
    OutsideOriginZone,
}

/// Clusters raw detections into flight segments.
#[derive(Debug, Clone, Default)]
pub struct FlightScanner {
    config: FlightScanConfig,
}

impl FlightScanner {
    pub fn new(config: FlightScanConfig) -> Self {
        Self { config }
    }

    /// Detect over the scan window and return the best surviving segment.
    pub fn scan(
        &self,
        frames: &dyn FrameSource,
        detector: &dyn ObjectDetector,
        strike_time: f64,
        origin: Option<(f64, f64)>,
    ) -> FlightResult<Option<FlightSegment>> {
        let c = &self.config;
        let meta = frames.metadata();
        let start = meta.frame_index(strike_time);
        let end = meta.frame_index(strike_time + c.window_secs).min(meta.last_frame_index());

        let mut detections = Vec::new();
        for frame_index in (start..=end).step_by(c.frame_stride.max(1)) {
            let Some(frame) = frames.frame(frame_index)? else {
                break;
            };
            for det in detector.detect(&frame)? {
                if det.confidence < c.min_detection_confidence {
                    continue;
                }
                let (x, y) = det.center();
                detections.push(FrameDetection::new(frame_index, x, y, det.confidence));
            }
        }

        let segments = self.cluster(&detections);
        let fps = meta.fps;
        let best = segments
            .into_iter()
            .filter_map(|seg| match self.evaluate(&seg, fps, strike_time, origin) {
                Ok(r_squared) => Some(FlightSegment {
                    detections: seg,
                    r_squared,
                }),
                Err(reason) => {
                    debug!(?reason, "Flight-scan segment rejected");
                    None
                }
            })
            .max_by(|a, b| {
                let sa = a.detections.len() as f64 * a.confidence();
                let sb = b.detections.len() as f64 * b.confidence();
                sa.total_cmp(&sb)
            });

        debug!(
            raw = detections.len(),
            found = best.is_some(),
            "Flight scan finished"
        );
        Ok(best)
    }

    /// Greedy nearest-tail clustering in frame order.
    pub fn cluster(&self, detections: &[FrameDetection]) -> Vec<Vec<FrameDetection>> {
        let c = &self.config;
        let mut sorted = detections.to_vec();
        sorted.sort_by_key(|d| d.frame_index);

        let mut segments: Vec<Vec<FrameDetection>> = Vec::new();
        for det in sorted {
            let mut best: Option<(usize, f64)> = None;
            for (i, seg) in segments.iter().enumerate() {
                let Some(tail) = seg.last() else { continue };
                if tail.frame_index >= det.frame_index {
                    continue;
                }
                let gap = det.frame_index - tail.frame_index;
                if gap > c.max_gap_frames {
                    continue;
                }
                let distance = ((det.x - tail.x).powi(2) + (det.y - tail.y).powi(2)).sqrt();
                if distance > c.max_jump_px * gap as f64 {
                    continue;
                }
                if best.map_or(true, |(_, d)| distance < d) {
                    best = Some((i, distance));
                }
            }
            match best {
                Some((i, _)) => segments[i].push(det),
                None => segments.push(vec![det]),
            }
        }
        segments
    }

    /// Run all segment checks; returns the quadratic R^2 on success.
    pub fn evaluate(
        &self,
        segment: &[FrameDetection],
        fps: f64,
        strike_time: f64,
        origin: Option<(f64, f64)>,
    ) -> Result<f64, SegmentRejection> {
        let c = &self.config;
        if segment.len() < c.min_segment_points {
            return Err(SegmentRejection::TooShort);
        }

        let (min_y, max_y) = segment
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), d| (lo.min(d.y), hi.max(d.y)));
        if max_y - min_y < c.min_travel_px {
            return Err(SegmentRejection::NoTravel);
        }

        let ts: Vec<f64> = segment.iter().map(|d| d.frame_index as f64 / fps).collect();
        let ys: Vec<f64> = segment.iter().map(|d| d.y).collect();
        let r_squared = quadratic_r_squared(&ts, &ys).ok_or(SegmentRejection::FitFailed)?;
        if r_squared < c.min_r_squared {
            return Err(SegmentRejection::PoorFit { r_squared });
        }

        let net_dx = segment[segment.len() - 1].x - segment[0].x;
        let sign = if net_dx >= 0.0 { 1.0 } else { -1.0 };
        if segment
            .windows(2)
            .any(|w| (w[1].x - w[0].x) * sign < -c.monotonic_tolerance_px)
        {
            return Err(SegmentRejection::NotMonotonic);
        }

        if let Some((ox, oy)) = origin {
            let first = &segment[0];
            let elapsed = (first.frame_index as f64 / fps - strike_time).max(0.0);
            let radius = c.origin_zone_radius_px + c.origin_zone_growth_px_s * elapsed;
            let distance = ((first.x - ox).powi(2) + (first.y - oy).powi(2)).sqrt();
            if distance > radius {
                return Err(SegmentRejection::OutsideOriginZone);
            }
        }

        Ok(r_squared)
    }
}

/// R^2 of a least-squares quadratic `y = a + b t + c t^2`.
///
/// `None` when the fit cannot be solved or `y` has no variance.
pub fn quadratic_r_squared(ts: &[f64], ys: &[f64]) -> Option<f64> {
    let n = ts.len();
    if n < 3 || ys.len() != n {
        return None;
    }

    let t0 = ts[0];
    let a = DMatrix::from_fn(n, 3, |r, col| (ts[r] - t0).powi(col as i32));
    let b = DVector::from_column_slice(ys);
    let coeffs = a.clone().svd(true, true).solve(&b, 1e-12).ok()?;
    let fitted = &a * &coeffs;

    let mean = ys.iter().sum::<f64>() / n as f64;
    let ss_tot: f64 = ys.iter().map(|y| (y - mean).powi(2)).sum();
    if ss_tot < 1e-12 {
        return None;
    }
    let ss_res: f64 = ys.iter().zip(fitted.iter()).map(|(y, f)| (y - f).powi(2)).sum();
    Some((1.0 - ss_res / ss_tot).clamp(0.0, 1.0))
}
