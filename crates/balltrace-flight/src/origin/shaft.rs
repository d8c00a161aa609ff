//! Club-shaft geometry: the shaft at address points from the hands down
//! to the clubhead, and the ball sits just past the clubhead.

use balltrace_models::{BoundingBox, OriginMethod};
use image::GrayImage;
use tracing::debug;

use super::{OriginCandidate, OriginConfig};
use crate::vision::{detect_line_segments, LineSegment, Region};

/// Best shaft-derived ball candidate, regardless of quality floor.
pub(super) fn detect_shaft(
    gray: &GrayImage,
    golfer: &BoundingBox,
    config: &OriginConfig,
) -> Option<OriginCandidate> {
    let search = golfer.pad(golfer.width * config.zone_right);
    let region = Region::from_bbox(&search, gray.width(), gray.height());
    let segments = detect_line_segments(gray, region, &config.lines);

    let ground_y = golfer.y2();
    let mut best: Option<(f64, LineSegment)> = None;

    for seg in &segments {
        if !passes_geometry(seg, golfer, ground_y, config) {
            continue;
        }
        let score = score_segment(gray, seg, golfer, ground_y, config);
        if best.map_or(true, |(s, _)| score > s) {
            best = Some((score, *seg));
        }
    }

    debug!(
        segments = segments.len(),
        best_score = best.map(|b| b.0),
        "Shaft search finished"
    );

    best.map(|(score, seg)| {
        let (hx, hy) = seg.left_endpoint();
        let (cx, cy) = seg.right_endpoint();
        let len = seg.length().max(1e-9);
        OriginCandidate {
            x: cx + (cx - hx) / len * config.shaft_ball_offset_px,
            y: cy + (cy - hy) / len * config.shaft_ball_offset_px,
            method: OriginMethod::ShaftDetection,
            score,
        }
    })
}

fn passes_geometry(seg: &LineSegment, golfer: &BoundingBox, ground_y: f64, config: &OriginConfig) -> bool {
    let angle = seg.angle_from_horizontal();
    if angle < config.min_shaft_angle_deg || angle > config.max_shaft_angle_deg {
        return false;
    }
    // Hands up-left, clubhead down-right
    if !seg.cartesian_slope().is_some_and(|m| m < 0.0) {
        return false;
    }
    let (_, top_y) = seg.left_endpoint();
    if top_y < golfer.y || top_y > golfer.y2() {
        return false;
    }
    let (_, head_y) = seg.right_endpoint();
    (head_y - ground_y).abs() <= config.ground_tolerance_px
}

fn score_segment(
    gray: &GrayImage,
    seg: &LineSegment,
    golfer: &BoundingBox,
    ground_y: f64,
    config: &OriginConfig,
) -> f64 {
    let samples = seg.sample_points(seg.length().ceil() as usize);
    let mean = samples
        .iter()
        .map(|&(x, y)| {
            let px = (x.round().max(0.0) as u32).min(gray.width() - 1);
            let py = (y.round().max(0.0) as u32).min(gray.height() - 1);
            gray.get_pixel(px, py).0[0] as f64
        })
        .sum::<f64>()
        / samples.len() as f64;

    let darkness = 1.0 - mean / 255.0;
    let expected = (golfer.height * config.expected_shaft_fraction).max(1.0);
    let length = (seg.length() / expected).min(1.0);
    let angle_span = (config.max_shaft_angle_deg - config.min_shaft_angle_deg).max(1.0) / 2.0;
    let angle = (1.0 - (seg.angle_from_horizontal() - config.preferred_shaft_angle_deg).abs() / angle_span).max(0.0);
    let (_, head_y) = seg.right_endpoint();
    let ground = (1.0 - (head_y - ground_y).abs() / config.ground_tolerance_px).max(0.0);

    config.shaft_weight_darkness * darkness
        + config.shaft_weight_length * length
        + config.shaft_weight_angle * angle
        + config.shaft_weight_ground * ground
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::draw_thick_line;
    use crate::vision::to_gray;
    use image::{Rgb, RgbImage};

    fn golfer() -> BoundingBox {
        BoundingBox::new(80.0, 40.0, 60.0, 150.0)
    }

    #[test]
    fn test_finds_address_shaft() {
        let mut img = RgbImage::from_pixel(320, 240, Rgb([60, 140, 60]));
        draw_thick_line(&mut img, (100.0, 110.0), (170.0, 180.0), 1.5, Rgb([20, 20, 20]));
        let candidate = detect_shaft(&to_gray(&img), &golfer(), &OriginConfig::default()).unwrap();

        assert!(candidate.score >= OriginConfig::default().shaft_quality_floor);
        assert!((candidate.x - 175.0).abs() < 8.0);
        assert!((candidate.y - 185.0).abs() < 8.0);
    }

    #[test]
    fn test_rejects_wrong_slope() {
        let mut img = RgbImage::from_pixel(320, 240, Rgb([60, 140, 60]));
        // rising to the right: positive Cartesian slope
        draw_thick_line(&mut img, (100.0, 180.0), (170.0, 110.0), 1.5, Rgb([20, 20, 20]));
        assert!(detect_shaft(&to_gray(&img), &golfer(), &OriginConfig::default()).is_none());
    }

    #[test]
    fn test_rejects_flat_line() {
        let mut img = RgbImage::from_pixel(320, 240, Rgb([60, 140, 60]));
        draw_thick_line(&mut img, (90.0, 150.0), (190.0, 160.0), 1.5, Rgb([20, 20, 20]));
        assert!(detect_shaft(&to_gray(&img), &golfer(), &OriginConfig::default()).is_none());
    }
}
