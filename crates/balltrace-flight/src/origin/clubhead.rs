//! Clubhead fallback: a bright, low-saturation (metallic) blob in the
//! search zone, offset toward the golfer.

use balltrace_models::{BoundingBox, OriginMethod};
use image::{imageops, Luma, Rgb, RgbImage};
use imageproc::map;

use super::{OriginCandidate, OriginConfig};
use crate::vision::{find_blobs, BinaryMask, Region};

/// Brightness (max channel) over `zone`, masked to bright pixels with
/// low saturation.
fn metallic_mask(frame: &RgbImage, zone: Region, config: &OriginConfig) -> BinaryMask {
    let patch = imageops::crop_imm(frame, zone.x0, zone.y0, zone.width(), zone.height()).to_image();
    let brightness = map::map_colors(&patch, |p: Rgb<u8>| Luma([p.0.into_iter().max().unwrap_or(0)]));
    let mask = map::map_colors(&patch, |p: Rgb<u8>| {
        let max = p.0.into_iter().max().unwrap_or(0) as f64;
        let min = p.0.into_iter().min().unwrap_or(0) as f64;
        let saturation = if max > 0.0 { (max - min) / max } else { 0.0 };
        let metallic = max >= config.clubhead_min_brightness && saturation <= config.clubhead_max_saturation;
        Luma([if metallic { 255u8 } else { 0 }])
    });
    BinaryMask::new(zone, brightness, mask)
}

pub(super) fn detect_clubhead(
    frame: &RgbImage,
    zone: Region,
    golfer: &BoundingBox,
    config: &OriginConfig,
) -> Option<OriginCandidate> {
    if zone.is_empty() {
        return None;
    }

    let bright = metallic_mask(frame, zone, config);
    let blob = find_blobs(&bright, config.clubhead_min_area, config.clubhead_max_area)
        .into_iter()
        .max_by(|a, b| (a.area as f64 * a.mean_value).total_cmp(&(b.area as f64 * b.mean_value)))?;

    let toward = (golfer.cx() - blob.cx).signum();
    let score = (blob.mean_value / 255.0).min(1.0);

    Some(OriginCandidate {
        x: blob.cx + toward * config.clubhead_offset_px,
        y: blob.cy,
        method: OriginMethod::ClubheadDetection,
        score,
    })
}
