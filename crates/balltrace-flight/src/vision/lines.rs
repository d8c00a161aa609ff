//! Straight line-segment detection.
//!
//! Two detectors run over the same Sobel gradient field and their output
//! is merged:
//! - gradient-orientation region growing in the style of LSD, good at
//!   thin high-contrast segments
//! - `imageproc`'s Hough transform at several vote thresholds, with
//!   segments extracted by walking edge pixels along each line, which
//!   recovers broken or low-contrast lines
//!
//! A club shaft is often only a few pixels wide and partially blurred, so
//! neither detector alone has enough recall.

use std::f64::consts::PI;

use image::{GrayImage, Luma};
use imageproc::gradients;
use imageproc::hough::{self, LineDetectionOptions, PolarLine};
use serde::{Deserialize, Serialize};

use super::frame_ops::{crop_gray, Region};

/// Line detector tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LineDetectorConfig {
    /// Minimum Sobel magnitude for an edge pixel
    pub gradient_threshold: f64,
    /// Region-growing orientation tolerance in degrees
    pub angle_tolerance_deg: f64,
    /// Minimum pixels in a grown region
    pub min_region_size: usize,
    /// Minimum segment length in pixels
    pub min_length: f64,
    /// Hough vote thresholds, tried from strictest to loosest
    pub hough_thresholds: Vec<u32>,
    /// Accumulator non-maximum suppression radius
    pub hough_suppression_radius: u32,
    /// Lines walked per Hough threshold
    pub hough_max_lines: usize,
    /// Largest gap bridged while walking a Hough line
    pub max_line_gap: f64,
    /// Near-duplicate suppression: orientation difference in degrees
    pub merge_angle_deg: f64,
    /// Near-duplicate suppression: perpendicular distance in pixels
    pub merge_distance: f64,
}

impl Default for LineDetectorConfig {
    fn default() -> Self {
        Self {
            gradient_threshold: 40.0,
            angle_tolerance_deg: 22.5,
            min_region_size: 12,
            min_length: 25.0,
            hough_thresholds: vec![60, 40, 25],
            hough_suppression_radius: 8,
            hough_max_lines: 24,
            max_line_gap: 5.0,
            merge_angle_deg: 5.0,
            merge_distance: 6.0,
        }
    }
}

/// A detected segment in frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl LineSegment {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn length(&self) -> f64 {
        ((self.x2 - self.x1).powi(2) + (self.y2 - self.y1).powi(2)).sqrt()
    }

    /// Acute angle to the horizontal in degrees, [0, 90].
    pub fn angle_from_horizontal(&self) -> f64 {
        let dx = (self.x2 - self.x1).abs();
        let dy = (self.y2 - self.y1).abs();
        dy.atan2(dx).to_degrees()
    }

    /// Undirected orientation in degrees, [0, 180).
    pub fn orientation(&self) -> f64 {
        let a = (self.y2 - self.y1).atan2(self.x2 - self.x1).to_degrees();
        a.rem_euclid(180.0)
    }

    /// Slope in Cartesian convention (y up). `None` for vertical segments.
    pub fn cartesian_slope(&self) -> Option<f64> {
        let dx = self.x2 - self.x1;
        if dx.abs() < 1e-9 {
            return None;
        }
        Some(-(self.y2 - self.y1) / dx)
    }

    pub fn midpoint(&self) -> (f64, f64) {
        ((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    /// Endpoint with the larger x.
    pub fn right_endpoint(&self) -> (f64, f64) {
        if self.x2 >= self.x1 {
            (self.x2, self.y2)
        } else {
            (self.x1, self.y1)
        }
    }

    /// Endpoint with the smaller x.
    pub fn left_endpoint(&self) -> (f64, f64) {
        if self.x2 >= self.x1 {
            (self.x1, self.y1)
        } else {
            (self.x2, self.y2)
        }
    }

    /// Perpendicular distance from a point to the infinite line.
    pub fn line_distance(&self, x: f64, y: f64) -> f64 {
        let len = self.length();
        if len < 1e-9 {
            return ((x - self.x1).powi(2) + (y - self.y1).powi(2)).sqrt();
        }
        ((self.x2 - self.x1) * (self.y1 - y) - (self.x1 - x) * (self.y2 - self.y1)).abs() / len
    }

    /// Evenly spaced sample points along the segment (inclusive).
    pub fn sample_points(&self, count: usize) -> Vec<(f64, f64)> {
        let count = count.max(2);
        (0..count)
            .map(|i| {
                let t = i as f64 / (count - 1) as f64;
                (
                    self.x1 + (self.x2 - self.x1) * t,
                    self.y1 + (self.y2 - self.y1) * t,
                )
            })
            .collect()
    }
}

struct Gradients {
    region: Region,
    gx: Vec<f64>,
    gy: Vec<f64>,
    mag: Vec<f64>,
}

impl Gradients {
    /// Sobel field over `region`, computed on a crop with a one-pixel
    /// border so the region edge sees real neighbours.
    fn compute(image: &GrayImage, region: Region) -> Self {
        let padded = Region::clamped(
            region.x0 as f64 - 1.0,
            region.y0 as f64 - 1.0,
            region.x1 as f64 + 1.0,
            region.y1 as f64 + 1.0,
            image.width(),
            image.height(),
        );
        let patch = crop_gray(image, padded);
        let sx = gradients::horizontal_sobel(&patch);
        let sy = gradients::vertical_sobel(&patch);

        let (ox, oy) = (region.x0 - padded.x0, region.y0 - padded.y0);
        let n = region.area() as usize;
        let (mut gx, mut gy, mut mag) = (Vec::with_capacity(n), Vec::with_capacity(n), Vec::with_capacity(n));
        for ly in 0..region.height() {
            for lx in 0..region.width() {
                let x = sx.get_pixel(lx + ox, ly + oy).0[0] as f64;
                let y = sy.get_pixel(lx + ox, ly + oy).0[0] as f64;
                gx.push(x);
                gy.push(y);
                mag.push((x * x + y * y).sqrt() / 4.0);
            }
        }

        Self { region, gx, gy, mag }
    }

    fn width(&self) -> usize {
        self.region.width() as usize
    }

    /// Level-line angle (perpendicular to the gradient) in radians.
    fn level_angle(&self, i: usize) -> f64 {
        self.gx[i].atan2(-self.gy[i])
    }

    fn to_frame(&self, i: usize) -> (f64, f64) {
        let w = self.width();
        (
            self.region.x0 as f64 + (i % w) as f64,
            self.region.y0 as f64 + (i / w) as f64,
        )
    }
}

/// Detect line segments inside `region` of a grayscale image.
pub fn detect_line_segments(
    image: &GrayImage,
    region: Region,
    config: &LineDetectorConfig,
) -> Vec<LineSegment> {
    if region.width() < 3 || region.height() < 3 {
        return Vec::new();
    }

    let grads = Gradients::compute(image, region);
    let mut segments = region_growing_segments(&grads, config);
    segments.extend(hough_segments(&grads, config));

    merge_segments(segments, config)
}

fn angle_diff(a: f64, b: f64) -> f64 {
    let mut d = (a - b).abs() % (2.0 * PI);
    if d > PI {
        d = 2.0 * PI - d;
    }
    d
}

fn region_growing_segments(grads: &Gradients, config: &LineDetectorConfig) -> Vec<LineSegment> {
    let w = grads.width() as i64;
    let h = grads.region.height() as i64;
    let tolerance = config.angle_tolerance_deg.to_radians();

    let mut seeds: Vec<usize> = (0..grads.mag.len())
        .filter(|&i| grads.mag[i] >= config.gradient_threshold)
        .collect();
    seeds.sort_by(|&a, &b| grads.mag[b].total_cmp(&grads.mag[a]));

    let mut used = vec![false; grads.mag.len()];
    let mut segments = Vec::new();

    for seed in seeds {
        if used[seed] {
            continue;
        }

        used[seed] = true;
        let mut members = vec![seed];
        let mut angle = grads.level_angle(seed);
        let (mut sum_cos, mut sum_sin) = (angle.cos(), angle.sin());
        let mut cursor = 0;

        while cursor < members.len() {
            let i = members[cursor];
            cursor += 1;
            let lx = i as i64 % w;
            let ly = i as i64 / w;

            for dy in -1..=1 {
                for dx in -1..=1 {
                    let nx = lx + dx;
                    let ny = ly + dy;
                    if (dx == 0 && dy == 0) || nx < 0 || ny < 0 || nx >= w || ny >= h {
                        continue;
                    }
                    let n = (ny * w + nx) as usize;
                    if used[n] || grads.mag[n] < config.gradient_threshold {
                        continue;
                    }
                    if angle_diff(grads.level_angle(n), angle) > tolerance {
                        continue;
                    }
                    used[n] = true;
                    members.push(n);
                    let a = grads.level_angle(n);
                    sum_cos += a.cos();
                    sum_sin += a.sin();
                    angle = sum_sin.atan2(sum_cos);
                }
            }
        }

        if members.len() < config.min_region_size {
            continue;
        }

        if let Some(segment) = fit_region(grads, &members) {
            if segment.length() >= config.min_length {
                segments.push(segment);
            }
        }
    }

    segments
}

/// Principal-axis fit of a pixel region, endpoints from the extreme
/// projections.
fn fit_region(grads: &Gradients, members: &[usize]) -> Option<LineSegment> {
    let mut total = 0.0;
    let (mut mx, mut my) = (0.0, 0.0);
    for &i in members {
        let (x, y) = grads.to_frame(i);
        let wgt = grads.mag[i];
        mx += x * wgt;
        my += y * wgt;
        total += wgt;
    }
    if total <= 0.0 {
        return None;
    }
    mx /= total;
    my /= total;

    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for &i in members {
        let (x, y) = grads.to_frame(i);
        let wgt = grads.mag[i];
        sxx += wgt * (x - mx).powi(2);
        syy += wgt * (y - my).powi(2);
        sxy += wgt * (x - mx) * (y - my);
    }

    let theta = 0.5 * (2.0 * sxy).atan2(sxx - syy);
    let (dx, dy) = (theta.cos(), theta.sin());

    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for &i in members {
        let (x, y) = grads.to_frame(i);
        let t = (x - mx) * dx + (y - my) * dy;
        lo = lo.min(t);
        hi = hi.max(t);
    }

    Some(LineSegment::new(
        mx + lo * dx,
        my + lo * dy,
        mx + hi * dx,
        my + hi * dy,
    ))
}

/// Edge pixels from the Sobel field, voted with `imageproc`'s Hough
/// transform. Thresholds are tried strictest first; the first that
/// yields segments wins.
fn hough_segments(grads: &Gradients, config: &LineDetectorConfig) -> Vec<LineSegment> {
    let width = grads.region.width();
    let edge_image = GrayImage::from_fn(width, grads.region.height(), |x, y| {
        let i = (y * width + x) as usize;
        Luma([if grads.mag[i] >= config.gradient_threshold { 255 } else { 0 }])
    });
    let edges: Vec<(f64, f64)> = edge_image
        .enumerate_pixels()
        .filter(|(_, _, p)| p.0[0] > 0)
        .map(|(x, y, _)| (x as f64, y as f64))
        .collect();
    if edges.is_empty() {
        return Vec::new();
    }

    let (ox, oy) = (grads.region.x0 as f64, grads.region.y0 as f64);
    for &vote_threshold in &config.hough_thresholds {
        let lines = hough::detect_lines(
            &edge_image,
            LineDetectionOptions {
                vote_threshold,
                suppression_radius: config.hough_suppression_radius,
            },
        );

        let mut ranked: Vec<(usize, &PolarLine)> = lines
            .iter()
            .map(|line| (line_support(&edges, line), line))
            .collect();
        ranked.sort_by(|a, b| b.0.cmp(&a.0));

        let segments: Vec<LineSegment> = ranked
            .into_iter()
            .take(config.hough_max_lines)
            .map(|(_, line)| line)
            .flat_map(|line| walk_line(&edges, line, config))
            .map(|seg| LineSegment::new(seg.x1 + ox, seg.y1 + oy, seg.x2 + ox, seg.y2 + oy))
            .collect();
        if !segments.is_empty() {
            return segments;
        }
    }

    Vec::new()
}

const LINE_BAND_PX: f64 = 1.5;

/// Unit normal and offset of a polar line.
fn polar_params(line: &PolarLine) -> (f64, f64, f64) {
    let theta = (line.angle_in_degrees as f64).to_radians();
    (theta.cos(), theta.sin(), line.r as f64)
}

fn line_support(edges: &[(f64, f64)], line: &PolarLine) -> usize {
    let (c, s, rho) = polar_params(line);
    edges
        .iter()
        .filter(|&&(x, y)| (x * c + y * s - rho).abs() <= LINE_BAND_PX)
        .count()
}

/// Collect region-local edge pixels on `x cos + y sin = r` and split them
/// into runs separated by more than `max_line_gap`.
fn walk_line(edges: &[(f64, f64)], line: &PolarLine, config: &LineDetectorConfig) -> Vec<LineSegment> {
    let (c, s, rho) = polar_params(line);
    // Direction along the line
    let (dx, dy) = (-s, c);
    let mut along: Vec<(f64, f64, f64)> = edges
        .iter()
        .filter(|&&(x, y)| (x * c + y * s - rho).abs() <= LINE_BAND_PX)
        .map(|&(x, y)| (x * dx + y * dy, x, y))
        .collect();
    along.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut segments = Vec::new();
    let mut run_start = 0;
    for i in 1..=along.len() {
        let split = i == along.len() || along[i].0 - along[i - 1].0 > config.max_line_gap;
        if !split {
            continue;
        }
        if i > run_start {
            let (_, x1, y1) = along[run_start];
            let (_, x2, y2) = along[i - 1];
            let segment = LineSegment::new(x1, y1, x2, y2);
            if segment.length() >= config.min_length {
                segments.push(segment);
            }
        }
        run_start = i;
    }

    segments
}

/// Drop segments that duplicate a longer one.
fn merge_segments(mut segments: Vec<LineSegment>, config: &LineDetectorConfig) -> Vec<LineSegment> {
    segments.sort_by(|a, b| b.length().total_cmp(&a.length()));
    let mut kept: Vec<LineSegment> = Vec::new();

    for seg in segments {
        let duplicate = kept.iter().any(|k| {
            let mut d = (k.orientation() - seg.orientation()).abs();
            if d > 90.0 {
                d = 180.0 - d;
            }
            let (mx, my) = seg.midpoint();
            d <= config.merge_angle_deg && k.line_distance(mx, my) <= config.merge_distance
        });
        if !duplicate {
            kept.push(seg);
        }
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn draw_line(img: &mut GrayImage, x1: f64, y1: f64, x2: f64, y2: f64, thickness: i64) {
        let steps = ((x2 - x1).abs().max((y2 - y1).abs()) * 2.0) as usize;
        for i in 0..=steps {
            let t = i as f64 / steps as f64;
            let x = (x1 + (x2 - x1) * t).round() as i64;
            let y = (y1 + (y2 - y1) * t).round() as i64;
            for oy in 0..thickness {
                for ox in 0..thickness {
                    let (px, py) = (x + ox, y + oy);
                    if px >= 0 && py >= 0 && (px as u32) < img.width() && (py as u32) < img.height() {
                        img.put_pixel(px as u32, py as u32, Luma([20]));
                    }
                }
            }
        }
    }

    #[test]
    fn test_segment_geometry() {
        let seg = LineSegment::new(0.0, 0.0, 10.0, 10.0);
        assert!((seg.length() - 200f64.sqrt()).abs() < 1e-9);
        assert!((seg.angle_from_horizontal() - 45.0).abs() < 1e-9);
        // image y grows downward, so down-right is a negative Cartesian slope
        assert!(seg.cartesian_slope().unwrap() < 0.0);
        assert_eq!(seg.right_endpoint(), (10.0, 10.0));
        assert!((seg.line_distance(10.0, 0.0) - 50f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_detects_dark_diagonal_on_bright_background() {
        let mut img = GrayImage::from_pixel(120, 120, Luma([200]));
        draw_line(&mut img, 20.0, 30.0, 100.0, 90.0, 3);

        let segments = detect_line_segments(&img, Region::full(120, 120), &LineDetectorConfig::default());
        assert!(!segments.is_empty());

        let expected = (60.0f64).atan2(80.0).to_degrees();
        let best = segments
            .iter()
            .max_by(|a, b| a.length().total_cmp(&b.length()))
            .unwrap();
        assert!(best.length() > 50.0);
        assert!((best.angle_from_horizontal() - expected).abs() < 6.0);
    }

    #[test]
    fn test_flat_image_has_no_segments() {
        let img = GrayImage::from_pixel(50, 50, Luma([128]));
        assert!(detect_line_segments(&img, Region::full(50, 50), &LineDetectorConfig::default()).is_empty());
    }

    #[test]
    fn test_hough_recovers_dashed_line() {
        let mut img = GrayImage::from_pixel(100, 100, Luma([200]));
        // Vertical shaft broken into dashes shorter than the region-growing minimum
        for start in (10..90).step_by(8) {
            draw_line(&mut img, 50.0, start as f64, 50.0, start as f64 + 3.0, 2);
        }
        let config = LineDetectorConfig {
            min_region_size: 1000,
            ..Default::default()
        };

        let segments = detect_line_segments(&img, Region::full(100, 100), &config);
        let best = segments
            .iter()
            .max_by(|a, b| a.length().total_cmp(&b.length()))
            .expect("hough should bridge the dashes");
        assert!(best.length() > 60.0, "length = {}", best.length());
        assert!(best.angle_from_horizontal() > 85.0);
    }

    #[test]
    fn test_merge_suppresses_parallel_duplicates() {
        let config = LineDetectorConfig::default();
        let merged = merge_segments(
            vec![
                LineSegment::new(0.0, 0.0, 100.0, 0.0),
                LineSegment::new(10.0, 2.0, 60.0, 2.0),
                LineSegment::new(0.0, 50.0, 100.0, 50.0),
            ],
            &config,
        );
        assert_eq!(merged.len(), 2);
    }
}
