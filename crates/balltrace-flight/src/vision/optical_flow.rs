//! Sparse optical flow: FAST corners and iterative Lucas-Kanade over
//! Sobel gradients.

use image::{GrayImage, ImageBuffer, Luma};
use imageproc::corners::{self, Corner};
use imageproc::gradients;
use serde::{Deserialize, Serialize};

use super::frame_ops::{crop_gray, Region};

/// Lucas-Kanade tracker tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LucasKanadeConfig {
    /// Half-size of the integration window (window is 2r+1 square)
    pub window_radius: i32,
    pub max_iterations: usize,
    /// Stop when the update step is shorter than this (pixels)
    pub epsilon: f64,
    /// Reject points whose structure tensor is this degenerate
    pub min_eigenvalue: f64,
    /// Reject points that move further than this in one frame
    pub max_displacement: f64,
}

impl Default for LucasKanadeConfig {
    fn default() -> Self {
        Self {
            window_radius: 7,
            max_iterations: 20,
            epsilon: 0.01,
            min_eigenvalue: 1e-3,
            max_displacement: 80.0,
        }
    }
}

/// Bilinear read of a single-channel image through `pixel`.
fn bilinear(width: u32, height: u32, x: f64, y: f64, pixel: impl Fn(u32, u32) -> f64) -> f64 {
    let x = x.clamp(0.0, (width - 1) as f64);
    let y = y.clamp(0.0, (height - 1) as f64);
    let (x0, y0) = (x.floor(), y.floor());
    let (fx, fy) = (x - x0, y - y0);
    let (x0, y0) = (x0 as u32, y0 as u32);
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);

    pixel(x0, y0) * (1.0 - fx) * (1.0 - fy)
        + pixel(x1, y0) * fx * (1.0 - fy)
        + pixel(x0, y1) * (1.0 - fx) * fy
        + pixel(x1, y1) * fx * fy
}

fn sample(img: &GrayImage, x: f64, y: f64) -> f64 {
    bilinear(img.width(), img.height(), x, y, |x, y| img.get_pixel(x, y).0[0] as f64)
}

/// Sobel responses of the reference frame, scaled to intensity per pixel.
struct GradientField {
    gx: ImageBuffer<Luma<i16>, Vec<i16>>,
    gy: ImageBuffer<Luma<i16>, Vec<i16>>,
}

impl GradientField {
    // 3x3 Sobel weights sum to 8 across the central difference span
    const SOBEL_SCALE: f64 = 8.0;

    fn new(img: &GrayImage) -> Self {
        Self {
            gx: gradients::horizontal_sobel(img),
            gy: gradients::vertical_sobel(img),
        }
    }

    fn at(&self, x: f64, y: f64) -> (f64, f64) {
        let (w, h) = self.gx.dimensions();
        let read = |img: &ImageBuffer<Luma<i16>, Vec<i16>>| {
            bilinear(w, h, x, y, |px, py| img.get_pixel(px, py).0[0] as f64) / Self::SOBEL_SCALE
        };
        (read(&self.gx), read(&self.gy))
    }
}

/// Smaller eigenvalue of the 2x2 structure tensor `[a b; b c]`.
fn min_eigen(a: f64, b: f64, c: f64) -> f64 {
    let trace = a + c;
    let det = a * c - b * b;
    let disc = (trace * trace / 4.0 - det).max(0.0).sqrt();
    trace / 2.0 - disc
}

// FAST needs a 3 px ring around each tested pixel
const FAST_RING: f64 = 3.0;

/// FAST-9 corners inside `region`, strongest first.
///
/// `quality_level` is relative to the strongest corner score; corners
/// closer than `min_distance` to a stronger one are dropped.
pub fn good_features(
    img: &GrayImage,
    region: Region,
    max_corners: usize,
    fast_threshold: u8,
    quality_level: f64,
    min_distance: f64,
) -> Vec<(f64, f64)> {
    if region.is_empty() {
        return Vec::new();
    }

    let padded = Region::clamped(
        region.x0 as f64 - FAST_RING,
        region.y0 as f64 - FAST_RING,
        region.x1 as f64 + FAST_RING,
        region.y1 as f64 + FAST_RING,
        img.width(),
        img.height(),
    );
    let patch = crop_gray(img, padded);

    let mut found: Vec<Corner> = corners::corners_fast9(&patch, fast_threshold)
        .into_iter()
        .filter(|c| region.contains(padded.x0 + c.x, padded.y0 + c.y))
        .collect();
    let best = found.iter().map(|c| c.score).fold(0.0f32, f32::max);
    if best <= 0.0 {
        return Vec::new();
    }

    found.retain(|c| c.score as f64 >= best as f64 * quality_level);
    found.sort_by(|a, b| b.score.total_cmp(&a.score));

    let min_d2 = min_distance * min_distance;
    let mut kept: Vec<(f64, f64)> = Vec::new();
    for corner in found {
        if kept.len() >= max_corners {
            break;
        }
        let x = (padded.x0 + corner.x) as f64;
        let y = (padded.y0 + corner.y) as f64;
        if kept
            .iter()
            .all(|&(kx, ky)| (kx - x).powi(2) + (ky - y).powi(2) >= min_d2)
        {
            kept.push((x, y));
        }
    }
    kept
}

/// Track points from `prev` into `cur`. `None` marks a lost point.
pub fn track_points(
    prev: &GrayImage,
    cur: &GrayImage,
    points: &[(f64, f64)],
    config: &LucasKanadeConfig,
) -> Vec<Option<(f64, f64)>> {
    if prev.width() < 2 || prev.height() < 2 {
        return vec![None; points.len()];
    }
    let field = GradientField::new(prev);
    points
        .iter()
        .map(|&p| track_one(prev, &field, cur, p, config))
        .collect()
}

fn track_one(
    prev: &GrayImage,
    field: &GradientField,
    cur: &GrayImage,
    (px, py): (f64, f64),
    config: &LucasKanadeConfig,
) -> Option<(f64, f64)> {
    let r = config.window_radius;
    let n = ((2 * r + 1) * (2 * r + 1)) as f64;

    let mut window = Vec::with_capacity(((2 * r + 1) * (2 * r + 1)) as usize);
    let (mut a, mut b, mut c) = (0.0, 0.0, 0.0);
    for wy in -r..=r {
        for wx in -r..=r {
            let x = px + wx as f64;
            let y = py + wy as f64;
            let (gx, gy) = field.at(x, y);
            a += gx * gx;
            b += gx * gy;
            c += gy * gy;
            window.push((x, y, gx, gy, sample(prev, x, y)));
        }
    }

    if min_eigen(a, b, c) / n < config.min_eigenvalue {
        return None;
    }
    let det = a * c - b * b;
    if det.abs() < 1e-12 {
        return None;
    }

    let (mut dx, mut dy) = (0.0, 0.0);
    for _ in 0..config.max_iterations {
        let (mut bx, mut by) = (0.0, 0.0);
        for &(x, y, gx, gy, i0) in &window {
            let diff = i0 - sample(cur, x + dx, y + dy);
            bx += diff * gx;
            by += diff * gy;
        }
        let step_x = (c * bx - b * by) / det;
        let step_y = (a * by - b * bx) / det;
        dx += step_x;
        dy += step_y;

        if (dx * dx + dy * dy).sqrt() > config.max_displacement {
            return None;
        }
        if (step_x * step_x + step_y * step_y).sqrt() < config.epsilon {
            break;
        }
    }

    let nx = px + dx;
    let ny = py + dy;
    if nx < 0.0 || ny < 0.0 || nx > (cur.width() - 1) as f64 || ny > (cur.height() - 1) as f64 {
        return None;
    }
    Some((nx, ny))
}
