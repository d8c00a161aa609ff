//! Grayscale conversion, regions and frame differencing.

use balltrace_models::BoundingBox;
use image::{imageops, GrayImage, Luma, RgbImage};
use imageproc::{contrast, map};

/// Integer pixel rectangle `[x0, x1) x [y0, y1)`, always inside the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl Region {
    /// Region covering a whole frame.
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x0: 0,
            y0: 0,
            x1: width,
            y1: height,
        }
    }

    /// Region from float bounds, clamped to the frame.
    pub fn clamped(x0: f64, y0: f64, x1: f64, y1: f64, width: u32, height: u32) -> Self {
        let cx = |v: f64| v.floor().clamp(0.0, width as f64) as u32;
        let cy = |v: f64| v.floor().clamp(0.0, height as f64) as u32;
        let (ax, bx) = (cx(x0.min(x1)), cx(x0.max(x1).ceil()));
        let (ay, by) = (cy(y0.min(y1)), cy(y0.max(y1).ceil()));
        Self {
            x0: ax,
            y0: ay,
            x1: bx,
            y1: by,
        }
    }

    /// Square region centered on a point.
    pub fn around(x: f64, y: f64, radius: f64, width: u32, height: u32) -> Self {
        Self::clamped(x - radius, y - radius, x + radius, y + radius, width, height)
    }

    pub fn from_bbox(bbox: &BoundingBox, width: u32, height: u32) -> Self {
        Self::clamped(bbox.x, bbox.y, bbox.x2(), bbox.y2(), width, height)
    }

    pub fn width(&self) -> u32 {
        self.x1.saturating_sub(self.x0)
    }

    pub fn height(&self) -> u32 {
        self.y1.saturating_sub(self.y0)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }
}

/// Luma conversion.
pub fn to_gray(frame: &RgbImage) -> GrayImage {
    imageops::grayscale(frame)
}

/// Copy of `region` out of a grayscale frame.
pub fn crop_gray(image: &GrayImage, region: Region) -> GrayImage {
    imageops::crop_imm(image, region.x0, region.y0, region.width(), region.height()).to_image()
}

/// Binary mask over a region, with the per-pixel values it was
/// thresholded from (frame difference, brightness).
#[derive(Debug, Clone)]
pub struct BinaryMask {
    pub region: Region,
    /// Source value per region pixel
    pub values: GrayImage,
    /// 255 where set, 0 elsewhere
    pub mask: GrayImage,
}

impl BinaryMask {
    pub fn new(region: Region, values: GrayImage, mask: GrayImage) -> Self {
        Self { region, values, mask }
    }

    /// Mask of `values > threshold`.
    pub fn from_threshold(region: Region, values: GrayImage, threshold: u8) -> Self {
        let mask = contrast::threshold(&values, threshold);
        Self { region, values, mask }
    }

    pub fn is_set(&self, x: u32, y: u32) -> bool {
        self.region.contains(x, y) && self.mask.get_pixel(x - self.region.x0, y - self.region.y0).0[0] > 0
    }

    pub fn value_at(&self, x: u32, y: u32) -> u8 {
        self.values.get_pixel(x - self.region.x0, y - self.region.y0).0[0]
    }

    pub fn active_pixels(&self) -> usize {
        self.mask.pixels().filter(|p| p.0[0] > 0).count()
    }
}

fn abs_diff(prev: &GrayImage, cur: &GrayImage) -> GrayImage {
    map::map_colors2(prev, cur, |a: Luma<u8>, b: Luma<u8>| Luma([a.0[0].abs_diff(b.0[0])]))
}

/// Absolute grayscale difference of two frames inside `region`.
pub fn diff_mask(prev: &GrayImage, cur: &GrayImage, region: Region, threshold: u8) -> BinaryMask {
    let diff = abs_diff(&crop_gray(prev, region), &crop_gray(cur, region));
    BinaryMask::from_threshold(region, diff, threshold)
}

/// Mean absolute grayscale difference, sampling every `step` pixels.
pub fn mean_abs_diff(prev: &GrayImage, cur: &GrayImage, step: u32) -> f64 {
    let step = step.max(1);
    let region = Region::full(prev.width().min(cur.width()), prev.height().min(cur.height()));
    if region.is_empty() {
        return 0.0;
    }
    let diff = abs_diff(&crop_gray(prev, region), &crop_gray(cur, region));

    let (total, count) = diff
        .enumerate_pixels()
        .filter(|(x, y, _)| x % step == 0 && y % step == 0)
        .fold((0u64, 0u64), |(t, c), (_, _, p)| (t + p.0[0] as u64, c + 1));

    if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_region_clamps_to_frame() {
        let r = Region::around(5.0, 95.0, 10.0, 100, 100);
        assert_eq!((r.x0, r.y0, r.x1, r.y1), (0, 85, 15, 100));
        assert!(Region::clamped(200.0, 0.0, 300.0, 10.0, 100, 100).is_empty());
    }

    #[test]
    fn test_diff_mask_marks_changed_pixels() {
        let prev = GrayImage::from_pixel(10, 10, Luma([50]));
        let mut cur = prev.clone();
        cur.put_pixel(3, 4, Luma([200]));

        let mask = diff_mask(&prev, &cur, Region::full(10, 10), 25);
        assert_eq!(mask.active_pixels(), 1);
        assert!(mask.is_set(3, 4));
        assert_eq!(mask.value_at(3, 4), 150);
    }

    #[test]
    fn test_diff_mask_is_local_to_region() {
        let prev = GrayImage::from_pixel(20, 20, Luma([50]));
        let mut cur = prev.clone();
        cur.put_pixel(2, 2, Luma([200]));
        cur.put_pixel(12, 14, Luma([200]));

        let mask = diff_mask(&prev, &cur, Region::clamped(10.0, 10.0, 20.0, 20.0, 20, 20), 25);
        assert_eq!(mask.active_pixels(), 1);
        assert!(mask.is_set(12, 14));
        assert!(!mask.is_set(2, 2));
    }

    #[test]
    fn test_mean_abs_diff_samples_grid() {
        let prev = GrayImage::from_pixel(8, 8, Luma([10]));
        let cur = GrayImage::from_pixel(8, 8, Luma([30]));
        assert!((mean_abs_diff(&prev, &cur, 2) - 20.0).abs() < 1e-9);
        assert_eq!(mean_abs_diff(&prev, &prev, 1), 0.0);
    }

    #[test]
    fn test_to_gray_white_is_white() {
        let frame = RgbImage::from_pixel(2, 2, Rgb([255, 255, 255]));
        assert_eq!(to_gray(&frame).get_pixel(1, 1).0[0], 255);
    }
}
