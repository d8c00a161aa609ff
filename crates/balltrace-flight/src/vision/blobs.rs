//! Connected-component blobs over a binary mask.

use image::Luma;
use imageproc::region_labelling::{connected_components, Connectivity};

use super::frame_ops::BinaryMask;

/// One 8-connected group of changed pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Blob {
    /// Centroid x in frame pixels
    pub cx: f64,
    /// Centroid y in frame pixels
    pub cy: f64,
    /// Pixel count
    pub area: usize,
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
    /// Mean mask source value over the blob (0-255)
    pub mean_value: f64,
    /// Member pixels in frame coordinates
    pub pixels: Vec<(u32, u32)>,
}

/// Extract blobs with `min_area <= area <= max_area`.
pub fn find_blobs(mask: &BinaryMask, min_area: usize, max_area: usize) -> Vec<Blob> {
    let labels = connected_components(&mask.mask, Connectivity::Eight, Luma([0u8]));
    let region = mask.region;

    let mut groups: Vec<Vec<(u32, u32)>> = Vec::new();
    for (x, y, label) in labels.enumerate_pixels() {
        let label = label.0[0] as usize;
        if label == 0 {
            continue;
        }
        if groups.len() < label {
            groups.resize_with(label, Vec::new);
        }
        groups[label - 1].push((x, y));
    }

    groups
        .into_iter()
        .filter(|local| !local.is_empty() && (min_area..=max_area).contains(&local.len()))
        .map(|local| {
            let area = local.len();
            let mut value_sum = 0.0;
            let (mut sx, mut sy) = (0.0, 0.0);
            let (mut min_x, mut min_y) = (u32::MAX, u32::MAX);
            let (mut max_x, mut max_y) = (0, 0);
            let pixels: Vec<(u32, u32)> = local
                .into_iter()
                .map(|(lx, ly)| {
                    let (x, y) = (region.x0 + lx, region.y0 + ly);
                    value_sum += mask.value_at(x, y) as f64;
                    sx += x as f64;
                    sy += y as f64;
                    min_x = min_x.min(x);
                    min_y = min_y.min(y);
                    max_x = max_x.max(x);
                    max_y = max_y.max(y);
                    (x, y)
                })
                .collect();

            Blob {
                cx: sx / area as f64,
                cy: sy / area as f64,
                area,
                min_x,
                min_y,
                max_x,
                max_y,
                mean_value: value_sum / area as f64,
                pixels,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::frame_ops::{diff_mask, Region};
    use image::GrayImage;

    #[test]
    fn test_two_separate_blobs() {
        let prev = GrayImage::from_pixel(20, 20, Luma([0]));
        let mut cur = prev.clone();
        for (x, y) in [(2, 2), (3, 2), (2, 3), (3, 3)] {
            cur.put_pixel(x, y, Luma([255]));
        }
        cur.put_pixel(15, 15, Luma([255]));
        // diagonal neighbour joins under 8-connectivity
        cur.put_pixel(16, 16, Luma([255]));

        let mask = diff_mask(&prev, &cur, Region::full(20, 20), 10);
        let mut blobs = find_blobs(&mask, 1, 100);
        blobs.sort_by_key(|b| b.area);

        assert_eq!(blobs.len(), 2);
        assert_eq!(blobs[0].area, 2);
        assert!((blobs[0].cx - 15.5).abs() < 1e-9);
        assert_eq!(blobs[1].area, 4);
        assert!((blobs[1].cx - 2.5).abs() < 1e-9);
        assert!((blobs[1].mean_value - 255.0).abs() < 1e-9);
    }

    #[test]
    fn test_area_filter() {
        let prev = GrayImage::from_pixel(10, 10, Luma([0]));
        let mut cur = prev.clone();
        cur.put_pixel(5, 5, Luma([255]));
        let mask = diff_mask(&prev, &cur, Region::full(10, 10), 10);
        assert!(find_blobs(&mask, 2, 100).is_empty());
    }
}
