//! Ball color template.

use image::RgbImage;

use super::blobs::Blob;

/// Mean color of the ball patch captured just before the strike.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorTemplate {
    /// Mean RGB of the ball pixels.
    pub mean_rgb: [f64; 3],
    /// Mean luma of the ball pixels (0-255).
    pub brightness: f64,
    /// Maximum RGB distance that still scores above zero.
    pub max_distance: f64,
}

impl ColorTemplate {
    /// Generic white-ball template used when no patch is available.
    pub fn white_ball(max_distance: f64) -> Self {
        Self {
            mean_rgb: [235.0, 235.0, 235.0],
            brightness: 235.0,
            max_distance,
        }
    }

    /// Sample a disc of `radius` around `(x, y)` and keep its brightest
    /// quarter, which is the ball against darker turf.
    pub fn extract(frame: &RgbImage, x: f64, y: f64, radius: f64, max_distance: f64) -> Option<Self> {
        let r2 = radius * radius;
        let mut samples: Vec<([f64; 3], f64)> = Vec::new();

        let x0 = (x - radius).floor().max(0.0) as u32;
        let y0 = (y - radius).floor().max(0.0) as u32;
        let x1 = ((x + radius).ceil() as u32).min(frame.width().saturating_sub(1));
        let y1 = ((y + radius).ceil() as u32).min(frame.height().saturating_sub(1));

        for py in y0..=y1 {
            for px in x0..=x1 {
                let dx = px as f64 - x;
                let dy = py as f64 - y;
                if dx * dx + dy * dy > r2 {
                    continue;
                }
                let [r, g, b] = frame.get_pixel(px, py).0;
                let rgb = [r as f64, g as f64, b as f64];
                samples.push((rgb, luma(rgb)));
            }
        }

        if samples.is_empty() {
            return None;
        }

        samples.sort_by(|a, b| b.1.total_cmp(&a.1));
        let keep = (samples.len() / 4).max(1);
        let top = &samples[..keep];

        let mut mean = [0.0; 3];
        for (rgb, _) in top {
            for c in 0..3 {
                mean[c] += rgb[c];
            }
        }
        for value in &mut mean {
            *value /= keep as f64;
        }

        Some(Self {
            mean_rgb: mean,
            brightness: luma(mean),
            max_distance,
        })
    }

    /// Similarity of an RGB color to the template in [0, 1].
    pub fn score_color(&self, rgb: [f64; 3]) -> f64 {
        let dist = ((rgb[0] - self.mean_rgb[0]).powi(2)
            + (rgb[1] - self.mean_rgb[1]).powi(2)
            + (rgb[2] - self.mean_rgb[2]).powi(2))
        .sqrt();
        (1.0 - dist / self.max_distance.max(1.0)).max(0.0)
    }

    /// Similarity of a blob's pixels (sampled from `frame`) to the template.
    pub fn score_blob(&self, frame: &RgbImage, blob: &Blob) -> f64 {
        if blob.pixels.is_empty() {
            return 0.0;
        }
        let mut mean = [0.0; 3];
        for &(x, y) in &blob.pixels {
            let [r, g, b] = frame.get_pixel(x, y).0;
            mean[0] += r as f64;
            mean[1] += g as f64;
            mean[2] += b as f64;
        }
        let n = blob.pixels.len() as f64;
        self.score_color([mean[0] / n, mean[1] / n, mean[2] / n])
    }
}

fn luma(rgb: [f64; 3]) -> f64 {
    0.299 * rgb[0] + 0.587 * rgb[1] + 0.114 * rgb[2]
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_extract_prefers_bright_pixels() {
        let mut frame = RgbImage::from_pixel(40, 40, Rgb([40, 120, 40]));
        for y in 18..=22 {
            for x in 18..=22 {
                frame.put_pixel(x, y, Rgb([250, 250, 250]));
            }
        }

        let template = ColorTemplate::extract(&frame, 20.0, 20.0, 4.0, 150.0).unwrap();
        assert!(template.brightness > 200.0);
        assert!(template.score_color([250.0, 250.0, 250.0]) > 0.9);
        assert_eq!(template.score_color([40.0, 120.0, 40.0]), 0.0);
    }
}
