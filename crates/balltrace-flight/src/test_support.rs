//! Synthetic collaborators for unit tests.

use balltrace_models::BoundingBox;
use image::{Rgb, RgbImage};

use crate::error::FlightResult;
use crate::source::{FrameSource, ObjectDetection, ObjectDetector, VideoMetadata};

/// Uniform frames whose pixel (0, 0) encodes the frame index.
pub struct IndexedFrames {
    pub meta: VideoMetadata,
    pub background: Rgb<u8>,
}

impl IndexedFrames {
    pub fn new(width: u32, height: u32, fps: f64, duration: f64) -> Self {
        Self {
            meta: VideoMetadata {
                fps,
                width,
                height,
                duration,
            },
            background: Rgb([60, 140, 60]),
        }
    }
}

pub fn frame_index_of(frame: &RgbImage) -> usize {
    let [a, b, c] = frame.get_pixel(0, 0).0;
    ((a as usize) << 16) | ((b as usize) << 8) | c as usize
}

impl FrameSource for IndexedFrames {
    fn metadata(&self) -> VideoMetadata {
        self.meta
    }

    fn frame_at(&self, timestamp: f64) -> FlightResult<Option<RgbImage>> {
        if timestamp < 0.0 || timestamp > self.meta.duration {
            return Ok(None);
        }
        let idx = self.meta.frame_index(timestamp);
        let mut img = RgbImage::from_pixel(self.meta.width, self.meta.height, self.background);
        img.put_pixel(
            0,
            0,
            Rgb([(idx >> 16) as u8, (idx >> 8) as u8, idx as u8]),
        );
        Ok(Some(img))
    }
}

/// Detector answering from a function of the frame index.
pub struct ScriptedDetector<F>
where
    F: Fn(usize) -> Vec<(f64, f64, f64)> + Send + Sync,
{
    pub class: &'static str,
    pub size: f64,
    pub script: F,
}

impl<F> ObjectDetector for ScriptedDetector<F>
where
    F: Fn(usize) -> Vec<(f64, f64, f64)> + Send + Sync,
{
    fn detect(&self, frame: &RgbImage) -> FlightResult<Vec<ObjectDetection>> {
        let idx = frame_index_of(frame);
        Ok((self.script)(idx)
            .into_iter()
            .map(|(cx, cy, conf)| {
                ObjectDetection::new(
                    BoundingBox::new(cx - self.size / 2.0, cy - self.size / 2.0, self.size, self.size),
                    conf,
                )
            })
            .collect())
    }

    fn target_class(&self) -> &str {
        self.class
    }
}

/// The same picture for every in-range timestamp, index-stamped like
/// [`IndexedFrames`].
pub struct StaticFrames {
    pub meta: VideoMetadata,
    pub image: RgbImage,
}

impl StaticFrames {
    pub fn new(image: RgbImage, fps: f64, duration: f64) -> Self {
        Self {
            meta: VideoMetadata {
                fps,
                width: image.width(),
                height: image.height(),
                duration,
            },
            image,
        }
    }
}

impl FrameSource for StaticFrames {
    fn metadata(&self) -> VideoMetadata {
        self.meta
    }

    fn frame_at(&self, timestamp: f64) -> FlightResult<Option<RgbImage>> {
        if timestamp < 0.0 || timestamp > self.meta.duration {
            return Ok(None);
        }
        let idx = self.meta.frame_index(timestamp);
        let mut img = self.image.clone();
        img.put_pixel(
            0,
            0,
            Rgb([(idx >> 16) as u8, (idx >> 8) as u8, idx as u8]),
        );
        Ok(Some(img))
    }
}

pub fn fill_disc(img: &mut RgbImage, cx: f64, cy: f64, r: f64, color: Rgb<u8>) {
    let x0 = (cx - r).floor().max(0.0) as u32;
    let y0 = (cy - r).floor().max(0.0) as u32;
    let x1 = ((cx + r).ceil() as u32).min(img.width() - 1);
    let y1 = ((cy + r).ceil() as u32).min(img.height() - 1);
    for y in y0..=y1 {
        for x in x0..=x1 {
            if (x as f64 - cx).powi(2) + (y as f64 - cy).powi(2) <= r * r {
                img.put_pixel(x, y, color);
            }
        }
    }
}

pub fn draw_thick_line(img: &mut RgbImage, from: (f64, f64), to: (f64, f64), radius: f64, color: Rgb<u8>) {
    let steps = ((to.0 - from.0).abs().max((to.1 - from.1).abs()) * 2.0).max(1.0) as usize;
    for i in 0..=steps {
        let t = i as f64 / steps as f64;
        fill_disc(
            img,
            from.0 + (to.0 - from.0) * t,
            from.1 + (to.1 - from.1) * t,
            radius,
            color,
        );
    }
}
