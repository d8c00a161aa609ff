//! Interfaces to external collaborators: decoded frames, audio and the
//! object detector.
//!
//! The core never decodes media itself. Implementations of these traits
//! own all blocking I/O.

use balltrace_models::BoundingBox;
use image::RgbImage;

use crate::error::FlightResult;

/// Frame-source metadata.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoMetadata {
    pub fps: f64,
    pub width: u32,
    pub height: u32,
    /// Duration in seconds.
    pub duration: f64,
}

impl VideoMetadata {
    /// Frame index nearest to `timestamp`.
    pub fn frame_index(&self, timestamp: f64) -> usize {
        (timestamp.max(0.0) * self.fps).round() as usize
    }

    /// Timestamp of a frame index.
    pub fn timestamp(&self, frame_index: usize) -> f64 {
        frame_index as f64 / self.fps
    }

    /// Seconds per frame.
    pub fn frame_interval(&self) -> f64 {
        1.0 / self.fps
    }

    /// Index of the last decodable frame.
    pub fn last_frame_index(&self) -> usize {
        ((self.duration * self.fps).floor() as usize).saturating_sub(1)
    }

    /// Frame diagonal in pixels.
    pub fn diagonal(&self) -> f64 {
        ((self.width as f64).powi(2) + (self.height as f64).powi(2)).sqrt()
    }
}

/// Random-access decoded frames.
pub trait FrameSource: Send + Sync {
    fn metadata(&self) -> VideoMetadata;

    /// Decoded frame nearest to `timestamp`, or `None` outside the video.
    fn frame_at(&self, timestamp: f64) -> FlightResult<Option<RgbImage>>;

    /// Decoded frame by index.
    fn frame(&self, frame_index: usize) -> FlightResult<Option<RgbImage>> {
        let meta = self.metadata();
        self.frame_at(meta.timestamp(frame_index))
    }
}

/// One detector output box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectDetection {
    /// Bounding box in pixel coordinates.
    pub bbox: BoundingBox,
    /// Detection confidence [0, 1]
    pub confidence: f64,
}

impl ObjectDetection {
    pub fn new(bbox: BoundingBox, confidence: f64) -> Self {
        Self { bbox, confidence }
    }

    /// Center point in pixels.
    pub fn center(&self) -> (f64, f64) {
        (self.bbox.cx(), self.bbox.cy())
    }
}

/// Black-box object detector pre-filtered to a single class.
pub trait ObjectDetector: Send + Sync {
    fn detect(&self, frame: &RgbImage) -> FlightResult<Vec<ObjectDetection>>;

    /// Class this detector reports (e.g. "person", "sports ball").
    fn target_class(&self) -> &str;
}

/// Decoded mono PCM audio.
#[derive(Debug, Clone, Default)]
pub struct AudioTrack {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioTrack {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Sample index for a timestamp (clamped to the track).
    pub fn sample_index(&self, timestamp: f64) -> usize {
        ((timestamp.max(0.0) * self.sample_rate as f64) as usize).min(self.samples.len())
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_index_round_trip() {
        let meta = VideoMetadata {
            fps: 30.0,
            width: 640,
            height: 480,
            duration: 20.0,
        };
        assert_eq!(meta.frame_index(10.0), 300);
        assert!((meta.timestamp(300) - 10.0).abs() < 1e-12);
        assert_eq!(meta.last_frame_index(), 599);
        assert_eq!(meta.diagonal(), 800.0);
    }

    #[test]
    fn test_audio_sample_index_clamped() {
        let audio = AudioTrack::new(vec![0.0; 100], 10);
        assert_eq!(audio.duration(), 10.0);
        assert_eq!(audio.sample_index(5.0), 50);
        assert_eq!(audio.sample_index(50.0), 100);
    }
}
