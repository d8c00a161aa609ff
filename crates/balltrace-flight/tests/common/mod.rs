//! Rendered synthetic driving-range video and image-based detectors.

#![allow(dead_code)]

use balltrace_flight::{
    AudioTrack, FlightResult, FrameSource, ObjectDetection, ObjectDetector, VideoMetadata,
};
use balltrace_models::BoundingBox;
use image::{Rgb, RgbImage};

pub const WIDTH: u32 = 320;
pub const HEIGHT: u32 = 240;
pub const FPS: f64 = 30.0;
pub const DURATION: f64 = 20.0;
pub const STRIKE_TIME: f64 = 10.0;

const GRASS: Rgb<u8> = Rgb([60, 140, 60]);
const BALL: Rgb<u8> = Rgb([245, 245, 245]);
const GOLFER: Rgb<u8> = Rgb([40, 40, 60]);

/// Ball at address in front of the golfer, struck at [`STRIKE_TIME`].
pub struct RangeVideo {
    /// Shift the golfer's body sideways for a few frames around impact
    pub swing: bool,
    /// Whether the ball leaves its address position at the strike
    pub launch: bool,
}

impl RangeVideo {
    pub fn new() -> Self {
        Self {
            swing: false,
            launch: true,
        }
    }

    pub fn with_swing() -> Self {
        Self {
            swing: true,
            launch: true,
        }
    }

    /// A whiff: the ball never moves.
    pub fn without_launch() -> Self {
        Self {
            swing: false,
            launch: false,
        }
    }

    /// Ball center in pixels, `None` once it has left the frame.
    pub fn ball_position(frame_index: usize) -> Option<(f64, f64)> {
        let strike_frame = (STRIKE_TIME * FPS) as usize;
        if frame_index < strike_frame {
            return Some((160.0, 200.0));
        }
        let tau = (frame_index - strike_frame) as f64 / FPS;
        let x = 160.0 + 30.0 * tau;
        let y = 200.0 - 300.0 * tau + 150.0 * tau * tau;
        if y > HEIGHT as f64 + 3.0 {
            None
        } else {
            Some((x, y))
        }
    }

    fn render(&self, frame_index: usize) -> RgbImage {
        let mut img = RgbImage::from_pixel(WIDTH, HEIGHT, GRASS);
        let t = frame_index as f64 / FPS;
        let shift = if self.swing && (t - STRIKE_TIME).abs() < 0.15 { -12.0 } else { 0.0 };
        fill_rect(&mut img, 96.0 + shift, 90.0, 48.0, 120.0, GOLFER);
        let ball = if self.launch {
            Self::ball_position(frame_index)
        } else {
            Self::ball_position(0)
        };
        if let Some((x, y)) = ball {
            fill_disc(&mut img, x, y, 3.0, BALL);
        }
        img
    }
}

impl FrameSource for RangeVideo {
    fn metadata(&self) -> VideoMetadata {
        VideoMetadata {
            fps: FPS,
            width: WIDTH,
            height: HEIGHT,
            duration: DURATION,
        }
    }

    fn frame_at(&self, timestamp: f64) -> FlightResult<Option<RgbImage>> {
        if !(0.0..=DURATION).contains(&timestamp) {
            return Ok(None);
        }
        Ok(Some(self.render(self.metadata().frame_index(timestamp))))
    }
}

/// Reports a fixed golfer box, or nothing.
pub struct GolferDetector {
    pub present: bool,
}

impl ObjectDetector for GolferDetector {
    fn detect(&self, _frame: &RgbImage) -> FlightResult<Vec<ObjectDetection>> {
        if !self.present {
            return Ok(Vec::new());
        }
        Ok(vec![ObjectDetection::new(
            BoundingBox::new(90.0, 85.0, 60.0, 130.0),
            0.95,
        )])
    }

    fn target_class(&self) -> &str {
        "person"
    }
}

/// Finds the bright ball pixels and reports their bounding box.
pub struct BrightBallDetector;

impl ObjectDetector for BrightBallDetector {
    fn detect(&self, frame: &RgbImage) -> FlightResult<Vec<ObjectDetection>> {
        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for (x, y, px) in frame.enumerate_pixels() {
            if px.0.iter().all(|&c| c > 220) {
                bounds = Some(match bounds {
                    None => (x, y, x, y),
                    Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                });
            }
        }
        Ok(bounds
            .map(|(x0, y0, x1, y1)| {
                let bbox = BoundingBox::new(
                    x0 as f64,
                    y0 as f64,
                    (x1 - x0 + 1) as f64,
                    (y1 - y0 + 1) as f64,
                );
                vec![ObjectDetection::new(bbox, 0.9)]
            })
            .unwrap_or_default())
    }

    fn target_class(&self) -> &str {
        "sports ball"
    }
}

pub const AUDIO_RATE: u32 = 8000;

/// Faint hiss with a sharp high crack at [`STRIKE_TIME`] and a low thud
/// at `landing_time`.
pub fn range_audio(landing_time: f64) -> AudioTrack {
    let sr = AUDIO_RATE as f64;
    let mut samples = vec![0.0f32; (sr * DURATION) as usize];
    add_tone(&mut samples, 0.0, DURATION, 2500.0, 0.002);
    add_tone(&mut samples, STRIKE_TIME, 0.05, 3000.0, 0.9);
    add_tone(&mut samples, landing_time, 0.12, 200.0, 0.5);
    AudioTrack::new(samples, AUDIO_RATE)
}

fn add_tone(samples: &mut [f32], start: f64, dur: f64, freq: f64, amp: f32) {
    let sr = AUDIO_RATE as f64;
    let s = (start * sr) as usize;
    let e = ((start + dur) * sr) as usize;
    for (i, sample) in samples.iter_mut().enumerate().take(e).skip(s) {
        *sample += amp * (2.0 * std::f64::consts::PI * freq * i as f64 / sr).sin() as f32;
    }
}

pub fn fill_disc(img: &mut RgbImage, cx: f64, cy: f64, r: f64, color: Rgb<u8>) {
    let x0 = (cx - r).floor().max(0.0) as u32;
    let y0 = (cy - r).floor().max(0.0) as u32;
    let x1 = ((cx + r).ceil().max(0.0) as u32).min(img.width() - 1);
    let y1 = ((cy + r).ceil().max(0.0) as u32).min(img.height() - 1);
    for y in y0..=y1 {
        for x in x0..=x1 {
            if (x as f64 - cx).powi(2) + (y as f64 - cy).powi(2) <= r * r {
                img.put_pixel(x, y, color);
            }
        }
    }
}

pub fn fill_rect(img: &mut RgbImage, x: f64, y: f64, w: f64, h: f64, color: Rgb<u8>) {
    let x0 = x.max(0.0) as u32;
    let y0 = y.max(0.0) as u32;
    let x1 = ((x + w).max(0.0) as u32).min(img.width());
    let y1 = ((y + h).max(0.0) as u32).min(img.height());
    for yy in y0..y1 {
        for xx in x0..x1 {
            img.put_pixel(xx, yy, color);
        }
    }
}
