//! Landing estimation from audio, frame exit and physics.
//!
//! All three estimators are independent. [`LandingEstimator::select_best`]
//! orders by method priority (audio > frame exit > physics) and then by
//! confidence. The physics estimator always produces a result, so a shot
//! with a strike always has a landing estimate.

use std::f64::consts::PI;

use balltrace_models::{AssembledTrajectory, ExitEdge, LandingEstimate, LandingMethod, StrikeEvent};
use nalgebra::Complex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::physics::LaunchParameters;
use crate::source::AudioTrack;

/// Landing estimation tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LandingConfig {
    /// Audio search window relative to the strike (s)
    pub audio_window_start: f64,
    pub audio_window_end: f64,
    /// Analysis window and hop (s)
    pub audio_frame_secs: f64,
    pub audio_hop_secs: f64,
    /// Spectral-centroid band of a ground impact (Hz)
    pub thud_band_low_hz: f64,
    pub thud_band_high_hz: f64,
    /// Minimum energy relative to the window median
    pub min_onset_ratio: f64,
    pub min_audio_confidence: f64,
    /// Normalized distance from a screen edge that counts as an exit
    pub edge_margin: f64,
    /// Normalized y below which a descending ball is at ground level
    pub ground_y: f64,
    pub frame_exit_confidence: f64,
    /// Flight time used when no launch parameters exist (s)
    pub default_flight_time: f64,
    pub min_flight_time: f64,
    pub max_flight_time: f64,
    pub physics_confidence: f64,
}

impl Default for LandingConfig {
    fn default() -> Self {
        Self {
            audio_window_start: 1.0,
            audio_window_end: 8.0,
            audio_frame_secs: 0.032,
            audio_hop_secs: 0.016,
            thud_band_low_hz: 80.0,
            thud_band_high_hz: 600.0,
            min_onset_ratio: 4.0,
            min_audio_confidence: 0.3,
            edge_margin: 0.02,
            ground_y: 0.9,
            frame_exit_confidence: 0.7,
            default_flight_time: 4.0,
            min_flight_time: 1.0,
            max_flight_time: 8.0,
            physics_confidence: 0.3,
        }
    }
}

/// Runs the landing estimators for one shot.
#[derive(Debug, Clone, Default)]
pub struct LandingEstimator {
    config: LandingConfig,
}

impl LandingEstimator {
    pub fn new(config: LandingConfig) -> Self {
        Self { config }
    }

    /// Look for a ground-impact transient after the strike.
    ///
    /// The candidate must be an energy onset whose spectral centroid is
    /// lower than the strike's (when known) and falls in the thud band.
    /// Audio yields only a time; the position comes from `position_at`.
    pub fn estimate_from_audio(
        &self,
        audio: &AudioTrack,
        strike: &StrikeEvent,
        position_at: impl Fn(f64) -> (f64, f64),
    ) -> Option<LandingEstimate> {
        let c = &self.config;
        if audio.is_empty() || audio.sample_rate == 0 {
            return None;
        }

        let sr = audio.sample_rate as f64;
        let frame_len = ((c.audio_frame_secs * sr) as usize).max(16);
        let hop = ((c.audio_hop_secs * sr) as usize).max(1);
        let start = audio.sample_index(strike.timestamp + c.audio_window_start);
        let end = audio.sample_index(strike.timestamp + c.audio_window_end);
        if end <= start + frame_len {
            return None;
        }

        let offsets: Vec<usize> = (start..end - frame_len).step_by(hop).collect();
        let energies: Vec<f64> = offsets
            .iter()
            .map(|&o| rms(&audio.samples[o..o + frame_len]))
            .collect();
        if energies.len() < 3 {
            return None;
        }

        let mut sorted = energies.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let median = sorted[sorted.len() / 2].max(1e-9);

        let strike_centroid = strike.features.spectral_centroid_hz;
        let analyzer = CentroidAnalyzer::new(frame_len, sr);
        let mut best: Option<(f64, f64)> = None;

        for i in 1..energies.len() - 1 {
            let e = energies[i];
            let ratio = e / median;
            if ratio < c.min_onset_ratio || e < energies[i - 1] || e < energies[i + 1] {
                continue;
            }

            let window = &audio.samples[offsets[i]..offsets[i] + frame_len];
            let centroid = analyzer.centroid(window);
            if strike_centroid > 0.0 && centroid >= strike_centroid {
                continue;
            }

            let thud = self.thud_score(centroid);
            let onset = (ratio / (2.0 * c.min_onset_ratio)).min(1.0);
            let confidence = thud * onset;
            let timestamp = (offsets[i] + frame_len / 2) as f64 / sr;

            if best.map_or(true, |(conf, _)| confidence > conf) {
                best = Some((confidence, timestamp));
            }
        }

        let (confidence, timestamp) = best?;
        if confidence < c.min_audio_confidence {
            return None;
        }

        let (x, y) = position_at(timestamp);
        debug!(timestamp, confidence, "Audio landing candidate");
        Some(LandingEstimate {
            timestamp,
            x,
            y,
            confidence,
            method: LandingMethod::Audio,
            exit_edge: None,
        })
    }

    /// 1 inside the thud band, falling linearly to 0 at half the low edge
    /// and twice the high edge.
    fn thud_score(&self, centroid: f64) -> f64 {
        let (lo, hi) = (self.config.thud_band_low_hz, self.config.thud_band_high_hz);
        if centroid >= lo && centroid <= hi {
            1.0
        } else if centroid < lo {
            ((centroid - lo / 2.0) / (lo / 2.0)).clamp(0.0, 1.0)
        } else {
            (1.0 - (centroid - hi) / hi).clamp(0.0, 1.0)
        }
    }

    /// First point where the trajectory leaves the screen or descends into
    /// the ground band after the apex.
    pub fn estimate_from_frame_exit(&self, trajectory: &AssembledTrajectory) -> Option<LandingEstimate> {
        let c = &self.config;
        let confidence = c.frame_exit_confidence * (0.5 + 0.5 * trajectory.avg_confidence());
        let apex = trajectory.apex_index();

        for (i, p) in trajectory.points().iter().enumerate().skip(1) {
            let edge = if p.x <= c.edge_margin {
                Some(ExitEdge::Left)
            } else if p.x >= 1.0 - c.edge_margin {
                Some(ExitEdge::Right)
            } else if p.y <= c.edge_margin {
                Some(ExitEdge::Top)
            } else if p.y >= 1.0 - c.edge_margin && i > apex {
                Some(ExitEdge::Bottom)
            } else if i > apex && p.vy > 0.0 && p.y >= c.ground_y {
                Some(ExitEdge::Ground)
            } else {
                None
            };

            if let Some(edge) = edge {
                return Some(LandingEstimate {
                    timestamp: p.timestamp,
                    x: p.x,
                    y: p.y,
                    confidence,
                    method: LandingMethod::FrameExit,
                    exit_edge: Some(edge),
                });
            }
        }

        None
    }

    /// Closed-form flight time with a bucketed screen-position heuristic.
    pub fn estimate_from_physics(
        &self,
        strike_time: f64,
        launch: Option<&LaunchParameters>,
        origin: Option<(f64, f64)>,
    ) -> LandingEstimate {
        let c = &self.config;
        let flight_time = launch
            .map(|l| l.flight_time)
            .unwrap_or(c.default_flight_time)
            .clamp(c.min_flight_time, c.max_flight_time);

        let (ox, oy) = origin.unwrap_or((0.5, 0.8));
        let lateral = launch.map_or(0.0, |l| l.lateral_angle_deg);

        // Longer flights land closer to the horizon
        let rise = if flight_time < 2.0 {
            0.25
        } else if flight_time < 4.0 {
            0.35
        } else {
            0.45
        };
        let x = (ox + (lateral.to_radians()).sin() * 0.3).clamp(0.0, 1.0);
        let y = (oy - rise).clamp(0.0, 1.0);

        LandingEstimate {
            timestamp: strike_time + flight_time,
            x,
            y,
            confidence: c.physics_confidence,
            method: LandingMethod::Physics,
            exit_edge: None,
        }
    }

    /// Highest priority method wins; confidence breaks ties.
    pub fn select_best(estimates: &[LandingEstimate]) -> Option<LandingEstimate> {
        estimates.iter().copied().max_by(|a, b| {
            a.method
                .priority()
                .cmp(&b.method.priority())
                .then(a.confidence.total_cmp(&b.confidence))
        })
    }
}

fn rms(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    (samples.iter().map(|&s| (s as f64).powi(2)).sum::<f64>() / samples.len() as f64).sqrt()
}

/// Spectral centroid of fixed-length frames, with the Hann window and DFT
/// twiddle table computed once per frame length.
struct CentroidAnalyzer {
    window: Vec<f64>,
    twiddles: Vec<Complex<f64>>,
    sample_rate: f64,
}

impl CentroidAnalyzer {
    fn new(frame_len: usize, sample_rate: f64) -> Self {
        let n = frame_len.max(2);
        let window = (0..n)
            .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f64 / (n - 1) as f64).cos()))
            .collect();
        let twiddles = (0..n)
            .map(|j| Complex::from_polar(1.0, -2.0 * PI * j as f64 / n as f64))
            .collect();
        Self {
            window,
            twiddles,
            sample_rate,
        }
    }

    /// Magnitude-weighted mean frequency of one frame.
    fn centroid(&self, samples: &[f32]) -> f64 {
        let n = self.window.len().min(samples.len());
        if n < 2 {
            return 0.0;
        }
        let windowed: Vec<f64> = samples[..n]
            .iter()
            .zip(&self.window)
            .map(|(&s, w)| s as f64 * w)
            .collect();

        let mut weighted = 0.0;
        let mut total = 0.0;
        for k in 1..n / 2 {
            let bin: Complex<f64> = windowed
                .iter()
                .enumerate()
                .map(|(i, &v)| self.twiddles[(k * i) % n] * v)
                .sum();
            let mag = bin.norm();
            weighted += mag * k as f64 * self.sample_rate / n as f64;
            total += mag;
        }

        if total <= 0.0 {
            0.0
        } else {
            weighted / total
        }
    }
}
