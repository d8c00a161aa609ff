//! Visual-only strike detection for videos without usable audio.
//!
//! Samples the video at a low rate, measures global motion energy
//! between consecutive samples and reports spikes well above the median
//! energy as candidate strikes.

use balltrace_models::StrikeEvent;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cancel::CancellationToken;
use crate::error::FlightResult;
use crate::source::FrameSource;
use crate::strikes::dedup_strikes;
use crate::vision::{mean_abs_diff, to_gray};

/// Visual strike scan tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualScanConfig {
    /// Sampling rate of the scan (frames per second)
    pub sample_fps: f64,
    /// Energy must exceed `spike_ratio` x median to count as a spike
    pub spike_ratio: f64,
    /// Upper bound on confidence of visually detected strikes
    pub visual_confidence_scale: f64,
    /// Pixel stride used for the energy measurement
    pub diff_step: u32,
}

impl Default for VisualScanConfig {
    fn default() -> Self {
        Self {
            sample_fps: 10.0,
            spike_ratio: 3.0,
            visual_confidence_scale: 0.6,
            diff_step: 4,
        }
    }
}

/// Motion energy between two consecutive samples, stamped with the
/// later sample's time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergySample {
    pub timestamp: f64,
    pub energy: f64,
}

/// Scans a whole video for motion spikes.
#[derive(Debug, Clone, Default)]
pub struct VisualStrikeScanner {
    config: VisualScanConfig,
}

impl VisualStrikeScanner {
    pub fn new(config: VisualScanConfig) -> Self {
        Self { config }
    }

    /// Motion energy series over the whole video.
    pub fn energy_series(
        &self,
        frames: &dyn FrameSource,
        cancel: &CancellationToken,
    ) -> FlightResult<Vec<EnergySample>> {
        let meta = frames.metadata();
        let interval = 1.0 / self.config.sample_fps.max(f64::EPSILON);
        let mut series = Vec::new();
        let mut prev = None;
        let mut t = 0.0;

        while t <= meta.duration {
            cancel.check()?;
            let Some(frame) = frames.frame_at(t)? else {
                break;
            };
            let gray = to_gray(&frame);
            if let Some(ref p) = prev {
                series.push(EnergySample {
                    timestamp: t,
                    energy: mean_abs_diff(p, &gray, self.config.diff_step),
                });
            }
            prev = Some(gray);
            t += interval;
        }
        Ok(series)
    }

    /// Strike candidates from an energy series, before deduplication.
    pub fn spikes(&self, series: &[EnergySample]) -> Vec<StrikeEvent> {
        if series.len() < 3 {
            return Vec::new();
        }
        let c = &self.config;

        let mut energies: Vec<f64> = series.iter().map(|s| s.energy).collect();
        energies.sort_by(f64::total_cmp);
        let median = energies[energies.len() / 2].max(1e-6);

        let mut out = Vec::new();
        for i in 0..series.len() {
            let e = series[i].energy;
            let above_prev = i == 0 || e > series[i - 1].energy;
            let not_below_next = i + 1 == series.len() || e >= series[i + 1].energy;
            if !(above_prev && not_below_next) {
                continue;
            }
            let ratio = e / median;
            if ratio < c.spike_ratio {
                continue;
            }
            let confidence = (ratio / (2.0 * c.spike_ratio)).min(1.0) * c.visual_confidence_scale;
            debug!(timestamp = series[i].timestamp, ratio, confidence, "Motion spike");
            out.push(StrikeEvent::at(series[i].timestamp, confidence));
        }
        out
    }

    /// Full scan: energy, spikes, then dedup within `min_interval`.
    pub fn scan(
        &self,
        frames: &dyn FrameSource,
        min_interval: f64,
        cancel: &CancellationToken,
    ) -> FlightResult<Vec<StrikeEvent>> {
        let series = self.energy_series(frames, cancel)?;
        let strikes = dedup_strikes(&self.spikes(&series), min_interval);
        info!(
            samples = series.len(),
            strikes = strikes.len(),
            "Visual strike scan finished"
        );
        Ok(strikes)
    }
}
