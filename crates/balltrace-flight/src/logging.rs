//! Structured per-shot logging utilities.
//!
//! Provides consistent, structured logging for shot processing with
//! contextual fields (shot index, strike time).

use tracing::{debug, error, info, warn};

/// Shot logger for structured logging with consistent formatting.
#[derive(Debug, Clone)]
pub struct ShotLogger {
    shot_index: usize,
    strike_time: f64,
}

impl ShotLogger {
    pub fn new(shot_index: usize, strike_time: f64) -> Self {
        Self {
            shot_index,
            strike_time,
        }
    }

    /// Log the start of a processing stage.
    pub fn log_stage(&self, stage: &str) {
        debug!(
            shot = self.shot_index,
            strike_time = self.strike_time,
            stage,
            "Shot stage started"
        );
    }

    /// Log a fallback taken after a stage produced no result.
    pub fn log_fallback(&self, from: &str, to: &str, reason: &str) {
        warn!(
            shot = self.shot_index,
            strike_time = self.strike_time,
            from,
            to,
            "Shot fallback: {}", reason
        );
    }

    /// Log a terminal outcome that still produces a shot record.
    pub fn log_degraded(&self, message: &str) {
        warn!(
            shot = self.shot_index,
            strike_time = self.strike_time,
            "Shot degraded: {}", message
        );
    }

    pub fn log_error(&self, stage: &str, message: &str) {
        error!(
            shot = self.shot_index,
            strike_time = self.strike_time,
            stage,
            "Shot error: {}", message
        );
    }

    pub fn log_completion(&self, confidence: f64, shot_type: &str, points: usize) {
        info!(
            shot = self.shot_index,
            strike_time = self.strike_time,
            confidence,
            shot_type,
            points,
            "Shot completed"
        );
    }
}
