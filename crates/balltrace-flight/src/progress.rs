//! Progress reporting for per-shot processing.
//!
//! Callbacks receive `(step_name, percent)` with percent in [0, 100].
//! Each processing step owns a fixed band (see
//! [`ProcessingStep::band`]) and reported values never decrease within
//! a shot.

use std::sync::Arc;

use balltrace_models::ProcessingStep;

/// Progress callback type.
pub type ProgressCallback = Arc<dyn Fn(&str, f64) + Send + Sync>;

/// Per-shot progress reporter.
pub struct ShotProgress {
    callback: Option<ProgressCallback>,
    last_percent: f64,
}

impl ShotProgress {
    pub fn new(callback: Option<ProgressCallback>) -> Self {
        Self {
            callback,
            last_percent: 0.0,
        }
    }

    /// Report progress `fraction` (0-1) through `step`.
    pub fn report(&mut self, step: ProcessingStep, fraction: f64) {
        let (start, end) = step.band();
        let percent = start + (end - start) * fraction.clamp(0.0, 1.0);
        let percent = percent.max(self.last_percent);
        self.last_percent = percent;

        if let Some(ref callback) = self.callback {
            callback(step.as_str(), percent);
        }
    }

    pub fn step_started(&mut self, step: ProcessingStep) {
        self.report(step, 0.0);
    }

    pub fn step_completed(&mut self, step: ProcessingStep) {
        self.report(step, 1.0);
    }

    /// Jump to the end of the shot (used when a shot terminates early).
    pub fn finish(&mut self) {
        self.step_completed(ProcessingStep::Emitting);
    }
}
