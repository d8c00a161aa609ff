//! Metrics for flight reconstruction.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const SHOTS_EMITTED_TOTAL: &str = "balltrace_shots_emitted_total";
    pub const SHOTS_FAILED_TOTAL: &str = "balltrace_shots_failed_total";
    pub const FALLBACKS_TOTAL: &str = "balltrace_fallbacks_total";
    pub const ORIGIN_RESULTS_TOTAL: &str = "balltrace_origin_results_total";
    pub const SHOT_DURATION_SECONDS: &str = "balltrace_shot_duration_seconds";
}

/// Record an emitted shot.
pub fn record_shot_emitted(shot_type: &str) {
    let labels = [("shot_type", shot_type.to_string())];
    counter!(names::SHOTS_EMITTED_TOTAL, &labels).increment(1);
}

/// Record a shot that failed with a hard error in `stage`.
pub fn record_shot_failed(stage: &str) {
    let labels = [("stage", stage.to_string())];
    counter!(names::SHOTS_FAILED_TOTAL, &labels).increment(1);
}

/// Record a fallback path being taken.
pub fn record_fallback(kind: &str) {
    let labels = [("kind", kind.to_string())];
    counter!(names::FALLBACKS_TOTAL, &labels).increment(1);
}

/// Record the outcome of origin localization ("ball_detection", "not_found", ...).
pub fn record_origin_result(method: &str) {
    let labels = [("method", method.to_string())];
    counter!(names::ORIGIN_RESULTS_TOTAL, &labels).increment(1);
}

/// Record per-shot processing time.
pub fn record_shot_duration(duration_secs: f64) {
    histogram!(names::SHOT_DURATION_SECONDS).record(duration_secs);
}
