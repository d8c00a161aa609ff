//! Pipeline configuration.
//!
//! Aggregates the per-component tuning structs. Every field has a
//! default, so a partial JSON document or an empty environment yields a
//! working configuration.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::assembly::AssemblyConfig;
use crate::curve_fit::CurveFitConfig;
use crate::early_flight::EarlyFlightConfig;
use crate::error::{FlightError, FlightResult};
use crate::flight_scan::FlightScanConfig;
use crate::kalman::KalmanConfig;
use crate::landing::LandingConfig;
use crate::origin::OriginConfig;
use crate::physics::{PerspectiveConfig, PhysicsConfig};
use crate::shot_type::ShotTypeConfig;
use crate::visual_scan::VisualScanConfig;

/// Full reconstruction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub origin: OriginConfig,
    pub early_flight: EarlyFlightConfig,
    pub kalman: KalmanConfig,
    pub physics: PhysicsConfig,
    pub perspective: PerspectiveConfig,
    pub assembly: AssemblyConfig,
    pub landing: LandingConfig,
    pub curve_fit: CurveFitConfig,
    pub flight_scan: FlightScanConfig,
    pub visual_scan: VisualScanConfig,
    pub shot_type: ShotTypeConfig,

    /// Strikes closer than this are merged (s)
    pub dedup_interval_secs: f64,
    /// Clip start before the strike (s)
    pub pre_roll_secs: f64,
    /// Clip end after landing or trajectory end (s)
    pub post_roll_secs: f64,
    /// Process independent strikes in parallel
    pub parallel_shots: bool,
    /// Confidence factor for a found origin with no trajectory
    pub missing_trajectory_penalty: f64,
    /// Kalman refinement must add at least this many detections,
    /// otherwise the seed is extrapolated with physics
    pub min_refined_extension: usize,
    /// Confidence given to physics-extrapolated points
    pub physics_point_confidence: f64,
    /// Fit a render spline for each assembled trajectory
    pub fit_spline: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            origin: OriginConfig::default(),
            early_flight: EarlyFlightConfig::default(),
            kalman: KalmanConfig::default(),
            physics: PhysicsConfig::default(),
            perspective: PerspectiveConfig::default(),
            assembly: AssemblyConfig::default(),
            landing: LandingConfig::default(),
            curve_fit: CurveFitConfig::default(),
            flight_scan: FlightScanConfig::default(),
            visual_scan: VisualScanConfig::default(),
            shot_type: ShotTypeConfig::default(),
            dedup_interval_secs: 10.0,
            pre_roll_secs: 2.0,
            post_roll_secs: 1.5,
            parallel_shots: true,
            missing_trajectory_penalty: 0.8,
            min_refined_extension: 3,
            physics_point_confidence: 0.5,
            fit_spline: true,
        }
    }
}

impl PipelineConfig {
    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> FlightResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Default configuration with top-level overrides from `BALLTRACE_*`
    /// environment variables. Unparseable values keep the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Default configuration with overrides read through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        config.dedup_interval_secs =
            parse_or(&lookup, "BALLTRACE_DEDUP_INTERVAL_SECS", config.dedup_interval_secs);
        config.pre_roll_secs = parse_or(&lookup, "BALLTRACE_PRE_ROLL_SECS", config.pre_roll_secs);
        config.post_roll_secs = parse_or(&lookup, "BALLTRACE_POST_ROLL_SECS", config.post_roll_secs);
        config.parallel_shots = parse_or(&lookup, "BALLTRACE_PARALLEL_SHOTS", config.parallel_shots);
        config.fit_spline = parse_or(&lookup, "BALLTRACE_FIT_SPLINE", config.fit_spline);
        config.physics.gravity = parse_or(&lookup, "BALLTRACE_GRAVITY", config.physics.gravity);
        config.visual_scan.sample_fps =
            parse_or(&lookup, "BALLTRACE_VISUAL_SAMPLE_FPS", config.visual_scan.sample_fps);
        config.early_flight.use_optical_flow_fallback = parse_or(
            &lookup,
            "BALLTRACE_OPTICAL_FLOW_FALLBACK",
            config.early_flight.use_optical_flow_fallback,
        );

        config
    }

    /// Reject values the algorithms cannot work with.
    pub fn validate(&self) -> FlightResult<()> {
        let positive = [
            ("dedup_interval_secs", self.dedup_interval_secs),
            ("physics.gravity", self.physics.gravity),
            ("physics.sample_fps", self.physics.sample_fps),
            ("visual_scan.sample_fps", self.visual_scan.sample_fps),
            ("visual_scan.spike_ratio", self.visual_scan.spike_ratio),
            ("flight_scan.window_secs", self.flight_scan.window_secs),
            ("early_flight.window_secs", self.early_flight.window_secs),
            ("curve_fit.resample_fps", self.curve_fit.resample_fps),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(FlightError::invalid_config(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }

        let non_negative = [
            ("pre_roll_secs", self.pre_roll_secs),
            ("post_roll_secs", self.post_roll_secs),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(FlightError::invalid_config(format!(
                    "{} must not be negative, got {}",
                    name, value
                )));
            }
        }

        let unit = [
            ("missing_trajectory_penalty", self.missing_trajectory_penalty),
            ("physics_point_confidence", self.physics_point_confidence),
            ("visual_scan.visual_confidence_scale", self.visual_scan.visual_confidence_scale),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(FlightError::invalid_config(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        if self.physics.min_flight_time > self.physics.max_flight_time {
            return Err(FlightError::invalid_config(
                "physics.min_flight_time exceeds physics.max_flight_time",
            ));
        }
        if self.assembly.min_points < 2 {
            return Err(FlightError::invalid_config("assembly.min_points must be at least 2"));
        }
        if self.early_flight.expansion_levels.is_empty() {
            return Err(FlightError::invalid_config(
                "early_flight.expansion_levels must not be empty",
            ));
        }

        Ok(())
    }
}

fn parse_or<T, F>(lookup: F, key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "Ignoring unparseable environment override");
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_default_is_valid() {
        PipelineConfig::default().validate().unwrap();
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = PipelineConfig::from_json(
            r#"{"pre_roll_secs": 3.0, "physics": {"gravity": 2.5}, "kalman": {"max_consecutive_misses": 9}}"#,
        )
        .unwrap();

        assert_eq!(config.pre_roll_secs, 3.0);
        assert_eq!(config.physics.gravity, 2.5);
        assert_eq!(config.physics.min_flight_time, 1.5);
        assert_eq!(config.kalman.max_consecutive_misses, 9);
        assert_eq!(config.dedup_interval_secs, 10.0);
    }

    #[test]
    fn test_invalid_json_values_rejected() {
        let err = PipelineConfig::from_json(r#"{"missing_trajectory_penalty": 1.5}"#).unwrap_err();
        assert!(matches!(err, FlightError::InvalidConfig(_)));

        let err = PipelineConfig::from_json(r#"{"physics": {"gravity": 0.0}}"#).unwrap_err();
        assert!(matches!(err, FlightError::InvalidConfig(_)));

        assert!(matches!(
            PipelineConfig::from_json("{not json").unwrap_err(),
            FlightError::JsonParse(_)
        ));
    }

    #[test]
    fn test_env_overrides_and_bad_values() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("BALLTRACE_POST_ROLL_SECS", "4.5"),
            ("BALLTRACE_PARALLEL_SHOTS", "false"),
            ("BALLTRACE_GRAVITY", "heavy"),
        ]);

        let config = PipelineConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.post_roll_secs, 4.5);
        assert!(!config.parallel_shots);
        assert_eq!(config.physics.gravity, 2.0);
        assert_eq!(config.pre_roll_secs, 2.0);
    }

    #[test]
    fn test_from_env_without_overrides_validates() {
        PipelineConfig::from_env().validate().unwrap();
    }

    #[test]
    fn test_empty_lookup_is_default() {
        let config = PipelineConfig::from_lookup(|_| None);
        assert_eq!(config.dedup_interval_secs, 10.0);
        assert!(config.fit_spline);
        config.validate().unwrap();
    }
}
