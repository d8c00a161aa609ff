//! Audio strike events.
//!
//! Strike events are produced by an external audio-analysis stage and
//! consumed read-only by the flight pipeline.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Spectral description of the transient that produced a strike.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SpectralFeatures {
    /// Spectral centroid of the onset window in Hz.
    pub spectral_centroid_hz: f64,
    /// Onset strength relative to the local background energy.
    pub onset_strength: f64,
    /// Peak absolute amplitude in the onset window (0-1).
    pub peak_amplitude: f64,
}

/// One candidate ball impact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StrikeEvent {
    /// Time of impact in seconds from the start of the video.
    pub timestamp: f64,
    /// Detector confidence (0-1).
    pub confidence: f64,
    /// Spectral features of the impact transient.
    #[serde(default)]
    pub features: SpectralFeatures,
}

impl StrikeEvent {
    /// Create a strike event, clamping confidence into [0, 1].
    pub fn new(timestamp: f64, confidence: f64, features: SpectralFeatures) -> Self {
        Self {
            timestamp,
            confidence: confidence.clamp(0.0, 1.0),
            features,
        }
    }

    /// Strike with no spectral information (visual scan, manual input).
    pub fn at(timestamp: f64, confidence: f64) -> Self {
        Self::new(timestamp, confidence, SpectralFeatures::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_clamped() {
        assert_eq!(StrikeEvent::at(1.0, 1.7).confidence, 1.0);
        assert_eq!(StrikeEvent::at(1.0, -0.2).confidence, 0.0);
    }

    #[test]
    fn test_deserialize_without_features() {
        let strike: StrikeEvent =
            serde_json::from_str(r#"{"timestamp": 10.0, "confidence": 0.9}"#).unwrap();
        assert_eq!(strike.features, SpectralFeatures::default());
    }
}
