#![deny(unreachable_patterns)]
//! Golf ball-flight reconstruction.
//!
//! This crate provides:
//! - Ball origin localization at address (shaft, clubhead and detector consensus)
//! - Early-flight tracking by frame differencing with an optical-flow fallback
//! - A 6-state Kalman estimator and frame-by-frame track refinement
//! - Projectile physics and a down-the-line perspective camera
//! - Trajectory assembly, landing estimation and render-spline fitting
//! - Visual strike scanning and longer-window flight scanning fallbacks
//! - Per-shot orchestration with progress, cancellation, logging and metrics
//!
//! Frames, audio and object detection come from the caller through the
//! traits in [`source`].

pub mod assembly;
pub mod cancel;
pub mod config;
pub mod curve_fit;
pub mod early_flight;
pub mod error;
pub mod flight_scan;
pub mod kalman;
pub mod landing;
pub mod logging;
pub mod metrics;
pub mod origin;
pub mod physics;
pub mod pipeline;
pub mod progress;
pub mod refine;
pub mod shot_type;
pub mod source;
pub mod strikes;
pub mod vision;
pub mod visual_scan;

#[cfg(test)]
mod test_support;

pub use assembly::{AssemblyConfig, FrameDetection, TrajectoryAssembler};
pub use cancel::{CancelHandle, CancellationToken};
pub use config::PipelineConfig;
pub use curve_fit::{fit_spline, fit_trajectory, simplify_rdp, CurveFitConfig, TimedPoint};
pub use early_flight::{EarlyFlightConfig, EarlyFlightTracker, Track, TrackSource};
pub use error::{FlightError, FlightResult};
pub use flight_scan::{FlightScanConfig, FlightScanner, FlightSegment};
pub use kalman::{BallKalmanFilter, KalmanConfig, Prediction};
pub use landing::{LandingConfig, LandingEstimator};
pub use logging::ShotLogger;
pub use origin::{OriginConfig, OriginFailure, OriginLocator, OriginResult};
pub use physics::{
    classify_shot_shape, LaunchParameters, PerspectiveCamera, PerspectiveConfig, PhysicsConfig,
    ProjectileModel, Trajectory3D,
};
pub use pipeline::{ScanMode, ShotAnalysis, ShotFailure, ShotPipeline, VideoAnalysis};
pub use progress::{ProgressCallback, ShotProgress};
pub use refine::{KalmanRefiner, RefinedTrack};
pub use shot_type::{classify_shot_type, ShotTypeConfig};
pub use source::{AudioTrack, FrameSource, ObjectDetection, ObjectDetector, VideoMetadata};
pub use strikes::dedup_strikes;
pub use visual_scan::{VisualScanConfig, VisualStrikeScanner};
