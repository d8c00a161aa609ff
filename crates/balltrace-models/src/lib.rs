//! Shared data models for golf ball-flight reconstruction.
//!
//! This crate provides Serde-serializable types for:
//! - Audio strike events and their spectral features
//! - Ball origin (address position) results
//! - Assembled flight trajectories and tracer splines
//! - Landing estimates
//! - Detected shot records and processing steps

pub mod error;
pub mod landing;
pub mod origin;
pub mod rect;
pub mod shot;
pub mod spline;
pub mod step;
pub mod strike;
pub mod trajectory;

// Re-export common types
pub use error::{ModelError, ModelResult};
pub use landing::{ExitEdge, LandingEstimate, LandingMethod};
pub use origin::{OriginMethod, OriginPoint};
pub use rect::BoundingBox;
pub use shot::{DetectedShot, ShotId, ShotShape, ShotType};
pub use spline::{BezierCurve, Point2, TrajectorySpline};
pub use step::ProcessingStep;
pub use strike::{SpectralFeatures, StrikeEvent};
pub use trajectory::{AssembledTrajectory, TrajectoryMethod, TrajectoryPayload, TrajectoryPoint};
