//! Low-level image primitives used by origin localization and
//! early-flight tracking.
//!
//! Everything here works on `image` buffers in pixel coordinates and is
//! restricted to a [`Region`] so per-frame cost stays bounded by the
//! search area rather than the frame size.

pub mod blobs;
pub mod frame_ops;
pub mod lines;
pub mod optical_flow;
pub mod template;

pub use blobs::{find_blobs, Blob};
pub use frame_ops::{crop_gray, diff_mask, mean_abs_diff, to_gray, BinaryMask, Region};
pub use lines::{detect_line_segments, LineDetectorConfig, LineSegment};
pub use optical_flow::{good_features, track_points, LucasKanadeConfig};
pub use template::ColorTemplate;
