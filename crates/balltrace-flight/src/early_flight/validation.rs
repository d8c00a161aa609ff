//! Motion-consistency checks for completed early-flight tracks.

use super::{DetectionCandidate, EarlyFlightConfig};

/// Why a track was rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackRejection {
    TooShort { len: usize },
    /// Too many frame-to-frame speed increases
    Accelerating { speedups: usize, steps: usize },
    /// A single step turned further than allowed
    DirectionChange { degrees: f64 },
}

/// Validate monotonic, bounded speed change and consistent direction.
pub fn validate_track(candidates: &[DetectionCandidate], config: &EarlyFlightConfig) -> Result<(), TrackRejection> {
    if candidates.len() < config.min_track_length {
        return Err(TrackRejection::TooShort {
            len: candidates.len(),
        });
    }

    let steps: Vec<(f64, f64, f64)> = candidates
        .windows(2)
        .map(|w| {
            let frames = (w[1].frame_index - w[0].frame_index).max(1) as f64;
            let dx = (w[1].x - w[0].x) / frames;
            let dy = (w[1].y - w[0].y) / frames;
            (dx, dy, (dx * dx + dy * dy).sqrt())
        })
        .collect();

    for w in steps.windows(2) {
        let degrees = angle_between((w[0].0, w[0].1), (w[1].0, w[1].1));
        if degrees > config.max_direction_change_deg {
            return Err(TrackRejection::DirectionChange { degrees });
        }
    }

    let speedups = steps
        .windows(2)
        .filter(|w| w[1].2 > w[0].2 * (1.0 + config.speedup_tolerance))
        .count();
    let comparisons = steps.len().saturating_sub(1);
    if comparisons > 0 && speedups as f64 > config.max_speedup_fraction * comparisons as f64 {
        return Err(TrackRejection::Accelerating {
            speedups,
            steps: comparisons,
        });
    }

    Ok(())
}

/// Unsigned angle between two vectors in degrees; zero vectors give 0.
pub fn angle_between(a: (f64, f64), b: (f64, f64)) -> f64 {
    let na = (a.0 * a.0 + a.1 * a.1).sqrt();
    let nb = (b.0 * b.0 + b.1 * b.1).sqrt();
    if na < 1e-12 || nb < 1e-12 {
        return 0.0;
    }
    ((a.0 * b.0 + a.1 * b.1) / (na * nb)).clamp(-1.0, 1.0).acos().to_degrees()
}
