//! Render-spline fitting: Catmull-Rom derived cubic Bezier segments with
//! optional Ramer-Douglas-Peucker style simplification.

use balltrace_models::{BezierCurve, Point2, TrajectoryPoint, TrajectorySpline};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FlightError, FlightResult};

/// Spline fitting tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveFitConfig {
    /// Catmull-Rom tension; 0.5 gives the centripetal-free classic form
    pub tension: f64,
    /// Simplify to at most this many control points before fitting
    pub target_points: Option<usize>,
    /// Animation resampling rate
    pub resample_fps: f64,
}

impl Default for CurveFitConfig {
    fn default() -> Self {
        Self {
            tension: 0.5,
            target_points: Some(24),
            resample_fps: 60.0,
        }
    }
}

/// A timed 2D sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedPoint {
    pub t: f64,
    pub p: Point2,
}

impl From<&TrajectoryPoint> for TimedPoint {
    fn from(point: &TrajectoryPoint) -> Self {
        Self {
            t: point.timestamp,
            p: Point2::new(point.x, point.y),
        }
    }
}

fn perpendicular_distance(p: Point2, a: Point2, b: Point2) -> f64 {
    let len = a.distance_to(&b);
    if len < 1e-12 {
        return p.distance_to(&a);
    }
    ((b.x - a.x) * (a.y - p.y) - (a.x - p.x) * (b.y - a.y)).abs() / len
}

/// Reduce `points` to at most `target_count` positions by repeatedly
/// inserting the point farthest from the current polyline.
///
/// Endpoints are always kept. Returns positions in path order.
pub fn simplify_rdp(points: &[Point2], target_count: usize) -> Vec<Point2> {
    let target = target_count.max(2);
    if points.len() <= target {
        return points.to_vec();
    }

    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[points.len() - 1] = true;
    let mut kept = 2;

    while kept < target {
        let mut worst: Option<(usize, f64)> = None;
        let mut left = 0;
        for right in 1..points.len() {
            if !keep[right] {
                continue;
            }
            for (i, p) in points.iter().enumerate().take(right).skip(left + 1) {
                let d = perpendicular_distance(*p, points[left], points[right]);
                if worst.map_or(true, |(_, w)| d > w) {
                    worst = Some((i, d));
                }
            }
            left = right;
        }

        match worst {
            Some((i, d)) if d > 0.0 => {
                keep[i] = true;
                kept += 1;
            }
            _ => break,
        }
    }

    points
        .iter()
        .zip(&keep)
        .filter(|(_, k)| **k)
        .map(|(p, _)| *p)
        .collect()
}

/// Smallest half-width of the index window searched per simplified point.
const MIN_MATCH_RADIUS: usize = 3;

/// Cumulative path length at each point, as a fraction of the total.
fn arc_fractions(points: &[Point2]) -> Vec<f64> {
    let mut along = Vec::with_capacity(points.len());
    let mut total = 0.0;
    for (i, p) in points.iter().enumerate() {
        if i > 0 {
            total += points[i - 1].distance_to(p);
        }
        along.push(total);
    }
    if total > 1e-12 {
        along.iter_mut().for_each(|d| *d /= total);
    }
    along
}

/// Attach timestamps from `original` to simplified positions.
///
/// Each simplified point is matched to its nearest original sample inside
/// a window around the index at the same arc-length fraction. Endpoints
/// map to the original endpoints. Windows only move forward and leave
/// room for the points still to match, so times stay ordered; distance
/// ties go to the sample closest to the expected index.
pub fn reassociate_timestamps(simplified: &[Point2], original: &[TimedPoint]) -> Vec<TimedPoint> {
    let (n, m) = (original.len(), simplified.len());
    let mut out = Vec::with_capacity(m);
    if n == 0 || m == 0 {
        return out;
    }

    let positions: Vec<Point2> = original.iter().map(|p| p.p).collect();
    let along_original = arc_fractions(&positions);
    let along_simplified = arc_fractions(simplified);
    let radius = (n / m).max(MIN_MATCH_RADIUS);
    let mut cursor = 0;

    for (j, p) in simplified.iter().enumerate() {
        if cursor >= n {
            break;
        }
        let expected = match j {
            0 => 0,
            _ if j == m - 1 => n - 1,
            _ => along_original
                .partition_point(|&f| f < along_simplified[j])
                .min(n - 1),
        };
        let lo = expected.saturating_sub(radius).max(cursor);
        let hi = (expected + radius)
            .min(n.saturating_sub(m - j))
            .max(lo)
            .min(n - 1);

        let best = (lo..=hi).min_by(|&a, &b| {
            original[a]
                .p
                .distance_to(p)
                .total_cmp(&original[b].p.distance_to(p))
                .then(a.abs_diff(expected).cmp(&b.abs_diff(expected)))
        });
        if let Some(i) = best {
            out.push(TimedPoint { t: original[i].t, p: *p });
            cursor = i + 1;
        }
    }

    out
}

/// Fit a C1-continuous spline through `points` (ordered by time).
///
/// Tangents are time-scaled Catmull-Rom velocities, so the first
/// derivative with respect to time matches on both sides of every join
/// and the curve passes through every retained point at its timestamp.
pub fn fit_spline(points: &[TimedPoint], config: &CurveFitConfig) -> FlightResult<TrajectorySpline> {
    if points.len() < 2 {
        return Err(FlightError::InsufficientPoints {
            required: 2,
            actual: points.len(),
        });
    }

    let points: Vec<TimedPoint> = match config.target_points {
        Some(target) if points.len() > target => {
            let positions: Vec<Point2> = points.iter().map(|p| p.p).collect();
            reassociate_timestamps(&simplify_rdp(&positions, target), points)
        }
        _ => points.to_vec(),
    };

    if let Some(i) = points.windows(2).position(|w| w[1].t <= w[0].t) {
        return Err(FlightError::invalid_input(format!(
            "spline timestamps must be strictly increasing (index {})",
            i + 1
        )));
    }

    let n = points.len();
    let scale = 2.0 * config.tension;
    let velocities: Vec<Point2> = (0..n)
        .map(|i| {
            let (a, b) = match i {
                0 => (0, 1),
                _ if i == n - 1 => (n - 2, n - 1),
                _ => (i - 1, i + 1),
            };
            let dt = points[b].t - points[a].t;
            Point2::new(
                scale * (points[b].p.x - points[a].p.x) / dt,
                scale * (points[b].p.y - points[a].p.y) / dt,
            )
        })
        .collect();

    let mut segments = Vec::with_capacity(n - 1);
    for i in 0..n - 1 {
        let (p0, p3) = (points[i].p, points[i + 1].p);
        let dt = points[i + 1].t - points[i].t;
        let c1 = Point2::new(p0.x + velocities[i].x * dt / 3.0, p0.y + velocities[i].y * dt / 3.0);
        let c2 = Point2::new(
            p3.x - velocities[i + 1].x * dt / 3.0,
            p3.y - velocities[i + 1].y * dt / 3.0,
        );
        segments.push(BezierCurve::new([p0, c1, c2, p3], points[i].t, points[i + 1].t)?);
    }

    debug!(segments = segments.len(), "Spline fitted");
    Ok(TrajectorySpline::new(segments)?)
}

/// Fit a spline through an assembled trajectory's points.
pub fn fit_trajectory(points: &[TrajectoryPoint], config: &CurveFitConfig) -> FlightResult<TrajectorySpline> {
    let timed: Vec<TimedPoint> = points.iter().map(TimedPoint::from).collect();
    fit_spline(&timed, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn arc(n: usize) -> Vec<TimedPoint> {
        (0..n)
            .map(|i| {
                let t = i as f64 * 0.1;
                TimedPoint {
                    t,
                    p: Point2::new(0.2 + 0.1 * t, 0.8 - 0.6 * t + 0.3 * t * t),
                }
            })
            .collect()
    }

    #[test]
    fn test_spline_passes_through_inputs() {
        let pts = arc(12);
        let config = CurveFitConfig {
            target_points: None,
            ..Default::default()
        };
        let spline = fit_spline(&pts, &config).unwrap();
        assert_eq!(spline.segments().len(), 11);

        for p in &pts {
            let q = spline.evaluate(p.t);
            assert_relative_eq!(q.x, p.p.x, epsilon = 1e-12);
            assert_relative_eq!(q.y, p.p.y, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_c1_continuity_at_joins() {
        let spline = fit_spline(&arc(8), &CurveFitConfig::default()).unwrap();
        for pair in spline.segments().windows(2) {
            let t = pair[0].t_end;
            let a = pair[0].velocity_at_time(t);
            let b = pair[1].velocity_at_time(t);
            assert_relative_eq!(a.x, b.x, epsilon = 1e-9);
            assert_relative_eq!(a.y, b.y, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_simplify_keeps_endpoints_and_corner() {
        let pts = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.01),
            Point2::new(2.0, 0.0),
            Point2::new(3.0, 2.0),
            Point2::new(4.0, 4.0),
        ];
        let simplified = simplify_rdp(&pts, 3);
        assert_eq!(simplified, vec![pts[0], pts[2], pts[4]]);
    }

    #[test]
    fn test_simplified_fit_keeps_original_timestamps() {
        let pts = arc(40);
        let config = CurveFitConfig {
            target_points: Some(6),
            ..Default::default()
        };
        let spline = fit_spline(&pts, &config).unwrap();
        assert_eq!(spline.segments().len(), 5);
        assert_relative_eq!(spline.t_start(), 0.0);
        assert_relative_eq!(spline.t_end(), pts[39].t);
        for seg in spline.segments() {
            assert!(pts.iter().any(|p| (p.t - seg.t_start).abs() < 1e-12));
        }
    }

    #[test]
    fn test_stationary_tail_keeps_final_timestamp() {
        let mut pts = arc(20);
        let rest = pts[19].p;
        for i in 20..30 {
            pts.push(TimedPoint {
                t: i as f64 * 0.1,
                p: rest,
            });
        }
        let positions: Vec<Point2> = pts.iter().map(|p| p.p).collect();
        let simplified = simplify_rdp(&positions, 5);

        let timed = reassociate_timestamps(&simplified, &pts);

        assert_eq!(timed.len(), simplified.len());
        assert_relative_eq!(timed[0].t, 0.0);
        assert_relative_eq!(timed.last().unwrap().t, pts[29].t);
        assert!(timed.windows(2).all(|w| w[1].t > w[0].t));
    }

    #[test]
    fn test_revisited_position_matches_its_own_pass() {
        // Out along y = 0 and back along y = 1. The second control point
        // lies nearer the return leg than the outbound sample it came from.
        let mut pts: Vec<TimedPoint> = (0..=10)
            .map(|i| TimedPoint {
                t: i as f64,
                p: Point2::new(i as f64, 0.0),
            })
            .collect();
        pts.extend((0..=10).map(|i| TimedPoint {
            t: 11.0 + i as f64,
            p: Point2::new(10.0 - i as f64, 1.0),
        }));
        let simplified = [
            Point2::new(0.0, 0.0),
            Point2::new(5.0, 0.6),
            Point2::new(10.0, 0.0),
            Point2::new(0.0, 1.0),
        ];

        let timed = reassociate_timestamps(&simplified, &pts);

        let times: Vec<f64> = timed.iter().map(|p| p.t).collect();
        assert_eq!(times, vec![0.0, 5.0, 10.0, 21.0]);
    }

    #[test]
    fn test_too_few_points() {
        assert!(matches!(
            fit_spline(&arc(1), &CurveFitConfig::default()),
            Err(FlightError::InsufficientPoints { .. })
        ));
    }

    #[test]
    fn test_resample_is_uniform() {
        let spline = fit_spline(&arc(11), &CurveFitConfig::default()).unwrap();
        let samples = spline.resample(30.0);
        assert_eq!(samples.len(), 31);
        assert_relative_eq!(samples[0].0, 0.0);
        assert_relative_eq!(samples[30].0, 1.0, epsilon = 1e-12);
    }
}
