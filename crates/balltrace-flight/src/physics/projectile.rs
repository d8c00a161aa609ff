use serde::{Deserialize, Serialize};

use super::{LaunchParameters, PerspectiveCamera, PhysicsConfig};

/// One sample of a generated flight in shot space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    /// Seconds since launch
    pub t: f64,
    /// Lateral deviation, positive right
    pub x: f64,
    /// Height above ground
    pub y: f64,
    /// Depth toward the target
    pub z: f64,
}

/// Physics-generated full flight path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory3D {
    pub points: Vec<Point3>,
    pub apex_index: usize,
    /// Last sample before the ball would go below ground
    pub landing_index: usize,
}

impl Trajectory3D {
    pub fn flight_time(&self) -> f64 {
        self.points.get(self.landing_index).map_or(0.0, |p| p.t)
    }

    pub fn apex(&self) -> Option<&Point3> {
        self.points.get(self.apex_index)
    }

    /// Project every sample to normalized screen coordinates as
    /// `(t, screen_x, screen_y)`.
    pub fn project(&self, camera: &PerspectiveCamera) -> Vec<(f64, f64, f64)> {
        self.points[..=self.landing_index.min(self.points.len().saturating_sub(1))]
            .iter()
            .map(|p| {
                let (sx, sy) = camera.project(p);
                (p.t, sx, sy)
            })
            .collect()
    }
}

/// Closed-form projectile generator.
#[derive(Debug, Clone, Default)]
pub struct ProjectileModel {
    config: PhysicsConfig,
}

impl ProjectileModel {
    pub fn new(config: PhysicsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Generate the flight from launch to the analytic ground intersection.
    ///
    /// Flight time and apex height are clamped to their configured ranges;
    /// the vertical motion uses the effective gravity that produces exactly
    /// that apex at mid-flight and lands at the clamped flight time.
    pub fn generate(&self, launch: &LaunchParameters) -> Trajectory3D {
        let c = &self.config;
        let angle = launch.launch_angle_deg.to_radians();
        let v0 = launch.launch_speed(c);

        let flight_time = (2.0 * v0 * angle.sin() / c.gravity).clamp(c.min_flight_time, c.max_flight_time);
        let natural_apex = (v0 * angle.sin()).powi(2) / (2.0 * c.gravity);
        let apex_height = natural_apex.clamp(c.min_apex_height, c.max_apex_height);

        let g_eff = 8.0 * apex_height / (flight_time * flight_time);
        let vy = 4.0 * apex_height / flight_time;

        let lateral = launch.lateral_angle_deg.to_radians();
        let landing_depth = (v0 * angle.cos() * flight_time * c.depth_scale).min(c.max_depth);
        let vz = landing_depth / flight_time;
        let vx = vz * lateral.tan();
        let ax = c.curve_acceleration * launch.shot_shape.curve_sign();

        let dt = 1.0 / c.sample_fps;
        let steps = (flight_time / dt).floor() as usize;
        let mut points = Vec::with_capacity(steps + 2);

        let sample = |t: f64| Point3 {
            t,
            x: vx * t + 0.5 * ax * t * t,
            y: (vy * t - 0.5 * g_eff * t * t).max(0.0),
            z: vz * t,
        };

        for i in 0..=steps {
            points.push(sample(i as f64 * dt));
        }
        if flight_time - steps as f64 * dt > 1e-9 {
            points.push(sample(flight_time));
        }

        let apex_index = points
            .iter()
            .enumerate()
            .fold(0, |best, (i, p)| if p.y > points[best].y { i } else { best });
        let landing_index = points.len() - 1;

        Trajectory3D {
            points,
            apex_index,
            landing_index,
        }
    }
}
