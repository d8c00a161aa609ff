use serde::{Deserialize, Serialize};

use super::Point3;

/// Down-the-line camera tuning (normalized screen units).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerspectiveConfig {
    /// Focal-length-style ratio: depth at which apparent size halves
    pub focal_length: f64,
    pub vanishing_point_x: f64,
    /// Horizon height on screen
    pub vanishing_point_y: f64,
    /// Screen units per unit of height at zero depth
    pub height_scale: f64,
    /// Tracer line width at zero depth (px)
    pub base_line_width: f64,
}

impl Default for PerspectiveConfig {
    fn default() -> Self {
        Self {
            focal_length: 1.0,
            vanishing_point_x: 0.5,
            vanishing_point_y: 0.35,
            height_scale: 1.0,
            base_line_width: 4.0,
        }
    }
}

/// Maps shot space to the screen for a camera behind the ball.
#[derive(Debug, Clone)]
pub struct PerspectiveCamera {
    config: PerspectiveConfig,
    origin_x: f64,
    origin_y: f64,
}

impl PerspectiveCamera {
    /// Camera anchored at the ball's normalized screen position.
    pub fn new(config: PerspectiveConfig, origin_x: f64, origin_y: f64) -> Self {
        Self {
            config,
            origin_x,
            origin_y,
        }
    }

    /// Apparent-size ratio at `depth`, 1 at the ball.
    pub fn scale_at_depth(&self, depth: f64) -> f64 {
        let f = self.config.focal_length;
        f / (f + depth.max(0.0))
    }

    /// Screen y of the ground under a point at `depth`.
    pub fn ground_y_at(&self, depth: f64) -> f64 {
        let vp_y = self.config.vanishing_point_y;
        vp_y + (self.origin_y - vp_y) * self.scale_at_depth(depth)
    }

    pub fn line_width_at(&self, depth: f64) -> f64 {
        self.config.base_line_width * self.scale_at_depth(depth)
    }

    /// Shot-space point to normalized screen `(x, y)`.
    pub fn project(&self, p: &Point3) -> (f64, f64) {
        let s = self.scale_at_depth(p.z);
        let vp_x = self.config.vanishing_point_x;
        let sx = vp_x + (self.origin_x - vp_x + p.x) * s;
        let sy = self.ground_y_at(p.z) - p.y * self.config.height_scale * s;
        (sx, sy)
    }

    /// Approximate depth of a point observed at `screen_y` with a known
    /// `height`. `None` when the observation is on or beyond the horizon.
    pub fn estimate_depth(&self, screen_y: f64, height: f64) -> Option<f64> {
        let vp_y = self.config.vanishing_point_y;
        let denom = self.origin_y - vp_y - height * self.config.height_scale;
        if denom.abs() < 1e-9 {
            return None;
        }
        let s = (screen_y - vp_y) / denom;
        if s <= 0.0 || s > 1.0 {
            return None;
        }
        Some(self.config.focal_length / s - self.config.focal_length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::new(PerspectiveConfig::default(), 0.5, 0.8)
    }

    #[test]
    fn test_origin_projects_to_itself() {
        let (x, y) = camera().project(&Point3 {
            t: 0.0,
            x: 0.0,
            y: 0.0,
            z: 0.0,
        });
        assert_relative_eq!(x, 0.5);
        assert_relative_eq!(y, 0.8);
    }

    #[test]
    fn test_ground_recedes_to_horizon() {
        let cam = camera();
        assert_relative_eq!(cam.scale_at_depth(1.0), 0.5);
        assert_relative_eq!(cam.ground_y_at(1.0), 0.35 + 0.45 * 0.5);
        assert!(cam.ground_y_at(1000.0) - 0.35 < 1e-3);
        assert_relative_eq!(cam.line_width_at(3.0), 1.0);
    }

    #[test]
    fn test_depth_estimate_inverts_projection() {
        let cam = camera();
        let p = Point3 {
            t: 1.0,
            x: 0.0,
            y: 0.2,
            z: 2.5,
        };
        let (_, sy) = cam.project(&p);
        let depth = cam.estimate_depth(sy, p.y).unwrap();
        assert_relative_eq!(depth, 2.5, epsilon = 1e-9);
    }

    #[test]
    fn test_depth_estimate_rejects_horizon() {
        assert!(camera().estimate_depth(0.35, 0.0).is_none());
    }
}
