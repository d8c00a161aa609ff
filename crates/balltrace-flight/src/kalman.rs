//! Six-state constant-acceleration Kalman filter for ball tracking.
//!
//! State vector: `[x, y, vx, vy, ax, ay]` in frame pixels and seconds.
//! Gravity is folded into the `ay` prior at initialization (image y grows
//! downward, so gravity is positive).
//!
//! Every `update*` call must be preceded by exactly one `predict()`.
//! Breaking that sequence is a contract violation and returns
//! [`FlightError::NotPredicted`].

use nalgebra::{SMatrix, SVector};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{FlightError, FlightResult};

type State = SVector<f64, 6>;
type Matrix6 = SMatrix<f64, 6, 6>;
type Matrix2x6 = SMatrix<f64, 2, 6>;
type Matrix6x2 = SMatrix<f64, 6, 2>;
type Matrix2 = SMatrix<f64, 2, 2>;
type Vector2 = SVector<f64, 2>;

/// Kalman estimator tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KalmanConfig {
    /// Process noise variance on position (px^2)
    pub process_noise_position: f64,
    /// Process noise variance on velocity ((px/s)^2)
    pub process_noise_velocity: f64,
    /// Process noise variance on acceleration ((px/s^2)^2)
    pub process_noise_acceleration: f64,
    /// Measurement noise variance at detector confidence 1.0 (px^2)
    pub measurement_noise: f64,
    /// Screen-space gravity prior (px/s^2). Empirical, not metric.
    pub gravity_px_s2: f64,
    pub initial_position_variance: f64,
    pub initial_velocity_variance: f64,
    pub initial_acceleration_variance: f64,
    /// Confidence floor used when scaling measurement noise
    pub min_confidence: f64,
    /// Mahalanobis gate (chi-square, 2 dof; 9.21 is the 99% quantile)
    pub gate_threshold: f64,
    /// Covariance multiplier applied on a missed measurement
    pub no_measurement_inflation: f64,
    /// Lower bound on the search radius returned by `predict` (px)
    pub min_search_radius: f64,
    /// Refinement stops after this many consecutive misses
    pub max_consecutive_misses: usize,
    /// Upper bound on frames refined past the seed
    pub max_refine_frames: usize,
    /// Stop refining once the prediction is this far outside the frame (px)
    pub exit_margin: f64,
}

impl Default for KalmanConfig {
    fn default() -> Self {
        Self {
            process_noise_position: 1.0,
            process_noise_velocity: 25.0,
            process_noise_acceleration: 400.0,
            measurement_noise: 4.0,
            gravity_px_s2: 600.0,
            initial_position_variance: 25.0,
            initial_velocity_variance: 2500.0,
            initial_acceleration_variance: 10000.0,
            min_confidence: 0.05,
            gate_threshold: 9.21,
            no_measurement_inflation: 1.5,
            min_search_radius: 8.0,
            max_consecutive_misses: 6,
            max_refine_frames: 150,
            exit_margin: 10.0,
        }
    }
}

/// Output of [`BallKalmanFilter::predict`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub x: f64,
    pub y: f64,
    /// Three-sigma position uncertainty (px)
    pub search_radius: f64,
}

/// Kalman filter over `[x, y, vx, vy, ax, ay]`.
#[derive(Debug, Clone)]
pub struct BallKalmanFilter {
    config: KalmanConfig,
    dt: f64,
    state: State,
    covariance: Matrix6,
    initialized: bool,
    predicted: bool,
}

impl BallKalmanFilter {
    /// Create a filter stepping `dt` seconds per predict.
    pub fn new(config: KalmanConfig, dt: f64) -> Self {
        Self {
            config,
            dt,
            state: State::zeros(),
            covariance: Matrix6::identity(),
            initialized: false,
            predicted: false,
        }
    }

    /// Build transition matrix F for the configured timestep.
    ///
    /// ```text
    /// | 1  0  dt  0  0.5dt²  0      |
    /// | 0  1  0   dt 0       0.5dt² |
    /// | 0  0  1   0  dt      0      |
    /// | 0  0  0   1  0       dt     |
    /// | 0  0  0   0  1       0      |
    /// | 0  0  0   0  0       1      |
    /// ```
    #[rustfmt::skip]
    fn transition_matrix(&self) -> Matrix6 {
        let dt = self.dt;
        let dt2 = 0.5 * dt * dt;
        Matrix6::new(
            1.0, 0.0, dt, 0.0, dt2, 0.0,
            0.0, 1.0, 0.0, dt, 0.0, dt2,
            0.0, 0.0, 1.0, 0.0, dt, 0.0,
            0.0, 0.0, 0.0, 1.0, 0.0, dt,
            0.0, 0.0, 0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 0.0, 0.0, 1.0,
        )
    }

    #[rustfmt::skip]
    fn observation_matrix() -> Matrix2x6 {
        Matrix2x6::new(
            1.0, 0.0, 0.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0, 0.0, 0.0,
        )
    }

    fn process_noise(&self) -> Matrix6 {
        let c = &self.config;
        Matrix6::from_diagonal(&State::from([
            c.process_noise_position,
            c.process_noise_position,
            c.process_noise_velocity,
            c.process_noise_velocity,
            c.process_noise_acceleration,
            c.process_noise_acceleration,
        ]))
    }

    fn measurement_noise(&self, confidence: f64) -> Matrix2 {
        let scale = 1.0 / confidence.clamp(self.config.min_confidence, 1.0);
        Matrix2::identity() * (self.config.measurement_noise * scale)
    }

    /// Reset the state at a known position and velocity (px, px/s).
    pub fn initialize(&mut self, x: f64, y: f64, vx: f64, vy: f64) {
        let c = &self.config;
        self.state = State::from([x, y, vx, vy, 0.0, c.gravity_px_s2]);
        self.covariance = Matrix6::from_diagonal(&State::from([
            c.initial_position_variance,
            c.initial_position_variance,
            c.initial_velocity_variance,
            c.initial_velocity_variance,
            c.initial_acceleration_variance,
            c.initial_acceleration_variance,
        ]));
        self.initialized = true;
        self.predicted = false;
    }

    /// Propagate state and covariance one step.
    pub fn predict(&mut self) -> FlightResult<Prediction> {
        if !self.initialized {
            return Err(FlightError::NotInitialized);
        }

        let f = self.transition_matrix();
        self.state = f * self.state;
        self.covariance = f * self.covariance * f.transpose() + self.process_noise();
        self.predicted = true;

        Ok(Prediction {
            x: self.state[0],
            y: self.state[1],
            search_radius: self.search_radius(),
        })
    }

    fn search_radius(&self) -> f64 {
        let sigma = self.covariance[(0, 0)].max(self.covariance[(1, 1)]).max(0.0).sqrt();
        (3.0 * sigma).max(self.config.min_search_radius)
    }

    fn take_prediction(&mut self) -> FlightResult<()> {
        if !self.initialized {
            return Err(FlightError::NotInitialized);
        }
        if !self.predicted {
            return Err(FlightError::NotPredicted);
        }
        self.predicted = false;
        Ok(())
    }

    /// Correct the prediction with a measurement.
    ///
    /// Measurement noise scales inversely with `confidence`. The covariance
    /// update uses the Joseph form.
    pub fn update(&mut self, measured_x: f64, measured_y: f64, confidence: f64) -> FlightResult<()> {
        self.take_prediction()?;

        let h = Self::observation_matrix();
        let r = self.measurement_noise(confidence);
        let z = Vector2::new(measured_x, measured_y);

        let innovation = z - h * self.state;
        let s = h * self.covariance * h.transpose() + r;

        let Some(s_inv) = s.try_inverse() else {
            warn!(
                measured_x,
                measured_y, "Singular innovation covariance, keeping prediction"
            );
            return Ok(());
        };

        let k: Matrix6x2 = self.covariance * h.transpose() * s_inv;
        self.state += k * innovation;

        // Joseph form: P = (I - KH) P (I - KH)' + K R K'
        let i_kh = Matrix6::identity() - k * h;
        self.covariance = i_kh * self.covariance * i_kh.transpose() + k * r * k.transpose();

        Ok(())
    }

    /// Accept the prediction without a measurement, inflating uncertainty.
    pub fn update_no_measurement(&mut self) -> FlightResult<()> {
        self.take_prediction()?;
        self.covariance *= self.config.no_measurement_inflation.max(1.0);
        Ok(())
    }

    /// Squared Mahalanobis distance of a measurement from the current
    /// predicted position. `None` when the innovation covariance is singular.
    pub fn mahalanobis_distance(&self, x: f64, y: f64) -> FlightResult<Option<f64>> {
        if !self.initialized {
            return Err(FlightError::NotInitialized);
        }
        let h = Self::observation_matrix();
        let s = h * self.covariance * h.transpose() + self.measurement_noise(1.0);
        let innovation = Vector2::new(x, y) - h * self.state;

        Ok(s.try_inverse()
            .map(|s_inv| (innovation.transpose() * s_inv * innovation)[(0, 0)]))
    }

    /// Gate a candidate measurement before it may update the filter.
    ///
    /// Falls back to a 3-sigma Euclidean check when the innovation
    /// covariance cannot be inverted.
    pub fn is_measurement_plausible(&self, x: f64, y: f64) -> FlightResult<bool> {
        match self.mahalanobis_distance(x, y)? {
            Some(d2) => Ok(d2 <= self.config.gate_threshold),
            None => {
                let distance = ((x - self.state[0]).powi(2) + (y - self.state[1]).powi(2)).sqrt();
                Ok(distance <= self.search_radius())
            }
        }
    }

    pub fn position(&self) -> (f64, f64) {
        (self.state[0], self.state[1])
    }

    pub fn velocity(&self) -> (f64, f64) {
        (self.state[2], self.state[3])
    }

    #[cfg(test)]
    fn covariance(&self) -> &Matrix6 {
        &self.covariance
    }
}
