//! Linear Kalman filter over `(x, y, θ)`.
//!
//! Motion, control and measurement matrices are all identity: the control
//! input is already the expected pose change and the beacon fix observes the
//! state directly. Headings are degrees; the heading innovation is wrapped to
//! `[-180, 180)` so a fix across the 0/360 seam pulls the short way round.

use arena_kinematics::Pose;
use nalgebra::{Matrix3, Vector3};
use tracing::{debug, warn};

use crate::config::FilterNoise;
use crate::odometry::ControlInput;

/// Filter belief: mean pose and covariance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Belief {
    /// Mean pose, heading in `[0, 360)`.
    pub mean: Pose,
    /// Covariance over `(x, y, θ)`.
    pub covariance: Matrix3<f64>,
}

impl Belief {
    /// A belief certain of `mean`.
    pub fn new(mean: Pose) -> Self {
        Self {
            mean,
            covariance: Matrix3::zeros(),
        }
    }

    /// Covariance is symmetric and finite with a non-negative diagonal.
    pub fn is_well_formed(&self) -> bool {
        let c = &self.covariance;
        c.iter().all(|v| v.is_finite())
            && c.diagonal().iter().all(|v| *v >= 0.0)
            && (c - c.transpose()).amax() <= 1e-9 * (1.0 + c.amax())
    }
}

/// Kalman filter with fixed diagonal process and measurement noise.
#[derive(Debug, Clone, PartialEq)]
pub struct PoseFilter {
    process: Matrix3<f64>,
    measurement: Matrix3<f64>,
}

impl PoseFilter {
    /// Creates a filter with process noise `R` and measurement noise `Q` taken from `noise`.
    pub fn new(noise: &FilterNoise) -> Self {
        Self {
            process: Matrix3::from_diagonal(&Vector3::new(
                noise.process_xy,
                noise.process_xy,
                noise.process_theta,
            )),
            measurement: Matrix3::from_diagonal(&Vector3::new(
                noise.measurement_xy,
                noise.measurement_xy,
                noise.measurement_theta,
            )),
        }
    }

    /// Prediction: `μ̄ = μ + u`, `Σ̄ = Σ + R`.
    pub fn predict(&self, belief: &Belief, control: ControlInput) -> Belief {
        let m = belief.mean;
        Belief {
            mean: Pose::normalized(m.x + control.dx, m.y + control.dy, m.theta + control.dtheta),
            covariance: belief.covariance + self.process,
        }
    }

    /// Correction with measurement `z`.
    ///
    /// A singular innovation covariance leaves the prediction untouched.
    pub fn correct(&self, predicted: &Belief, z: Pose) -> Belief {
        let sigma = predicted.covariance;
        let Some(innovation_inv) = (sigma + self.measurement).try_inverse() else {
            warn!(measurement = %z, "innovation covariance is singular; skipping correction");
            return *predicted;
        };
        let gain = sigma * innovation_inv;

        let m = predicted.mean;
        let innovation = Vector3::new(z.x - m.x, z.y - m.y, Pose::wrap_angle(z.theta - m.theta));
        let step = gain * innovation;

        Belief {
            mean: Pose::normalized(m.x + step.x, m.y + step.y, m.theta + step.z),
            covariance: (Matrix3::identity() - gain) * sigma,
        }
    }

    /// One filter cycle. Without a measurement the prediction is returned.
    pub fn update(&self, belief: &Belief, control: ControlInput, measurement: Option<Pose>) -> Belief {
        let predicted = self.predict(belief, control);
        match measurement {
            Some(z) => self.correct(&predicted, z),
            None => {
                debug!(mean = %predicted.mean, "no beacon fix; prediction only");
                predicted
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn zero_noise() -> FilterNoise {
        FilterNoise {
            process_xy: 0.0,
            process_theta: 0.0,
            measurement_xy: 0.0,
            measurement_theta: 0.0,
        }
    }

    #[test]
    fn test_prediction_only() {
        let filter = PoseFilter::new(&FilterNoise::default());
        let belief = Belief::new(Pose::new(10.0, 20.0, 350.0));
        let u = ControlInput { dx: 1.0, dy: -2.0, dtheta: 20.0 };
        let next = filter.update(&belief, u, None);
        assert_relative_eq!(next.mean.x, 11.0);
        assert_relative_eq!(next.mean.y, 18.0);
        assert_relative_eq!(next.mean.theta, 10.0, epsilon = 1e-9);
        assert_relative_eq!(next.covariance[(0, 0)], 0.05);
        assert_relative_eq!(next.covariance[(2, 2)], 0.05);
        assert_eq!(next.covariance[(0, 1)], 0.0);
    }

    #[test]
    fn test_correction_moves_towards_measurement() {
        let filter = PoseFilter::new(&FilterNoise::default());
        let belief = Belief::new(Pose::new(100.0, 100.0, 0.0));
        let next = filter.update(&belief, ControlInput::default(), Some(Pose::new(110.0, 100.0, 0.0)));
        // Σ̄ = 0.05, S = 0.06, K = 5/6.
        assert_relative_eq!(next.mean.x, 100.0 + 10.0 * 5.0 / 6.0, epsilon = 1e-9);
        assert_relative_eq!(next.covariance[(0, 0)], 0.05 / 6.0, epsilon = 1e-12);
        assert!(next.is_well_formed());
    }

    #[test]
    fn test_heading_innovation_takes_short_way() {
        let filter = PoseFilter::new(&FilterNoise::default());
        let belief = Belief::new(Pose::new(0.0, 0.0, 359.0));
        let next = filter.update(&belief, ControlInput::default(), Some(Pose::new(0.0, 0.0, 1.0)));
        // Innovation is +2 degrees, not -358.
        let expected = Pose::normalize_angle(359.0 + 2.0 * 5.0 / 6.0);
        assert_relative_eq!(next.mean.theta, expected, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_noise_matching_measurement() {
        let filter = PoseFilter::new(&zero_noise());
        let mean = Pose::new(50.0, 60.0, 30.0);
        let mut belief = Belief {
            mean,
            covariance: Matrix3::identity() * 2.0,
        };
        let mut trace = belief.covariance.trace();
        for _ in 0..3 {
            belief = filter.update(&belief, ControlInput::default(), Some(mean));
            assert_eq!(belief.mean, mean);
            assert!(belief.covariance.trace() <= trace);
            assert!(belief.is_well_formed());
            trace = belief.covariance.trace();
        }
    }

    #[test]
    fn test_singular_innovation_skips_correction() {
        let filter = PoseFilter::new(&zero_noise());
        let belief = Belief::new(Pose::new(1.0, 2.0, 3.0));
        let next = filter.update(&belief, ControlInput::default(), Some(Pose::new(9.0, 9.0, 9.0)));
        assert_eq!(next, belief);
    }

    #[test]
    fn test_covariance_stays_well_formed() {
        let filter = PoseFilter::new(&FilterNoise::default());
        let mut belief = Belief::new(Pose::new(400.0, 175.0, 0.0));
        for i in 0..200 {
            let z = (i % 3 == 0).then(|| Pose::new(400.0 + i as f64, 175.0, (i * 7) as f64));
            belief = filter.update(&belief, ControlInput { dx: 1.0, dy: 0.0, dtheta: 7.0 }, z);
            assert!(belief.is_well_formed());
            assert!((0.0..360.0).contains(&belief.mean.theta));
        }
    }
}
