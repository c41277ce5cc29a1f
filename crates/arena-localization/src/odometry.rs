//! Probabilistic odometry motion model.
//!
//! A measured transition between two poses is decomposed into an initial
//! rotation, a translation and a final rotation. Noise proportional to those
//! three quantities is sampled to turn noise-free odometry into a plausible
//! noisy control input for the pose filter. The matching density evaluator
//! scores a candidate transition against a measured one.
//!
//! Poses are exchanged in degrees; the decomposition is carried in radians.

use std::f64::consts::{PI, TAU};

use arena_kinematics::Pose;
use rand::Rng;

use crate::config::OdometryNoise;

const MIN_TRANSLATION: f64 = 1e-9;

/// Zero-mean noise distribution used for sampling and density evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum Sampler {
    /// Approximate normal: half the sum of twelve uniform draws on `(-sd, sd)`.
    #[default]
    Normal,
    /// Triangular distribution with the same standard deviation.
    Triangular,
}

impl Sampler {
    /// Draws a zero-mean value with standard deviation `sd`. Returns 0 when `sd <= 0`.
    pub fn sample<R: Rng>(&self, rng: &mut R, sd: f64) -> f64 {
        if !(sd > 0.0) {
            return 0.0;
        }
        match self {
            Sampler::Normal => 0.5 * (0..12).map(|_| rng.random_range(-sd..sd)).sum::<f64>(),
            Sampler::Triangular => {
                let u1 = rng.random_range(-sd..sd);
                let u2 = rng.random_range(-sd..sd);
                6f64.sqrt() * 0.5 * (u1 + u2)
            }
        }
    }

    /// Density at `a` of the zero-mean distribution with standard deviation `sd`.
    ///
    /// A zero standard deviation is replaced by the smallest positive value whose
    /// square is still representable.
    pub fn density(&self, a: f64, sd: f64) -> f64 {
        let sd = if sd > 0.0 { sd } else { f64::EPSILON };
        let variance = sd * sd;
        match self {
            Sampler::Normal => (-a * a / (2.0 * variance)).exp() / (2.0 * PI * variance).sqrt(),
            Sampler::Triangular => (1.0 / (6f64.sqrt() * sd) - a.abs() / (6.0 * variance)).max(0.0),
        }
    }
}

/// Wraps an angle in radians to `[-π, π)`.
fn wrap_radians(angle: f64) -> f64 {
    let a = (angle + PI).rem_euclid(TAU);
    if a >= TAU { -PI } else { a - PI }
}

/// A transition decomposed into rotation, translation, rotation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OdometryMotion {
    /// Rotation towards the direction of travel, radians in `[-π, π)`.
    pub rot1: f64,
    /// Straight-line distance travelled.
    pub trans: f64,
    /// Remaining rotation to the final heading, radians in `[-π, π)`.
    pub rot2: f64,
}

impl OdometryMotion {
    /// Decomposes the transition `before → after`.
    ///
    /// A transition without translation is pure rotation: `rot1` is 0 and `rot2`
    /// carries the whole heading change.
    pub fn between(before: Pose, after: Pose) -> Self {
        let dx = after.x - before.x;
        let dy = after.y - before.y;
        let trans = dx.hypot(dy);
        let heading_before = before.theta_radians();
        let rot1 = if trans < MIN_TRANSLATION {
            0.0
        } else {
            wrap_radians(dy.atan2(dx) - heading_before)
        };
        let rot2 = wrap_radians(after.theta_radians() - heading_before - rot1);
        OdometryMotion { rot1, trans, rot2 }
    }

    /// Standard deviations `(rot1, trans, rot2)` of the noise on this motion.
    pub fn deviations(&self, noise: &OdometryNoise) -> (f64, f64, f64) {
        let rot1 = noise.alpha1 * self.rot1.abs() + noise.alpha2 * self.trans;
        let trans = noise.alpha3 * self.trans + noise.alpha4 * (self.rot1.abs() + self.rot2.abs());
        let rot2 = noise.alpha1 * self.rot2.abs() + noise.alpha2 * self.trans;
        (rot1, trans, rot2)
    }

    /// Applies the motion to `pose`.
    pub fn apply(&self, pose: Pose) -> Pose {
        let heading = pose.theta_radians() + self.rot1;
        Pose::normalized(
            pose.x + self.trans * heading.cos(),
            pose.y + self.trans * heading.sin(),
            (heading + self.rot2).to_degrees(),
        )
    }
}

/// Control input handed to the pose filter: the expected pose change.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControlInput {
    /// Change in x.
    pub dx: f64,
    /// Change in y.
    pub dy: f64,
    /// Change in heading in degrees, wrapped to `[-180, 180)`.
    pub dtheta: f64,
}

impl ControlInput {
    /// Difference `to - from`.
    pub fn between(from: Pose, to: Pose) -> Self {
        ControlInput {
            dx: to.x - from.x,
            dy: to.y - from.y,
            dtheta: Pose::wrap_angle(to.theta - from.theta),
        }
    }
}

/// Odometry motion model with a pluggable noise distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct OdometryMotionModel {
    noise: OdometryNoise,
    sampler: Sampler,
}

impl OdometryMotionModel {
    /// Creates a model with the given noise parameters and distribution.
    pub fn new(noise: OdometryNoise, sampler: Sampler) -> Self {
        Self { noise, sampler }
    }

    /// Noise parameters.
    pub fn noise(&self) -> OdometryNoise {
        self.noise
    }

    /// Distribution used for sampling and density evaluation.
    pub fn sampler(&self) -> Sampler {
        self.sampler
    }

    /// Replaces the distribution.
    pub fn set_sampler(&mut self, sampler: Sampler) {
        self.sampler = sampler;
    }

    /// Samples a noisy pose reached from `before` given the measured transition `before → after`.
    pub fn sample<R: Rng>(&self, rng: &mut R, before: Pose, after: Pose) -> Pose {
        let measured = OdometryMotion::between(before, after);
        let (sd_rot1, sd_trans, sd_rot2) = measured.deviations(&self.noise);
        let noisy = OdometryMotion {
            rot1: measured.rot1 + self.sampler.sample(rng, sd_rot1),
            trans: measured.trans + self.sampler.sample(rng, sd_trans),
            rot2: measured.rot2 + self.sampler.sample(rng, sd_rot2),
        };
        noisy.apply(before)
    }

    /// Noisy control input for the measured transition `before → after`.
    ///
    /// With zero noise this is exactly the raw odometry delta.
    pub fn control_input<R: Rng>(&self, rng: &mut R, before: Pose, after: Pose) -> ControlInput {
        ControlInput::between(before, self.sample(rng, before, after))
    }

    /// Density of the candidate transition `candidate.0 → candidate.1` given the
    /// measured odometry `measured.0 → measured.1`.
    ///
    /// Standard deviations are derived from the candidate motion.
    pub fn probability_density(&self, candidate: (Pose, Pose), measured: (Pose, Pose)) -> f64 {
        let hat = OdometryMotion::between(candidate.0, candidate.1);
        let odo = OdometryMotion::between(measured.0, measured.1);
        let (sd_rot1, sd_trans, sd_rot2) = hat.deviations(&self.noise);

        let p1 = self.sampler.density(wrap_radians(odo.rot1 - hat.rot1), sd_rot1);
        let p2 = self.sampler.density(odo.trans - hat.trans, sd_trans);
        let p3 = self.sampler.density(wrap_radians(odo.rot2 - hat.rot2), sd_rot2);
        p1 * p2 * p3
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_normal_density() {
        let s = Sampler::Normal;
        assert_relative_eq!(s.density(0.0, 1.0), 0.3989422804, epsilon = 1e-10);
        assert_relative_eq!(s.density(1.0, 1.0), 0.2419707245, epsilon = 1e-10);
        assert_relative_eq!(s.density(3.0, 1.0), 0.0044318484, epsilon = 1e-10);
        assert_relative_eq!(s.density(5.0, 5.0), 0.0483941449, epsilon = 1e-10);
    }

    #[test]
    fn test_triangular_density() {
        let s = Sampler::Triangular;
        assert_relative_eq!(s.density(0.0, 1.0), 0.4082482905, epsilon = 1e-10);
        assert_relative_eq!(s.density(1.0, 1.0), 0.2415816238, epsilon = 1e-10);
        assert_eq!(s.density(3.0, 1.0), 0.0);
        assert_relative_eq!(s.density(5.0, 5.0), 0.0483163248, epsilon = 1e-10);
    }

    #[test]
    fn test_zero_deviation_density_is_finite() {
        for s in [Sampler::Normal, Sampler::Triangular] {
            let at_zero = s.density(0.0, 0.0);
            assert!(at_zero.is_finite() && at_zero > 0.0);
            assert_eq!(s.density(1.0, 0.0), 0.0);
        }
    }

    #[test]
    fn test_samplers_are_zero_mean_with_requested_deviation() {
        let mut rng = StdRng::seed_from_u64(7);
        for s in [Sampler::Normal, Sampler::Triangular] {
            let n = 20_000;
            let draws: Vec<f64> = (0..n).map(|_| s.sample(&mut rng, 2.0)).collect();
            let mean = draws.iter().sum::<f64>() / n as f64;
            let var = draws.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / n as f64;
            assert!(mean.abs() < 0.1, "{s:?} mean {mean}");
            assert!((var.sqrt() - 2.0).abs() < 0.1, "{s:?} sd {}", var.sqrt());
        }
        assert_eq!(Sampler::Normal.sample(&mut rng, 0.0), 0.0);
    }

    #[test]
    fn test_decomposition() {
        let m = OdometryMotion::between(Pose::new(1.0, 1.0, 0.0), Pose::new(1.0, 3.0, 90.0));
        assert_relative_eq!(m.rot1, PI / 2.0, epsilon = EPSILON);
        assert_relative_eq!(m.trans, 2.0, epsilon = EPSILON);
        assert_relative_eq!(m.rot2, 0.0, epsilon = EPSILON);

        // Pure rotation keeps rot1 at zero.
        let m = OdometryMotion::between(Pose::new(5.0, 5.0, 350.0), Pose::new(5.0, 5.0, 10.0));
        assert_eq!(m.rot1, 0.0);
        assert_eq!(m.trans, 0.0);
        assert_relative_eq!(m.rot2, 20f64.to_radians(), epsilon = EPSILON);

        // Driving backwards is a half turn either side, never a banana-shaped detour.
        let m = OdometryMotion::between(Pose::new(0.0, 0.0, 0.0), Pose::new(-1.0, -1.0, 0.0));
        assert_relative_eq!(m.trans, 2f64.sqrt(), epsilon = EPSILON);
        assert_relative_eq!(m.rot1, -3.0 * PI / 4.0, epsilon = EPSILON);
        assert_relative_eq!(m.rot2, 3.0 * PI / 4.0, epsilon = EPSILON);
    }

    #[test]
    fn test_zero_noise_returns_raw_delta() {
        let model = OdometryMotionModel::new(OdometryNoise::ZERO, Sampler::Normal);
        let mut rng = StdRng::seed_from_u64(1);
        let before = Pose::new(400.0, 175.0, 350.0);
        let after = Pose::new(403.5, 174.0, 5.0);
        let u = model.control_input(&mut rng, before, after);
        assert_relative_eq!(u.dx, 3.5, epsilon = EPSILON);
        assert_relative_eq!(u.dy, -1.0, epsilon = EPSILON);
        assert_relative_eq!(u.dtheta, 15.0, epsilon = EPSILON);
    }

    #[test]
    fn test_noisy_sample_stays_near_measurement() {
        let model = OdometryMotionModel::new(OdometryNoise::default(), Sampler::Triangular);
        let mut rng = StdRng::seed_from_u64(3);
        let before = Pose::new(0.0, 0.0, 0.0);
        let after = Pose::new(10.0, 0.0, 0.0);
        for _ in 0..100 {
            let p = model.sample(&mut rng, before, after);
            assert!((p.x - 10.0).abs() < 0.1);
            assert!(p.y.abs() < 0.3);
            assert!((0.0..360.0).contains(&p.theta));
        }
    }

    #[test]
    fn test_probability_density() {
        let mut model = OdometryMotionModel::new(OdometryNoise::uniform(0.1), Sampler::Normal);
        let candidate = (Pose::new(0.0, 0.0, 0.0), Pose::new(1.0, 0.0, 0.0));
        let measured = (Pose::new(0.0, 0.0, 0.0), Pose::new(1.0, 0.0, 0.0));
        assert_relative_eq!(model.probability_density(candidate, measured), 63.4936359342, epsilon = 1e-9);

        model.set_sampler(Sampler::Triangular);
        assert_relative_eq!(model.probability_density(candidate, measured), 68.0413817440, epsilon = 1e-9);

        // A candidate that disagrees with the odometry is less likely.
        model.set_sampler(Sampler::Normal);
        let off = (Pose::new(0.0, 0.0, 0.0), Pose::new(1.1, 0.0, 0.0));
        assert!(model.probability_density(off, measured) < 63.4936359342);
    }
}
