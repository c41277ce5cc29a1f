//! Static configuration consumed when a robot or simulation is constructed.
//!
//! Defaults reproduce the reference arena: a robot of radius 30 with twelve
//! infrared rays of range 500, eight corner beacons, and small diagonal filter
//! noise matrices.

use arena_kinematics::{Pose, WheelVelocities};

use crate::error::LocalizationError;
use crate::odometry::Sampler;

/// Noise parameters `α1..α4` of the odometry motion model.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct OdometryNoise {
    /// Rotation noise caused by rotation.
    pub alpha1: f64,
    /// Rotation noise caused by translation.
    pub alpha2: f64,
    /// Translation noise caused by translation.
    pub alpha3: f64,
    /// Translation noise caused by rotation.
    pub alpha4: f64,
}

impl OdometryNoise {
    /// Noise-free odometry.
    pub const ZERO: OdometryNoise = OdometryNoise::uniform(0.0);

    /// All four parameters set to `alpha`.
    pub const fn uniform(alpha: f64) -> Self {
        OdometryNoise {
            alpha1: alpha,
            alpha2: alpha,
            alpha3: alpha,
            alpha4: alpha,
        }
    }
}

impl Default for OdometryNoise {
    fn default() -> Self {
        OdometryNoise::uniform(0.001)
    }
}

/// Diagonals of the Kalman filter's process (`R`) and measurement (`Q`) noise.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct FilterNoise {
    /// Process noise variance on x and y.
    pub process_xy: f64,
    /// Process noise variance on theta.
    pub process_theta: f64,
    /// Measurement noise variance on x and y.
    pub measurement_xy: f64,
    /// Measurement noise variance on theta.
    pub measurement_theta: f64,
}

impl Default for FilterNoise {
    fn default() -> Self {
        FilterNoise {
            process_xy: 0.05,
            process_theta: 0.05,
            measurement_xy: 0.01,
            measurement_theta: 0.01,
        }
    }
}

/// Robot geometry, sensing and estimation parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct RobotConfig {
    /// Robot body radius.
    pub radius: f64,
    /// Distance between the drive wheels.
    pub wheel_separation: f64,
    /// Number of equally spaced range rays, ray 0 along the heading.
    pub ray_count: usize,
    /// Maximum range of a ray.
    pub sensor_max: f64,
    /// Exponent `k` of the activation transform `(sensor_max - d)^k`.
    pub activation_exponent: f64,
    /// Slack used by segment intersection and penetration tests.
    pub collision_tolerance: f64,
    /// Wall hits closer than this to a beacon do not occlude it.
    pub beacon_occlusion_tolerance: f64,
    /// Beacon range noise standard deviation as a fraction of the true range.
    pub beacon_distance_noise: f64,
    /// A tick is rejected when `dt >= radius * dt_limit_factor`.
    pub dt_limit_factor: f64,
    /// Converts a tick time delta into kinematic time units.
    pub time_scale: f64,
    /// Cap on collision corrections within a single sensor update.
    pub max_collision_iterations: usize,
    /// Odometry motion model noise.
    pub odometry_noise: OdometryNoise,
    /// Distribution used to sample and score odometry noise.
    pub sampler: Sampler,
    /// Kalman filter noise.
    pub filter_noise: FilterNoise,
    /// Pose restored by a reset.
    pub initial_pose: Pose,
    /// Seed for all measurement and motion noise; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for RobotConfig {
    fn default() -> Self {
        RobotConfig {
            radius: 30.0,
            wheel_separation: 60.0,
            ray_count: 12,
            sensor_max: 500.0,
            activation_exponent: 2.0,
            collision_tolerance: 0.001,
            beacon_occlusion_tolerance: 5.0,
            beacon_distance_noise: 0.01,
            dt_limit_factor: 10.0,
            time_scale: 0.1,
            max_collision_iterations: 64,
            odometry_noise: OdometryNoise::default(),
            sampler: Sampler::Normal,
            filter_noise: FilterNoise::default(),
            initial_pose: Pose::new(400.0, 175.0, 0.0),
            seed: None,
        }
    }
}

impl RobotConfig {
    /// Checks that every parameter is in range.
    ///
    /// # Errors
    ///
    /// Returns `LocalizationError::InvalidConfig` naming the first offending field.
    pub fn validate(&self) -> Result<(), LocalizationError> {
        if !(self.radius > 0.0) {
            return Err(LocalizationError::InvalidConfig("radius must be positive"));
        }
        if !(self.wheel_separation > 0.0) {
            return Err(LocalizationError::InvalidConfig("wheel_separation must be positive"));
        }
        if self.ray_count == 0 {
            return Err(LocalizationError::InvalidConfig("ray_count must be non-zero"));
        }
        if !(self.sensor_max > 0.0) {
            return Err(LocalizationError::InvalidConfig("sensor_max must be positive"));
        }
        if !(self.collision_tolerance >= 0.0 && self.beacon_occlusion_tolerance >= 0.0) {
            return Err(LocalizationError::InvalidConfig("tolerances must be non-negative"));
        }
        if !(self.beacon_distance_noise >= 0.0) {
            return Err(LocalizationError::InvalidConfig("beacon_distance_noise must be non-negative"));
        }
        if !(self.dt_limit_factor > 0.0 && self.time_scale > 0.0) {
            return Err(LocalizationError::InvalidConfig("dt_limit_factor and time_scale must be positive"));
        }
        let n = self.odometry_noise;
        if [n.alpha1, n.alpha2, n.alpha3, n.alpha4].iter().any(|a| !(*a >= 0.0)) {
            return Err(LocalizationError::InvalidConfig("odometry noise parameters must be non-negative"));
        }
        let f = self.filter_noise;
        if [f.process_xy, f.process_theta, f.measurement_xy, f.measurement_theta]
            .iter()
            .any(|v| !(*v >= 0.0))
        {
            return Err(LocalizationError::InvalidConfig("filter noise variances must be non-negative"));
        }
        if !(self.initial_pose.x.is_finite() && self.initial_pose.y.is_finite() && self.initial_pose.theta.is_finite()) {
            return Err(LocalizationError::InvalidConfig("initial_pose must be finite"));
        }
        Ok(())
    }

    /// Exclusive upper bound on a tick's time delta.
    pub fn dt_limit(&self) -> f64 {
        self.radius * self.dt_limit_factor
    }

    /// Activation of a ray touching the robot center, `sensor_max^k`.
    pub fn max_activation(&self) -> f64 {
        self.sensor_max.powf(self.activation_exponent)
    }
}

/// Parameters of the simulation driver and its coverage grid.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct SimulationConfig {
    /// Time delta used by static (as fast as possible) runs.
    pub static_dt: f64,
    /// Largest static time delta accepted.
    pub max_static_dt: f64,
    /// Number of ticks in a static run.
    pub ticks: u64,
    /// Pace ticks against the wall clock instead of using `static_dt`.
    pub realtime: bool,
    /// Simulated time per wall-clock time in paced mode.
    pub time_dilation: f64,
    /// Wall-clock duration of a paced run in seconds; `0` runs `ticks` ticks.
    pub timeout_secs: f64,
    /// Number of coverage cells along each axis.
    pub grid_size: usize,
    /// Width of the field covered by the grid.
    pub field_width: f64,
    /// Height of the field covered by the grid.
    pub field_height: f64,
    /// Coverage value of a newly swept cell per unit of normalized activation.
    pub coverage_weight: f64,
    /// Wheel velocities of the demo controller.
    pub demo_velocities: WheelVelocities,
    /// Lower bound on commanded wheel velocities.
    pub velocity_min: f64,
    /// Upper bound on commanded wheel velocities.
    pub velocity_max: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            static_dt: 20.0,
            max_static_dt: 200.0,
            ticks: 2_000,
            realtime: false,
            time_dilation: 1.0,
            timeout_secs: 0.0,
            grid_size: 128,
            field_width: 1024.0,
            field_height: 768.0,
            coverage_weight: 5.0,
            demo_velocities: WheelVelocities::new(0.65, 0.5),
            velocity_min: -1.0,
            velocity_max: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = RobotConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.dt_limit(), 300.0);
        assert_eq!(config.max_activation(), 250_000.0);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = RobotConfig { radius: 0.0, ..RobotConfig::default() };
        assert_eq!(config.validate(), Err(LocalizationError::InvalidConfig("radius must be positive")));

        let config = RobotConfig { ray_count: 0, ..RobotConfig::default() };
        assert!(config.validate().is_err());

        let config = RobotConfig {
            odometry_noise: OdometryNoise { alpha3: -0.1, ..OdometryNoise::default() },
            ..RobotConfig::default()
        };
        assert!(config.validate().is_err());

        let config = RobotConfig { sensor_max: f64::NAN, ..RobotConfig::default() };
        assert!(config.validate().is_err());
    }
}
