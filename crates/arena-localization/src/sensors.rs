//! Infrared range sensing and wall collision correction.
//!
//! Rays are cast from the robot center at `theta + i * 360 / N`; ray 0 points
//! along the heading. Each ray reports the nearest wall hit within
//! `sensor_max` together with a proximity activation `(sensor_max - d)^k`.
//!
//! A reading shorter than the robot radius means the body overlaps a wall.
//! [`CollisionResolver`] pushes the robot out along the offending ray and
//! re-runs the full sweep until no ray penetrates, or reports a fault once its
//! iteration cap is exhausted.

use arena_kinematics::{Point, Pose, Segment};
use tracing::{debug, warn};

use crate::config::RobotConfig;
use crate::error::LocalizationError;
use crate::map::Wall;

/// Output of a single ray.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SensorReading {
    /// Distance to the nearest wall, in `[0, sensor_max]`.
    pub distance: f64,
    /// Transformed proximity signal `(sensor_max - distance)^k`.
    pub activation: f64,
    /// Nearest wall hit, or the ray's far end when nothing was hit.
    pub endpoint: Point,
}

/// Ray-casting range sensor.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeSensor {
    ray_count: usize,
    sensor_max: f64,
    activation_exponent: f64,
    tolerance: f64,
}

impl RangeSensor {
    /// Builds the sensor from the robot configuration.
    pub fn from_config(config: &RobotConfig) -> Self {
        Self {
            ray_count: config.ray_count,
            sensor_max: config.sensor_max,
            activation_exponent: config.activation_exponent,
            tolerance: config.collision_tolerance,
        }
    }

    /// Number of rays.
    pub fn ray_count(&self) -> usize {
        self.ray_count
    }

    /// Map bearing of ray `index` for a robot heading `heading`.
    pub fn ray_angle(&self, heading: f64, index: usize) -> f64 {
        Pose::normalize_angle(heading + (360.0 / self.ray_count as f64) * index as f64)
    }

    /// Activation of a ray reporting `distance`.
    pub fn activation(&self, distance: f64) -> f64 {
        (self.sensor_max - distance).max(0.0).powf(self.activation_exponent)
    }

    /// Readings of every ray for a robot at `pose`, indexed by ray number.
    pub fn cast(&self, pose: Pose, walls: &[Wall]) -> Vec<SensorReading> {
        let origin = pose.position();
        (0..self.ray_count)
            .map(|index| {
                let angle = self.ray_angle(pose.theta, index);
                let ray = Segment::new(origin, origin.project(angle, self.sensor_max));

                let (distance, endpoint) = walls
                    .iter()
                    .filter_map(|wall| wall.intersection(&ray, self.tolerance))
                    .map(|hit| (origin.distance(hit), hit))
                    .fold((self.sensor_max, ray.end), |nearest, candidate| {
                        if candidate.0 < nearest.0 { candidate } else { nearest }
                    });

                SensorReading {
                    distance,
                    activation: self.activation(distance),
                    endpoint,
                }
            })
            .collect()
    }
}

/// Result of a converged sensor update.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorSweep {
    /// Readings taken at the final pose.
    pub readings: Vec<SensorReading>,
    /// Pose after all collision corrections.
    pub pose: Pose,
    /// Number of corrections applied.
    pub corrections: usize,
}

impl SensorSweep {
    /// Largest activation among the readings.
    pub fn max_activation(&self) -> f64 {
        self.readings.iter().map(|r| r.activation).fold(0.0, f64::max)
    }
}

/// Bounded fixed-point iteration that pushes the robot out of walls.
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionResolver {
    radius: f64,
    tolerance: f64,
    max_iterations: usize,
}

impl CollisionResolver {
    /// Builds the resolver from the robot configuration.
    pub fn from_config(config: &RobotConfig) -> Self {
        Self {
            radius: config.radius,
            tolerance: config.collision_tolerance,
            max_iterations: config.max_collision_iterations,
        }
    }

    /// Senses from `pose`, correcting the pose until no ray penetrates the robot body.
    ///
    /// The deepest penetrating ray wins each round. The robot is moved back from
    /// that ray's wall hit along the ray bearing by `(radius - distance) + radius`,
    /// and the whole sweep is repeated from the new pose.
    ///
    /// # Errors
    ///
    /// Returns `LocalizationError::CollisionUnresolved` when a penetration remains
    /// after `max_iterations` corrections.
    pub fn resolve(
        &self,
        sensor: &RangeSensor,
        pose: Pose,
        walls: &[Wall],
    ) -> Result<SensorSweep, LocalizationError> {
        let mut pose = pose;
        let mut corrections = 0;

        loop {
            let readings = sensor.cast(pose, walls);
            let deepest = readings
                .iter()
                .enumerate()
                .filter(|(_, r)| r.distance < self.radius - self.tolerance)
                .min_by(|a, b| a.1.distance.total_cmp(&b.1.distance));

            let Some((index, reading)) = deepest else {
                return Ok(SensorSweep {
                    readings,
                    pose,
                    corrections,
                });
            };

            if corrections >= self.max_iterations {
                warn!(corrections, pose = %pose, "collision resolution hit its iteration cap");
                return Err(LocalizationError::CollisionUnresolved {
                    iterations: corrections,
                });
            }

            let angle = sensor.ray_angle(pose.theta, index);
            let push = (self.radius - reading.distance) + self.radius;
            let corrected = reading.endpoint.project(angle, -push);
            debug!(ray = index, distance = reading.distance, from = %pose, to = %corrected, "resolving wall penetration");

            pose = Pose::new(corrected.x, corrected.y, pose.theta);
            corrections += 1;
        }
    }
}
