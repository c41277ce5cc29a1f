//! Beacon line-of-sight and range/bearing measurement.

use arena_kinematics::geometry::bearing;
use arena_kinematics::{Point, Pose, Segment};
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::config::RobotConfig;
use crate::map::{Beacon, Wall};

/// A range and bearing measurement of one visible beacon.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BeaconObservation {
    /// Known map position of the beacon.
    pub beacon: Point,
    /// Measured distance from the robot center.
    pub distance: f64,
    /// Map bearing from the robot to the beacon relative to the robot heading, degrees in `[0, 360)`.
    pub bearing: f64,
}

/// Measures the beacons the robot can see.
#[derive(Debug, Clone, PartialEq)]
pub struct BeaconSensor {
    tolerance: f64,
    occlusion_tolerance: f64,
    distance_noise: f64,
}

impl BeaconSensor {
    /// Builds the sensor from the robot configuration.
    pub fn from_config(config: &RobotConfig) -> Self {
        Self {
            tolerance: config.collision_tolerance,
            occlusion_tolerance: config.beacon_occlusion_tolerance,
            distance_noise: config.beacon_distance_noise,
        }
    }

    /// True when no wall crosses the sight line from `from` to `beacon`.
    ///
    /// Hits within the occlusion tolerance of the beacon are ignored, since every
    /// beacon sits on a wall end.
    pub fn is_visible(&self, from: Point, beacon: &Beacon, walls: &[Wall]) -> bool {
        let target = beacon.position();
        let sight = Segment::new(from, target);
        walls
            .iter()
            .filter_map(|wall| wall.intersection(&sight, self.tolerance))
            .all(|hit| hit.distance(target) <= self.occlusion_tolerance)
    }

    /// Noise-free observation of `beacon` from `pose`.
    pub fn exact(pose: Pose, beacon: &Beacon) -> BeaconObservation {
        let position = pose.position();
        let target = beacon.position();
        BeaconObservation {
            beacon: target,
            distance: position.distance(target),
            bearing: Pose::normalize_angle(bearing(position, target) - pose.theta),
        }
    }

    /// Observations of every visible beacon, in beacon order.
    ///
    /// Each distance is drawn from a normal distribution around the true distance
    /// with standard deviation `distance * beacon_distance_noise`.
    pub fn observe<R: Rng>(
        &self,
        rng: &mut R,
        pose: Pose,
        beacons: &[Beacon],
        walls: &[Wall],
    ) -> Vec<BeaconObservation> {
        let position = pose.position();
        beacons
            .iter()
            .filter(|beacon| self.is_visible(position, beacon, walls))
            .map(|beacon| {
                let mut observation = Self::exact(pose, beacon);
                let d = observation.distance;
                observation.distance = Normal::new(d, d * self.distance_noise)
                    .map(|noise| noise.sample(rng).max(0.0))
                    .unwrap_or(d);
                observation
            })
            .collect()
    }
}
