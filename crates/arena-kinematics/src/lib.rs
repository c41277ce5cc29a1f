#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![doc = "A `no_std` library for planar geometry and exact differential-drive kinematics."]
#![doc = ""]
#![doc = "This crate provides the pose type shared by the localization pipeline, segment"]
#![doc = "intersection and bearing helpers, and exact arc integration of wheel velocities."]

use core::f64::consts::PI;
use core::fmt;
use libm::{cos, sin};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod error;
pub mod geometry;
pub use error::KinematicsError;
pub use geometry::{Point, Segment};

/// Scale applied to the wheel rotation rate before integration.
///
/// The rotation rate `(v_right - v_left) / wheel_separation` is interpreted in
/// revolutions per unit time, so it is multiplied by `2π` to obtain radians.
/// Straight-line motion is not scaled. Every arc computation in the workspace
/// goes through [`DifferentialDrive::update_pose`], so this is the only place the
/// convention lives.
pub const ROTATION_SCALE: f64 = 2.0 * PI;

/// A 2‑D pose `(x, y, θ)` in arena units and degrees (θ measured from the
/// x‑axis towards the y‑axis in the arena frame).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    /// Arena x position.
    pub x: f64,
    /// Arena y position.
    pub y: f64,
    /// Heading (degrees), normalized to `[0, 360)`.
    pub theta: f64,
}

impl Pose {
    /// Construct a new pose. The heading is taken as given.
    ///
    /// # Arguments
    ///
    /// * `x`: Arena x position.
    /// * `y`: Arena y position.
    /// * `theta`: Heading in degrees.
    pub const fn new(x: f64, y: f64, theta: f64) -> Self {
        Pose { x, y, theta }
    }

    /// Construct a pose with its heading normalized to `[0, 360)`.
    pub fn normalized(x: f64, y: f64, theta: f64) -> Self {
        Pose {
            x,
            y,
            theta: Pose::normalize_angle(theta),
        }
    }

    /// Normalize an angle in degrees to be within `[0, 360)`.
    ///
    /// # Arguments
    ///
    /// * `angle`: The angle in degrees to normalize.
    ///
    /// # Returns
    ///
    /// The normalized angle in degrees.
    pub fn normalize_angle(angle: f64) -> f64 {
        let a = angle % 360.0;
        let a = if a < 0.0 { a + 360.0 } else { a };
        // A tiny negative remainder rounds up to exactly 360.
        if a >= 360.0 { 0.0 } else { a }
    }

    /// Wrap an angle difference in degrees to `[-180, 180)`.
    pub fn wrap_angle(angle: f64) -> f64 {
        Pose::normalize_angle(angle + 180.0) - 180.0
    }

    /// Position component of the pose.
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Heading in radians.
    pub fn theta_radians(&self) -> f64 {
        self.theta * PI / 180.0
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(x: {:.2}, y: {:.2}, θ: {:.2}°)", self.x, self.y, self.theta)
    }
}

/// Left and right wheel linear velocities.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WheelVelocities {
    /// Left wheel velocity (arena units per time unit).
    pub left: f64,
    /// Right wheel velocity (arena units per time unit).
    pub right: f64,
}

impl WheelVelocities {
    /// Construct wheel velocities.
    ///
    /// # Arguments
    ///
    /// * `left`: Left wheel velocity.
    /// * `right`: Right wheel velocity.
    pub const fn new(left: f64, right: f64) -> Self {
        WheelVelocities { left, right }
    }

    /// Both velocities clamped to `[min, max]`.
    pub fn clamped(self, min: f64, max: f64) -> Self {
        WheelVelocities {
            left: self.left.clamp(min, max),
            right: self.right.clamp(min, max),
        }
    }
}

impl fmt::Display for WheelVelocities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(vL: {:.2}, vR: {:.2})", self.left, self.right)
    }
}

/// Differential‑drive kinematics helper.
///
/// This struct encapsulates the wheel separation of a differential-drive robot
/// and integrates wheel velocities into pose changes along exact circular arcs.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifferentialDrive {
    /// Distance between the two drive wheels.
    wheel_separation: f64,
}

impl DifferentialDrive {
    /// Construct a new differential‑drive kinematics helper.
    ///
    /// # Arguments
    ///
    /// * `wheel_separation`: The distance between the centers of the two drive wheels.
    ///
    /// # Errors
    ///
    /// Returns `Err(KinematicsError::InvalidWheelSeparation)` if `wheel_separation` is not positive.
    pub const fn new(wheel_separation: f64) -> Result<Self, KinematicsError> {
        if !(wheel_separation > 0.0) {
            return Err(KinematicsError::InvalidWheelSeparation("must be positive"));
        }
        Ok(DifferentialDrive { wheel_separation })
    }

    /// Returns the wheel separation.
    pub fn wheel_separation(&self) -> f64 {
        self.wheel_separation
    }

    /// Linear velocity of the chassis center, `(v_left + v_right) / 2`.
    pub fn linear_velocity(&self, velocities: WheelVelocities) -> f64 {
        (velocities.left + velocities.right) / 2.0
    }

    /// Rotation rate `(v_right - v_left) / wheel_separation`, before [`ROTATION_SCALE`].
    ///
    /// Positive when the right wheel is faster (counter-clockwise in a y-up frame).
    pub fn rotation_rate(&self, velocities: WheelVelocities) -> f64 {
        (velocities.right - velocities.left) / self.wheel_separation
    }

    /// Signed distance from the chassis center to the instantaneous center of curvature.
    ///
    /// Returns `None` for straight-line motion (equal wheel velocities).
    pub fn icc_radius(&self, velocities: WheelVelocities) -> Option<f64> {
        if velocities.left == velocities.right {
            return None;
        }
        Some(
            (self.wheel_separation / 2.0) * (velocities.right + velocities.left)
                / (velocities.right - velocities.left),
        )
    }

    /// Instantaneous center of curvature for the given pose and wheel velocities.
    ///
    /// The ICC lies on the wheel axle, offset perpendicular to the heading by the
    /// signed radius. Returns `None` for straight-line motion.
    pub fn icc(&self, pose: Pose, velocities: WheelVelocities) -> Option<Point> {
        let radius = self.icc_radius(velocities)?;
        let rad = pose.theta_radians();
        Some(Point::new(pose.x - radius * sin(rad), pose.y + radius * cos(rad)))
    }

    /// Integrates constant wheel velocities over `dt` and returns the new pose.
    ///
    /// Equal velocities move the robot straight along its heading by `v * dt`.
    /// Otherwise the robot is rotated about the ICC by `rotation_rate * 2π * dt`
    /// radians. The resulting heading is normalized to `[0, 360)` degrees.
    ///
    /// # Arguments
    ///
    /// * `pose`: The robot's current pose.
    /// * `velocities`: Left and right wheel velocities.
    /// * `dt`: The time delta over which the velocities are applied.
    ///
    /// # Errors
    ///
    /// Returns `Err(KinematicsError::NegativeTimeDelta)` if `dt` is negative and
    /// `Err(KinematicsError::NonFiniteInput)` if any input is NaN or infinite.
    pub fn update_pose(
        &self,
        pose: Pose,
        velocities: WheelVelocities,
        dt: f64,
    ) -> Result<Pose, KinematicsError> {
        if !(dt.is_finite()
            && pose.x.is_finite()
            && pose.y.is_finite()
            && pose.theta.is_finite()
            && velocities.left.is_finite()
            && velocities.right.is_finite())
        {
            return Err(KinematicsError::NonFiniteInput("pose, velocities and dt must be finite"));
        }
        if dt < 0.0 {
            return Err(KinematicsError::NegativeTimeDelta("must be non-negative"));
        }

        let Some(icc) = self.icc(pose, velocities) else {
            let travel = self.linear_velocity(velocities) * dt;
            let rad = pose.theta_radians();
            return Ok(Pose::normalized(
                pose.x + travel * cos(rad),
                pose.y + travel * sin(rad),
                pose.theta,
            ));
        };

        let rotation = self.rotation_rate(velocities) * ROTATION_SCALE * dt;
        let (sin_r, cos_r) = (sin(rotation), cos(rotation));
        let dx = pose.x - icc.x;
        let dy = pose.y - icc.y;

        Ok(Pose::normalized(
            dx * cos_r - dy * sin_r + icc.x,
            dx * sin_r + dy * cos_r + icc.y,
            pose.theta + rotation * 180.0 / PI,
        ))
    }
}

impl fmt::Display for DifferentialDrive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DifferentialDrive (L: {:.2})", self.wheel_separation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    const EPSILON: f64 = 1e-6;

    fn angle_close(a: f64, b: f64) -> bool {
        Pose::wrap_angle(a - b).abs() < EPSILON
    }

    #[test]
    fn test_pose_normalization() {
        assert!((Pose::normalize_angle(0.0) - 0.0).abs() < EPSILON);
        assert!((Pose::normalize_angle(360.0) - 0.0).abs() < EPSILON);
        assert!((Pose::normalize_angle(-90.0) - 270.0).abs() < EPSILON);
        assert!((Pose::normalize_angle(725.0) - 5.0).abs() < EPSILON);
        assert!((Pose::normalize_angle(-725.0) - 355.0).abs() < EPSILON);
        assert!(Pose::normalize_angle(-1e-15) < 360.0);
        assert!((Pose::wrap_angle(350.0) - (-10.0)).abs() < EPSILON);
        assert!((Pose::wrap_angle(180.0) - (-180.0)).abs() < EPSILON);
        assert!((Pose::wrap_angle(-190.0) - 170.0).abs() < EPSILON);
    }

    #[test]
    fn test_kinematics_constructor() {
        let kinematics = DifferentialDrive::new(2.0).unwrap();
        assert_eq!(kinematics.wheel_separation(), 2.0);
    }

    #[test]
    fn test_constructor_invalid_separation() {
        let result = DifferentialDrive::new(0.0);
        assert!(matches!(result, Err(KinematicsError::InvalidWheelSeparation("must be positive"))));
        let result_negative = DifferentialDrive::new(-1.0);
        assert!(matches!(result_negative, Err(KinematicsError::InvalidWheelSeparation(_))));
        assert!(DifferentialDrive::new(f64::NAN).is_err());
    }

    #[test]
    fn test_linear_velocity() {
        let kinematics = DifferentialDrive::new(1.0).unwrap();
        assert_eq!(kinematics.linear_velocity(WheelVelocities::new(1.0, 1.0)), 1.0);
        assert_eq!(kinematics.linear_velocity(WheelVelocities::new(0.0, 0.0)), 0.0);
        assert_eq!(kinematics.linear_velocity(WheelVelocities::new(-1.0, 1.0)), 0.0);
        assert_eq!(kinematics.linear_velocity(WheelVelocities::new(-1.0, -1.0)), -1.0);
    }

    #[test]
    fn test_rotation_rate() {
        let kinematics = DifferentialDrive::new(1.0).unwrap();
        assert_eq!(kinematics.rotation_rate(WheelVelocities::new(1.0, 1.0)), 0.0);
        // left faster -> clockwise -> negative rate
        assert_eq!(kinematics.rotation_rate(WheelVelocities::new(1.0, -1.0)), -2.0);
        assert_eq!(kinematics.rotation_rate(WheelVelocities::new(1.0, 0.0)), -1.0);
        // right faster -> counter-clockwise -> positive rate
        assert_eq!(kinematics.rotation_rate(WheelVelocities::new(-1.0, 1.0)), 2.0);
        assert_eq!(kinematics.rotation_rate(WheelVelocities::new(0.0, 1.0)), 1.0);
    }

    #[test]
    fn test_icc_radius() {
        let kinematics = DifferentialDrive::new(1.0).unwrap();
        assert_eq!(kinematics.icc_radius(WheelVelocities::new(1.0, 1.0)), None);
        assert_eq!(kinematics.icc_radius(WheelVelocities::new(-1.0, -1.0)), None);
        assert_eq!(kinematics.icc_radius(WheelVelocities::new(0.0, 1.0)), Some(0.5));
        assert_eq!(kinematics.icc_radius(WheelVelocities::new(1.0, 0.0)), Some(-0.5));
    }

    #[test]
    fn test_icc_coordinates() {
        let kinematics = DifferentialDrive::new(2.0).unwrap();
        assert_eq!(kinematics.icc(Pose::default(), WheelVelocities::new(0.0, 0.0)), None);

        let cases = [
            (0.0, (1.0, 0.0), (0.0, -1.0)),
            (90.0, (1.0, 0.0), (1.0, 0.0)),
            (180.0, (1.0, 0.0), (0.0, 1.0)),
            (270.0, (1.0, 0.0), (-1.0, 0.0)),
            (0.0, (0.0, 1.0), (0.0, 1.0)),
            (90.0, (0.0, 1.0), (-1.0, 0.0)),
            (180.0, (0.0, 1.0), (0.0, -1.0)),
            (270.0, (0.0, 1.0), (1.0, 0.0)),
        ];
        for (theta, (vl, vr), (ex, ey)) in cases {
            let icc = kinematics
                .icc(Pose::new(0.0, 0.0, theta), WheelVelocities::new(vl, vr))
                .unwrap();
            assert!((icc.x - ex).abs() < EPSILON, "theta {theta}: {icc}");
            assert!((icc.y - ey).abs() < EPSILON, "theta {theta}: {icc}");
        }
    }

    #[test]
    fn test_update_pose_straight_keeps_heading() {
        let kinematics = DifferentialDrive::new(2.0).unwrap();
        let new_pose = kinematics
            .update_pose(Pose::new(0.0, 0.0, 0.0), WheelVelocities::new(1.0, 1.0), 1.0)
            .unwrap();
        assert!((new_pose.x - 1.0).abs() < EPSILON);
        assert!((new_pose.y - 0.0).abs() < EPSILON);
        assert_eq!(new_pose.theta, 0.0);
    }

    #[test]
    fn test_update_pose_straight_directions() {
        let kinematics = DifferentialDrive::new(2.0).unwrap();
        let cases = [
            (0.0, -1.0, (-1.0, 0.0)),
            (90.0, 1.0, (0.0, 1.0)),
            (90.0, -1.0, (0.0, -1.0)),
        ];
        for (theta, v, (ex, ey)) in cases {
            let new_pose = kinematics
                .update_pose(Pose::new(0.0, 0.0, theta), WheelVelocities::new(v, v), 1.0)
                .unwrap();
            assert!((new_pose.x - ex).abs() < EPSILON);
            assert!((new_pose.y - ey).abs() < EPSILON);
            assert_eq!(new_pose.theta, theta);
        }
    }

    #[test]
    fn test_update_pose_straight_displacement_is_v_dt() {
        let kinematics = DifferentialDrive::new(60.0).unwrap();
        let start = Pose::new(400.0, 175.0, 33.0);
        let new_pose = kinematics
            .update_pose(start, WheelVelocities::new(0.7, 0.7), 2.5)
            .unwrap();
        let travelled = new_pose.position().distance(start.position());
        assert!((travelled - 1.75).abs() < EPSILON);
        assert_eq!(new_pose.theta, 33.0);
        assert!((start.position().bearing_to(new_pose.position()) - 33.0).abs() < EPSILON);
    }

    #[test]
    fn test_update_pose_in_place_rotation() {
        let kinematics = DifferentialDrive::new(2.0).unwrap();
        let cases = [(0.25, 90.0), (0.5, 180.0), (1.0, 0.0)];
        for (v, expected_theta) in cases {
            let new_pose = kinematics
                .update_pose(Pose::new(0.0, 0.0, 0.0), WheelVelocities::new(-v, v), 1.0)
                .unwrap();
            assert!(new_pose.x.abs() < EPSILON);
            assert!(new_pose.y.abs() < EPSILON);
            assert!(angle_close(new_pose.theta, expected_theta), "v {v}: {new_pose}");
        }
    }

    #[test]
    fn test_update_pose_stretched_curve() {
        let kinematics = DifferentialDrive::new(4.0).unwrap();
        let new_pose = kinematics
            .update_pose(Pose::new(0.0, 0.0, 0.0), WheelVelocities::new(1.0, 2.0), 1.0)
            .unwrap();
        assert!((new_pose.x - 6.0).abs() < EPSILON);
        assert!((new_pose.y - 6.0).abs() < EPSILON);
        assert!(angle_close(new_pose.theta, 90.0));
    }

    #[test]
    fn test_update_pose_heading_wraps() {
        let kinematics = DifferentialDrive::new(2.0).unwrap();
        let new_pose = kinematics
            .update_pose(Pose::new(0.0, 0.0, 300.0), WheelVelocities::new(-0.25, 0.25), 1.0)
            .unwrap();
        assert!((0.0..360.0).contains(&new_pose.theta));
        assert!(angle_close(new_pose.theta, 30.0));
    }

    #[test]
    fn test_update_pose_negative_dt() {
        let kinematics = DifferentialDrive::new(2.0).unwrap();
        let result = kinematics.update_pose(Pose::default(), WheelVelocities::new(1.0, 0.0), -0.1);
        assert!(matches!(result, Err(KinematicsError::NegativeTimeDelta("must be non-negative"))));
    }

    #[test]
    fn test_update_pose_non_finite() {
        let kinematics = DifferentialDrive::new(2.0).unwrap();
        let result = kinematics.update_pose(Pose::default(), WheelVelocities::new(f64::NAN, 0.0), 1.0);
        assert!(matches!(result, Err(KinematicsError::NonFiniteInput(_))));
    }

    #[test]
    fn test_clamped_velocities() {
        let v = WheelVelocities::new(1.4, -3.0).clamped(-1.0, 1.0);
        assert_eq!(v, WheelVelocities::new(1.0, -1.0));
    }
}
