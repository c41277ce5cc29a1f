//! This module defines the error types used by the `arena-localization` crate.

use arena_kinematics::KinematicsError;
use thiserror::Error;

/// Error type for simulation and localization operations.
///
/// Fewer than three visible beacons is not an error: the filter falls back to
/// prediction for that tick. Degenerate geometry is reported as `None` by the
/// functions that encounter it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocalizationError {
    /// The tick time delta is too large for wall penetration to be detected reliably.
    #[error(
        "time delta {dt} exceeds the limit of {limit}; wall penetration detection is unreliable at this step size"
    )]
    TimeDeltaTooLarge {
        /// Requested time delta.
        dt: f64,
        /// Largest accepted time delta (exclusive).
        limit: f64,
    },
    /// The collision correction loop hit its iteration cap without reaching a fixed point.
    #[error(
        "collision resolution did not converge after {iterations} corrections; the robot is likely embedded in the walls"
    )]
    CollisionUnresolved {
        /// Number of corrections applied before giving up.
        iterations: usize,
    },
    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    /// Pose integration failed.
    #[error(transparent)]
    Kinematics(#[from] KinematicsError),
}
