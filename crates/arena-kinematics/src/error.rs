#![warn(missing_docs)]

//! Error types for the kinematics library.
//!
//! Degenerate geometry is not an error in this crate (it is reported as `None`
//! by the geometry helpers); these variants cover invalid robot parameters and
//! invalid integration inputs.

use core::fmt;

/// Errors that can occur in kinematic calculations.
#[derive(Debug, Clone, PartialEq)]
pub enum KinematicsError {
    /// Error for invalid wheel separation.
    /// This variant is returned when a wheel separation is provided that is not positive.
    InvalidWheelSeparation(&'static str),
    /// Error for negative time delta.
    /// This variant is returned when a negative time delta is used for pose updates.
    NegativeTimeDelta(&'static str),
    /// Error for NaN or infinite pose, velocity or time inputs.
    NonFiniteInput(&'static str),
}

impl fmt::Display for KinematicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KinematicsError::InvalidWheelSeparation(msg) => {
                write!(f, "Invalid wheel separation: {}", msg)
            }
            KinematicsError::NegativeTimeDelta(msg) => write!(f, "Negative time delta: {}", msg),
            KinematicsError::NonFiniteInput(msg) => write!(f, "Non-finite input: {}", msg),
        }
    }
}

impl core::error::Error for KinematicsError {}
