//! Controller seam: maps sensor readings to wheel velocities once per tick.

use arena_kinematics::WheelVelocities;

use crate::sensors::SensorReading;

/// Produces wheel velocities from the current sensor readings and the
/// environmental signal (coverage collected on the previous tick).
pub trait Controller {
    /// Velocities for the next tick.
    fn command(&mut self, sensors: &[SensorReading], signal: f64) -> WheelVelocities;

    /// Clears internal state at the start of a run.
    fn reset(&mut self) {}
}

/// Ignores its inputs and drives at constant velocities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedVelocity(pub WheelVelocities);

impl Default for FixedVelocity {
    /// `(0.65, 0.5)` drives a circle.
    fn default() -> Self {
        FixedVelocity(WheelVelocities::new(0.65, 0.5))
    }
}

impl Controller for FixedVelocity {
    fn command(&mut self, _sensors: &[SensorReading], _signal: f64) -> WheelVelocities {
        self.0
    }
}

/// A single manual adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nudge {
    /// Speed the left wheel up by one step.
    LeftFaster,
    /// Slow the left wheel down by one step.
    LeftSlower,
    /// Speed the right wheel up by one step.
    RightFaster,
    /// Slow the right wheel down by one step.
    RightSlower,
    /// Stop both wheels.
    Stop,
}

/// Velocities adjusted in fixed steps and clamped to a range.
#[derive(Debug, Clone, PartialEq)]
pub struct ManualController {
    velocities: WheelVelocities,
    step: f64,
    min: f64,
    max: f64,
}

impl ManualController {
    /// Creates a stopped controller.
    pub fn new(step: f64, min: f64, max: f64) -> Self {
        Self {
            velocities: WheelVelocities::default(),
            step,
            min,
            max,
        }
    }

    /// Applies one adjustment and returns the clamped velocities.
    pub fn nudge(&mut self, nudge: Nudge) -> WheelVelocities {
        let v = &mut self.velocities;
        match nudge {
            Nudge::LeftFaster => v.left += self.step,
            Nudge::LeftSlower => v.left -= self.step,
            Nudge::RightFaster => v.right += self.step,
            Nudge::RightSlower => v.right -= self.step,
            Nudge::Stop => *v = WheelVelocities::default(),
        }
        self.velocities = self.velocities.clamped(self.min, self.max);
        self.velocities
    }

    /// Current velocities.
    pub fn velocities(&self) -> WheelVelocities {
        self.velocities
    }
}

impl Default for ManualController {
    fn default() -> Self {
        Self::new(0.1, -1.0, 1.0)
    }
}

impl Controller for ManualController {
    fn command(&mut self, _sensors: &[SensorReading], _signal: f64) -> WheelVelocities {
        self.velocities
    }

    fn reset(&mut self) {
        self.velocities = WheelVelocities::default();
    }
}
