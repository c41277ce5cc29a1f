//! Read-only per-tick records consumed by external fitness evaluation.

use std::collections::VecDeque;

use arena_kinematics::{Pose, WheelVelocities};

/// Number of pose error samples retained per estimator.
pub const ERROR_HISTORY: usize = 1000;

/// Absolute deviation of an estimate from the true pose.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PoseError {
    /// `|x_est - x_true|`.
    pub x: f64,
    /// `|y_est - y_true|`.
    pub y: f64,
    /// Heading difference in degrees, at most 180.
    pub theta: f64,
}

impl PoseError {
    /// Deviation of `estimate` from `truth`.
    pub fn between(estimate: Pose, truth: Pose) -> Self {
        Self {
            x: (estimate.x - truth.x).abs(),
            y: (estimate.y - truth.y).abs(),
            theta: Pose::wrap_angle(estimate.theta - truth.theta).abs(),
        }
    }

    /// Mean of the x and y deviations.
    pub fn xy(&self) -> f64 {
        (self.x + self.y) / 2.0
    }
}

/// Rolling window of the most recent pose errors of one estimator.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ErrorLog {
    samples: VecDeque<PoseError>,
}

impl ErrorLog {
    /// Appends a sample, dropping the oldest once the window is full.
    pub fn push(&mut self, error: PoseError) {
        if self.samples.len() >= ERROR_HISTORY {
            self.samples.pop_front();
        }
        self.samples.push_back(error);
    }

    /// Number of retained samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Most recent sample.
    pub fn latest(&self) -> Option<PoseError> {
        self.samples.back().copied()
    }

    /// Component-wise mean over the window.
    pub fn mean(&self) -> Option<PoseError> {
        if self.samples.is_empty() {
            return None;
        }
        let n = self.samples.len() as f64;
        let sum = self.samples.iter().fold(PoseError::default(), |acc, e| PoseError {
            x: acc.x + e.x,
            y: acc.y + e.y,
            theta: acc.theta + e.theta,
        });
        Some(PoseError {
            x: sum.x / n,
            y: sum.y / n,
            theta: sum.theta / n,
        })
    }

    /// Clears the window.
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

/// Mean estimator errors at one point in a run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PoseErrorStats {
    /// Kalman filter belief.
    pub believed: Option<PoseError>,
    /// Raw odometry integration of the previous belief.
    pub odometry: Option<PoseError>,
    /// Beacon trilateration, over ticks that had a fix.
    pub beacon: Option<PoseError>,
}

/// Counters and per-tick logs kept by a robot across a run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Telemetry {
    /// Penetrations resolved so far.
    pub collisions: usize,
    /// Per-tick maximum activation divided by `sensor_max^k`.
    pub activations: Vec<f64>,
    /// Per-tick wheel velocities.
    pub velocities: Vec<WheelVelocities>,
    believed: ErrorLog,
    odometry: ErrorLog,
    beacon: ErrorLog,
}

impl Telemetry {
    /// Records the estimator errors of one tick.
    pub fn record_errors(&mut self, truth: Pose, believed: Pose, odometry: Pose, beacon: Option<Pose>) {
        self.believed.push(PoseError::between(believed, truth));
        self.odometry.push(PoseError::between(odometry, truth));
        if let Some(beacon) = beacon {
            self.beacon.push(PoseError::between(beacon, truth));
        }
    }

    /// Mean estimator errors over the retained window.
    pub fn error_stats(&self) -> PoseErrorStats {
        PoseErrorStats {
            believed: self.believed.mean(),
            odometry: self.odometry.mean(),
            beacon: self.beacon.mean(),
        }
    }

    /// Error log of the filter belief.
    pub fn believed_errors(&self) -> &ErrorLog {
        &self.believed
    }

    /// Mean normalized activation over the run, 0 before the first tick.
    pub fn mean_activation(&self) -> f64 {
        if self.activations.is_empty() {
            0.0
        } else {
            self.activations.iter().sum::<f64>() / self.activations.len() as f64
        }
    }

    /// Clears every counter and log.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
