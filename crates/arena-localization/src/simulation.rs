//! Simulation driver: controller, robot and coverage grid advanced in lockstep.
//!
//! The driver only runs ticks. Pacing against the wall clock belongs to the
//! caller; [`Simulation::run_static`] runs as fast as possible with a fixed
//! time delta.

use arena_kinematics::Pose;
use tracing::{debug, info};

use crate::config::{RobotConfig, SimulationConfig};
use crate::controller::Controller;
use crate::coverage::CoverageGrid;
use crate::error::LocalizationError;
use crate::map::Arena;
use crate::robot::{RobotState, TickReport};
use crate::telemetry::PoseErrorStats;

/// Outcome of one simulation tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutcome {
    /// Robot side of the tick.
    pub report: TickReport,
    /// Coverage collected this tick; the controller's next environmental signal.
    pub signal: f64,
}

/// Read-only figures describing a run so far.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Ticks completed.
    pub ticks: u64,
    /// Simulated milliseconds.
    pub elapsed: f64,
    /// Cumulative coverage value.
    pub coverage: f64,
    /// Cells holding coverage.
    pub covered_cells: usize,
    /// Penetrations resolved.
    pub collisions: usize,
    /// Mean normalized activation.
    pub mean_activation: f64,
    /// Mean estimator errors.
    pub errors: PoseErrorStats,
    /// Final true pose.
    pub pose: Pose,
    /// Final filter belief.
    pub believed: Pose,
}

/// One independent simulation run.
#[derive(Debug)]
pub struct Simulation<C> {
    config: SimulationConfig,
    arena: Arena,
    robot: RobotState,
    controller: C,
    grid: CoverageGrid,
    signal: f64,
    ticks: u64,
    elapsed: f64,
}

impl<C: Controller> Simulation<C> {
    /// Builds a simulation and takes the initial sensor reading.
    ///
    /// # Errors
    ///
    /// Fails when the robot configuration is invalid or the robot starts embedded in a wall.
    pub fn new(
        robot: RobotConfig,
        config: SimulationConfig,
        arena: Arena,
        controller: C,
    ) -> Result<Self, LocalizationError> {
        let robot = RobotState::new(robot)?;
        let grid = CoverageGrid::new(config.grid_size, config.field_width, config.field_height);
        let mut simulation = Self {
            config,
            arena,
            robot,
            controller,
            grid,
            signal: 0.0,
            ticks: 0,
            elapsed: 0.0,
        };
        simulation.start()?;
        Ok(simulation)
    }

    /// Restores the robot, grid and controller to their initial state and senses once.
    ///
    /// # Errors
    ///
    /// Returns `LocalizationError::CollisionUnresolved` when the robot starts embedded in a wall.
    pub fn start(&mut self) -> Result<(), LocalizationError> {
        self.reset();
        self.robot.update_sensors(&self.arena)?;
        info!(
            pose = %self.robot.pose(),
            walls = self.arena.walls.len(),
            beacons = self.arena.beacons.len(),
            "simulation started"
        );
        Ok(())
    }

    /// Restores the robot, grid and controller without sensing.
    pub fn reset(&mut self) {
        self.robot.reset();
        self.grid.reset();
        self.controller.reset();
        self.signal = 0.0;
        self.ticks = 0;
        self.elapsed = 0.0;
    }

    /// Redefines the robot's start pose. Takes effect on the next [`start`](Self::start).
    pub fn set_initial_pose(&mut self, pose: Pose) {
        self.robot.set_initial_pose(pose);
    }

    /// Runs one tick of `dt` milliseconds.
    ///
    /// The controller's command is clamped to the configured velocity range.
    ///
    /// # Errors
    ///
    /// Propagates any [`RobotState::step`] failure; the tick has no effect then.
    pub fn tick(&mut self, dt: f64) -> Result<TickOutcome, LocalizationError> {
        let velocities = self
            .controller
            .command(self.robot.sensors(), self.signal)
            .clamped(self.config.velocity_min, self.config.velocity_max);
        self.robot.set_velocities(velocities);

        let report = self.robot.step(dt, &self.arena)?;
        let value = self.config.coverage_weight * report.activation;
        self.signal = self
            .grid
            .sweep(report.pose.position(), self.robot.config().radius, value);
        self.ticks += 1;
        self.elapsed += dt;

        Ok(TickOutcome {
            report,
            signal: self.signal,
        })
    }

    /// Runs `ticks` ticks of a fixed `dt` as fast as possible.
    ///
    /// # Errors
    ///
    /// Returns `LocalizationError::InvalidConfig` when `dt` exceeds the static
    /// limit, or the first tick failure.
    pub fn run_static(&mut self, dt: f64, ticks: u64) -> Result<RunSummary, LocalizationError> {
        if !(dt > 0.0 && dt <= self.config.max_static_dt) {
            return Err(LocalizationError::InvalidConfig(
                "static dt must be positive and at most max_static_dt",
            ));
        }
        for _ in 0..ticks {
            self.tick(dt)?;
        }
        let summary = self.summary();
        debug!(ticks = summary.ticks, coverage = summary.coverage, "static run finished");
        Ok(summary)
    }

    /// Figures for the run so far.
    pub fn summary(&self) -> RunSummary {
        let telemetry = self.robot.telemetry();
        RunSummary {
            ticks: self.ticks,
            elapsed: self.elapsed,
            coverage: self.grid.total(),
            covered_cells: self.grid.covered_cells(),
            collisions: telemetry.collisions,
            mean_activation: telemetry.mean_activation(),
            errors: telemetry.error_stats(),
            pose: self.robot.pose(),
            believed: self.robot.believed_pose(),
        }
    }

    /// Robot state.
    pub fn robot(&self) -> &RobotState {
        &self.robot
    }

    /// Arena.
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Coverage grid.
    pub fn grid(&self) -> &CoverageGrid {
        &self.grid
    }

    /// Controller.
    pub fn controller_mut(&mut self) -> &mut C {
        &mut self.controller
    }

    /// Simulation parameters.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }
}
