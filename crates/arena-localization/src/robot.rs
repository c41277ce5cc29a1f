//! Robot state and the per-tick localization sequence.
//!
//! A tick integrates the true pose and a replica of the belief with the same
//! wheel velocities, resolves wall penetration and refreshes the range sensors,
//! samples a noisy odometry control from the replica, trilaterates the visible
//! beacons, and feeds both estimates through the Kalman filter.

use arena_kinematics::{DifferentialDrive, Pose, WheelVelocities};
use nalgebra::Matrix3;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, warn};

use crate::beacon::{BeaconObservation, BeaconSensor};
use crate::config::RobotConfig;
use crate::error::LocalizationError;
use crate::kalman::{Belief, PoseFilter};
use crate::map::Arena;
use crate::odometry::OdometryMotionModel;
use crate::sensors::{CollisionResolver, RangeSensor, SensorReading, SensorSweep};
use crate::telemetry::Telemetry;
use crate::trilateration::trilaterate;

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Summary of one completed tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// True pose after collision correction.
    pub pose: Pose,
    /// Filter belief after the update.
    pub believed: Pose,
    /// Trilaterated pose, if enough beacons were visible.
    pub beacon_fix: Option<Pose>,
    /// Number of visible beacons.
    pub visible_beacons: usize,
    /// Collision corrections applied this tick.
    pub corrections: usize,
    /// Maximum ray activation divided by `sensor_max^k`.
    pub activation: f64,
}

/// Everything a single simulated robot knows and estimates.
#[derive(Debug, Clone)]
pub struct RobotState {
    config: RobotConfig,
    drive: DifferentialDrive,
    range_sensor: RangeSensor,
    resolver: CollisionResolver,
    beacon_sensor: BeaconSensor,
    odometry: OdometryMotionModel,
    filter: PoseFilter,
    rng: StdRng,
    initial_pose: Pose,
    pose: Pose,
    belief: Belief,
    previous_believed: Pose,
    odometry_pose: Option<Pose>,
    beacon_pose: Pose,
    velocities: WheelVelocities,
    sensors: Vec<SensorReading>,
    visible_beacons: Vec<BeaconObservation>,
    telemetry: Telemetry,
}

impl RobotState {
    /// Builds a robot at `config.initial_pose`.
    ///
    /// # Errors
    ///
    /// Returns `LocalizationError::InvalidConfig` or a kinematics error when the
    /// configuration is out of range.
    pub fn new(config: RobotConfig) -> Result<Self, LocalizationError> {
        config.validate()?;
        let drive = DifferentialDrive::new(config.wheel_separation)?;
        let initial_pose = Pose::normalized(
            config.initial_pose.x,
            config.initial_pose.y,
            config.initial_pose.theta,
        );

        Ok(Self {
            drive,
            range_sensor: RangeSensor::from_config(&config),
            resolver: CollisionResolver::from_config(&config),
            beacon_sensor: BeaconSensor::from_config(&config),
            odometry: OdometryMotionModel::new(config.odometry_noise, config.sampler),
            filter: PoseFilter::new(&config.filter_noise),
            rng: seeded_rng(config.seed),
            initial_pose,
            pose: initial_pose,
            belief: Belief::new(initial_pose),
            previous_believed: initial_pose,
            odometry_pose: None,
            beacon_pose: initial_pose,
            velocities: WheelVelocities::default(),
            sensors: Self::blank_sensors(&config, initial_pose),
            visible_beacons: Vec::new(),
            telemetry: Telemetry::default(),
            config,
        })
    }

    fn blank_sensors(config: &RobotConfig, pose: Pose) -> Vec<SensorReading> {
        vec![
            SensorReading {
                endpoint: pose.position(),
                ..SensorReading::default()
            };
            config.ray_count
        ]
    }

    /// Restores every derived field to its initial value and reseeds the noise source.
    pub fn reset(&mut self) {
        let pose = self.initial_pose;
        self.pose = pose;
        self.belief = Belief::new(pose);
        self.previous_believed = pose;
        self.odometry_pose = None;
        self.beacon_pose = pose;
        self.velocities = WheelVelocities::default();
        self.sensors = Self::blank_sensors(&self.config, pose);
        self.visible_beacons.clear();
        self.telemetry.reset();
        self.rng = seeded_rng(self.config.seed);
    }

    /// Redefines the pose restored by [`reset`](Self::reset) and moves every pose estimate there.
    pub fn set_initial_pose(&mut self, pose: Pose) {
        let pose = Pose::normalized(pose.x, pose.y, pose.theta);
        self.initial_pose = pose;
        self.pose = pose;
        self.belief = Belief::new(pose);
        self.previous_believed = pose;
        self.beacon_pose = pose;
    }

    /// Sets the wheel velocities used by the next tick.
    pub fn set_velocities(&mut self, velocities: WheelVelocities) {
        self.velocities = velocities;
    }

    fn sense(&self, pose: Pose, arena: &Arena) -> Result<SensorSweep, LocalizationError> {
        self.resolver.resolve(&self.range_sensor, pose, &arena.walls)
    }

    fn commit_sweep(&mut self, sweep: SensorSweep) -> f64 {
        if sweep.corrections > 0 {
            warn!(corrections = sweep.corrections, pose = %sweep.pose, "robot pushed out of a wall");
        }
        let activation = sweep.max_activation() / self.config.max_activation();
        self.telemetry.collisions += sweep.corrections;
        self.pose = sweep.pose;
        self.sensors = sweep.readings;
        activation
    }

    /// Refreshes the range sensors at the current true pose, resolving any wall penetration.
    ///
    /// Returns the normalized maximum activation.
    ///
    /// # Errors
    ///
    /// Returns `LocalizationError::CollisionUnresolved` when the robot cannot be
    /// pushed free. The state is left untouched in that case.
    pub fn update_sensors(&mut self, arena: &Arena) -> Result<f64, LocalizationError> {
        let sweep = self.sense(self.pose, arena)?;
        Ok(self.commit_sweep(sweep))
    }

    /// Advances the robot by one tick of `dt` milliseconds.
    ///
    /// # Errors
    ///
    /// * `LocalizationError::TimeDeltaTooLarge` if `dt >= radius * dt_limit_factor`.
    /// * `LocalizationError::CollisionUnresolved` if wall penetration cannot be resolved.
    /// * `LocalizationError::Kinematics` for a negative `dt`.
    ///
    /// A failed tick leaves the state untouched.
    pub fn step(&mut self, dt: f64, arena: &Arena) -> Result<TickReport, LocalizationError> {
        let limit = self.config.dt_limit();
        if !(dt < limit) {
            return Err(LocalizationError::TimeDeltaTooLarge { dt, limit });
        }
        let kinematic_dt = dt * self.config.time_scale;

        let moved = self.drive.update_pose(self.pose, self.velocities, kinematic_dt)?;
        let odometry_pose = self.drive.update_pose(self.belief.mean, self.velocities, kinematic_dt)?;
        let sweep = self.sense(moved, arena)?;

        let corrections = sweep.corrections;
        let activation = self.commit_sweep(sweep);
        self.odometry_pose = Some(odometry_pose);

        let control = self
            .odometry
            .control_input(&mut self.rng, self.belief.mean, odometry_pose);

        self.visible_beacons =
            self.beacon_sensor
                .observe(&mut self.rng, self.pose, &arena.beacons, &arena.walls);
        let beacon_fix = trilaterate(&self.visible_beacons);
        if let Some(fix) = beacon_fix {
            self.beacon_pose = fix;
        }

        self.previous_believed = self.belief.mean;
        self.belief = self.filter.update(&self.belief, control, beacon_fix);

        self.telemetry.activations.push(activation);
        self.telemetry.velocities.push(self.velocities);
        self.telemetry
            .record_errors(self.pose, self.belief.mean, odometry_pose, beacon_fix);

        debug!(
            actual = %self.pose,
            believed = %self.belief.mean,
            odometry = %odometry_pose,
            beacons = self.visible_beacons.len(),
            fix = ?beacon_fix,
            "tick"
        );

        Ok(TickReport {
            pose: self.pose,
            believed: self.belief.mean,
            beacon_fix,
            visible_beacons: self.visible_beacons.len(),
            corrections,
            activation,
        })
    }

    /// Robot configuration.
    pub fn config(&self) -> &RobotConfig {
        &self.config
    }

    /// True pose.
    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// Pose restored by a reset.
    pub fn initial_pose(&self) -> Pose {
        self.initial_pose
    }

    /// Filter belief.
    pub fn belief(&self) -> &Belief {
        &self.belief
    }

    /// Filter mean pose.
    pub fn believed_pose(&self) -> Pose {
        self.belief.mean
    }

    /// Filter mean before the latest tick.
    pub fn previous_believed_pose(&self) -> Pose {
        self.previous_believed
    }

    /// Previous belief integrated with the raw wheel velocities, `None` before the first tick.
    pub fn odometry_pose(&self) -> Option<Pose> {
        self.odometry_pose
    }

    /// Latest beacon fix, the initial pose until one exists.
    pub fn beacon_pose(&self) -> Pose {
        self.beacon_pose
    }

    /// Filter covariance.
    pub fn covariance(&self) -> &Matrix3<f64> {
        &self.belief.covariance
    }

    /// Current wheel velocities.
    pub fn velocities(&self) -> WheelVelocities {
        self.velocities
    }

    /// Latest range readings, indexed by ray.
    pub fn sensors(&self) -> &[SensorReading] {
        &self.sensors
    }

    /// Beacons observed on the latest tick.
    pub fn visible_beacons(&self) -> &[BeaconObservation] {
        &self.visible_beacons
    }

    /// Penetrations resolved since the last reset.
    pub fn collisions(&self) -> usize {
        self.telemetry.collisions
    }

    /// Counters and logs since the last reset.
    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }
}
