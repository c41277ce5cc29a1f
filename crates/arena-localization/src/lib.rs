#![warn(missing_docs)]
#![doc = "Localization pipeline for a simulated differential-drive robot."]
#![doc = ""]
#![doc = "Each tick integrates the true pose, resolves wall penetration from ray-cast range"]
#![doc = "readings, samples a noisy odometry control, trilaterates visible beacons and fuses"]
#![doc = "both estimates in a linear Kalman filter. All noise comes from one seedable source"]
#![doc = "owned by the robot, so runs replay exactly for a fixed seed."]

pub mod beacon;
pub mod config;
pub mod controller;
pub mod coverage;
pub mod error;
pub mod kalman;
pub mod map;
pub mod odometry;
pub mod robot;
pub mod sensors;
pub mod simulation;
pub mod telemetry;
pub mod trilateration;

pub use arena_kinematics::{Point, Pose, Segment, WheelVelocities};
pub use beacon::{BeaconObservation, BeaconSensor};
pub use config::{FilterNoise, OdometryNoise, RobotConfig, SimulationConfig};
pub use controller::{Controller, FixedVelocity, ManualController, Nudge};
pub use coverage::CoverageGrid;
pub use error::LocalizationError;
pub use kalman::{Belief, PoseFilter};
pub use map::{Arena, Beacon, Wall};
pub use odometry::{ControlInput, OdometryMotion, OdometryMotionModel, Sampler};
pub use robot::{RobotState, TickReport};
pub use sensors::{CollisionResolver, RangeSensor, SensorReading, SensorSweep};
pub use simulation::{RunSummary, Simulation, TickOutcome};
pub use telemetry::{PoseError, PoseErrorStats, Telemetry};
pub use trilateration::trilaterate;
