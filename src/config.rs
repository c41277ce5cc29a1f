use std::env;

use arena_localization::{Arena, RobotConfig, SimulationConfig};
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use tracing::{error, info};

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
const CONFIG_PATH_VAR: &str = "ARENA_SIM_CONFIG";
const ENV_PREFIX: &str = "ARENA_SIM";

/// Everything the binary reads at startup.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub robot: RobotConfig,
    pub arena: Arena,
    pub simulation: SimulationConfig,
}

/// Loads `config/default.toml` (or the file named by `ARENA_SIM_CONFIG`) and
/// applies `ARENA_SIM__SECTION__KEY` environment overrides.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let path = env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    info!("Attempting to load configuration from {}", path);

    let settings = Config::builder()
        .add_source(File::new(&path, FileFormat::Toml).required(true))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .and_then(|config| config.try_deserialize::<AppConfig>());

    match settings {
        Ok(config) => {
            info!(
                walls = config.arena.walls.len(),
                beacons = config.arena.beacons.len(),
                seed = ?config.robot.seed,
                "Successfully loaded configuration"
            );
            Ok(config)
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            Err(e)
        }
    }
}
