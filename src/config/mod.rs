// ABOUTME: Configuration types and parsing for fleetkeeper.yml.
// ABOUTME: Handles YAML parsing, defaults, environment overrides, validation, and discovery.

mod business_hours;
mod capacity;
mod env_override;
mod init;
mod switch;
mod vertical;

pub use business_hours::BusinessHours;
pub use capacity::{CapacityConfig, CostConfig};
pub use env_override::{BLUE_VAR, GREEN_VAR, STATE_DIR_VAR, WORKERS_VAR, apply_env_overrides};
pub use init::init_config;
pub use switch::SwitchConfig;
pub use vertical::{ScalingThresholds, VerticalConfig};

use crate::error::{Error, Result};
use crate::types::EnvironmentPair;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "fleetkeeper.yml";
pub const CONFIG_FILENAME_ALT: &str = "fleetkeeper.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".fleetkeeper/config.yml";

const STATE_FILENAME: &str = "state.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub environments: EnvironmentPair,

    #[serde(default)]
    pub switch: SwitchConfig,

    #[serde(default)]
    pub vertical: Option<VerticalConfig>,

    #[serde(default)]
    pub capacity: Option<CapacityConfig>,

    #[serde(default)]
    pub cost: CostConfig,

    /// Directory holding locks, hooks, and the simulated fleet state.
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
}

fn default_state_dir() -> PathBuf {
    PathBuf::from(".fleetkeeper")
}

impl Config {
    /// Parse, apply `FLEETKEEPER_*` overrides, then validate.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let mut config: Config = serde_yaml::from_str(yaml)?;
        apply_env_overrides(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&content)?;
        // Relative state directories live next to the config file.
        if config.state_dir.is_relative() {
            if let Some(parent) = path.parent() {
                config.state_dir = parent.join(&config.state_dir);
            }
        }
        Ok(config)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.environments.blue == self.environments.green {
            return Err(Error::InvalidConfig(format!(
                "blue and green must be different fleets, both are '{}'",
                self.environments.blue
            )));
        }
        self.switch.validate().map_err(Error::InvalidConfig)?;
        if let Some(vertical) = &self.vertical {
            vertical.validate().map_err(Error::InvalidConfig)?;
        }
        if let Some(capacity) = &self.capacity {
            capacity.validate().map_err(Error::InvalidConfig)?;
        }
        Ok(())
    }

    /// Path of the persisted fleet state.
    pub fn state_file(&self) -> PathBuf {
        self.state_dir.join(STATE_FILENAME)
    }
}
