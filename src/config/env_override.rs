// ABOUTME: Environment variable overrides applied on top of the YAML configuration.
// ABOUTME: Lets a deployment pick fleets and the state directory without editing the file.

use std::path::PathBuf;

use super::Config;
use crate::error::{Error, Result};
use crate::types::FleetName;

pub const BLUE_VAR: &str = "FLEETKEEPER_BLUE";
pub const GREEN_VAR: &str = "FLEETKEEPER_GREEN";
pub const WORKERS_VAR: &str = "FLEETKEEPER_WORKERS";
pub const STATE_DIR_VAR: &str = "FLEETKEEPER_STATE_DIR";

/// Non-empty value of `var`, if set.
fn lookup(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

fn fleet_from(var: &str, value: &str) -> Result<FleetName> {
    FleetName::new(value.trim()).map_err(|e| Error::InvalidConfig(format!("{var}: {e}")))
}

/// Replace configured values with any `FLEETKEEPER_*` variables that are set.
///
/// `FLEETKEEPER_WORKERS` only applies when a capacity section exists.
pub fn apply_env_overrides(config: &mut Config) -> Result<()> {
    if let Some(value) = lookup(BLUE_VAR) {
        config.environments.blue = fleet_from(BLUE_VAR, &value)?;
    }
    if let Some(value) = lookup(GREEN_VAR) {
        config.environments.green = fleet_from(GREEN_VAR, &value)?;
    }
    if let Some(value) = lookup(WORKERS_VAR) {
        match config.capacity.as_mut() {
            Some(capacity) => capacity.fleet = fleet_from(WORKERS_VAR, &value)?,
            None => tracing::warn!("{WORKERS_VAR} is set but no capacity section is configured"),
        }
    }
    if let Some(value) = lookup(STATE_DIR_VAR) {
        config.state_dir = PathBuf::from(value);
    }
    Ok(())
}
