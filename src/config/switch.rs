// ABOUTME: Blue/green switch configuration.
// ABOUTME: Health poll cadence, poll timeout, and the capacity an active fleet runs at.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::gateway::CapacityBounds;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchConfig {
    /// Delay between health polls of the fleet being brought up.
    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,

    /// How long to wait for the first healthy instance before giving up.
    #[serde(default = "default_health_timeout", with = "humantime_serde")]
    pub health_timeout: Duration,

    #[serde(default)]
    pub active_capacity: CapacityBounds,
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(30)
}

fn default_health_timeout() -> Duration {
    Duration::from_secs(600)
}

impl Default for SwitchConfig {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            health_timeout: default_health_timeout(),
            active_capacity: CapacityBounds::ACTIVE,
        }
    }
}

impl SwitchConfig {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.poll_interval.is_zero() {
            return Err("switch.poll_interval must be greater than zero".to_string());
        }
        let bounds = self.active_capacity;
        if bounds.desired == 0 || !bounds.contains(bounds.desired) {
            return Err(format!(
                "switch.active_capacity must have 1 <= min <= desired <= max, got {bounds}"
            ));
        }
        Ok(())
    }
}
