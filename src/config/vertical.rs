// ABOUTME: Vertical scaling configuration.
// ABOUTME: Instance class ladder, utilisation thresholds, and rolling replacement preferences.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::gateway::RollingReplacement;
use crate::types::InstanceClassLadder;

/// Utilisation thresholds, in percent.
///
/// Up-scaling fires on either metric; down-scaling needs both to agree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalingThresholds {
    #[serde(default = "default_cpu_scale_up")]
    pub cpu_scale_up: f64,
    #[serde(default = "default_cpu_scale_down")]
    pub cpu_scale_down: f64,
    #[serde(default = "default_memory_scale_up")]
    pub memory_scale_up: f64,
    #[serde(default = "default_memory_scale_down")]
    pub memory_scale_down: f64,
}

fn default_cpu_scale_up() -> f64 {
    75.0
}

fn default_cpu_scale_down() -> f64 {
    30.0
}

fn default_memory_scale_up() -> f64 {
    80.0
}

fn default_memory_scale_down() -> f64 {
    40.0
}

impl Default for ScalingThresholds {
    fn default() -> Self {
        Self {
            cpu_scale_up: default_cpu_scale_up(),
            cpu_scale_down: default_cpu_scale_down(),
            memory_scale_up: default_memory_scale_up(),
            memory_scale_down: default_memory_scale_down(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerticalConfig {
    pub ladder: InstanceClassLadder,

    #[serde(default, flatten)]
    pub thresholds: ScalingThresholds,

    /// Trailing window utilisation is averaged over.
    #[serde(default = "default_metrics_window", with = "humantime_serde")]
    pub metrics_window: Duration,

    #[serde(default = "default_min_healthy_percentage")]
    pub min_healthy_percentage: u8,

    #[serde(default = "default_warmup", with = "humantime_serde")]
    pub warmup: Duration,
}

fn default_metrics_window() -> Duration {
    Duration::from_secs(600)
}

fn default_min_healthy_percentage() -> u8 {
    100
}

fn default_warmup() -> Duration {
    Duration::from_secs(300)
}

impl VerticalConfig {
    pub fn new(ladder: InstanceClassLadder) -> Self {
        Self {
            ladder,
            thresholds: ScalingThresholds::default(),
            metrics_window: default_metrics_window(),
            min_healthy_percentage: default_min_healthy_percentage(),
            warmup: default_warmup(),
        }
    }

    pub fn rolling_replacement(&self) -> RollingReplacement {
        RollingReplacement {
            min_healthy_percentage: self.min_healthy_percentage,
            warmup_seconds: u32::try_from(self.warmup.as_secs()).unwrap_or(u32::MAX),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        let t = &self.thresholds;
        if t.cpu_scale_down >= t.cpu_scale_up {
            return Err(format!(
                "vertical.cpu_scale_down ({}) must be below cpu_scale_up ({})",
                t.cpu_scale_down, t.cpu_scale_up
            ));
        }
        if t.memory_scale_down >= t.memory_scale_up {
            return Err(format!(
                "vertical.memory_scale_down ({}) must be below memory_scale_up ({})",
                t.memory_scale_down, t.memory_scale_up
            ));
        }
        if self.min_healthy_percentage > 100 {
            return Err("vertical.min_healthy_percentage cannot exceed 100".to_string());
        }
        Ok(())
    }
}
