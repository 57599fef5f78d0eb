// ABOUTME: Horizontal capacity and cost configuration.
// ABOUTME: Worker fleet bounds, queue/idle thresholds, business hours, and pricing.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::BusinessHours;
use crate::types::FleetName;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityConfig {
    /// Fleet of build workers this advisor sizes.
    pub fleet: FleetName,

    #[serde(default)]
    pub min_workers: u32,

    #[serde(default = "default_max_workers")]
    pub max_workers: u32,

    /// Queue length above which the fleet grows.
    #[serde(default = "default_queue_threshold")]
    pub queue_threshold: u32,

    /// Queued jobs one additional worker is expected to absorb.
    #[serde(default = "default_jobs_per_worker")]
    pub jobs_per_worker: u32,

    /// Idle executors above which an idle worker is released.
    #[serde(default = "default_idle_threshold")]
    pub idle_threshold: u32,

    #[serde(default)]
    pub business_hours: BusinessHours,

    #[serde(default = "default_metrics_window", with = "humantime_serde")]
    pub metrics_window: Duration,
}

fn default_max_workers() -> u32 {
    10
}

fn default_queue_threshold() -> u32 {
    3
}

fn default_jobs_per_worker() -> u32 {
    2
}

fn default_idle_threshold() -> u32 {
    2
}

fn default_metrics_window() -> Duration {
    Duration::from_secs(300)
}

impl CapacityConfig {
    pub fn new(fleet: FleetName) -> Self {
        Self {
            fleet,
            min_workers: 0,
            max_workers: default_max_workers(),
            queue_threshold: default_queue_threshold(),
            jobs_per_worker: default_jobs_per_worker(),
            idle_threshold: default_idle_threshold(),
            business_hours: BusinessHours::default(),
            metrics_window: default_metrics_window(),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.min_workers > self.max_workers {
            return Err(format!(
                "capacity.min_workers ({}) exceeds max_workers ({})",
                self.min_workers, self.max_workers
            ));
        }
        if self.jobs_per_worker == 0 {
            return Err("capacity.jobs_per_worker must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Pricing used for informational cost reporting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostConfig {
    /// Hourly price of one worker at the purchase option actually used.
    #[serde(default = "default_unit_price")]
    pub unit_price: f64,

    #[serde(default = "default_on_demand_price")]
    pub on_demand_price: f64,

    #[serde(default = "default_monthly_budget")]
    pub monthly_budget: f64,

    /// Share of the budget, in percent, that triggers a cost alert.
    #[serde(default = "default_budget_alert_percent")]
    pub budget_alert_percent: f64,
}

fn default_unit_price() -> f64 {
    0.012
}

fn default_on_demand_price() -> f64 {
    0.0416
}

fn default_monthly_budget() -> f64 {
    100.0
}

fn default_budget_alert_percent() -> f64 {
    80.0
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            unit_price: default_unit_price(),
            on_demand_price: default_on_demand_price(),
            monthly_budget: default_monthly_budget(),
            budget_alert_percent: default_budget_alert_percent(),
        }
    }
}
