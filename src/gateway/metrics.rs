// ABOUTME: Metrics source trait for time-windowed utilization samples.
// ABOUTME: CPU and memory percentages plus build queue and executor counts.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use super::error::GatewayError;
use crate::types::FleetName;

/// A metric the advisors read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Average CPU utilisation, percent.
    CpuUtilization,
    /// Average memory utilisation, percent.
    MemoryUtilization,
    /// Jobs waiting for an executor.
    QueueLength,
    ActiveExecutors,
    IdleExecutors,
}

impl Metric {
    pub fn name(self) -> &'static str {
        match self {
            Metric::CpuUtilization => "cpu_utilization",
            Metric::MemoryUtilization => "memory_utilization",
            Metric::QueueLength => "queue_length",
            Metric::ActiveExecutors => "active_executors",
            Metric::IdleExecutors => "idle_executors",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Source of averaged utilization samples.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Average of `metric` for `fleet` over the trailing `window`.
    ///
    /// `Ok(None)` means no datapoints exist for the window.
    async fn utilization(
        &self,
        fleet: &FleetName,
        metric: Metric,
        window: Duration,
    ) -> Result<Option<f64>, GatewayError>;
}
