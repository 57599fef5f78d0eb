// ABOUTME: Health verdicts for a fleet computed from its instance records.
// ABOUTME: Separates real outages from failed reads, and hosts the looser switch gate.

use serde::Serialize;
use std::fmt;

use crate::gateway::{GatewayError, InfrastructureGateway, InstanceRecord};
use crate::types::FleetName;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Every instance is healthy.
    Healthy,
    /// Instances exist but not all of them are healthy.
    Degraded,
    /// The fleet has no instances.
    Unhealthy,
    /// The instance query itself failed.
    Error,
    /// No environment is serving traffic.
    Unknown,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Unhealthy => "unhealthy",
            HealthStatus::Error => "error",
            HealthStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub healthy_count: usize,
    pub total_count: usize,
    pub percentage: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl HealthReport {
    pub fn from_instances(instances: &[InstanceRecord]) -> Self {
        let total_count = instances.len();
        let healthy_count = instances.iter().filter(|i| i.is_healthy()).count();

        let (status, percentage) = if total_count == 0 {
            (HealthStatus::Unhealthy, 0.0)
        } else {
            let percentage = healthy_count as f64 * 100.0 / total_count as f64;
            let status = if healthy_count == total_count {
                HealthStatus::Healthy
            } else {
                HealthStatus::Degraded
            };
            (status, percentage)
        };

        let message = (total_count == 0).then(|| "no instances found".to_string());

        Self {
            status,
            healthy_count,
            total_count,
            percentage,
            message,
        }
    }

    pub fn error(err: &GatewayError) -> Self {
        Self {
            status: HealthStatus::Error,
            healthy_count: 0,
            total_count: 0,
            percentage: 0.0,
            message: Some(err.to_string()),
        }
    }

    pub fn unknown() -> Self {
        Self {
            status: HealthStatus::Unknown,
            healthy_count: 0,
            total_count: 0,
            percentage: 0.0,
            message: Some("no active environment found".to_string()),
        }
    }
}

impl fmt::Display for HealthReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}/{} healthy, {:.1}%)",
            self.status, self.healthy_count, self.total_count, self.percentage
        )?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        Ok(())
    }
}

pub struct HealthValidator<'a, G: ?Sized> {
    gateway: &'a G,
}

impl<'a, G: InfrastructureGateway + ?Sized> HealthValidator<'a, G> {
    pub fn new(gateway: &'a G) -> Self {
        Self { gateway }
    }

    /// Health of `fleet`; a failed read yields `HealthStatus::Error`.
    pub async fn assess(&self, fleet: &FleetName) -> HealthReport {
        match self.gateway.fleet_state(fleet).await {
            Ok(state) => HealthReport::from_instances(&state.instances),
            Err(e) => {
                tracing::warn!(fleet = %fleet, error = %e, "health query failed");
                HealthReport::error(&e)
            }
        }
    }

    /// Switch gate: at least one healthy instance. Read failures count as unsafe.
    pub async fn is_switch_safe(&self, fleet: &FleetName) -> bool {
        self.safe_count(fleet).await.is_some_and(|(healthy, _)| healthy > 0)
    }

    /// Healthy and total instance counts, or `None` if the read failed.
    pub(crate) async fn safe_count(&self, fleet: &FleetName) -> Option<(usize, usize)> {
        match self.gateway.fleet_state(fleet).await {
            Ok(state) => Some((state.healthy_count(), state.instances.len())),
            Err(e) => {
                tracing::warn!(fleet = %fleet, error = %e, "switch validation read failed");
                None
            }
        }
    }
}
