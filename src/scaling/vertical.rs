// ABOUTME: Vertical scaling: step the active fleet up or down the instance class ladder.
// ABOUTME: Applies a change via a new launch configuration version and a rolling replacement.

use serde::Serialize;
use snafu::{OptionExt, ResultExt};

use crate::config::{ScalingThresholds, VerticalConfig};
use crate::gateway::{
    FleetState, GatewayError, InfrastructureGateway, LaunchConfigRef, LaunchOverrides,
    LaunchVersion, Metric, MetricsSource, NotificationSink, publish_or_warn,
};
use crate::notify::vertical_subject;
use crate::types::{EnvironmentPair, FleetName, InstanceClass, InstanceClassLadder};

use super::error::{GatewaySnafu, MissingLaunchConfigSnafu, ScalingError, UnknownClassSnafu};

/// Next class for `current` under the default thresholds (75/30 CPU, 80/40 memory).
pub fn decide(
    ladder: &InstanceClassLadder,
    current: &InstanceClass,
    cpu: f64,
    memory: f64,
) -> Result<InstanceClass, ScalingError> {
    decide_with(&ScalingThresholds::default(), ladder, current, cpu, memory)
}

/// Next class for `current`.
///
/// Either metric above its up threshold moves one step up; both metrics
/// below their down thresholds move one step down. Steps clamp at the ends
/// of the ladder.
pub fn decide_with(
    thresholds: &ScalingThresholds,
    ladder: &InstanceClassLadder,
    current: &InstanceClass,
    cpu: f64,
    memory: f64,
) -> Result<InstanceClass, ScalingError> {
    let index = ladder
        .position(current)
        .context(UnknownClassSnafu {
            class: current.clone(),
        })?;

    let next = if cpu > thresholds.cpu_scale_up || memory > thresholds.memory_scale_up {
        ladder.step_up(index)
    } else if cpu < thresholds.cpu_scale_down && memory < thresholds.memory_scale_down {
        ladder.step_down(index)
    } else {
        current
    };
    Ok(next.clone())
}

/// What a vertical scaling run did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerticalOutcome {
    /// Neither fleet has any desired capacity.
    NoActiveFleet,
    /// CPU or memory had no datapoints; nothing was decided.
    NoData { fleet: FleetName, class: InstanceClass },
    Unchanged {
        fleet: FleetName,
        class: InstanceClass,
        cpu: f64,
        memory: f64,
    },
    Scaled {
        fleet: FleetName,
        from: InstanceClass,
        to: InstanceClass,
        cpu: f64,
        memory: f64,
        version: u32,
    },
    /// The class change was decided but could not be applied.
    Failed {
        fleet: FleetName,
        from: InstanceClass,
        to: InstanceClass,
        cpu: f64,
        memory: f64,
        error: String,
    },
}

pub struct VerticalScalingAdvisor<'a, G: ?Sized, M: ?Sized, N: ?Sized> {
    gateway: &'a G,
    metrics: &'a M,
    notifier: &'a N,
    pair: EnvironmentPair,
    config: VerticalConfig,
}

impl<'a, G, M, N> VerticalScalingAdvisor<'a, G, M, N>
where
    G: InfrastructureGateway + ?Sized,
    M: MetricsSource + ?Sized,
    N: NotificationSink + ?Sized,
{
    pub fn new(
        gateway: &'a G,
        metrics: &'a M,
        notifier: &'a N,
        pair: EnvironmentPair,
        config: VerticalConfig,
    ) -> Self {
        Self {
            gateway,
            metrics,
            notifier,
            pair,
            config,
        }
    }

    /// One scaling cycle for the active fleet.
    ///
    /// # Errors
    ///
    /// Configuration problems (class not on the ladder, no launch
    /// configuration) and failed reads. A failed class change is reported as
    /// `VerticalOutcome::Failed`, not as an error.
    pub async fn run(&self) -> Result<VerticalOutcome, ScalingError> {
        let Some(fleet) = self.active_fleet().await? else {
            tracing::info!("no active fleet found");
            return Ok(VerticalOutcome::NoActiveFleet);
        };
        let name = fleet.name.clone();

        let launch_config = fleet
            .launch_config
            .clone()
            .context(MissingLaunchConfigSnafu {
                fleet: name.clone(),
            })?;
        let current = self
            .gateway
            .launch_config(&launch_config.id, launch_config.version)
            .await
            .context(GatewaySnafu {
                step: "read launch configuration",
            })?
            .instance_class;
        tracing::info!(fleet = %name, class = %current, "current instance class");

        let (Some(cpu), Some(memory)) = (
            self.sample(&name, Metric::CpuUtilization).await,
            self.sample(&name, Metric::MemoryUtilization).await,
        ) else {
            tracing::info!(fleet = %name, "no utilisation data, skipping");
            return Ok(VerticalOutcome::NoData {
                fleet: name,
                class: current,
            });
        };
        tracing::info!(fleet = %name, cpu, memory, "utilisation");

        let next = decide_with(
            &self.config.thresholds,
            &self.config.ladder,
            &current,
            cpu,
            memory,
        )?;
        if next == current {
            tracing::info!(fleet = %name, class = %current, "no scaling needed");
            return Ok(VerticalOutcome::Unchanged {
                fleet: name,
                class: current,
                cpu,
                memory,
            });
        }

        tracing::info!(fleet = %name, from = %current, to = %next, "scaling instance class");
        let outcome = match self.apply(&name, &launch_config, &next).await {
            Ok(version) => VerticalOutcome::Scaled {
                fleet: name,
                from: current,
                to: next,
                cpu,
                memory,
                version,
            },
            Err(e) => {
                tracing::error!(fleet = %name, error = %e, "vertical scaling failed");
                VerticalOutcome::Failed {
                    fleet: name,
                    from: current,
                    to: next,
                    cpu,
                    memory,
                    error: e.to_string(),
                }
            }
        };
        self.notify(&outcome).await;
        Ok(outcome)
    }

    /// First of blue, green with desired capacity above zero.
    async fn active_fleet(&self) -> Result<Option<FleetState>, ScalingError> {
        for name in [&self.pair.blue, &self.pair.green] {
            let state = self
                .gateway
                .fleet_state(name)
                .await
                .context(GatewaySnafu { step: "read fleet" })?;
            if state.desired_capacity > 0 {
                return Ok(Some(state));
            }
        }
        Ok(None)
    }

    /// A failed metrics read is treated like a window without datapoints.
    async fn sample(&self, fleet: &FleetName, metric: Metric) -> Option<f64> {
        match self
            .metrics
            .utilization(fleet, metric, self.config.metrics_window)
            .await
        {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(fleet = %fleet, %metric, error = %e, "metrics read failed");
                None
            }
        }
    }

    /// New launch version from `$Latest` with only the class replaced, fleet
    /// pointed at `$Latest`, then a rolling replacement.
    async fn apply(
        &self,
        fleet: &FleetName,
        launch_config: &LaunchConfigRef,
        class: &InstanceClass,
    ) -> Result<u32, GatewayError> {
        let overrides = LaunchOverrides::instance_class(class.clone());
        let version = self
            .gateway
            .create_launch_config_version(&launch_config.id, LaunchVersion::Latest, &overrides)
            .await?;
        tracing::info!(launch_config = %launch_config.id, version, "created launch configuration version");

        let latest = LaunchConfigRef {
            id: launch_config.id.clone(),
            version: LaunchVersion::Latest,
        };
        self.gateway.set_launch_config(fleet, &latest).await?;
        self.gateway
            .start_rolling_replacement(fleet, self.config.rolling_replacement())
            .await?;
        tracing::info!(fleet = %fleet, "started rolling replacement");
        Ok(version)
    }

    async fn notify(&self, outcome: &VerticalOutcome) {
        let (from, to, cpu, memory, status) = match outcome {
            VerticalOutcome::Scaled {
                from,
                to,
                cpu,
                memory,
                ..
            } => (from, to, cpu, memory, "success".to_string()),
            VerticalOutcome::Failed {
                from,
                to,
                cpu,
                memory,
                error,
                ..
            } => (from, to, cpu, memory, format!("error: {error}")),
            _ => return,
        };

        let message = format!(
            "Vertical Scaling\n\n\
             Status: {status}\n\
             Old Instance Class: {from}\n\
             New Instance Class: {to}\n\n\
             Metrics:\n\
             - CPU Utilization: {cpu:.2}%\n\
             - Memory Utilization: {memory:.2}%\n\n\
             Timestamp: {}",
            chrono::Utc::now().to_rfc3339()
        );
        publish_or_warn(
            self.notifier,
            &vertical_subject(from.as_str(), to.as_str()),
            &message,
        )
        .await;
    }
}
