// ABOUTME: Test support utilities.
// ABOUTME: Tracing setup, blue/green fixtures, and a gateway wrapper that degrades a fleet mid-switch.

use async_trait::async_trait;
use fleetkeeper::config::SwitchConfig;
use fleetkeeper::gateway::memory::Operation;
use fleetkeeper::gateway::{
    CapacityBounds, FleetState, GatewayError, InMemoryFleet, InfrastructureGateway,
    InstanceHealth, LaunchConfigData, LaunchConfigRef, LaunchOverrides, LaunchVersion,
    RollingReplacement,
};
use fleetkeeper::types::{EnvironmentPair, FleetName, InstanceId, LaunchConfigId};
use std::collections::BTreeSet;
use std::sync::Once;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter =
            EnvFilter::from_default_env().add_directive("fleetkeeper=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

#[allow(dead_code)]
pub fn fleet(name: &str) -> FleetName {
    FleetName::new(name).unwrap()
}

#[allow(dead_code)]
pub fn pair() -> EnvironmentPair {
    EnvironmentPair::new(fleet("ci-blue"), fleet("ci-green"))
}

/// Blue active and routed, green dormant.
#[allow(dead_code)]
pub fn blue_green() -> (InMemoryFleet, EnvironmentPair) {
    let pair = pair();
    let gateway = InMemoryFleet::new();
    gateway.add_fleet(&pair.blue, CapacityBounds::ACTIVE);
    gateway.add_fleet(&pair.green, CapacityBounds::DORMANT);
    gateway.route_to(&pair.blue);
    (gateway, pair)
}

/// Millisecond polling so switch tests finish quickly.
#[allow(dead_code)]
pub fn fast_switch() -> SwitchConfig {
    SwitchConfig {
        poll_interval: Duration::from_millis(2),
        health_timeout: Duration::from_millis(200),
        active_capacity: CapacityBounds::ACTIVE,
    }
}

/// Delegates to an `InMemoryFleet`, but turns every instance of `watched`
/// unhealthy right after the first read that saw a healthy one.
#[allow(dead_code)]
pub struct SickAfterHealthy<'a> {
    inner: &'a InMemoryFleet,
    watched: FleetName,
    then_fail: Option<Operation>,
    tripped: AtomicBool,
}

#[allow(dead_code)]
impl<'a> SickAfterHealthy<'a> {
    pub fn new(inner: &'a InMemoryFleet, watched: &FleetName) -> Self {
        Self {
            inner,
            watched: watched.clone(),
            then_fail: None,
            tripped: AtomicBool::new(false),
        }
    }

    /// Also make `operation` fail on the watched fleet once it turns sick.
    pub fn then_fail(mut self, operation: Operation) -> Self {
        self.then_fail = Some(operation);
        self
    }
}

#[async_trait]
impl InfrastructureGateway for SickAfterHealthy<'_> {
    async fn fleet_state(&self, fleet: &FleetName) -> Result<FleetState, GatewayError> {
        let state = self.inner.fleet_state(fleet).await?;
        if *fleet == self.watched
            && state.healthy_count() > 0
            && !self.tripped.swap(true, Ordering::SeqCst)
        {
            self.inner
                .set_instance_health(&self.watched, InstanceHealth::Unhealthy);
            if let Some(operation) = self.then_fail {
                self.inner.fail(operation, Some(&self.watched));
            }
        }
        Ok(state)
    }

    async fn set_capacity(
        &self,
        fleet: &FleetName,
        bounds: CapacityBounds,
        honor_cooldown: bool,
    ) -> Result<(), GatewayError> {
        self.inner.set_capacity(fleet, bounds, honor_cooldown).await
    }

    async fn set_desired_capacity(
        &self,
        fleet: &FleetName,
        desired: u32,
        honor_cooldown: bool,
    ) -> Result<(), GatewayError> {
        self.inner
            .set_desired_capacity(fleet, desired, honor_cooldown)
            .await
    }

    async fn target_set_members(&self) -> Result<BTreeSet<InstanceId>, GatewayError> {
        self.inner.target_set_members().await
    }

    async fn set_target_set(&self, fleet: &FleetName) -> Result<(), GatewayError> {
        self.inner.set_target_set(fleet).await
    }

    async fn launch_config(
        &self,
        id: &LaunchConfigId,
        version: LaunchVersion,
    ) -> Result<LaunchConfigData, GatewayError> {
        self.inner.launch_config(id, version).await
    }

    async fn create_launch_config_version(
        &self,
        id: &LaunchConfigId,
        base: LaunchVersion,
        overrides: &LaunchOverrides,
    ) -> Result<u32, GatewayError> {
        self.inner
            .create_launch_config_version(id, base, overrides)
            .await
    }

    async fn set_launch_config(
        &self,
        fleet: &FleetName,
        launch_config: &LaunchConfigRef,
    ) -> Result<(), GatewayError> {
        self.inner.set_launch_config(fleet, launch_config).await
    }

    async fn start_rolling_replacement(
        &self,
        fleet: &FleetName,
        preferences: RollingReplacement,
    ) -> Result<(), GatewayError> {
        self.inner
            .start_rolling_replacement(fleet, preferences)
            .await
    }
}
