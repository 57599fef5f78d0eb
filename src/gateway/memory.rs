// ABOUTME: In-process fleet simulation implementing the gateway and metrics traits.
// ABOUTME: Persists to JSON so the CLI can drive the control loop against local state.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::time::Duration;

use super::error::GatewayError;
use super::fleet::{
    CapacityBounds, FleetState, InfrastructureGateway, InstanceHealth, InstanceRecord,
    LaunchConfigData, LaunchConfigRef, LaunchOverrides, LaunchVersion, RollingReplacement,
};
use super::metrics::{Metric, MetricsSource};
use crate::error::Result;
use crate::types::{FleetName, InstanceId, LaunchConfigId};

/// Gateway operations that can be made to fail on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    FleetState,
    SetCapacity,
    SetDesiredCapacity,
    TargetSetMembers,
    SetTargetSet,
    LaunchConfig,
    CreateLaunchConfigVersion,
    SetLaunchConfig,
    StartRollingReplacement,
    Utilization,
}

impl Operation {
    fn is_write(self) -> bool {
        matches!(
            self,
            Operation::SetCapacity
                | Operation::SetDesiredCapacity
                | Operation::SetTargetSet
                | Operation::CreateLaunchConfigVersion
                | Operation::SetLaunchConfig
                | Operation::StartRollingReplacement
        )
    }
}

/// A mutating call recorded by the simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum GatewayCall {
    SetCapacity {
        fleet: FleetName,
        bounds: CapacityBounds,
        honor_cooldown: bool,
    },
    SetDesiredCapacity {
        fleet: FleetName,
        desired: u32,
        honor_cooldown: bool,
    },
    SetTargetSet {
        fleet: FleetName,
    },
    CreateLaunchConfigVersion {
        id: LaunchConfigId,
        base: LaunchVersion,
        version: u32,
    },
    SetLaunchConfig {
        fleet: FleetName,
        launch_config: LaunchConfigRef,
    },
    StartRollingReplacement {
        fleet: FleetName,
        preferences: RollingReplacement,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SimulatedInstance {
    id: InstanceId,
    health: InstanceHealth,
    #[serde(default)]
    pending_reads: u32,
}

/// A simulated auto-scaling group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatedFleet {
    pub bounds: CapacityBounds,

    #[serde(default)]
    pub launch_config: Option<LaunchConfigRef>,

    /// Health newly launched instances settle into.
    #[serde(default = "default_launch_health")]
    pub launch_health: InstanceHealth,

    /// Number of reads a new instance reports `unknown` for before settling.
    #[serde(default)]
    pub warmup_reads: u32,

    #[serde(default)]
    instances: Vec<SimulatedInstance>,
}

fn default_launch_health() -> InstanceHealth {
    InstanceHealth::Healthy
}

impl SimulatedFleet {
    fn new(bounds: CapacityBounds) -> Self {
        Self {
            bounds,
            launch_config: None,
            launch_health: default_launch_health(),
            warmup_reads: 0,
            instances: Vec::new(),
        }
    }
}

/// Serializable state of the whole simulation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FleetSnapshot {
    #[serde(default)]
    pub fleets: BTreeMap<FleetName, SimulatedFleet>,

    #[serde(default)]
    pub target_set: BTreeSet<InstanceId>,

    /// Versions per launch configuration; version `n` lives at index `n - 1`.
    #[serde(default)]
    pub launch_configs: BTreeMap<LaunchConfigId, Vec<LaunchConfigData>>,

    #[serde(default)]
    pub metrics: BTreeMap<FleetName, BTreeMap<Metric, f64>>,

    /// Mutating calls made through this process; not persisted.
    #[serde(skip)]
    pub history: Vec<GatewayCall>,

    #[serde(default)]
    next_instance: u64,
}

impl FleetSnapshot {
    fn fleet_mut(&mut self, name: &FleetName) -> std::result::Result<&mut SimulatedFleet, GatewayError> {
        self.fleets
            .get_mut(name)
            .ok_or_else(|| GatewayError::FleetNotFound(name.to_string()))
    }

    /// Launch or terminate instances until the fleet matches its desired size.
    fn reconcile(&mut self, name: &FleetName) -> std::result::Result<(), GatewayError> {
        let fleet = self
            .fleets
            .get_mut(name)
            .ok_or_else(|| GatewayError::FleetNotFound(name.to_string()))?;
        let desired = fleet.bounds.desired as usize;

        while fleet.instances.len() < desired {
            self.next_instance += 1;
            fleet.instances.push(SimulatedInstance {
                id: InstanceId::new(format!("i-{:08x}", self.next_instance)),
                health: fleet.launch_health,
                pending_reads: fleet.warmup_reads,
            });
        }

        while fleet.instances.len() > desired {
            if let Some(terminated) = fleet.instances.pop() {
                self.target_set.remove(&terminated.id);
            }
        }

        Ok(())
    }
}

/// Thread-safe fleet simulation.
#[derive(Debug, Default)]
pub struct InMemoryFleet {
    state: Mutex<FleetSnapshot>,
    failures: Mutex<HashMap<Operation, Option<FleetName>>>,
}

impl InMemoryFleet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: FleetSnapshot) -> Self {
        Self {
            state: Mutex::new(snapshot),
            failures: Mutex::new(HashMap::new()),
        }
    }

    /// Load from a JSON state file, starting empty if it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no fleet state file, starting empty");
            return Ok(Self::new());
        }
        let content = std::fs::read_to_string(path)?;
        let snapshot: FleetSnapshot = serde_json::from_str(&content)?;
        Ok(Self::from_snapshot(snapshot))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&*self.state.lock())?;
        // Write beside the target and rename over it, so readers never see a partial file.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn snapshot(&self) -> FleetSnapshot {
        self.state.lock().clone()
    }

    /// Add a fleet and launch its desired instances.
    pub fn add_fleet(&self, name: &FleetName, bounds: CapacityBounds) -> Vec<InstanceId> {
        let mut state = self.state.lock();
        state.fleets.insert(name.clone(), SimulatedFleet::new(bounds));
        // Cannot fail: the fleet was inserted above.
        let _ = state.reconcile(name);
        state.fleets[name]
            .instances
            .iter()
            .map(|i| i.id.clone())
            .collect()
    }

    /// Health that future instances of `fleet` settle into.
    pub fn set_launch_health(&self, fleet: &FleetName, health: InstanceHealth) {
        if let Some(f) = self.state.lock().fleets.get_mut(fleet) {
            f.launch_health = health;
        }
    }

    /// Reads a new instance of `fleet` stays `unknown` for.
    pub fn set_warmup_reads(&self, fleet: &FleetName, reads: u32) {
        if let Some(f) = self.state.lock().fleets.get_mut(fleet) {
            f.warmup_reads = reads;
        }
    }

    /// Force every current instance of `fleet` to report `health`.
    pub fn set_instance_health(&self, fleet: &FleetName, health: InstanceHealth) {
        if let Some(f) = self.state.lock().fleets.get_mut(fleet) {
            for instance in &mut f.instances {
                instance.health = health;
                instance.pending_reads = 0;
            }
        }
    }

    /// Point the target set at `fleet` without recording a call.
    pub fn route_to(&self, fleet: &FleetName) {
        let mut state = self.state.lock();
        let ids: BTreeSet<InstanceId> = state
            .fleets
            .get(fleet)
            .map(|f| f.instances.iter().map(|i| i.id.clone()).collect())
            .unwrap_or_default();
        state.target_set = ids;
    }

    /// Register a launch configuration with a single version and attach it to `fleet`.
    pub fn register_launch_config(
        &self,
        fleet: &FleetName,
        id: &LaunchConfigId,
        data: LaunchConfigData,
    ) -> LaunchConfigRef {
        let mut state = self.state.lock();
        state.launch_configs.insert(id.clone(), vec![data]);
        let reference = LaunchConfigRef {
            id: id.clone(),
            version: LaunchVersion::Number(1),
        };
        if let Some(f) = state.fleets.get_mut(fleet) {
            f.launch_config = Some(reference.clone());
        }
        reference
    }

    pub fn set_metric(&self, fleet: &FleetName, metric: Metric, value: f64) {
        self.state
            .lock()
            .metrics
            .entry(fleet.clone())
            .or_default()
            .insert(metric, value);
    }

    /// Make `operation` fail, for every fleet or only for `fleet`.
    pub fn fail(&self, operation: Operation, fleet: Option<&FleetName>) {
        self.failures.lock().insert(operation, fleet.cloned());
    }

    pub fn heal(&self, operation: Operation) {
        self.failures.lock().remove(&operation);
    }

    pub fn history(&self) -> Vec<GatewayCall> {
        self.state.lock().history.clone()
    }

    pub fn target_set(&self) -> BTreeSet<InstanceId> {
        self.state.lock().target_set.clone()
    }

    pub fn bounds(&self, fleet: &FleetName) -> Option<CapacityBounds> {
        self.state.lock().fleets.get(fleet).map(|f| f.bounds)
    }

    pub fn instance_ids(&self, fleet: &FleetName) -> BTreeSet<InstanceId> {
        self.state
            .lock()
            .fleets
            .get(fleet)
            .map(|f| f.instances.iter().map(|i| i.id.clone()).collect())
            .unwrap_or_default()
    }

    pub fn launch_versions(&self, id: &LaunchConfigId) -> Vec<LaunchConfigData> {
        self.state
            .lock()
            .launch_configs
            .get(id)
            .cloned()
            .unwrap_or_default()
    }

    fn check(
        &self,
        operation: Operation,
        fleet: Option<&FleetName>,
    ) -> std::result::Result<(), GatewayError> {
        let failures = self.failures.lock();
        let injected = match failures.get(&operation) {
            Some(None) => true,
            Some(Some(target)) => fleet == Some(target),
            None => false,
        };
        if !injected {
            return Ok(());
        }

        let resource = match fleet {
            Some(f) => format!("{operation:?} on {f}"),
            None => format!("{operation:?}"),
        };
        if operation.is_write() {
            Err(GatewayError::write(resource, "injected failure"))
        } else {
            Err(GatewayError::read(resource, "injected failure"))
        }
    }
}

#[async_trait]
impl InfrastructureGateway for InMemoryFleet {
    async fn fleet_state(&self, fleet: &FleetName) -> std::result::Result<FleetState, GatewayError> {
        self.check(Operation::FleetState, Some(fleet))?;
        let mut state = self.state.lock();
        let sim = state.fleet_mut(fleet)?;

        let instances = sim
            .instances
            .iter_mut()
            .map(|instance| {
                let health = if instance.pending_reads > 0 {
                    instance.pending_reads -= 1;
                    InstanceHealth::Unknown
                } else {
                    instance.health
                };
                InstanceRecord {
                    id: instance.id.clone(),
                    health,
                    fleet: fleet.clone(),
                }
            })
            .collect();

        Ok(FleetState {
            name: fleet.clone(),
            desired_capacity: sim.bounds.desired,
            min_size: sim.bounds.min,
            max_size: sim.bounds.max,
            launch_config: sim.launch_config.clone(),
            instances,
        })
    }

    async fn set_capacity(
        &self,
        fleet: &FleetName,
        bounds: CapacityBounds,
        honor_cooldown: bool,
    ) -> std::result::Result<(), GatewayError> {
        self.check(Operation::SetCapacity, Some(fleet))?;
        if bounds.min > bounds.max || !bounds.contains(bounds.desired) {
            return Err(GatewayError::Rejected(format!(
                "invalid capacity for {fleet}: {bounds}"
            )));
        }

        let mut state = self.state.lock();
        state.fleet_mut(fleet)?.bounds = bounds;
        state.reconcile(fleet)?;
        state.history.push(GatewayCall::SetCapacity {
            fleet: fleet.clone(),
            bounds,
            honor_cooldown,
        });
        Ok(())
    }

    async fn set_desired_capacity(
        &self,
        fleet: &FleetName,
        desired: u32,
        honor_cooldown: bool,
    ) -> std::result::Result<(), GatewayError> {
        self.check(Operation::SetDesiredCapacity, Some(fleet))?;
        let mut state = self.state.lock();
        let sim = state.fleet_mut(fleet)?;
        if !sim.bounds.contains(desired) {
            return Err(GatewayError::Rejected(format!(
                "desired capacity {desired} outside {fleet} bounds ({})",
                sim.bounds
            )));
        }
        sim.bounds.desired = desired;
        state.reconcile(fleet)?;
        state.history.push(GatewayCall::SetDesiredCapacity {
            fleet: fleet.clone(),
            desired,
            honor_cooldown,
        });
        Ok(())
    }

    async fn target_set_members(&self) -> std::result::Result<BTreeSet<InstanceId>, GatewayError> {
        self.check(Operation::TargetSetMembers, None)?;
        Ok(self.state.lock().target_set.clone())
    }

    async fn set_target_set(&self, fleet: &FleetName) -> std::result::Result<(), GatewayError> {
        self.check(Operation::SetTargetSet, Some(fleet))?;
        let mut state = self.state.lock();
        let ids: BTreeSet<InstanceId> = state
            .fleet_mut(fleet)?
            .instances
            .iter()
            .map(|i| i.id.clone())
            .collect();
        state.target_set = ids;
        state.history.push(GatewayCall::SetTargetSet {
            fleet: fleet.clone(),
        });
        Ok(())
    }

    async fn launch_config(
        &self,
        id: &LaunchConfigId,
        version: LaunchVersion,
    ) -> std::result::Result<LaunchConfigData, GatewayError> {
        self.check(Operation::LaunchConfig, None)?;
        let state = self.state.lock();
        let versions = state
            .launch_configs
            .get(id)
            .ok_or_else(|| GatewayError::LaunchConfigNotFound(id.to_string()))?;
        let data = match version {
            LaunchVersion::Latest => versions.last(),
            LaunchVersion::Number(n) => (n as usize).checked_sub(1).and_then(|i| versions.get(i)),
        };
        data.cloned()
            .ok_or_else(|| GatewayError::LaunchConfigNotFound(format!("{id} version {version}")))
    }

    async fn create_launch_config_version(
        &self,
        id: &LaunchConfigId,
        base: LaunchVersion,
        overrides: &LaunchOverrides,
    ) -> std::result::Result<u32, GatewayError> {
        self.check(Operation::CreateLaunchConfigVersion, None)?;
        let base_data = self.launch_config(id, base).await?;

        let mut state = self.state.lock();
        let versions = state
            .launch_configs
            .get_mut(id)
            .ok_or_else(|| GatewayError::LaunchConfigNotFound(id.to_string()))?;
        versions.push(overrides.apply(&base_data));
        let version = versions.len() as u32;
        state.history.push(GatewayCall::CreateLaunchConfigVersion {
            id: id.clone(),
            base,
            version,
        });
        Ok(version)
    }

    async fn set_launch_config(
        &self,
        fleet: &FleetName,
        launch_config: &LaunchConfigRef,
    ) -> std::result::Result<(), GatewayError> {
        self.check(Operation::SetLaunchConfig, Some(fleet))?;
        let mut state = self.state.lock();
        if !state.launch_configs.contains_key(&launch_config.id) {
            return Err(GatewayError::LaunchConfigNotFound(launch_config.id.to_string()));
        }
        state.fleet_mut(fleet)?.launch_config = Some(launch_config.clone());
        state.history.push(GatewayCall::SetLaunchConfig {
            fleet: fleet.clone(),
            launch_config: launch_config.clone(),
        });
        Ok(())
    }

    async fn start_rolling_replacement(
        &self,
        fleet: &FleetName,
        preferences: RollingReplacement,
    ) -> std::result::Result<(), GatewayError> {
        self.check(Operation::StartRollingReplacement, Some(fleet))?;
        let mut state = self.state.lock();
        state.fleet_mut(fleet)?;
        state.history.push(GatewayCall::StartRollingReplacement {
            fleet: fleet.clone(),
            preferences,
        });
        Ok(())
    }
}

#[async_trait]
impl MetricsSource for InMemoryFleet {
    async fn utilization(
        &self,
        fleet: &FleetName,
        metric: Metric,
        _window: Duration,
    ) -> std::result::Result<Option<f64>, GatewayError> {
        self.check(Operation::Utilization, Some(fleet))?;
        Ok(self
            .state
            .lock()
            .metrics
            .get(fleet)
            .and_then(|m| m.get(&metric))
            .copied())
    }
}
