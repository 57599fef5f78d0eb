// ABOUTME: Infrastructure gateway trait for fleet and traffic-routing primitives.
// ABOUTME: Fleet snapshots, capacity bounds, launch configurations, and rolling replacement.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::error::GatewayError;
use crate::types::{FleetName, InstanceClass, InstanceId, LaunchConfigId};

/// Health an instance reports to the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceHealth {
    Healthy,
    Unhealthy,
    Unknown,
}

/// Read-only snapshot of one instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceRecord {
    pub id: InstanceId,
    pub health: InstanceHealth,
    pub fleet: FleetName,
}

impl InstanceRecord {
    pub fn is_healthy(&self) -> bool {
        self.health == InstanceHealth::Healthy
    }
}

/// Size bounds for a fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityBounds {
    pub min: u32,
    pub max: u32,
    pub desired: u32,
}

impl CapacityBounds {
    /// Bounds of a fleet serving traffic.
    pub const ACTIVE: CapacityBounds = CapacityBounds {
        min: 1,
        max: 3,
        desired: 1,
    };

    /// Bounds of a dormant standby.
    pub const DORMANT: CapacityBounds = CapacityBounds {
        min: 0,
        max: 0,
        desired: 0,
    };

    pub fn contains(&self, desired: u32) -> bool {
        (self.min..=self.max).contains(&desired)
    }
}

impl Default for CapacityBounds {
    fn default() -> Self {
        Self::ACTIVE
    }
}

impl fmt::Display for CapacityBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "min={} max={} desired={}",
            self.min, self.max, self.desired
        )
    }
}

/// A launch configuration version selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LaunchVersion {
    /// Whatever the newest version is at launch time.
    Latest,
    Number(u32),
}

impl fmt::Display for LaunchVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaunchVersion::Latest => f.write_str("$Latest"),
            LaunchVersion::Number(n) => write!(f, "{n}"),
        }
    }
}

impl Serialize for LaunchVersion {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for LaunchVersion {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s == "$Latest" {
            return Ok(LaunchVersion::Latest);
        }
        s.parse::<u32>()
            .map(LaunchVersion::Number)
            .map_err(|_| serde::de::Error::custom(format!("invalid launch version: {s}")))
    }
}

/// Which launch configuration (and version) a fleet launches from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchConfigRef {
    pub id: LaunchConfigId,
    pub version: LaunchVersion,
}

/// Contents of one launch configuration version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchConfigData {
    pub instance_class: InstanceClass,
    /// Everything else the template carries; copied untouched between versions.
    #[serde(default, flatten)]
    pub settings: BTreeMap<String, String>,
}

/// Fields replaced when deriving a new launch configuration version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_class: Option<InstanceClass>,
}

impl LaunchOverrides {
    pub fn instance_class(class: InstanceClass) -> Self {
        Self {
            instance_class: Some(class),
        }
    }

    pub fn apply(&self, base: &LaunchConfigData) -> LaunchConfigData {
        let mut data = base.clone();
        if let Some(class) = &self.instance_class {
            data.instance_class = class.clone();
        }
        data
    }
}

/// Preferences for an incremental instance replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollingReplacement {
    pub min_healthy_percentage: u8,
    pub warmup_seconds: u32,
}

impl Default for RollingReplacement {
    fn default() -> Self {
        Self {
            min_healthy_percentage: 100,
            warmup_seconds: 300,
        }
    }
}

/// Point-in-time view of a fleet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetState {
    pub name: FleetName,
    pub desired_capacity: u32,
    pub min_size: u32,
    pub max_size: u32,
    pub launch_config: Option<LaunchConfigRef>,
    pub instances: Vec<InstanceRecord>,
}

impl FleetState {
    pub fn bounds(&self) -> CapacityBounds {
        CapacityBounds {
            min: self.min_size,
            max: self.max_size,
            desired: self.desired_capacity,
        }
    }

    pub fn instance_ids(&self) -> BTreeSet<InstanceId> {
        self.instances.iter().map(|i| i.id.clone()).collect()
    }

    pub fn healthy_count(&self) -> usize {
        self.instances.iter().filter(|i| i.is_healthy()).count()
    }
}

/// Fleet and traffic-routing primitives.
///
/// Every call is blocking from the caller's point of view, may have side
/// effects, and is never retried implicitly.
#[async_trait]
pub trait InfrastructureGateway: Send + Sync {
    /// Current capacity, launch configuration and instances of a fleet.
    async fn fleet_state(&self, fleet: &FleetName) -> Result<FleetState, GatewayError>;

    /// Replace a fleet's min/max/desired capacity.
    async fn set_capacity(
        &self,
        fleet: &FleetName,
        bounds: CapacityBounds,
        honor_cooldown: bool,
    ) -> Result<(), GatewayError>;

    /// Change only the desired capacity, leaving min/max untouched.
    async fn set_desired_capacity(
        &self,
        fleet: &FleetName,
        desired: u32,
        honor_cooldown: bool,
    ) -> Result<(), GatewayError>;

    /// Instance ids currently receiving routed traffic.
    async fn target_set_members(&self) -> Result<BTreeSet<InstanceId>, GatewayError>;

    /// Route traffic to exactly the instances of `fleet`.
    ///
    /// Implementations must make this atomic: once it returns, no mix of old
    /// and new targets is observable.
    async fn set_target_set(&self, fleet: &FleetName) -> Result<(), GatewayError>;

    async fn launch_config(
        &self,
        id: &LaunchConfigId,
        version: LaunchVersion,
    ) -> Result<LaunchConfigData, GatewayError>;

    /// Derive a new version from `base` with `overrides` applied; returns its number.
    async fn create_launch_config_version(
        &self,
        id: &LaunchConfigId,
        base: LaunchVersion,
        overrides: &LaunchOverrides,
    ) -> Result<u32, GatewayError>;

    async fn set_launch_config(
        &self,
        fleet: &FleetName,
        launch_config: &LaunchConfigRef,
    ) -> Result<(), GatewayError>;

    async fn start_rolling_replacement(
        &self,
        fleet: &FleetName,
        preferences: RollingReplacement,
    ) -> Result<(), GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launch_version_round_trips_latest_marker() {
        let json = serde_json::to_string(&LaunchVersion::Latest).unwrap();
        assert_eq!(json, "\"$Latest\"");
        let parsed: LaunchVersion = serde_json::from_str("\"7\"").unwrap();
        assert_eq!(parsed, LaunchVersion::Number(7));
    }

    #[test]
    fn overrides_replace_only_instance_class() {
        let mut settings = BTreeMap::new();
        settings.insert("image".to_string(), "ami-123".to_string());
        let base = LaunchConfigData {
            instance_class: InstanceClass::new("t3.medium").unwrap(),
            settings,
        };

        let next = LaunchOverrides::instance_class(InstanceClass::new("t3.large").unwrap())
            .apply(&base);
        assert_eq!(next.instance_class.as_str(), "t3.large");
        assert_eq!(next.settings.get("image").map(String::as_str), Some("ami-123"));
    }

    #[test]
    fn bounds_contains_is_inclusive() {
        assert!(CapacityBounds::ACTIVE.contains(1));
        assert!(CapacityBounds::ACTIVE.contains(3));
        assert!(!CapacityBounds::ACTIVE.contains(0));
        assert!(CapacityBounds::DORMANT.contains(0));
    }

    #[test]
    fn rolling_replacement_defaults_hold_full_capacity() {
        let prefs = RollingReplacement::default();
        assert_eq!(prefs.min_healthy_percentage, 100);
        assert_eq!(prefs.warmup_seconds, 300);
    }
}
