// ABOUTME: Local fleet backend shared by the commands.
// ABOUTME: Loads the simulated fleet under the state lock, seeding it from the config on first use.

use fleetkeeper::config::Config;
use fleetkeeper::error::Result;
use fleetkeeper::gateway::{CapacityBounds, InMemoryFleet, LaunchConfigData};
use fleetkeeper::switch::SwitchLock;
use fleetkeeper::types::LaunchConfigId;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// The persisted fleet, held under the state lock until saved.
pub struct LocalFleet {
    fleet: InMemoryFleet,
    path: PathBuf,
    lock: SwitchLock,
}

impl LocalFleet {
    /// Lock the state file, then load it or seed a fresh fleet from `config`.
    pub fn open(config: &Config, force: bool) -> Result<Self> {
        let lock = SwitchLock::acquire_state(&config.state_dir, force)?;
        let path = config.state_file();

        let fleet = if path.exists() {
            tracing::debug!(path = %path.display(), "loading fleet state");
            InMemoryFleet::load(&path)?
        } else {
            tracing::info!(path = %path.display(), "no fleet state yet, seeding from configuration");
            let fleet = InMemoryFleet::new();
            seed(&fleet, config);
            fleet
        };

        Ok(Self { fleet, path, lock })
    }

    pub fn fleet(&self) -> &InMemoryFleet {
        &self.fleet
    }

    /// Write the state back and release the lock.
    pub fn save(self) -> Result<()> {
        self.fleet.save(&self.path)?;
        self.lock.release()?;
        Ok(())
    }
}

/// Blue serves traffic, green is dormant, and the worker fleet starts at its minimum.
fn seed(fleet: &InMemoryFleet, config: &Config) {
    let pair = &config.environments;
    fleet.add_fleet(&pair.blue, config.switch.active_capacity);
    fleet.add_fleet(&pair.green, CapacityBounds::DORMANT);
    fleet.route_to(&pair.blue);

    if let Some(vertical) = &config.vertical {
        for name in [&pair.blue, &pair.green] {
            let id = LaunchConfigId::new(format!("{name}-template"));
            let data = LaunchConfigData {
                instance_class: vertical.ladder.smallest().clone(),
                settings: BTreeMap::new(),
            };
            fleet.register_launch_config(name, &id, data);
        }
    }

    if let Some(capacity) = &config.capacity {
        if capacity.fleet == pair.blue || capacity.fleet == pair.green {
            tracing::warn!(fleet = %capacity.fleet, "worker fleet is also a blue/green fleet, not reseeding it");
            return;
        }
        let bounds = CapacityBounds {
            min: capacity.min_workers,
            max: capacity.max_workers,
            desired: capacity.min_workers,
        };
        fleet.add_fleet(&capacity.fleet, bounds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetkeeper::gateway::InfrastructureGateway;
    use fleetkeeper::switch::ActiveEnvironmentResolver;
    use fleetkeeper::types::{Environment, FleetName};

    const CONFIG: &str = r#"
environments:
  blue: web-blue
  green: web-green
vertical:
  ladder: [small, medium, large]
capacity:
  fleet: workers
  min_workers: 1
  max_workers: 5
"#;

    #[tokio::test]
    async fn seeds_blue_active_and_green_dormant() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::from_yaml(CONFIG).unwrap();
        config.state_dir = dir.path().join(".fleetkeeper");

        let local = LocalFleet::open(&config, false).unwrap();
        let fleet = local.fleet();
        let pair = config.environments.clone();

        let active = ActiveEnvironmentResolver::new(fleet, &pair)
            .resolve()
            .await
            .unwrap();
        assert_eq!(active, Some(Environment::Blue));
        assert_eq!(fleet.bounds(&pair.green), Some(CapacityBounds::DORMANT));

        let blue = fleet.fleet_state(&pair.blue).await.unwrap();
        let launch = blue.launch_config.unwrap();
        let data = fleet.launch_config(&launch.id, launch.version).await.unwrap();
        assert_eq!(data.instance_class.as_str(), "small");

        let workers = fleet.bounds(&FleetName::new("workers").unwrap()).unwrap();
        assert_eq!((workers.min, workers.max, workers.desired), (1, 5, 1));
    }

    #[tokio::test]
    async fn reopens_saved_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::from_yaml(CONFIG).unwrap();
        config.state_dir = dir.path().to_path_buf();

        let local = LocalFleet::open(&config, false).unwrap();
        local.fleet().route_to(&config.environments.green);
        local.save().unwrap();

        let reopened = LocalFleet::open(&config, false).unwrap();
        assert!(reopened.fleet().target_set().is_empty());
    }

    #[tokio::test]
    async fn overlapping_runs_cannot_both_hold_the_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::from_yaml(CONFIG).unwrap();
        config.state_dir = dir.path().to_path_buf();

        let first = LocalFleet::open(&config, false).unwrap();
        assert!(LocalFleet::open(&config, false).is_err());

        first.fleet().route_to(&config.environments.green);
        first.save().unwrap();

        let second = LocalFleet::open(&config, false).unwrap();
        assert!(second.fleet().target_set().is_empty());
        second.save().unwrap();
    }
}
