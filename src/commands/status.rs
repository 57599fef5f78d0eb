// ABOUTME: Status command implementation.
// ABOUTME: Shows the resolved active environment and each fleet's capacity and health.

use super::local_fleet::LocalFleet;
use fleetkeeper::config::Config;
use fleetkeeper::error::Result;
use fleetkeeper::gateway::{FleetState, InfrastructureGateway};
use fleetkeeper::output::Output;
use fleetkeeper::switch::ActiveEnvironmentResolver;
use fleetkeeper::types::{Environment, FleetName};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct StatusReport {
    active_environment: Option<Environment>,
    fleets: Vec<FleetSummary>,
}

#[derive(Debug, Serialize)]
struct FleetSummary {
    name: FleetName,
    role: &'static str,
    desired: u32,
    min: u32,
    max: u32,
    healthy: usize,
    instances: usize,
}

impl FleetSummary {
    fn new(role: &'static str, state: &FleetState) -> Self {
        Self {
            name: state.name.clone(),
            role,
            desired: state.desired_capacity,
            min: state.min_size,
            max: state.max_size,
            healthy: state.healthy_count(),
            instances: state.instances.len(),
        }
    }
}

pub async fn status(config: Config, output: Output) -> Result<()> {
    let local = LocalFleet::open(&config, false)?;
    let fleet = local.fleet();
    let pair = &config.environments;

    let active = ActiveEnvironmentResolver::new(fleet, pair).resolve().await?;
    let (blue, green) = futures::join!(fleet.fleet_state(&pair.blue), fleet.fleet_state(&pair.green));

    let mut fleets = vec![FleetSummary::new("blue", &blue?), FleetSummary::new("green", &green?)];
    if let Some(capacity) = &config.capacity {
        let workers = fleet.fleet_state(&capacity.fleet).await?;
        fleets.push(FleetSummary::new("workers", &workers));
    }
    local.save()?;

    for summary in &fleets {
        output.progress(&format!(
            "{:<6} {}: desired {} (min {}, max {}), {}/{} healthy",
            summary.role,
            summary.name,
            summary.desired,
            summary.min,
            summary.max,
            summary.healthy,
            summary.instances
        ));
    }

    let headline = match active {
        Some(env) => format!("Active environment: {env} ({})", pair.fleet(env)),
        None => "Active environment: unknown".to_string(),
    };
    output.result(
        &headline,
        &StatusReport {
            active_environment: active,
            fleets,
        },
    );
    Ok(())
}
