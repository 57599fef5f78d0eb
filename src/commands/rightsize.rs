// ABOUTME: Rightsize command implementation.
// ABOUTME: Runs one vertical scaling cycle for the active blue/green fleet.

use super::local_fleet::LocalFleet;
use fleetkeeper::config::Config;
use fleetkeeper::error::{Error, Result};
use fleetkeeper::notify::HookNotifier;
use fleetkeeper::output::Output;
use fleetkeeper::scaling::{VerticalOutcome, VerticalScalingAdvisor};

pub async fn rightsize(config: Config, mut output: Output) -> Result<()> {
    let vertical = config
        .vertical
        .clone()
        .ok_or(Error::MissingSection("vertical"))?;

    output.start_timer();
    let local = LocalFleet::open(&config, false)?;
    let fleet = local.fleet();
    let notifier = HookNotifier::new(&config.state_dir);

    let advisor = VerticalScalingAdvisor::new(
        fleet,
        fleet,
        &notifier,
        config.environments.clone(),
        vertical,
    );
    let outcome = advisor.run().await?;
    local.save()?;

    if let VerticalOutcome::Failed { error, .. } = &outcome {
        return Err(Error::ScalingFailed(error.clone()));
    }
    output.result(&summary(&outcome), &outcome);
    Ok(())
}

fn summary(outcome: &VerticalOutcome) -> String {
    match outcome {
        VerticalOutcome::NoActiveFleet => "No active fleet found".to_string(),
        VerticalOutcome::NoData { fleet, class } => {
            format!("No utilisation data for {fleet} ({class}), nothing to do")
        }
        VerticalOutcome::Unchanged {
            fleet,
            class,
            cpu,
            memory,
        } => format!("{fleet} stays at {class} (CPU {cpu:.1}%, memory {memory:.1}%)"),
        VerticalOutcome::Scaled {
            fleet,
            from,
            to,
            version,
            ..
        } => format!("{fleet} scaled {from} -> {to} (launch configuration version {version})"),
        VerticalOutcome::Failed {
            fleet, from, to, ..
        } => format!("{fleet} failed to scale {from} -> {to}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetkeeper::types::{FleetName, InstanceClass};

    #[test]
    fn summarizes_scaled_outcome() {
        let outcome = VerticalOutcome::Scaled {
            fleet: FleetName::new("web-blue").unwrap(),
            from: InstanceClass::new("small").unwrap(),
            to: InstanceClass::new("medium").unwrap(),
            cpu: 90.0,
            memory: 10.0,
            version: 2,
        };
        assert_eq!(
            summary(&outcome),
            "web-blue scaled small -> medium (launch configuration version 2)"
        );
    }
}
