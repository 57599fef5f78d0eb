// ABOUTME: Check command implementation.
// ABOUTME: Reports the active environment's health without changing anything.

use super::local_fleet::LocalFleet;
use fleetkeeper::config::Config;
use fleetkeeper::error::Result;
use fleetkeeper::notify::HookNotifier;
use fleetkeeper::output::Output;
use fleetkeeper::switch::{SwitchOrchestrator, SwitchRequest};

pub async fn check(config: Config, mut output: Output) -> Result<()> {
    output.start_timer();
    let local = LocalFleet::open(&config, false)?;
    let fleet = local.fleet();
    let notifier = HookNotifier::new(&config.state_dir);

    output.progress(&format!(
        "Checking {} / {}",
        config.environments.blue, config.environments.green
    ));

    let orchestrator = SwitchOrchestrator::new(
        fleet,
        &notifier,
        config.environments.clone(),
        config.switch.clone(),
    );
    let result = orchestrator.run(SwitchRequest::check()).await?;
    local.save()?;

    output.result(&result.message, &result);
    Ok(())
}
