// ABOUTME: Switch command implementation.
// ABOUTME: Runs the full blue/green switch protocol while holding the switch and state locks.

use super::local_fleet::LocalFleet;
use fleetkeeper::config::Config;
use fleetkeeper::error::{Error, Result};
use fleetkeeper::notify::HookNotifier;
use fleetkeeper::output::Output;
use fleetkeeper::switch::{SwitchLock, SwitchOrchestrator, SwitchOutcome, SwitchRequest};

/// Switch traffic to the standby environment.
///
/// A rollback is reported but is not an error; a failed switch or a health
/// timeout is.
pub async fn switch(config: Config, force: bool, mut output: Output) -> Result<()> {
    output.start_timer();
    let lock = SwitchLock::acquire(&config.state_dir, &config.environments, force)?;
    let local = LocalFleet::open(&config, force)?;
    let fleet = local.fleet();
    let notifier = HookNotifier::new(&config.state_dir);

    output.progress(&format!(
        "Switching {} / {} (timeout {}s)",
        config.environments.blue,
        config.environments.green,
        config.switch.health_timeout.as_secs()
    ));

    let orchestrator = SwitchOrchestrator::new(
        fleet,
        &notifier,
        config.environments.clone(),
        config.switch.clone(),
    );
    let outcome = orchestrator.run(SwitchRequest::switch()).await;

    // Whatever happened to the fleets happened; keep the state file in step.
    local.save()?;
    lock.release()?;

    let result = outcome?;
    match result.outcome {
        SwitchOutcome::Failed => Err(Error::SwitchFailed(result.message)),
        SwitchOutcome::RolledBack => {
            output.warning(&result.message);
            output.result(&result.message, &result);
            Ok(())
        }
        SwitchOutcome::Switched | SwitchOutcome::HealthCheckReport => {
            output.result(&result.message, &result);
            Ok(())
        }
    }
}
