// ABOUTME: Capacity command implementation.
// ABOUTME: Runs one worker capacity cycle and prints the decision and its cost.

use super::local_fleet::LocalFleet;
use fleetkeeper::config::Config;
use fleetkeeper::error::{Error, Result};
use fleetkeeper::gateway::SystemClock;
use fleetkeeper::notify::HookNotifier;
use fleetkeeper::output::Output;
use fleetkeeper::scaling::CapacityScalingAdvisor;

pub async fn capacity(config: Config, mut output: Output) -> Result<()> {
    let capacity = config
        .capacity
        .clone()
        .ok_or(Error::MissingSection("capacity"))?;

    output.start_timer();
    let local = LocalFleet::open(&config, false)?;
    let fleet = local.fleet();
    let notifier = HookNotifier::new(&config.state_dir);

    let advisor = CapacityScalingAdvisor::new(
        fleet,
        fleet,
        &notifier,
        &SystemClock,
        capacity,
        config.cost,
    );
    let report = advisor.run().await?;
    local.save()?;

    if let Some(error) = &report.cost_impact.error {
        return Err(Error::ScalingFailed(error.clone()));
    }

    let workload = &report.workload;
    output.progress(&format!(
        "Queue: {} jobs, {} active / {} idle executors{}",
        workload.queue_length,
        workload.active_executors,
        workload.idle_executors,
        if report.decision.is_off_hours {
            " (off-hours)"
        } else {
            ""
        }
    ));
    output.progress(&format!(
        "Cost: ${:.2}/month at {} workers, saving ${:.2} ({:.1}%) against on-demand",
        report.cost.monthly_cost,
        report.cost.capacity,
        report.cost.monthly_savings,
        report.cost.savings_percent
    ));
    if report.budget.alert {
        output.warning(&format!(
            "monthly cost is {:.1}% of the ${:.2} budget",
            report.budget.usage_percent, report.budget.budget
        ));
    }

    let decision = &report.decision;
    output.result(
        &format!(
            "{}: {} {} -> {} ({}), monthly change ${:.2}",
            report.fleet,
            decision.action,
            decision.current_capacity,
            decision.target_capacity,
            decision.reason,
            report.cost_impact.monthly_change
        ),
        &report,
    );
    Ok(())
}
