// ABOUTME: Horizontal capacity advisor for the build worker fleet.
// ABOUTME: Sizes from queue pressure and idle executors, biased to zero off-hours.

use serde::Serialize;
use snafu::ResultExt;
use std::fmt;

use crate::config::{CapacityConfig, CostConfig};
use crate::gateway::{
    Clock, InfrastructureGateway, Metric, MetricsSource, NotificationSink, publish_or_warn,
};
use crate::notify::{CAPACITY_ERROR_SUBJECT, COST_ALERT_SUBJECT};
use crate::types::FleetName;

use super::cost::{BudgetStatus, CostImpact, CostModel, CostReport};
use super::error::{GatewaySnafu, ScalingError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalingAction {
    ScaleUp,
    ScaleDown,
    NoChange,
}

impl fmt::Display for ScalingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScalingAction::ScaleUp => "scale_up",
            ScalingAction::ScaleDown => "scale_down",
            ScalingAction::NoChange => "no_change",
        };
        f.write_str(s)
    }
}

/// Build system load at the time of the decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WorkloadSnapshot {
    pub queue_length: u32,
    pub active_executors: u32,
    pub idle_executors: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScalingDecision {
    pub current_capacity: u32,
    pub target_capacity: u32,
    pub action: ScalingAction,
    pub reason: String,
    pub is_off_hours: bool,
}

impl ScalingDecision {
    pub fn changes_capacity(&self) -> bool {
        self.current_capacity != self.target_capacity
    }
}

/// Bounds and thresholds the decision rules use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityPolicy {
    pub min_workers: u32,
    pub max_workers: u32,
    pub queue_threshold: u32,
    pub jobs_per_worker: u32,
    pub idle_threshold: u32,
}

impl Default for CapacityPolicy {
    fn default() -> Self {
        Self {
            min_workers: 0,
            max_workers: 10,
            queue_threshold: 3,
            jobs_per_worker: 2,
            idle_threshold: 2,
        }
    }
}

impl From<&CapacityConfig> for CapacityPolicy {
    fn from(config: &CapacityConfig) -> Self {
        Self {
            min_workers: config.min_workers,
            max_workers: config.max_workers,
            queue_threshold: config.queue_threshold,
            jobs_per_worker: config.jobs_per_worker,
            idle_threshold: config.idle_threshold,
        }
    }
}

/// Target worker count. Rules are tried in order and the first match wins:
///
/// 1. queue above threshold: grow by `ceil(queue / jobs_per_worker)`, capped at max
/// 2. off-hours with an empty queue and no busy executor: drop to min
/// 3. empty queue, too many idle executors, more than one worker: shrink by one
/// 4. otherwise keep the current size
///
/// The action names the rule that matched, so an off-hours drop reports
/// `ScaleDown` even when the fleet is already at its minimum.
pub fn decide(
    policy: &CapacityPolicy,
    current: u32,
    workload: WorkloadSnapshot,
    is_off_hours: bool,
) -> ScalingDecision {
    let WorkloadSnapshot {
        queue_length,
        active_executors,
        idle_executors,
    } = workload;

    let (target, action, reason) = if queue_length > policy.queue_threshold {
        let needed = queue_length.div_ceil(policy.jobs_per_worker.max(1));
        (
            current.saturating_add(needed).min(policy.max_workers),
            ScalingAction::ScaleUp,
            format!("Queue backlog: {queue_length} jobs"),
        )
    } else if is_off_hours && queue_length == 0 && active_executors == 0 {
        (
            policy.min_workers,
            ScalingAction::ScaleDown,
            "Off-hours with no activity".to_string(),
        )
    } else if queue_length == 0 && idle_executors > policy.idle_threshold && current > 1 {
        (
            current.saturating_sub(1).max(policy.min_workers),
            ScalingAction::ScaleDown,
            format!("Excess idle workers: {idle_executors}"),
        )
    } else {
        (current, ScalingAction::NoChange, "Optimal capacity".to_string())
    };

    ScalingDecision {
        current_capacity: current,
        target_capacity: target,
        action,
        reason,
        is_off_hours,
    }
}

/// Everything a capacity run produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapacityReport {
    pub fleet: FleetName,
    pub workload: WorkloadSnapshot,
    pub decision: ScalingDecision,
    pub cost_impact: CostImpact,
    /// Cost at the capacity the run started from.
    pub cost: CostReport,
    pub budget: BudgetStatus,
}

pub struct CapacityScalingAdvisor<'a, G: ?Sized, M: ?Sized, N: ?Sized, C: ?Sized> {
    gateway: &'a G,
    metrics: &'a M,
    notifier: &'a N,
    clock: &'a C,
    config: CapacityConfig,
    cost: CostModel,
}

impl<'a, G, M, N, C> CapacityScalingAdvisor<'a, G, M, N, C>
where
    G: InfrastructureGateway + ?Sized,
    M: MetricsSource + ?Sized,
    N: NotificationSink + ?Sized,
    C: Clock + ?Sized,
{
    pub fn new(
        gateway: &'a G,
        metrics: &'a M,
        notifier: &'a N,
        clock: &'a C,
        config: CapacityConfig,
        cost: CostConfig,
    ) -> Self {
        Self {
            gateway,
            metrics,
            notifier,
            clock,
            config,
            cost: CostModel::new(cost),
        }
    }

    /// One capacity cycle: read, decide, apply, report.
    ///
    /// # Errors
    ///
    /// Only when the fleet itself cannot be read. A failed capacity update
    /// is recorded in the report's cost impact and notified.
    pub async fn run(&self) -> Result<CapacityReport, ScalingError> {
        let fleet = &self.config.fleet;
        let state = match self
            .gateway
            .fleet_state(fleet)
            .await
            .context(GatewaySnafu { step: "read fleet" })
        {
            Ok(state) => state,
            Err(e) => {
                publish_or_warn(
                    self.notifier,
                    CAPACITY_ERROR_SUBJECT,
                    &format!("Capacity scaling error for {fleet}:\n\n{e}"),
                )
                .await;
                return Err(e);
            }
        };
        let current = state.desired_capacity;

        let workload = self.workload(fleet).await;
        let is_off_hours = self.config.business_hours.is_off_hours(self.clock.now());
        let decision = decide(
            &CapacityPolicy::from(&self.config),
            current,
            workload,
            is_off_hours,
        );
        tracing::info!(
            fleet = %fleet,
            current,
            target = decision.target_capacity,
            action = %decision.action,
            reason = %decision.reason,
            "capacity decision"
        );

        let cost_impact = self.execute(fleet, &decision).await;
        let cost = self.cost.report(current);
        let budget = self.cost.budget_status(&cost);
        if budget.alert {
            self.alert_budget(fleet, &cost, &budget).await;
        }

        Ok(CapacityReport {
            fleet: fleet.clone(),
            workload,
            decision,
            cost_impact,
            cost,
            budget,
        })
    }

    /// Missing or unreadable samples count as zero.
    async fn workload(&self, fleet: &FleetName) -> WorkloadSnapshot {
        WorkloadSnapshot {
            queue_length: self.count(fleet, Metric::QueueLength).await,
            active_executors: self.count(fleet, Metric::ActiveExecutors).await,
            idle_executors: self.count(fleet, Metric::IdleExecutors).await,
        }
    }

    async fn count(&self, fleet: &FleetName, metric: Metric) -> u32 {
        match self
            .metrics
            .utilization(fleet, metric, self.config.metrics_window)
            .await
        {
            Ok(Some(value)) if value.is_finite() && value > 0.0 => value.round() as u32,
            Ok(_) => 0,
            Err(e) => {
                tracing::warn!(fleet = %fleet, %metric, error = %e, "metrics read failed");
                0
            }
        }
    }

    async fn execute(&self, fleet: &FleetName, decision: &ScalingDecision) -> CostImpact {
        let current = decision.current_capacity;
        let target = decision.target_capacity;
        let change = i64::from(target) - i64::from(current);

        if !decision.changes_capacity() {
            tracing::info!(fleet = %fleet, current, "no scaling needed");
            return CostImpact::none(change);
        }

        match self.gateway.set_desired_capacity(fleet, target, true).await {
            Ok(()) => {
                let impact = self.cost.impact(current, target);
                tracing::info!(
                    fleet = %fleet,
                    from = current,
                    to = target,
                    daily_change = impact.daily_change,
                    monthly_change = impact.monthly_change,
                    "scaled worker fleet"
                );
                impact
            }
            Err(e) => {
                tracing::error!(fleet = %fleet, error = %e, "failed to apply capacity");
                publish_or_warn(
                    self.notifier,
                    CAPACITY_ERROR_SUBJECT,
                    &format!("Capacity scaling error for {fleet}:\n\n{e}"),
                )
                .await;
                CostImpact::failed(change, e.to_string())
            }
        }
    }

    async fn alert_budget(&self, fleet: &FleetName, cost: &CostReport, budget: &BudgetStatus) {
        let message = format!(
            "Cost Alert - {fleet}\n\n\
             Current monthly cost: ${:.2}\n\
             Budget limit: ${:.2}\n\
             Usage: {:.1}% of budget\n\n\
             Current capacity: {} workers\n\
             Savings vs on-demand: {:.1}%\n\n\
             Action required: review scaling policies or increase the budget.",
            budget.monthly_cost, budget.budget, budget.usage_percent, cost.capacity, cost.savings_percent
        );
        tracing::warn!(fleet = %fleet, usage_percent = budget.usage_percent, "budget alert");
        publish_or_warn(self.notifier, COST_ALERT_SUBJECT, &message).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workload(queue_length: u32, active_executors: u32, idle_executors: u32) -> WorkloadSnapshot {
        WorkloadSnapshot {
            queue_length,
            active_executors,
            idle_executors,
        }
    }

    #[test]
    fn backlog_scales_up_by_half_the_queue_rounded_up() {
        let decision = decide(&CapacityPolicy::default(), 1, workload(5, 1, 0), false);
        assert_eq!(decision.target_capacity, 4);
        assert_eq!(decision.action, ScalingAction::ScaleUp);
        assert_eq!(decision.reason, "Queue backlog: 5 jobs");
    }

    #[test]
    fn scale_up_is_capped() {
        let decision = decide(&CapacityPolicy::default(), 8, workload(9, 8, 0), false);
        assert_eq!(decision.target_capacity, 10);
    }

    #[test]
    fn queue_at_threshold_does_not_scale_up() {
        let decision = decide(&CapacityPolicy::default(), 2, workload(3, 2, 0), false);
        assert_eq!(decision.action, ScalingAction::NoChange);
        assert_eq!(decision.target_capacity, 2);
    }

    #[test]
    fn off_hours_idle_drops_to_minimum() {
        let decision = decide(&CapacityPolicy::default(), 3, workload(0, 0, 3), true);
        assert_eq!(decision.target_capacity, 0);
        assert_eq!(decision.action, ScalingAction::ScaleDown);
        assert_eq!(decision.reason, "Off-hours with no activity");
    }

    #[test]
    fn backlog_wins_over_off_hours() {
        let decision = decide(&CapacityPolicy::default(), 0, workload(4, 0, 0), true);
        assert_eq!(decision.action, ScalingAction::ScaleUp);
        assert_eq!(decision.target_capacity, 2);
    }

    #[test]
    fn excess_idle_removes_one_worker() {
        let decision = decide(&CapacityPolicy::default(), 2, workload(0, 1, 3), false);
        assert_eq!(decision.target_capacity, 1);
        assert_eq!(decision.action, ScalingAction::ScaleDown);
    }

    #[test]
    fn last_worker_is_kept_during_business_hours() {
        let decision = decide(&CapacityPolicy::default(), 1, workload(0, 0, 3), false);
        assert_eq!(decision.action, ScalingAction::NoChange);
        assert!(!decision.changes_capacity());
    }

    #[test]
    fn idle_scale_down_respects_minimum() {
        let policy = CapacityPolicy {
            min_workers: 2,
            ..CapacityPolicy::default()
        };
        let decision = decide(&policy, 2, workload(0, 0, 5), false);
        assert_eq!(decision.target_capacity, 2);
    }
}
