// ABOUTME: Drives the blue/green switch protocol and the periodic health check.
// ABOUTME: Every terminal state is notified and written as a JSON audit line.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::SwitchConfig;
use crate::gateway::{InfrastructureGateway, NotificationSink, publish_or_warn};
use crate::notify::SWITCH_SUBJECT;
use crate::types::{Environment, EnvironmentPair};

use super::error::SwitchError;
use super::health::{HealthReport, HealthValidator};
use super::resolver::ActiveEnvironmentResolver;
use super::result::{SwitchAction, SwitchOutcome, SwitchRequest, SwitchResult};
use super::state::Healthy;
use super::switchover::Switchover;

/// Tracing target audit lines are written to.
pub const AUDIT_TARGET: &str = "fleetkeeper::audit";

#[derive(Serialize)]
struct AuditRecord<'r> {
    active_deployment: Option<Environment>,
    outcome: SwitchOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    health_status: Option<&'r HealthReport>,
    message: &'r str,
    timestamp: DateTime<Utc>,
}

pub struct SwitchOrchestrator<'a, G: ?Sized, N: ?Sized> {
    gateway: &'a G,
    notifier: &'a N,
    pair: EnvironmentPair,
    config: SwitchConfig,
}

impl<'a, G, N> SwitchOrchestrator<'a, G, N>
where
    G: InfrastructureGateway + ?Sized,
    N: NotificationSink + ?Sized,
{
    pub fn new(gateway: &'a G, notifier: &'a N, pair: EnvironmentPair, config: SwitchConfig) -> Self {
        Self {
            gateway,
            notifier,
            pair,
            config,
        }
    }

    /// Handle one invocation.
    ///
    /// # Errors
    ///
    /// Only `SwitchError::HealthTimeout` is returned; every other failure
    /// becomes a `Failed` or `RolledBack` result.
    pub async fn run(&self, request: SwitchRequest) -> Result<SwitchResult, SwitchError> {
        match request.action {
            SwitchAction::Check => Ok(self.health_check().await),
            SwitchAction::Switch => self.switch().await,
        }
    }

    /// Report the active environment's health. Never changes infrastructure.
    pub async fn health_check(&self) -> SwitchResult {
        let resolver = ActiveEnvironmentResolver::new(self.gateway, &self.pair);
        let (active, report) = match resolver.resolve().await {
            Ok(Some(env)) => {
                let validator = HealthValidator::new(self.gateway);
                (Some(env), validator.assess(self.pair.fleet(env)).await)
            }
            Ok(None) => (None, HealthReport::unknown()),
            Err(e) => (None, HealthReport::error(&e)),
        };

        let message = match active {
            Some(env) => format!(
                "Health check: {env} ({}) is {report}",
                self.pair.fleet(env)
            ),
            None => format!("Health check: {report}"),
        };
        let result =
            SwitchResult::new(SwitchOutcome::HealthCheckReport, active, message).with_health(report);
        self.report(&result).await;
        result
    }

    /// Run the full switch protocol.
    pub async fn switch(&self) -> Result<SwitchResult, SwitchError> {
        let resolver = ActiveEnvironmentResolver::new(self.gateway, &self.pair);
        let active = match resolver.resolve().await {
            Ok(active) => active,
            Err(e) => {
                let err = SwitchError::gateway("resolve active environment", e);
                return Ok(self.failed(None, &err).await);
            }
        };

        let planned = Switchover::plan(self.pair.clone(), active);
        let (old, new) = (planned.old(), planned.new_environment());
        tracing::info!(from = %old, to = %new, "starting switch");

        let scaled = match planned
            .scale_up_new(self.gateway, self.config.active_capacity)
            .await
        {
            Ok(next) => next,
            Err((_, e)) => return Ok(self.failed(active, &e).await),
        };

        let healthy = match scaled
            .await_healthy(
                self.gateway,
                self.config.poll_interval,
                self.config.health_timeout,
            )
            .await
        {
            Ok(next) => next,
            Err((_, e)) => {
                // Nothing was routed, so there is nothing to roll back.
                self.failed(active, &e).await;
                return Err(e);
            }
        };

        let validated = match healthy.validate(self.gateway).await {
            Ok(next) => next,
            Err((healthy, e)) => return Ok(self.roll_back(healthy, active, &e).await),
        };

        let switched = match validated.switch_traffic(self.gateway).await {
            Ok(next) => next,
            Err((_, e)) => return Ok(self.failed(active, &e).await),
        };

        let completed = match switched.scale_down_old(self.gateway).await {
            Ok(next) => next,
            Err((_, e)) => return Ok(self.failed(Some(new), &e).await),
        };

        let (old, new) = completed.finish();
        let result = SwitchResult::new(
            SwitchOutcome::Switched,
            Some(new),
            format!("Deployment switch completed: {old} -> {new}"),
        );
        self.report(&result).await;
        Ok(result)
    }

    async fn roll_back(
        &self,
        healthy: Switchover<Healthy>,
        active: Option<Environment>,
        reason: &SwitchError,
    ) -> SwitchResult {
        tracing::error!(error = %reason, "validation failed, rolling back");
        let report = healthy
            .rollback(self.gateway, self.config.active_capacity)
            .await;

        let mut errors = vec![reason.to_string()];
        let result = if report.is_clean() {
            SwitchResult::new(
                SwitchOutcome::RolledBack,
                active,
                "Deployment rolled back due to health check failures",
            )
        } else {
            errors.extend(report.errors.iter().cloned());
            SwitchResult::new(
                SwitchOutcome::Failed,
                active,
                format!("Rollback failed: {}", report.errors.join("; ")),
            )
        };
        let result = result.with_errors(errors);
        self.report(&result).await;
        result
    }

    async fn failed(&self, active: Option<Environment>, err: &SwitchError) -> SwitchResult {
        tracing::error!(error = %err, "switch failed");
        let result = SwitchResult::new(
            SwitchOutcome::Failed,
            active,
            format!("Deployment switch failed: {err}"),
        )
        .with_errors(vec![err.to_string()]);
        self.report(&result).await;
        result
    }

    /// Publish the result and write it to the audit log.
    async fn report(&self, result: &SwitchResult) {
        tracing::info!(
            outcome = %result.outcome,
            active = ?result.active_environment,
            "{}",
            result.message
        );
        audit(result);
        publish_or_warn(self.notifier, SWITCH_SUBJECT, &result.message).await;
    }
}

fn audit(result: &SwitchResult) {
    let record = AuditRecord {
        active_deployment: result.active_environment,
        outcome: result.outcome,
        health_status: result.health.as_ref(),
        message: &result.message,
        timestamp: result.timestamp,
    };
    match serde_json::to_string(&record) {
        Ok(line) => tracing::info!(target: AUDIT_TARGET, "{line}"),
        Err(e) => tracing::warn!(error = %e, "failed to serialize audit record"),
    }
}
