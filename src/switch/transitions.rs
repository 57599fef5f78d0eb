// ABOUTME: State transition methods for the blue/green switch protocol.
// ABOUTME: Each method consumes self and returns the next state on success.

use std::marker::PhantomData;
use std::time::Duration;

use crate::gateway::{CapacityBounds, InfrastructureGateway};

use super::error::SwitchError;
use super::health::HealthValidator;
use super::state::{Completed, Healthy, Planned, ScaledUp, Switched, Validated};
use super::switchover::Switchover;
use crate::types::Environment;

/// Result type for transitions that may need rollback on failure.
pub type TransitionResult<T, S> = Result<Switchover<T>, (Switchover<S>, SwitchError)>;

/// What a rollback managed to undo.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RollbackReport {
    /// Old fleet had been scaled down and was restored to active capacity.
    pub restored_old: bool,
    /// New fleet was returned to dormant.
    pub retired_new: bool,
    /// Steps that failed; rollback continues past each one.
    pub errors: Vec<String>,
}

impl RollbackReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

// =============================================================================
// Internal Helpers
// =============================================================================

impl<S> Switchover<S> {
    fn transition<T>(self) -> Switchover<T> {
        Switchover {
            pair: self.pair,
            old: self.old,
            _state: PhantomData,
        }
    }

    /// Poll the new fleet until one instance is healthy. Read errors are
    /// logged and polled through.
    async fn poll_until_healthy<G: InfrastructureGateway + ?Sized>(
        &self,
        gateway: &G,
        interval: Duration,
    ) -> usize {
        let fleet = self.new_fleet();
        loop {
            match gateway.fleet_state(fleet).await {
                Ok(state) => {
                    let healthy = state.healthy_count();
                    if healthy > 0 {
                        tracing::info!(fleet = %fleet, healthy, "new fleet is healthy");
                        return healthy;
                    }
                    tracing::debug!(
                        fleet = %fleet,
                        instances = state.instances.len(),
                        "waiting for a healthy instance"
                    );
                }
                Err(e) => {
                    tracing::warn!(fleet = %fleet, error = %e, "health poll failed, retrying");
                }
            }
            tokio::time::sleep(interval).await;
        }
    }

    /// Restore the old fleet if it was scaled down, then retire the new one.
    async fn rollback_fleets<G: InfrastructureGateway + ?Sized>(
        self,
        gateway: &G,
        active: CapacityBounds,
    ) -> RollbackReport {
        let mut report = RollbackReport::default();
        let old_fleet = self.old_fleet();
        let new_fleet = self.new_fleet();
        tracing::info!(old = %old_fleet, new = %new_fleet, "rolling back switch");

        match gateway.fleet_state(old_fleet).await {
            Ok(state) if state.desired_capacity == 0 => {
                match gateway.set_capacity(old_fleet, active, false).await {
                    Ok(()) => report.restored_old = true,
                    Err(e) => report.errors.push(format!("restore {old_fleet}: {e}")),
                }
            }
            Ok(_) => {}
            Err(e) => report.errors.push(format!("read {old_fleet}: {e}")),
        }

        match gateway
            .set_capacity(new_fleet, CapacityBounds::DORMANT, false)
            .await
        {
            Ok(()) => report.retired_new = true,
            Err(e) => report.errors.push(format!("retire {new_fleet}: {e}")),
        }

        report
    }
}

// =============================================================================
// Planned -> ScaledUp
// =============================================================================

impl Switchover<Planned> {
    /// Bring the new fleet from dormant to `active` capacity.
    ///
    /// # Errors
    ///
    /// Returns `SwitchError::Gateway` if the capacity update fails.
    #[must_use = "switchover state must be used"]
    pub async fn scale_up_new<G: InfrastructureGateway + ?Sized>(
        self,
        gateway: &G,
        active: CapacityBounds,
    ) -> TransitionResult<ScaledUp, Planned> {
        tracing::info!(fleet = %self.new_fleet(), capacity = %active, "scaling up new fleet");
        match gateway.set_capacity(self.new_fleet(), active, false).await {
            Ok(()) => Ok(self.transition()),
            Err(e) => Err((self, SwitchError::gateway("scale up new fleet", e))),
        }
    }
}

// =============================================================================
// ScaledUp -> Healthy
// =============================================================================

impl Switchover<ScaledUp> {
    /// Wait for the first healthy instance of the new fleet.
    ///
    /// Polls every `interval` until `timeout` elapses. The poll is cut off
    /// by the timeout even mid-request.
    ///
    /// # Errors
    ///
    /// Returns `SwitchError::HealthTimeout` if no instance became healthy.
    #[must_use = "switchover state must be used"]
    pub async fn await_healthy<G: InfrastructureGateway + ?Sized>(
        self,
        gateway: &G,
        interval: Duration,
        timeout: Duration,
    ) -> TransitionResult<Healthy, ScaledUp> {
        let polled =
            tokio::time::timeout(timeout, self.poll_until_healthy(gateway, interval)).await;
        match polled {
            Ok(_) => Ok(self.transition()),
            Err(_elapsed) => {
                let fleet = self.new_fleet().clone();
                Err((
                    self,
                    SwitchError::HealthTimeout {
                        fleet,
                        waited: timeout,
                    },
                ))
            }
        }
    }
}

// =============================================================================
// Healthy -> Validated
// =============================================================================

impl Switchover<Healthy> {
    /// Re-check the switch gate on the new fleet.
    ///
    /// # Errors
    ///
    /// Returns `SwitchError::ValidationFailed` when no instance is healthy
    /// any more or the fleet cannot be read.
    #[must_use = "switchover state must be used"]
    pub async fn validate<G: InfrastructureGateway + ?Sized>(
        self,
        gateway: &G,
    ) -> TransitionResult<Validated, Healthy> {
        let validator = HealthValidator::new(gateway);
        let (healthy, total) = validator.safe_count(self.new_fleet()).await.unwrap_or((0, 0));
        if healthy > 0 {
            return Ok(self.transition());
        }
        let fleet = self.new_fleet().clone();
        Err((
            self,
            SwitchError::ValidationFailed {
                fleet,
                healthy,
                total,
            },
        ))
    }

    /// Undo the scale-up after a failed validation.
    ///
    /// Never fails; steps that could not be undone are listed in the report.
    pub async fn rollback<G: InfrastructureGateway + ?Sized>(
        self,
        gateway: &G,
        active: CapacityBounds,
    ) -> RollbackReport {
        self.rollback_fleets(gateway, active).await
    }
}

// =============================================================================
// Validated -> Switched
// =============================================================================

impl Switchover<Validated> {
    /// Route traffic to the new fleet's instances.
    ///
    /// # Errors
    ///
    /// Returns `SwitchError::Gateway` if the target set update fails.
    #[must_use = "switchover state must be used"]
    pub async fn switch_traffic<G: InfrastructureGateway + ?Sized>(
        self,
        gateway: &G,
    ) -> TransitionResult<Switched, Validated> {
        match gateway.set_target_set(self.new_fleet()).await {
            Ok(()) => {
                tracing::info!(fleet = %self.new_fleet(), "traffic switched");
                Ok(self.transition())
            }
            Err(e) => Err((self, SwitchError::gateway("switch traffic", e))),
        }
    }
}

// =============================================================================
// Switched -> Completed
// =============================================================================

impl Switchover<Switched> {
    /// Scale the old fleet down to dormant.
    ///
    /// # Errors
    ///
    /// Returns `SwitchError::Gateway` if the capacity update fails. Traffic
    /// already flows to the new fleet at that point.
    #[must_use = "switchover state must be used"]
    pub async fn scale_down_old<G: InfrastructureGateway + ?Sized>(
        self,
        gateway: &G,
    ) -> TransitionResult<Completed, Switched> {
        tracing::info!(fleet = %self.old_fleet(), "scaling down old fleet");
        match gateway
            .set_capacity(self.old_fleet(), CapacityBounds::DORMANT, false)
            .await
        {
            Ok(()) => Ok(self.transition()),
            Err(e) => Err((self, SwitchError::gateway("scale down old fleet", e))),
        }
    }
}

// =============================================================================
// Completed - Terminal State
// =============================================================================

impl Switchover<Completed> {
    /// Consume the switchover and return `(old, new)`.
    pub fn finish(self) -> (Environment, Environment) {
        (self.old, self.new_environment())
    }
}
