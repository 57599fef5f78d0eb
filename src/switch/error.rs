// ABOUTME: Error types for the blue/green switch protocol.
// ABOUTME: Only HealthTimeout escapes the orchestrator; the rest become failed results.

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::gateway::GatewayError;
use crate::types::FleetName;

/// Errors that can occur during switch transitions.
#[derive(Debug, thiserror::Error)]
pub enum SwitchError {
    /// No instance of the new fleet became healthy in time.
    #[error("no healthy instance in {fleet} after {} seconds", waited.as_secs())]
    HealthTimeout { fleet: FleetName, waited: Duration },

    /// The new fleet came up but is not safe to route traffic to.
    #[error("{fleet} failed validation: {healthy} of {total} instances healthy")]
    ValidationFailed {
        fleet: FleetName,
        healthy: usize,
        total: usize,
    },

    /// A gateway call made by one of the protocol steps failed.
    #[error("{step} failed: {source}")]
    Gateway {
        step: &'static str,
        #[source]
        source: GatewayError,
    },

    /// Another run holds the lock (a switch of the same pair, or any state update).
    #[error("lock held by {holder} (pid {pid}) since {started_at}")]
    LockHeld {
        holder: String,
        pid: u32,
        started_at: DateTime<Utc>,
    },

    #[error("switch lock error: {0}")]
    Lock(String),
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchErrorKind {
    HealthTimeout,
    ValidationFailed,
    /// Gateway failure that may succeed on retry.
    TransientGateway,
    /// Gateway failure that will not go away by retrying.
    Gateway,
    LockHeld,
    Lock,
}

impl SwitchError {
    pub(crate) fn gateway(step: &'static str, source: GatewayError) -> Self {
        SwitchError::Gateway { step, source }
    }

    pub(crate) fn lock_error(message: impl Into<String>) -> Self {
        SwitchError::Lock(message.into())
    }

    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> SwitchErrorKind {
        match self {
            SwitchError::HealthTimeout { .. } => SwitchErrorKind::HealthTimeout,
            SwitchError::ValidationFailed { .. } => SwitchErrorKind::ValidationFailed,
            SwitchError::Gateway { source, .. } if source.is_transient() => {
                SwitchErrorKind::TransientGateway
            }
            SwitchError::Gateway { .. } => SwitchErrorKind::Gateway,
            SwitchError::LockHeld { .. } => SwitchErrorKind::LockHeld,
            SwitchError::Lock(_) => SwitchErrorKind::Lock,
        }
    }
}
