// ABOUTME: Request and result records for orchestrator invocations.
// ABOUTME: Results are returned, published as notifications, and written as audit lines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::health::HealthReport;
use crate::types::Environment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchAction {
    /// Report the active environment's health without changing anything.
    Check,
    /// Run the full switch protocol.
    Switch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchRequest {
    pub action: SwitchAction,
}

impl SwitchRequest {
    pub fn check() -> Self {
        Self {
            action: SwitchAction::Check,
        }
    }

    pub fn switch() -> Self {
        Self {
            action: SwitchAction::Switch,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchOutcome {
    HealthCheckReport,
    Switched,
    RolledBack,
    Failed,
}

impl fmt::Display for SwitchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SwitchOutcome::HealthCheckReport => "health_check_report",
            SwitchOutcome::Switched => "switched",
            SwitchOutcome::RolledBack => "rolled_back",
            SwitchOutcome::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwitchResult {
    pub outcome: SwitchOutcome,

    /// Environment serving traffic once the invocation finished, if known.
    pub active_environment: Option<Environment>,

    /// Human-readable summary, also used as the notification text.
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<HealthReport>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,

    pub timestamp: DateTime<Utc>,
}

impl SwitchResult {
    pub fn new(
        outcome: SwitchOutcome,
        active_environment: Option<Environment>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            outcome,
            active_environment,
            message: message.into(),
            health: None,
            errors: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_health(mut self, report: HealthReport) -> Self {
        self.health = Some(report);
        self
    }

    pub fn with_errors(mut self, errors: Vec<String>) -> Self {
        self.errors = errors;
        self
    }

    pub fn is_success(&self) -> bool {
        matches!(
            self.outcome,
            SwitchOutcome::HealthCheckReport | SwitchOutcome::Switched
        )
    }
}
