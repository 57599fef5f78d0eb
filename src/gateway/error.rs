// ABOUTME: Error type shared by all infrastructure and metrics collaborators.
// ABOUTME: Distinguishes missing resources from transient read/write failures.

/// Errors returned by gateway and metrics calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("fleet not found: {0}")]
    FleetNotFound(String),

    #[error("launch configuration not found: {0}")]
    LaunchConfigNotFound(String),

    #[error("failed to read {resource}: {message}")]
    Read { resource: String, message: String },

    #[error("failed to update {resource}: {message}")]
    Write { resource: String, message: String },

    #[error("request rejected: {0}")]
    Rejected(String),
}

impl GatewayError {
    pub fn read(resource: impl Into<String>, message: impl Into<String>) -> Self {
        GatewayError::Read {
            resource: resource.into(),
            message: message.into(),
        }
    }

    pub fn write(resource: impl Into<String>, message: impl Into<String>) -> Self {
        GatewayError::Write {
            resource: resource.into(),
            message: message.into(),
        }
    }

    /// Whether retrying the same call could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, GatewayError::Read { .. } | GatewayError::Write { .. })
    }
}
