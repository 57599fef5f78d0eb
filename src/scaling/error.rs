// ABOUTME: Scaling error types with SNAFU pattern.
// ABOUTME: Separates configuration mistakes from gateway failures for programmatic handling.

use snafu::Snafu;

use crate::gateway::GatewayError;
use crate::types::{FleetName, InstanceClass};

/// Errors raised by the vertical and capacity advisors.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ScalingError {
    #[snafu(display("instance class {class} is not on the configured ladder"))]
    UnknownClass { class: InstanceClass },

    #[snafu(display("fleet {fleet} has no launch configuration"))]
    MissingLaunchConfig { fleet: FleetName },

    #[snafu(display("{step} failed: {source}"))]
    Gateway {
        step: &'static str,
        source: GatewayError,
    },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalingErrorKind {
    /// Current class missing from the ladder; fix the configuration.
    UnknownClass,
    /// Fleet cannot be scaled vertically without a launch configuration.
    MissingLaunchConfig,
    /// Gateway read or write failed; a later run may succeed.
    TransientGateway,
    /// Gateway refused the request or the resource does not exist.
    Gateway,
}

impl ScalingError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> ScalingErrorKind {
        match self {
            ScalingError::UnknownClass { .. } => ScalingErrorKind::UnknownClass,
            ScalingError::MissingLaunchConfig { .. } => ScalingErrorKind::MissingLaunchConfig,
            ScalingError::Gateway { source, .. } if source.is_transient() => {
                ScalingErrorKind::TransientGateway
            }
            ScalingError::Gateway { .. } => ScalingErrorKind::Gateway,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        let err = ScalingError::UnknownClass {
            class: InstanceClass::new("m5.huge").unwrap(),
        };
        assert_eq!(err.kind(), ScalingErrorKind::UnknownClass);
        assert_eq!(
            err.to_string(),
            "instance class m5.huge is not on the configured ladder"
        );

        let err = ScalingError::Gateway {
            step: "read fleet",
            source: GatewayError::read("ci-workers", "throttled"),
        };
        assert_eq!(err.kind(), ScalingErrorKind::TransientGateway);
    }
}
