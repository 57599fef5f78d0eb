// ABOUTME: Collaborator interfaces the control loop drives: fleets, metrics, notifications, time.
// ABOUTME: Also hosts the in-memory fleet simulation used for local runs and tests.

mod clock;
mod error;
mod fleet;
pub mod memory;
mod metrics;
mod notify;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::GatewayError;
pub use fleet::{
    CapacityBounds, FleetState, InfrastructureGateway, InstanceHealth, InstanceRecord,
    LaunchConfigData, LaunchConfigRef, LaunchOverrides, LaunchVersion, RollingReplacement,
};
pub use memory::InMemoryFleet;
pub use metrics::{Metric, MetricsSource};
pub use notify::{NotificationSink, NotifyError, publish_or_warn};
