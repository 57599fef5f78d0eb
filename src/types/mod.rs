// ABOUTME: Type-safe identifiers and validated domain types.
// ABOUTME: Uses phantom types to prevent ID confusion at compile time.

mod environment;
mod fleet_name;
mod id;
mod instance_class;

pub use environment::{Environment, EnvironmentPair};
pub use fleet_name::{FleetName, FleetNameError};
pub use id::{Id, InstanceId, LaunchConfigId};
pub use instance_class::{InstanceClass, InstanceClassError, InstanceClassLadder, LadderError};
