// ABOUTME: Blue/green switching using the type state pattern.
// ABOUTME: Resolver, health validator, switchover states, orchestrator and single-flight lock.

mod error;
mod health;
mod lock;
mod orchestrator;
mod resolver;
mod result;
mod state;
mod switchover;
mod transitions;

pub use error::{SwitchError, SwitchErrorKind};
pub use health::{HealthReport, HealthStatus, HealthValidator};
pub use lock::{LockInfo, STATE_LOCK_SCOPE, SwitchLock};
pub use orchestrator::{AUDIT_TARGET, SwitchOrchestrator};
pub use resolver::{ActiveEnvironmentResolver, resolve_from};
pub use result::{SwitchAction, SwitchOutcome, SwitchRequest, SwitchResult};
pub use state::{Completed, Healthy, Planned, ScaledUp, Switched, Validated};
pub use switchover::Switchover;
pub use transitions::{RollbackReport, TransitionResult};
