// ABOUTME: Notification sinks and the message texts the control loop publishes.
// ABOUTME: LogNotifier and HookNotifier for operators, MemoryNotifier for capturing messages in-process.

mod hook;
mod log;
mod memory;

pub use hook::{DEFAULT_HOOK_TIMEOUT, HookContext, HookNotifier, HookResult, NOTIFY_HOOK};
pub use log::LogNotifier;
pub use memory::{MemoryNotifier, Notification};

/// Subject used for every blue/green switch and health notification.
pub const SWITCH_SUBJECT: &str = "Blue/Green Deployment Alert";

/// Subject of the alert sent when the monthly cost nears the budget.
pub const COST_ALERT_SUBJECT: &str = "Cost Alert";

/// Subject of the alert sent when a capacity run fails.
pub const CAPACITY_ERROR_SUBJECT: &str = "Capacity Scaling Error";

/// Subject of a vertical scaling notification.
pub fn vertical_subject(from: &str, to: &str) -> String {
    format!("Vertical Scaling: {from} → {to}")
}
