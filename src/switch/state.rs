// ABOUTME: Switchover state marker types for the type state pattern.
// ABOUTME: Zero-sized types enforce the order of switch steps at compile time.

/// Initial state: active environment resolved, nothing changed yet.
/// Available actions: `scale_up_new()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Planned;

/// New fleet asked to run at active capacity.
/// Available actions: `await_healthy()`
#[derive(Debug, Clone, Copy, Default)]
pub struct ScaledUp;

/// At least one instance of the new fleet reported healthy.
/// Available actions: `validate()`, `rollback()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Healthy;

/// New fleet passed the switch gate.
/// Available actions: `switch_traffic()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Validated;

/// Traffic routed to the new fleet.
/// Available actions: `scale_down_old()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Switched;

/// Old fleet scaled to dormant.
/// Available actions: `finish()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Completed;
