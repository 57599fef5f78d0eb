// ABOUTME: Library root for fleetkeeper - exposes the control loop for the binary and tests.
// ABOUTME: The main binary is in main.rs; command handlers live in commands/.

pub mod config;
pub mod error;
pub mod gateway;
pub mod notify;
pub mod output;
pub mod scaling;
pub mod switch;
pub mod types;
