// ABOUTME: Command module aggregator for the fleetkeeper CLI.
// ABOUTME: Re-exports the init, check, switch, rightsize, capacity, and status handlers.

mod capacity;
mod check;
mod init;
mod local_fleet;
mod rightsize;
mod status;
mod switch;

pub use capacity::capacity;
pub use check::check;
pub use init::init;
pub use rightsize::rightsize;
pub use status::status;
pub use switch::switch;
