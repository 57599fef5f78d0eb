// ABOUTME: Init command implementation.
// ABOUTME: Writes a template fleetkeeper.yml into the working directory.

use fleetkeeper::config::{CONFIG_FILENAME, init_config};
use fleetkeeper::error::Result;
use fleetkeeper::output::Output;
use std::path::Path;

pub fn init(
    dir: &Path,
    blue: Option<&str>,
    green: Option<&str>,
    force: bool,
    output: Output,
) -> Result<()> {
    init_config(dir, blue, green, force)?;
    output.success(&format!("Created {CONFIG_FILENAME}"));
    Ok(())
}
