// ABOUTME: Config scaffolding for new projects.
// ABOUTME: Creates fleetkeeper.yml template files.

use std::path::Path;

use crate::error::{Error, Result};
use crate::types::FleetName;

use super::CONFIG_FILENAME;

pub fn init_config(
    dir: &Path,
    blue: Option<&str>,
    green: Option<&str>,
    force: bool,
) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let blue = FleetName::new(blue.unwrap_or("app-blue"))
        .map_err(|e| Error::InvalidConfig(e.to_string()))?;
    let green = FleetName::new(green.unwrap_or("app-green"))
        .map_err(|e| Error::InvalidConfig(e.to_string()))?;
    if blue == green {
        return Err(Error::InvalidConfig(
            "blue and green must be different fleets".to_string(),
        ));
    }

    std::fs::write(&config_path, generate_template_yaml(&blue, &green))?;

    Ok(())
}

fn generate_template_yaml(blue: &FleetName, green: &FleetName) -> String {
    format!(
        r#"environments:
  blue: {blue}
  green: {green}

switch:
  poll_interval: 30s
  health_timeout: 10m

# Step the active fleet up or down an instance class based on utilisation.
# vertical:
#   ladder: [t3.small, t3.medium, t3.large, t3.xlarge]
#   cpu_scale_up: 75
#   cpu_scale_down: 30
#   memory_scale_up: 80
#   memory_scale_down: 40

# Size a worker fleet from build queue pressure.
# capacity:
#   fleet: build-workers
#   min_workers: 0
#   max_workers: 10
#   business_hours: "08:00-19:00"

cost:
  unit_price: 0.012
  on_demand_price: 0.0416
  monthly_budget: 100
"#
    )
}
