// ABOUTME: Blue/green environment identity and the fleet pair backing it.
// ABOUTME: Maps each environment to the fleet name the gateway knows it by.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::FleetName;

/// One half of a blue/green pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Blue,
    Green,
}

impl Environment {
    /// The other half of the pair.
    pub fn opposite(self) -> Self {
        match self {
            Environment::Blue => Environment::Green,
            Environment::Green => Environment::Blue,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Environment::Blue => "blue",
            Environment::Green => "green",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The two fleets making up a blue/green deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentPair {
    pub blue: FleetName,
    pub green: FleetName,
}

impl EnvironmentPair {
    pub fn new(blue: FleetName, green: FleetName) -> Self {
        Self { blue, green }
    }

    /// Fleet backing the given environment.
    pub fn fleet(&self, env: Environment) -> &FleetName {
        match env {
            Environment::Blue => &self.blue,
            Environment::Green => &self.green,
        }
    }

    /// Key identifying this pair, used for single-flight locking.
    pub fn key(&self) -> String {
        format!("{}-{}", self.blue, self.green)
    }
}
