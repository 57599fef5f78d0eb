// ABOUTME: Validated fleet (auto-scaling group) names.
// ABOUTME: Rejects empty, oversized, and whitespace-containing names.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FleetNameError {
    #[error("fleet name cannot be empty")]
    Empty,

    #[error("fleet name exceeds maximum length of 255 characters")]
    TooLong,

    #[error("invalid character in fleet name: '{0}'")]
    InvalidChar(char),
}

/// Name of a fleet as known to the infrastructure gateway.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FleetName(String);

impl FleetName {
    pub fn new(value: &str) -> Result<Self, FleetNameError> {
        if value.is_empty() {
            return Err(FleetNameError::Empty);
        }

        if value.len() > 255 {
            return Err(FleetNameError::TooLong);
        }

        for c in value.chars() {
            if c.is_whitespace() || c.is_control() || c == '/' {
                return Err(FleetNameError::InvalidChar(c));
            }
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FleetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for FleetName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FleetName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        FleetName::new(&s).map_err(serde::de::Error::custom)
    }
}
