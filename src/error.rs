// ABOUTME: Application-wide error types for fleetkeeper.
// ABOUTME: Uses thiserror for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

use crate::gateway::GatewayError;
use crate::scaling::ScalingError;
use crate::switch::SwitchError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("configuration has no `{0}` section")]
    MissingSection(&'static str),

    #[error("switch failed: {0}")]
    SwitchFailed(String),

    #[error("scaling failed: {0}")]
    ScalingFailed(String),

    #[error(transparent)]
    Switch(#[from] SwitchError),

    #[error(transparent)]
    Scaling(#[from] ScalingError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
