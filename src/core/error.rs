use thiserror::Error;

use crate::power::PowerError;
use crate::warp::WarpError;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Unknown department: {0}")]
    UnknownDepartment(String),

    #[error("Department '{0}' is offline")]
    DepartmentOffline(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Command confidence {confidence:.2} below threshold {threshold:.2} - please repeat")]
    LowConfidence { confidence: f32, threshold: f32 },

    #[error("Power allocation rejected: {0}")]
    Power(#[from] PowerError),

    #[error(transparent)]
    Warp(#[from] WarpError),

    /// Command refused because of the current state of a system
    #[error("{0}")]
    Rejected(String),

    /// A consumable ran out
    #[error("{0}")]
    Exhausted(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
