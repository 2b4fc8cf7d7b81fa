//! Error types for SenseKit

use crate::types::SensorKind;
use thiserror::Error;

/// Errors raised by registry and adapter operations
#[derive(Debug, Error)]
pub enum SensorError {
    #[error("Sensor {0} is already registered")]
    AlreadyRegistered(SensorKind),

    #[error("Sensor {0} is not registered")]
    NotRegistered(SensorKind),

    #[error("Sensor {0} is already sensing")]
    AlreadySensing(SensorKind),

    #[error("Sensor {0} is not sensing")]
    NotSensing(SensorKind),

    #[error("Sensor {0} is currently sensing")]
    CurrentlySensing(SensorKind),

    #[error("Invalid configuration for sensor {kind}: {reason}")]
    InvalidConfiguration { kind: SensorKind, reason: String },

    #[error("Sensor {kind} is unavailable: {reason}")]
    ResourceUnavailable { kind: SensorKind, reason: String },

    #[error("Unknown sensor kind: {0}")]
    UnknownSensorKind(String),

    #[error("Invalid platform event for sensor {kind}: {reason}")]
    InvalidEvent { kind: SensorKind, reason: String },

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl SensorError {
    /// Sensor the failing operation was addressed to, when known
    pub fn kind(&self) -> Option<SensorKind> {
        match self {
            SensorError::AlreadyRegistered(kind)
            | SensorError::NotRegistered(kind)
            | SensorError::AlreadySensing(kind)
            | SensorError::NotSensing(kind)
            | SensorError::CurrentlySensing(kind) => Some(*kind),
            SensorError::InvalidConfiguration { kind, .. }
            | SensorError::ResourceUnavailable { kind, .. }
            | SensorError::InvalidEvent { kind, .. } => Some(*kind),
            SensorError::UnknownSensorKind(_) | SensorError::JsonError(_) => None,
        }
    }
}
