//! Core types shared by the registry, adapters and drivers
//!
//! This module defines the closed set of sensor identities, the adapter state
//! machine states and the runtime permissions a sensor may depend on.

use crate::error::SensorError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identity of a sensor exposed by the library
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    Accelerometer,
    Gravity,
    LinearAcceleration,
    Gyroscope,
    Rotation,
    Magnetometer,
    AmbientTemperature,
    StepDetector,
    StepCounter,
    Light,
    Location,
    Activity,
    Battery,
    ScreenStatus,
    AudioRecorder,
    AudioLevel,
    Bluetooth,
    Humidity,
    AirPressure,
}

impl SensorKind {
    /// Every sensor kind, in declaration order
    pub const ALL: [SensorKind; 19] = [
        SensorKind::Accelerometer,
        SensorKind::Gravity,
        SensorKind::LinearAcceleration,
        SensorKind::Gyroscope,
        SensorKind::Rotation,
        SensorKind::Magnetometer,
        SensorKind::AmbientTemperature,
        SensorKind::StepDetector,
        SensorKind::StepCounter,
        SensorKind::Light,
        SensorKind::Location,
        SensorKind::Activity,
        SensorKind::Battery,
        SensorKind::ScreenStatus,
        SensorKind::AudioRecorder,
        SensorKind::AudioLevel,
        SensorKind::Bluetooth,
        SensorKind::Humidity,
        SensorKind::AirPressure,
    ];

    /// Machine-readable identifier, matching the serde representation
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorKind::Accelerometer => "accelerometer",
            SensorKind::Gravity => "gravity",
            SensorKind::LinearAcceleration => "linear_acceleration",
            SensorKind::Gyroscope => "gyroscope",
            SensorKind::Rotation => "rotation",
            SensorKind::Magnetometer => "magnetometer",
            SensorKind::AmbientTemperature => "ambient_temperature",
            SensorKind::StepDetector => "step_detector",
            SensorKind::StepCounter => "step_counter",
            SensorKind::Light => "light",
            SensorKind::Location => "location",
            SensorKind::Activity => "activity",
            SensorKind::Battery => "battery",
            SensorKind::ScreenStatus => "screen_status",
            SensorKind::AudioRecorder => "audio_recorder",
            SensorKind::AudioLevel => "audio_level",
            SensorKind::Bluetooth => "bluetooth",
            SensorKind::Humidity => "humidity",
            SensorKind::AirPressure => "air_pressure",
        }
    }

    /// Human-readable name used in logs and error messages
    pub fn display_name(&self) -> &'static str {
        match self {
            SensorKind::Accelerometer => "Accelerometer",
            SensorKind::Gravity => "Gravity",
            SensorKind::LinearAcceleration => "Linear Acceleration",
            SensorKind::Gyroscope => "Gyroscope",
            SensorKind::Rotation => "Rotation",
            SensorKind::Magnetometer => "Magnetometer",
            SensorKind::AmbientTemperature => "Ambient Temperature",
            SensorKind::StepDetector => "Step Detector",
            SensorKind::StepCounter => "Step Counter",
            SensorKind::Light => "Light",
            SensorKind::Location => "Location",
            SensorKind::Activity => "Activity",
            SensorKind::Battery => "Battery",
            SensorKind::ScreenStatus => "Screen Status",
            SensorKind::AudioRecorder => "Audio Recorder",
            SensorKind::AudioLevel => "Audio Level",
            SensorKind::Bluetooth => "Bluetooth",
            SensorKind::Humidity => "Humidity",
            SensorKind::AirPressure => "Air Pressure",
        }
    }

    /// Family of platform service backing this sensor
    pub fn family(&self) -> SensorFamily {
        match self {
            SensorKind::Accelerometer
            | SensorKind::Gravity
            | SensorKind::LinearAcceleration
            | SensorKind::Gyroscope
            | SensorKind::Rotation
            | SensorKind::Magnetometer => SensorFamily::Motion,
            SensorKind::AmbientTemperature
            | SensorKind::Light
            | SensorKind::Humidity
            | SensorKind::AirPressure => SensorFamily::Environment,
            SensorKind::StepDetector | SensorKind::StepCounter => SensorFamily::Step,
            SensorKind::Location => SensorFamily::Location,
            SensorKind::Activity => SensorFamily::Activity,
            SensorKind::Battery | SensorKind::ScreenStatus => SensorFamily::Broadcast,
            SensorKind::AudioRecorder | SensorKind::AudioLevel => SensorFamily::Audio,
            SensorKind::Bluetooth => SensorFamily::Bluetooth,
        }
    }

    /// Runtime permissions the host must grant before sensing can start
    pub fn required_permissions(&self) -> &'static [Permission] {
        match self {
            SensorKind::Location => &[Permission::Location],
            SensorKind::Activity | SensorKind::StepDetector | SensorKind::StepCounter => {
                &[Permission::ActivityRecognition]
            }
            SensorKind::AudioRecorder | SensorKind::AudioLevel => &[Permission::RecordAudio],
            SensorKind::Bluetooth => &[Permission::Bluetooth, Permission::Location],
            _ => &[],
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for SensorKind {
    type Err = SensorError;

    /// Accepts the snake_case identifier, the display name or the
    /// upper-case constant form ("LINEAR_ACCELERATION"), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        SensorKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| SensorError::UnknownSensorKind(s.to_string()))
    }
}

/// Platform service family a sensor belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorFamily {
    /// Motion sensors delivering three-axis vectors
    Motion,
    /// Environment sensors delivering a single scalar
    Environment,
    /// Pedometer sensors
    Step,
    Location,
    Activity,
    /// Sensors fed by system broadcasts (battery, screen)
    Broadcast,
    Audio,
    Bluetooth,
}

impl SensorFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorFamily::Motion => "motion",
            SensorFamily::Environment => "environment",
            SensorFamily::Step => "step",
            SensorFamily::Location => "location",
            SensorFamily::Activity => "activity",
            SensorFamily::Broadcast => "broadcast",
            SensorFamily::Audio => "audio",
            SensorFamily::Bluetooth => "bluetooth",
        }
    }
}

/// Adapter lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorState {
    #[default]
    Idle,
    Sensing,
}

/// Runtime permission a sensor may depend on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Location,
    ActivityRecognition,
    RecordAudio,
    Bluetooth,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Location => "location",
            Permission::ActivityRecognition => "activity_recognition",
            Permission::RecordAudio => "record_audio",
            Permission::Bluetooth => "bluetooth",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_parse_accepts_identifier_display_name_and_constant() {
        assert_eq!(
            "linear_acceleration".parse::<SensorKind>().unwrap(),
            SensorKind::LinearAcceleration
        );
        assert_eq!(
            "Screen Status".parse::<SensorKind>().unwrap(),
            SensorKind::ScreenStatus
        );
        assert_eq!(
            "AIR_PRESSURE".parse::<SensorKind>().unwrap(),
            SensorKind::AirPressure
        );
    }

    #[test]
    fn test_parse_unknown_kind() {
        assert_matches!(
            "barometer".parse::<SensorKind>(),
            Err(SensorError::UnknownSensorKind(name)) if name == "barometer"
        );
    }

    #[test]
    fn test_identifier_matches_serde() {
        for kind in SensorKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
            assert_eq!(kind.as_str().parse::<SensorKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_bluetooth_requires_location_permission() {
        assert!(SensorKind::Bluetooth
            .required_permissions()
            .contains(&Permission::Location));
        assert!(SensorKind::Accelerometer.required_permissions().is_empty());
    }
}
