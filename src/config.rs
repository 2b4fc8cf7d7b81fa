//! Sensor configuration value objects
//!
//! Every sensor kind carries a configuration with a kind-specific default.
//! Configurations are plain serde values so they can be loaded from JSON.

use crate::error::SensorError;
use crate::types::{SensorFamily, SensorKind};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default interval between location updates (ms)
pub const DEFAULT_LOCATION_INTERVAL_MS: u64 = 10_000;

/// Default fastest accepted interval between location updates (ms)
pub const DEFAULT_LOCATION_FASTEST_INTERVAL_MS: u64 = 5_000;

/// Default activity recognition interval (ms)
pub const DEFAULT_ACTIVITY_INTERVAL_MS: u64 = 0;

/// Default audio sample rate (Hz)
pub const DEFAULT_AUDIO_SAMPLE_RATE_HZ: u32 = 8_000;

/// Default Bluetooth discovery interval (ms)
pub const DEFAULT_BLUETOOTH_SCAN_INTERVAL_MS: u64 = 12_000;

/// Rate at which a native sensor delivers events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingRate {
    /// Rate suitable for screen orientation changes
    #[default]
    Normal,
    /// Rate suitable for the user interface
    Ui,
    /// Rate suitable for games
    Game,
    /// Get sensor data as fast as possible
    Fastest,
    /// Explicit interval between events (microseconds)
    Custom(u32),
}

impl SamplingRate {
    /// Delay between events in microseconds
    pub fn delay_us(&self) -> u32 {
        match self {
            SamplingRate::Normal => 200_000,
            SamplingRate::Ui => 60_000,
            SamplingRate::Game => 20_000,
            SamplingRate::Fastest => 0,
            SamplingRate::Custom(us) => *us,
        }
    }
}

/// Accuracy/power trade-off requested from the location service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationPriority {
    HighAccuracy,
    #[default]
    BalancedPowerAccuracy,
    LowPower,
    NoPower,
}

/// Audio channel layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioChannels {
    #[default]
    Mono,
    Stereo,
}

/// Kind-specific settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SensorSettings {
    /// Motion, environment and step sensors
    Native { sampling_rate: SamplingRate },
    Location {
        priority: LocationPriority,
        interval_ms: u64,
        fastest_interval_ms: u64,
    },
    Activity { detection_interval_ms: u64 },
    AudioLevel {
        sample_rate_hz: u32,
        channels: AudioChannels,
    },
    AudioRecorder {
        sample_rate_hz: u32,
        channels: AudioChannels,
        /// Destination of the recording; the platform chooses one when absent
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output_path: Option<PathBuf>,
    },
    Bluetooth { scan_interval_ms: u64 },
    /// Broadcast-driven sensors take no settings
    Broadcast,
}

/// Configuration of a single sensor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorConfiguration {
    /// Sensor this configuration applies to
    pub kind: SensorKind,
    /// Kind-specific settings
    pub settings: SensorSettings,
}

impl SensorConfiguration {
    /// Default configuration for a sensor kind
    pub fn default_for(kind: SensorKind) -> Self {
        let settings = match kind.family() {
            SensorFamily::Motion | SensorFamily::Environment | SensorFamily::Step => {
                SensorSettings::Native {
                    sampling_rate: SamplingRate::default(),
                }
            }
            SensorFamily::Location => SensorSettings::Location {
                priority: LocationPriority::default(),
                interval_ms: DEFAULT_LOCATION_INTERVAL_MS,
                fastest_interval_ms: DEFAULT_LOCATION_FASTEST_INTERVAL_MS,
            },
            SensorFamily::Activity => SensorSettings::Activity {
                detection_interval_ms: DEFAULT_ACTIVITY_INTERVAL_MS,
            },
            SensorFamily::Audio if kind == SensorKind::AudioRecorder => {
                SensorSettings::AudioRecorder {
                    sample_rate_hz: DEFAULT_AUDIO_SAMPLE_RATE_HZ,
                    channels: AudioChannels::default(),
                    output_path: None,
                }
            }
            SensorFamily::Audio => SensorSettings::AudioLevel {
                sample_rate_hz: DEFAULT_AUDIO_SAMPLE_RATE_HZ,
                channels: AudioChannels::default(),
            },
            SensorFamily::Bluetooth => SensorSettings::Bluetooth {
                scan_interval_ms: DEFAULT_BLUETOOTH_SCAN_INTERVAL_MS,
            },
            SensorFamily::Broadcast => SensorSettings::Broadcast,
        };

        Self { kind, settings }
    }

    /// Parse a configuration from JSON
    pub fn from_json(json: &str) -> Result<Self, SensorError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the configuration to JSON
    pub fn to_json(&self) -> Result<String, SensorError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Check that these settings can drive a sensor of `kind`.
    pub fn validate_for(&self, kind: SensorKind) -> Result<(), SensorError> {
        let invalid = |reason: String| SensorError::InvalidConfiguration { kind, reason };

        if self.kind != kind {
            return Err(invalid(format!(
                "configuration belongs to sensor {}",
                self.kind
            )));
        }

        let fits = matches!(
            (kind.family(), &self.settings),
            (
                SensorFamily::Motion | SensorFamily::Environment | SensorFamily::Step,
                SensorSettings::Native { .. }
            ) | (SensorFamily::Location, SensorSettings::Location { .. })
                | (SensorFamily::Activity, SensorSettings::Activity { .. })
                | (SensorFamily::Bluetooth, SensorSettings::Bluetooth { .. })
                | (SensorFamily::Broadcast, SensorSettings::Broadcast)
        ) || matches!(
            (kind, &self.settings),
            (SensorKind::AudioLevel, SensorSettings::AudioLevel { .. })
                | (SensorKind::AudioRecorder, SensorSettings::AudioRecorder { .. })
        );

        if !fits {
            return Err(invalid(format!(
                "{} settings cannot drive a {} sensor",
                self.settings.name(),
                kind.family().as_str()
            )));
        }

        match &self.settings {
            SensorSettings::Location {
                interval_ms,
                fastest_interval_ms,
                ..
            } if fastest_interval_ms > interval_ms => Err(invalid(format!(
                "fastest interval {}ms exceeds interval {}ms",
                fastest_interval_ms, interval_ms
            ))),
            SensorSettings::AudioLevel { sample_rate_hz, .. }
            | SensorSettings::AudioRecorder { sample_rate_hz, .. }
                if *sample_rate_hz == 0 =>
            {
                Err(invalid("sample rate must be positive".to_string()))
            }
            SensorSettings::Bluetooth { scan_interval_ms } if *scan_interval_ms == 0 => {
                Err(invalid("scan interval must be positive".to_string()))
            }
            _ => Ok(()),
        }
    }
}

impl SensorSettings {
    fn name(&self) -> &'static str {
        match self {
            SensorSettings::Native { .. } => "native",
            SensorSettings::Location { .. } => "location",
            SensorSettings::Activity { .. } => "activity",
            SensorSettings::AudioLevel { .. } => "audio_level",
            SensorSettings::AudioRecorder { .. } => "audio_recorder",
            SensorSettings::Bluetooth { .. } => "bluetooth",
            SensorSettings::Broadcast => "broadcast",
        }
    }
}

/// Set of sensors to register, loaded from a JSON file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub sensors: Vec<SensorConfiguration>,
}

impl RegistryConfig {
    pub fn from_json(json: &str) -> Result<Self, SensorError> {
        Ok(serde_json::from_str(json)?)
    }
}
