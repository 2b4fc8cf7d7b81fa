//! Raw platform events
//!
//! The host pushes one [`PlatformEvent`] per platform callback. Its payload is
//! still in platform terms; the adapter's driver turns it into a reading.

use crate::data::{ActivityData, BatteryData, BluetoothDevice, LocationData, RecorderStatus, ScreenState};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Raw payload delivered by a platform sensor source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    /// Value array of a native sensor event
    Values { values: Vec<f32> },
    Location(LocationData),
    Activity(ActivityData),
    Battery(BatteryData),
    Screen { state: ScreenState },
    /// Peak amplitude read from the microphone buffer
    AudioLevel { amplitude: i32 },
    Recorder {
        status: RecorderStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<String>,
    },
    BluetoothScan { devices: Vec<BluetoothDevice> },
}

impl EventPayload {
    pub fn name(&self) -> &'static str {
        match self {
            EventPayload::Values { .. } => "values",
            EventPayload::Location(_) => "location",
            EventPayload::Activity(_) => "activity",
            EventPayload::Battery(_) => "battery",
            EventPayload::Screen { .. } => "screen",
            EventPayload::AudioLevel { .. } => "audio_level",
            EventPayload::Recorder { .. } => "recorder",
            EventPayload::BluetoothScan { .. } => "bluetooth_scan",
        }
    }
}

/// One platform callback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformEvent {
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    pub payload: EventPayload,
}

impl PlatformEvent {
    pub fn new(timestamp: i64, payload: EventPayload) -> Self {
        Self { timestamp, payload }
    }

    /// Event stamped with the current wall-clock time
    pub fn now(payload: EventPayload) -> Self {
        Self::new(Utc::now().timestamp_millis(), payload)
    }

    /// Native sensor event carrying `values`
    pub fn values(timestamp: i64, values: impl Into<Vec<f32>>) -> Self {
        Self::new(
            timestamp,
            EventPayload::Values {
                values: values.into(),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_uses_wall_clock() {
        let before = Utc::now().timestamp_millis();
        let event = PlatformEvent::now(EventPayload::Screen {
            state: ScreenState::On,
        });
        assert!(event.timestamp >= before);
    }

    #[test]
    fn test_event_from_json() {
        let event: PlatformEvent = serde_json::from_str(
            r#"{ "timestamp": 1000, "payload": { "type": "values", "values": [1.0, 2.0, 3.0] } }"#,
        )
        .unwrap();
        assert_eq!(event, PlatformEvent::values(1000, [1.0, 2.0, 3.0]));
    }
}
