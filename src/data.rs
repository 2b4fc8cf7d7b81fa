//! Sensor readings
//!
//! A [`SensorReading`] is the immutable value delivered to listeners: the
//! sensor it came from, a millisecond timestamp and the sensor-specific
//! [`SensorData`]. Readings know how to render themselves as CSV rows that
//! line up with [`csv_header`].

use crate::types::SensorKind;
use serde::{Deserialize, Serialize};

/// Three-axis vector reading (m/s², rad/s or μT depending on the sensor)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionData {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Rotation vector reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotationData {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Scalar component, not reported by every device
    pub cos: Option<f32>,
    /// Estimated heading accuracy (radians), not reported by every device
    pub heading_accuracy: Option<f32>,
}

/// Single-value environment reading (°C, lx, % or hPa depending on the sensor)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalarData {
    pub value: f32,
}

/// Cumulative step count since the last device reboot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepCountData {
    pub steps: u64,
}

/// Location fix
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationData {
    pub latitude: f64,
    pub longitude: f64,
    /// Meters above the WGS 84 reference ellipsoid
    #[serde(default)]
    pub altitude: Option<f64>,
    /// Horizontal accuracy radius (meters)
    #[serde(default)]
    pub accuracy: Option<f32>,
    /// Degrees east of true north
    #[serde(default)]
    pub bearing: Option<f32>,
    /// Ground speed (m/s)
    #[serde(default)]
    pub speed: Option<f32>,
}

/// Detected user activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    InVehicle,
    OnBicycle,
    OnFoot,
    Running,
    Still,
    Tilting,
    Walking,
    Unknown,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::InVehicle => "in_vehicle",
            ActivityType::OnBicycle => "on_bicycle",
            ActivityType::OnFoot => "on_foot",
            ActivityType::Running => "running",
            ActivityType::Still => "still",
            ActivityType::Tilting => "tilting",
            ActivityType::Walking => "walking",
            ActivityType::Unknown => "unknown",
        }
    }
}

/// Activity recognition result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityData {
    pub activity: ActivityType,
    /// Likelihood of the detected activity (0-100)
    pub confidence: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerSource {
    #[default]
    Unplugged,
    Ac,
    Usb,
    Wireless,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatteryStatus {
    Charging,
    Discharging,
    Full,
    NotCharging,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatteryHealth {
    Cold,
    Dead,
    Good,
    Overheat,
    OverVoltage,
    Failure,
    #[default]
    Unknown,
}

/// Battery state as reported by the system broadcast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatteryData {
    /// Charge level, in units of `scale`
    pub level: i32,
    /// Maximum charge level
    pub scale: i32,
    /// Temperature in tenths of a degree Celsius
    pub temperature: i32,
    /// Voltage (mV)
    pub voltage: i32,
    #[serde(default)]
    pub plugged: PowerSource,
    #[serde(default)]
    pub status: BatteryStatus,
    #[serde(default)]
    pub health: BatteryHealth,
}

impl BatteryData {
    /// Charge level as a fraction in 0-1, or `None` when the scale is unknown
    pub fn level_ratio(&self) -> Option<f32> {
        (self.scale > 0).then(|| self.level as f32 / self.scale as f32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenState {
    On,
    Off,
    Unknown,
}

impl ScreenState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScreenState::On => "on",
            ScreenState::Off => "off",
            ScreenState::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenData {
    pub state: ScreenState,
}

/// Peak microphone amplitude since the previous reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioLevelData {
    pub level: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecorderStatus {
    Started,
    Stopped,
    Failed,
}

impl RecorderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecorderStatus::Started => "started",
            RecorderStatus::Stopped => "stopped",
            RecorderStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecorderData {
    pub status: RecorderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Device found by a Bluetooth discovery scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BluetoothDevice {
    #[serde(default)]
    pub name: Option<String>,
    pub address: String,
    pub rssi: i16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BluetoothData {
    pub devices: Vec<BluetoothDevice>,
}

/// Sensor-specific payload of a reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SensorData {
    Motion(MotionData),
    Rotation(RotationData),
    Scalar(ScalarData),
    StepDetected,
    StepCount(StepCountData),
    Location(LocationData),
    Activity(ActivityData),
    Battery(BatteryData),
    Screen(ScreenData),
    AudioLevel(AudioLevelData),
    AudioRecorder(RecorderData),
    Bluetooth(BluetoothData),
}

/// Immutable snapshot delivered to listeners
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub kind: SensorKind,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    pub data: SensorData,
}

impl SensorReading {
    pub fn new(kind: SensorKind, timestamp: i64, data: SensorData) -> Self {
        Self {
            kind,
            timestamp,
            data,
        }
    }

    /// Render the reading as CSV matching [`csv_header`] for its kind.
    ///
    /// Bluetooth readings produce one line per discovered device (and an
    /// empty string when nothing was found).
    pub fn csv_row(&self) -> String {
        let ts = self.timestamp;
        match &self.data {
            SensorData::Motion(m) => format!("{},{},{},{}", ts, m.x, m.y, m.z),
            SensorData::Rotation(r) => format!(
                "{},{},{},{},{},{}",
                ts,
                r.x,
                r.y,
                r.z,
                opt(r.cos),
                opt(r.heading_accuracy)
            ),
            SensorData::Scalar(s) => format!("{},{}", ts, s.value),
            SensorData::StepDetected => ts.to_string(),
            SensorData::StepCount(s) => format!("{},{}", ts, s.steps),
            SensorData::Location(l) => format!(
                "{},{},{},{},{},{},{}",
                ts,
                l.latitude,
                l.longitude,
                opt(l.altitude),
                opt(l.accuracy),
                opt(l.bearing),
                opt(l.speed)
            ),
            SensorData::Activity(a) => format!("{},{},{}", ts, a.activity.as_str(), a.confidence),
            SensorData::Battery(b) => format!(
                "{},{},{},{},{},{},{},{}",
                ts,
                b.level,
                b.scale,
                b.temperature,
                b.voltage,
                enum_str(&b.plugged),
                enum_str(&b.status),
                enum_str(&b.health)
            ),
            SensorData::Screen(s) => format!("{},{}", ts, s.state.as_str()),
            SensorData::AudioLevel(a) => format!("{},{}", ts, a.level),
            SensorData::AudioRecorder(r) => format!(
                "{},{},{}",
                ts,
                r.status.as_str(),
                escape(r.path.as_deref().unwrap_or(""))
            ),
            SensorData::Bluetooth(b) => b
                .devices
                .iter()
                .map(|d| {
                    format!(
                        "{},{},{},{}",
                        ts,
                        escape(d.name.as_deref().unwrap_or("")),
                        escape(&d.address),
                        d.rssi
                    )
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// CSV header describing the rows produced by readings of `kind`
pub fn csv_header(kind: SensorKind) -> &'static str {
    match kind {
        SensorKind::Accelerometer
        | SensorKind::Gravity
        | SensorKind::LinearAcceleration
        | SensorKind::Gyroscope
        | SensorKind::Magnetometer => "timestamp,x,y,z",
        SensorKind::Rotation => "timestamp,x,y,z,cos,heading_accuracy",
        SensorKind::AmbientTemperature => "timestamp,temperature",
        SensorKind::Light => "timestamp,light",
        SensorKind::Humidity => "timestamp,humidity",
        SensorKind::AirPressure => "timestamp,pressure",
        SensorKind::StepDetector => "timestamp",
        SensorKind::StepCounter => "timestamp,steps",
        SensorKind::Location => "timestamp,latitude,longitude,altitude,accuracy,bearing,speed",
        SensorKind::Activity => "timestamp,activity,confidence",
        SensorKind::Battery => "timestamp,level,scale,temperature,voltage,plugged,status,health",
        SensorKind::ScreenStatus => "timestamp,status",
        SensorKind::AudioLevel => "timestamp,level",
        SensorKind::AudioRecorder => "timestamp,status,path",
        SensorKind::Bluetooth => "timestamp,name,address,rssi",
    }
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// snake_case name of a unit enum variant, via its serde representation
fn enum_str<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(s)) => s,
        _ => String::new(),
    }
}

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_motion_csv_row() {
        let reading = SensorReading::new(
            SensorKind::Accelerometer,
            1000,
            SensorData::Motion(MotionData {
                x: 1.0,
                y: 2.5,
                z: -3.0,
            }),
        );
        assert_eq!(reading.csv_row(), "1000,1,2.5,-3");
    }

    #[test]
    fn test_csv_row_matches_header_width() {
        let reading = SensorReading::new(
            SensorKind::Battery,
            42,
            SensorData::Battery(BatteryData {
                level: 80,
                scale: 100,
                temperature: 291,
                voltage: 4100,
                plugged: PowerSource::Usb,
                status: BatteryStatus::Charging,
                health: BatteryHealth::Good,
            }),
        );
        let row = reading.csv_row();
        assert_eq!(row, "42,80,100,291,4100,usb,charging,good");
        assert_eq!(
            row.split(',').count(),
            csv_header(SensorKind::Battery).split(',').count()
        );
    }

    #[test]
    fn test_location_csv_leaves_missing_fields_empty() {
        let reading = SensorReading::new(
            SensorKind::Location,
            7,
            SensorData::Location(LocationData {
                latitude: 51.5,
                longitude: -0.12,
                altitude: None,
                accuracy: Some(4.0),
                bearing: None,
                speed: None,
            }),
        );
        assert_eq!(reading.csv_row(), "7,51.5,-0.12,,4,,");
    }

    #[test]
    fn test_bluetooth_csv_one_line_per_device() {
        let reading = SensorReading::new(
            SensorKind::Bluetooth,
            5,
            SensorData::Bluetooth(BluetoothData {
                devices: vec![
                    BluetoothDevice {
                        name: Some("Desk, left".to_string()),
                        address: "00:11:22:33:44:55".to_string(),
                        rssi: -60,
                    },
                    BluetoothDevice {
                        name: None,
                        address: "66:77:88:99:AA:BB".to_string(),
                        rssi: -82,
                    },
                ],
            }),
        );
        assert_eq!(
            reading.csv_row(),
            "5,\"Desk, left\",00:11:22:33:44:55,-60\n5,,66:77:88:99:AA:BB,-82"
        );
    }

    #[test]
    fn test_level_ratio() {
        let battery = BatteryData {
            level: 50,
            scale: 200,
            temperature: 0,
            voltage: 0,
            plugged: PowerSource::Unplugged,
            status: BatteryStatus::Unknown,
            health: BatteryHealth::Unknown,
        };
        assert_eq!(battery.level_ratio(), Some(0.25));
        assert_eq!(BatteryData { scale: 0, ..battery }.level_ratio(), None);
    }

    #[test]
    fn test_reading_json_is_tagged() {
        let reading = SensorReading::new(
            SensorKind::ScreenStatus,
            9,
            SensorData::Screen(ScreenData {
                state: ScreenState::Off,
            }),
        );
        let value = serde_json::to_value(&reading).unwrap();
        assert_eq!(value["kind"], "screen_status");
        assert_eq!(value["data"]["type"], "screen");
        assert_eq!(value["data"]["state"], "off");
    }
}
