//! Per-sensor drivers
//!
//! A driver holds the only kind-specific logic of an adapter: turning a raw
//! platform payload into [`SensorData`] and deciding whether a given reading
//! should be published. Drivers are created through a [`DriverFactory`], a
//! table from sensor kind to constructor that callers can extend.

mod activity;
mod audio;
mod battery;
mod bluetooth;
mod location;
mod native;
mod screen;

pub use activity::ActivityDriver;
pub use audio::{AudioLevelDriver, AudioRecorderDriver};
pub use battery::BatteryDriver;
pub use bluetooth::BluetoothDriver;
pub use location::LocationDriver;
pub use native::NativeDriver;
pub use screen::ScreenStatusDriver;

use crate::data::SensorData;
use crate::error::SensorError;
use crate::event::EventPayload;
use crate::types::{SensorFamily, SensorKind};
use std::collections::HashMap;

/// Trait for kind-specific sensor drivers
pub trait SensorDriver: Send {
    /// Sensor this driver serves
    fn kind(&self) -> SensorKind;

    /// Convert a raw platform payload into sensor data
    fn build_data(&mut self, payload: &EventPayload) -> Result<SensorData, SensorError>;

    /// Whether `data` should be delivered to listeners. Called once per
    /// built reading, in event order.
    fn should_post(&mut self, _data: &SensorData) -> bool {
        true
    }
}

/// Constructor stored in a [`DriverFactory`]
pub type DriverConstructor = fn(SensorKind) -> Box<dyn SensorDriver>;

/// Table of driver constructors keyed by sensor kind
#[derive(Clone)]
pub struct DriverFactory {
    constructors: HashMap<SensorKind, DriverConstructor>,
}

impl Default for DriverFactory {
    fn default() -> Self {
        let mut factory = Self::empty();
        for kind in SensorKind::ALL {
            factory.insert(kind, default_constructor(kind));
        }
        factory
    }
}

impl DriverFactory {
    /// Factory with no constructors at all
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Install or replace the constructor for `kind`
    pub fn insert(&mut self, kind: SensorKind, constructor: DriverConstructor) {
        self.constructors.insert(kind, constructor);
    }

    /// Builder form of [`DriverFactory::insert`]
    pub fn with(mut self, kind: SensorKind, constructor: DriverConstructor) -> Self {
        self.insert(kind, constructor);
        self
    }

    pub fn supports(&self, kind: SensorKind) -> bool {
        self.constructors.contains_key(&kind)
    }

    /// Build the driver for `kind`
    pub fn create(&self, kind: SensorKind) -> Result<Box<dyn SensorDriver>, SensorError> {
        self.constructors
            .get(&kind)
            .map(|constructor| constructor(kind))
            .ok_or_else(|| SensorError::UnknownSensorKind(kind.as_str().to_string()))
    }
}

fn default_constructor(kind: SensorKind) -> DriverConstructor {
    match kind.family() {
        SensorFamily::Motion | SensorFamily::Environment | SensorFamily::Step => native_driver,
        SensorFamily::Location => location_driver,
        SensorFamily::Activity => activity_driver,
        SensorFamily::Broadcast if kind == SensorKind::Battery => battery_driver,
        SensorFamily::Broadcast => screen_status_driver,
        SensorFamily::Audio if kind == SensorKind::AudioRecorder => audio_recorder_driver,
        SensorFamily::Audio => audio_level_driver,
        SensorFamily::Bluetooth => bluetooth_driver,
    }
}

fn native_driver(kind: SensorKind) -> Box<dyn SensorDriver> {
    Box::new(NativeDriver::new(kind))
}

fn location_driver(_: SensorKind) -> Box<dyn SensorDriver> {
    Box::new(LocationDriver)
}

fn activity_driver(_: SensorKind) -> Box<dyn SensorDriver> {
    Box::new(ActivityDriver)
}

fn battery_driver(_: SensorKind) -> Box<dyn SensorDriver> {
    Box::new(BatteryDriver::default())
}

fn screen_status_driver(_: SensorKind) -> Box<dyn SensorDriver> {
    Box::new(ScreenStatusDriver::default())
}

fn audio_recorder_driver(_: SensorKind) -> Box<dyn SensorDriver> {
    Box::new(AudioRecorderDriver)
}

fn audio_level_driver(_: SensorKind) -> Box<dyn SensorDriver> {
    Box::new(AudioLevelDriver)
}

fn bluetooth_driver(_: SensorKind) -> Box<dyn SensorDriver> {
    Box::new(BluetoothDriver)
}

/// Error for a payload the driver of `kind` cannot interpret
fn unexpected_payload(kind: SensorKind, payload: &EventPayload) -> SensorError {
    SensorError::InvalidEvent {
        kind,
        reason: format!("unexpected {} payload", payload.name()),
    }
}
