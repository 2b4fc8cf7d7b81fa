//! SenseKit - Uniform registration and subscription API over device sensors
//!
//! SenseKit sits on top of a host platform's sensor services and exposes every
//! sensor (motion, environment, location, activity, battery, screen, audio,
//! Bluetooth) the same way: register a kind, subscribe listeners, start
//! sensing, and receive timestamped readings.
//!
//! ## Modules
//!
//! - **Registry**: the lifecycle table, at most one adapter per sensor kind
//! - **Adapters / drivers**: per-kind translation of platform events into readings
//! - **Platform**: the host capability the registry acquires sensors from
//! - **Dispatcher**: a thread delivering platform events into a shared registry

pub mod adapter;
pub mod adapters;
pub mod config;
pub mod data;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod listener;
pub mod platform;
pub mod registry;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use adapter::Delivery;
pub use config::{RegistryConfig, SensorConfiguration, SensorSettings};
pub use data::{SensorData, SensorReading};
pub use dispatch::{EventDispatcher, EventSender};
pub use error::SensorError;
pub use event::{EventPayload, PlatformEvent};
pub use listener::{ListenerError, SensorDataListener};
pub use platform::{InMemoryPlatform, PlatformHandle, SensorPlatform};
pub use registry::{SensorRegistry, SharedRegistry};
pub use types::{SensorKind, SensorState};

/// SenseKit library version
pub const SENSEKIT_VERSION: &str = env!("CARGO_PKG_VERSION");
