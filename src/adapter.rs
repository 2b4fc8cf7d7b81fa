//! Sensor adapter
//!
//! An adapter owns everything that exists for one registered sensor: its
//! lifecycle state, configuration, listener list, kind-specific driver and the
//! platform handle. Adapters are created and destroyed only by the registry.

use crate::adapters::SensorDriver;
use crate::config::SensorConfiguration;
use crate::data::SensorReading;
use crate::error::SensorError;
use crate::event::PlatformEvent;
use crate::listener::SensorDataListener;
use crate::platform::PlatformHandle;
use crate::types::{SensorKind, SensorState};
use log::{info, trace, warn};

/// Outcome of handing one platform event to an adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The reading was offered to every subscribed listener
    Delivered { listeners: usize, failures: usize },
    /// The driver's filter rejected the reading
    Filtered,
    /// The sensor is not registered or not sensing; nothing was built
    Dropped,
}

/// Live adapter for a registered sensor
pub struct SensorAdapter {
    kind: SensorKind,
    state: SensorState,
    configuration: SensorConfiguration,
    listeners: Vec<SensorDataListener>,
    driver: Box<dyn SensorDriver>,
    handle: Box<dyn PlatformHandle>,
}

impl SensorAdapter {
    /// Create an idle adapter. The configuration must fit the driver's kind.
    pub fn new(
        driver: Box<dyn SensorDriver>,
        handle: Box<dyn PlatformHandle>,
        configuration: SensorConfiguration,
    ) -> Result<Self, SensorError> {
        let kind = driver.kind();
        configuration.validate_for(kind)?;

        Ok(Self {
            kind,
            state: SensorState::Idle,
            configuration,
            listeners: Vec::new(),
            driver,
            handle,
        })
    }

    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    pub fn state(&self) -> SensorState {
        self.state
    }

    pub fn is_sensing(&self) -> bool {
        self.state == SensorState::Sensing
    }

    /// Acquire the platform resource and start sensing
    pub fn start_sensing(&mut self) -> Result<(), SensorError> {
        if self.is_sensing() {
            return Err(SensorError::AlreadySensing(self.kind));
        }

        self.handle
            .acquire(&self.configuration)
            .map_err(|e| SensorError::ResourceUnavailable {
                kind: self.kind,
                reason: e.to_string(),
            })?;

        self.state = SensorState::Sensing;
        info!("Sensor {} started sensing", self.kind);
        Ok(())
    }

    /// Release the platform resource. No reading is delivered once this returns.
    pub fn stop_sensing(&mut self) -> Result<(), SensorError> {
        if !self.is_sensing() {
            return Err(SensorError::NotSensing(self.kind));
        }

        self.handle.release();
        self.state = SensorState::Idle;
        info!("Sensor {} stopped sensing", self.kind);
        Ok(())
    }

    /// Subscribe a listener. Returns `false` if it was already subscribed.
    pub fn subscribe_listener(&mut self, listener: SensorDataListener) -> bool {
        if self.listeners.contains(&listener) {
            return false;
        }
        self.listeners.push(listener);
        true
    }

    /// Unsubscribe a listener. Returns `false` if it was not subscribed.
    pub fn unsubscribe_listener(&mut self, listener: &SensorDataListener) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| l != listener);
        self.listeners.len() != before
    }

    pub fn unsubscribe_all(&mut self) {
        self.listeners.clear();
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn configuration(&self) -> &SensorConfiguration {
        &self.configuration
    }

    /// Replace the configuration; it is applied the next time sensing starts.
    pub fn set_configuration(&mut self, configuration: SensorConfiguration) -> Result<(), SensorError> {
        configuration.validate_for(self.kind)?;
        if self.is_sensing() {
            info!(
                "Configuration of sensor {} changed while sensing; applies on next start",
                self.kind
            );
        }
        self.configuration = configuration;
        Ok(())
    }

    /// Build a reading from a platform event and fan it out to the listeners.
    ///
    /// A payload the driver cannot interpret is returned as an error to the
    /// caller. Listener failures are logged and counted, never propagated.
    pub fn handle_event(&mut self, event: &PlatformEvent) -> Result<Delivery, SensorError> {
        if !self.is_sensing() {
            trace!("Dropping event for idle sensor {}", self.kind);
            return Ok(Delivery::Dropped);
        }

        let data = self.driver.build_data(&event.payload)?;
        if !self.driver.should_post(&data) {
            trace!("Filtered reading of sensor {}", self.kind);
            return Ok(Delivery::Filtered);
        }

        let reading = SensorReading::new(self.kind, event.timestamp, data);
        Ok(self.deliver(&reading))
    }

    fn deliver(&self, reading: &SensorReading) -> Delivery {
        let mut failures = 0;
        for listener in &self.listeners {
            if let Err(e) = listener.notify(reading) {
                warn!(
                    "Listener {} of sensor {} failed: {}",
                    listener.id(),
                    self.kind,
                    e
                );
                failures += 1;
            }
        }

        Delivery::Delivered {
            listeners: self.listeners.len(),
            failures,
        }
    }
}

impl Drop for SensorAdapter {
    fn drop(&mut self) {
        if self.is_sensing() {
            self.handle.release();
        }
    }
}
