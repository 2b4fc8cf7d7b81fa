//! Sensor registry
//!
//! This module provides the public API of SenseKit. The registry owns the table
//! of live adapters (at most one per sensor kind) and is the only place
//! adapters are created or destroyed. Every lifecycle and subscription
//! operation is keyed by [`SensorKind`] and goes through it.

use crate::adapter::{Delivery, SensorAdapter};
use crate::adapters::DriverFactory;
use crate::config::SensorConfiguration;
use crate::data;
use crate::error::SensorError;
use crate::event::PlatformEvent;
use crate::listener::SensorDataListener;
use crate::platform::SensorPlatform;
use crate::types::SensorKind;
use log::{info, trace, warn};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Registry shared between the host's threads
pub type SharedRegistry = Arc<Mutex<SensorRegistry>>;

/// Table of registered sensors
pub struct SensorRegistry {
    platform: Box<dyn SensorPlatform>,
    factory: DriverFactory,
    adapters: BTreeMap<SensorKind, SensorAdapter>,
}

impl SensorRegistry {
    /// Create an empty registry backed by `platform`
    pub fn new(platform: impl SensorPlatform + 'static) -> Self {
        Self::with_factory(platform, DriverFactory::default())
    }

    /// Create an empty registry with a custom driver table
    pub fn with_factory(platform: impl SensorPlatform + 'static, factory: DriverFactory) -> Self {
        Self {
            platform: Box::new(platform),
            factory,
            adapters: BTreeMap::new(),
        }
    }

    /// Wrap the registry for use from several threads
    pub fn into_shared(self) -> SharedRegistry {
        Arc::new(Mutex::new(self))
    }

    /// Register a sensor with its default configuration
    pub fn register(&mut self, kind: SensorKind) -> Result<(), SensorError> {
        self.register_with_configuration(kind, SensorConfiguration::default_for(kind))
    }

    /// Register a sensor with an explicit configuration.
    ///
    /// No platform resource is acquired until sensing starts.
    pub fn register_with_configuration(
        &mut self,
        kind: SensorKind,
        configuration: SensorConfiguration,
    ) -> Result<(), SensorError> {
        info!("Register sensor: {}", kind);

        if self.is_registered(kind) {
            return Err(SensorError::AlreadyRegistered(kind));
        }

        configuration.validate_for(kind)?;
        let driver = self.factory.create(kind)?;
        let handle = self.platform.open(kind);
        let adapter = SensorAdapter::new(driver, handle, configuration)?;

        self.adapters.insert(kind, adapter);
        Ok(())
    }

    /// Remove a sensor, unsubscribing all of its listeners first
    pub fn deregister(&mut self, kind: SensorKind) -> Result<(), SensorError> {
        info!("Deregister sensor: {}", kind);

        let adapter = self.adapter_mut(kind)?;
        if adapter.is_sensing() {
            return Err(SensorError::CurrentlySensing(kind));
        }
        adapter.unsubscribe_all();

        self.adapters.remove(&kind);
        Ok(())
    }

    pub fn is_registered(&self, kind: SensorKind) -> bool {
        self.adapters.contains_key(&kind)
    }

    pub fn is_sensing(&self, kind: SensorKind) -> Result<bool, SensorError> {
        Ok(self.adapter(kind)?.is_sensing())
    }

    /// Kinds currently registered, in declaration order
    pub fn registered_kinds(&self) -> Vec<SensorKind> {
        self.adapters.keys().copied().collect()
    }

    pub fn start_sensing(&mut self, kind: SensorKind) -> Result<(), SensorError> {
        info!("Start sensing with sensor: {}", kind);
        self.adapter_mut(kind)?.start_sensing()
    }

    pub fn stop_sensing(&mut self, kind: SensorKind) -> Result<(), SensorError> {
        info!("Stop sensing with sensor: {}", kind);
        self.adapter_mut(kind)?.stop_sensing()
    }

    /// Start every registered sensor that is not sensing yet.
    ///
    /// A failure does not stop the remaining sensors from being started; the
    /// first failure is returned once all of them have been tried.
    pub fn start_all(&mut self) -> Result<(), SensorError> {
        let mut first_error = None;
        for (kind, adapter) in self.adapters.iter_mut() {
            if adapter.is_sensing() {
                continue;
            }
            if let Err(e) = adapter.start_sensing() {
                warn!("Could not start sensor {}: {}", kind, e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Stop every sensing sensor, with the same failure policy as [`start_all`](Self::start_all)
    pub fn stop_all(&mut self) -> Result<(), SensorError> {
        let mut first_error = None;
        for (kind, adapter) in self.adapters.iter_mut() {
            if !adapter.is_sensing() {
                continue;
            }
            if let Err(e) = adapter.stop_sensing() {
                warn!("Could not stop sensor {}: {}", kind, e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Subscribe a listener to a registered sensor. Subscribing the same
    /// listener twice has no effect.
    pub fn subscribe(
        &mut self,
        kind: SensorKind,
        listener: SensorDataListener,
    ) -> Result<(), SensorError> {
        info!("Subscribe to sensor: {}", kind);
        self.adapter_mut(kind)?.subscribe_listener(listener);
        Ok(())
    }

    pub fn unsubscribe(
        &mut self,
        kind: SensorKind,
        listener: &SensorDataListener,
    ) -> Result<(), SensorError> {
        info!("Unsubscribe from sensor: {}", kind);
        self.adapter_mut(kind)?.unsubscribe_listener(listener);
        Ok(())
    }

    pub fn unsubscribe_all(&mut self, kind: SensorKind) -> Result<(), SensorError> {
        info!("Unsubscribe all listeners from sensor: {}", kind);
        self.adapter_mut(kind)?.unsubscribe_all();
        Ok(())
    }

    pub fn listener_count(&self, kind: SensorKind) -> Result<usize, SensorError> {
        Ok(self.adapter(kind)?.listener_count())
    }

    /// Copy of the configuration of a registered sensor
    pub fn configuration(&self, kind: SensorKind) -> Result<SensorConfiguration, SensorError> {
        Ok(self.adapter(kind)?.configuration().clone())
    }

    pub fn set_configuration(
        &mut self,
        kind: SensorKind,
        configuration: SensorConfiguration,
    ) -> Result<(), SensorError> {
        self.adapter_mut(kind)?.set_configuration(configuration)
    }

    /// CSV header matching the rows of readings of `kind`
    pub fn csv_header(&self, kind: SensorKind) -> &'static str {
        data::csv_header(kind)
    }

    /// Whether the device provides the sensor behind `kind`
    pub fn is_available(&self, kind: SensorKind) -> bool {
        self.platform.is_available(kind)
    }

    /// Whether every runtime permission `kind` depends on has been granted
    pub fn is_permission_granted(&self, kind: SensorKind) -> bool {
        kind.required_permissions()
            .iter()
            .all(|p| self.platform.is_permission_granted(*p))
    }

    /// Inject a platform event for `kind`.
    ///
    /// Events for sensors that are not registered or not sensing are dropped.
    pub fn dispatch(
        &mut self,
        kind: SensorKind,
        event: &PlatformEvent,
    ) -> Result<Delivery, SensorError> {
        match self.adapters.get_mut(&kind) {
            Some(adapter) => adapter.handle_event(event),
            None => {
                trace!("Dropping event for unregistered sensor {}", kind);
                Ok(Delivery::Dropped)
            }
        }
    }

    fn adapter(&self, kind: SensorKind) -> Result<&SensorAdapter, SensorError> {
        self.adapters
            .get(&kind)
            .ok_or(SensorError::NotRegistered(kind))
    }

    fn adapter_mut(&mut self, kind: SensorKind) -> Result<&mut SensorAdapter, SensorError> {
        self.adapters
            .get_mut(&kind)
            .ok_or(SensorError::NotRegistered(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{NativeDriver, SensorDriver};
    use crate::data::{
        BatteryData, BatteryHealth, BatteryStatus, MotionData, PowerSource, SensorData,
        SensorReading,
    };
    use crate::event::EventPayload;
    use crate::platform::InMemoryPlatform;
    use crate::types::Permission;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    fn registry() -> (SensorRegistry, InMemoryPlatform) {
        let platform = InMemoryPlatform::new();
        (SensorRegistry::new(platform.clone()), platform)
    }

    fn battery_event(timestamp: i64, level: i32) -> PlatformEvent {
        PlatformEvent::new(
            timestamp,
            EventPayload::Battery(BatteryData {
                level,
                scale: 100,
                temperature: 280,
                voltage: 4000,
                plugged: PowerSource::Ac,
                status: BatteryStatus::Charging,
                health: BatteryHealth::Good,
            }),
        )
    }

    #[test]
    fn test_register_then_deregister_every_kind() {
        let (mut registry, _) = registry();
        for kind in SensorKind::ALL {
            registry.register(kind).unwrap();
            assert!(registry.is_registered(kind));
            registry.deregister(kind).unwrap();
            assert!(!registry.is_registered(kind));
        }
    }

    #[test]
    fn test_register_twice_fails() {
        let (mut registry, _) = registry();
        registry.register(SensorKind::Light).unwrap();
        assert_matches!(
            registry.register(SensorKind::Light),
            Err(SensorError::AlreadyRegistered(SensorKind::Light))
        );
    }

    #[test]
    fn test_register_does_not_acquire() {
        let (mut registry, platform) = registry();
        registry.register(SensorKind::Gyroscope).unwrap();
        assert!(!platform.is_active(SensorKind::Gyroscope));
        assert_eq!(registry.is_sensing(SensorKind::Gyroscope).unwrap(), false);
    }

    #[test]
    fn test_register_with_mismatched_configuration() {
        let (mut registry, _) = registry();
        let result = registry.register_with_configuration(
            SensorKind::Gyroscope,
            SensorConfiguration::default_for(SensorKind::Location),
        );
        assert_matches!(result, Err(SensorError::InvalidConfiguration { .. }));
        assert!(!registry.is_registered(SensorKind::Gyroscope));
    }

    #[test]
    fn test_unregistered_operations_fail() {
        let (mut registry, _) = registry();
        let kind = SensorKind::Humidity;
        let listener = SensorDataListener::from_fn(|_| {});

        assert_matches!(registry.is_sensing(kind), Err(SensorError::NotRegistered(_)));
        assert_matches!(registry.deregister(kind), Err(SensorError::NotRegistered(_)));
        assert_matches!(registry.start_sensing(kind), Err(SensorError::NotRegistered(_)));
        assert_matches!(registry.stop_sensing(kind), Err(SensorError::NotRegistered(_)));
        assert_matches!(
            registry.subscribe(kind, listener.clone()),
            Err(SensorError::NotRegistered(_))
        );
        assert_matches!(
            registry.unsubscribe(kind, &listener),
            Err(SensorError::NotRegistered(_))
        );
        assert_matches!(registry.unsubscribe_all(kind), Err(SensorError::NotRegistered(_)));
        assert_matches!(registry.configuration(kind), Err(SensorError::NotRegistered(_)));
    }

    #[test]
    fn test_start_twice_and_stop_idle() {
        let (mut registry, _) = registry();
        registry.register(SensorKind::Rotation).unwrap();

        assert_matches!(
            registry.stop_sensing(SensorKind::Rotation),
            Err(SensorError::NotSensing(_))
        );
        registry.start_sensing(SensorKind::Rotation).unwrap();
        assert_matches!(
            registry.start_sensing(SensorKind::Rotation),
            Err(SensorError::AlreadySensing(_))
        );
    }

    #[test]
    fn test_accelerometer_reading_delivered_once() {
        let (mut registry, _) = registry();
        let (listener, rx) = SensorDataListener::channel();

        registry.register(SensorKind::Accelerometer).unwrap();
        registry.subscribe(SensorKind::Accelerometer, listener).unwrap();
        registry.start_sensing(SensorKind::Accelerometer).unwrap();
        registry
            .dispatch(
                SensorKind::Accelerometer,
                &PlatformEvent::values(1000, [1.0, 2.0, 3.0]),
            )
            .unwrap();

        let readings: Vec<SensorReading> = rx.try_iter().collect();
        assert_eq!(
            readings,
            vec![SensorReading::new(
                SensorKind::Accelerometer,
                1000,
                SensorData::Motion(MotionData {
                    x: 1.0,
                    y: 2.0,
                    z: 3.0
                }),
            )]
        );
    }

    #[test]
    fn test_deregister_battery_while_sensing() {
        let (mut registry, platform) = registry();
        registry.register(SensorKind::Battery).unwrap();
        registry.start_sensing(SensorKind::Battery).unwrap();

        assert_matches!(
            registry.deregister(SensorKind::Battery),
            Err(SensorError::CurrentlySensing(SensorKind::Battery))
        );
        assert!(registry.is_registered(SensorKind::Battery));
        assert!(registry.is_sensing(SensorKind::Battery).unwrap());
        assert!(platform.is_active(SensorKind::Battery));
    }

    #[test]
    fn test_double_subscription_delivers_once() {
        let (mut registry, _) = registry();
        let (listener, rx) = SensorDataListener::channel();

        registry.register(SensorKind::Gravity).unwrap();
        registry.subscribe(SensorKind::Gravity, listener.clone()).unwrap();
        registry.subscribe(SensorKind::Gravity, listener).unwrap();
        registry.start_sensing(SensorKind::Gravity).unwrap();
        registry
            .dispatch(SensorKind::Gravity, &PlatformEvent::values(1, [0.0, 0.0, 9.8]))
            .unwrap();
        registry.stop_sensing(SensorKind::Gravity).unwrap();
        registry.deregister(SensorKind::Gravity).unwrap();

        assert_eq!(rx.try_iter().count(), 1);
    }

    #[test]
    fn test_unsubscribe_all_silences_listeners() {
        let (mut registry, _) = registry();
        let (first, first_rx) = SensorDataListener::channel();
        let (second, second_rx) = SensorDataListener::channel();

        registry.register(SensorKind::Light).unwrap();
        registry.subscribe(SensorKind::Light, first).unwrap();
        registry.subscribe(SensorKind::Light, second).unwrap();
        registry.start_sensing(SensorKind::Light).unwrap();
        registry.unsubscribe_all(SensorKind::Light).unwrap();

        let delivery = registry
            .dispatch(SensorKind::Light, &PlatformEvent::values(3, [120.0]))
            .unwrap();

        assert_eq!(
            delivery,
            Delivery::Delivered {
                listeners: 0,
                failures: 0
            }
        );
        assert!(first_rx.try_recv().is_err());
        assert!(second_rx.try_recv().is_err());
    }

    #[test]
    fn test_unsubscribe_single_listener() {
        let (mut registry, _) = registry();
        let (kept, kept_rx) = SensorDataListener::channel();
        let (removed, removed_rx) = SensorDataListener::channel();

        registry.register(SensorKind::Light).unwrap();
        registry.subscribe(SensorKind::Light, kept).unwrap();
        registry.subscribe(SensorKind::Light, removed.clone()).unwrap();
        registry.unsubscribe(SensorKind::Light, &removed).unwrap();
        registry.start_sensing(SensorKind::Light).unwrap();
        registry
            .dispatch(SensorKind::Light, &PlatformEvent::values(3, [80.0]))
            .unwrap();

        assert_eq!(kept_rx.try_iter().count(), 1);
        assert!(removed_rx.try_recv().is_err());
        assert_eq!(registry.listener_count(SensorKind::Light).unwrap(), 1);
    }

    #[test]
    fn test_deregister_clears_listeners() {
        let (mut registry, _) = registry();
        let (listener, rx) = SensorDataListener::channel();

        registry.register(SensorKind::Light).unwrap();
        registry.subscribe(SensorKind::Light, listener).unwrap();
        registry.deregister(SensorKind::Light).unwrap();
        registry.register(SensorKind::Light).unwrap();
        assert_eq!(registry.listener_count(SensorKind::Light).unwrap(), 0);

        registry.start_sensing(SensorKind::Light).unwrap();
        registry
            .dispatch(SensorKind::Light, &PlatformEvent::values(3, [80.0]))
            .unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_no_delivery_after_stop() {
        let (mut registry, _) = registry();
        let (listener, rx) = SensorDataListener::channel();

        registry.register(SensorKind::Magnetometer).unwrap();
        registry.subscribe(SensorKind::Magnetometer, listener).unwrap();
        registry.start_sensing(SensorKind::Magnetometer).unwrap();
        registry.stop_sensing(SensorKind::Magnetometer).unwrap();

        let delivery = registry
            .dispatch(
                SensorKind::Magnetometer,
                &PlatformEvent::values(9, [30.0, -12.0, 4.0]),
            )
            .unwrap();
        assert_eq!(delivery, Delivery::Dropped);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_dispatch_to_unregistered_is_dropped() {
        let (mut registry, _) = registry();
        assert_eq!(
            registry
                .dispatch(SensorKind::Light, &PlatformEvent::values(1, [1.0]))
                .unwrap(),
            Delivery::Dropped
        );
    }

    #[test]
    fn test_battery_duplicates_filtered() {
        let (mut registry, _) = registry();
        let (listener, rx) = SensorDataListener::channel();

        registry.register(SensorKind::Battery).unwrap();
        registry.subscribe(SensorKind::Battery, listener).unwrap();
        registry.start_sensing(SensorKind::Battery).unwrap();

        registry.dispatch(SensorKind::Battery, &battery_event(1, 90)).unwrap();
        assert_eq!(
            registry.dispatch(SensorKind::Battery, &battery_event(2, 90)).unwrap(),
            Delivery::Filtered
        );
        registry.dispatch(SensorKind::Battery, &battery_event(3, 89)).unwrap();

        let timestamps: Vec<i64> = rx.try_iter().map(|r| r.timestamp).collect();
        assert_eq!(timestamps, vec![1, 3]);
    }

    #[test]
    fn test_start_all_continues_past_failure() {
        let (mut registry, platform) = registry();
        platform.set_available(SensorKind::Gyroscope, false);

        registry.register(SensorKind::Accelerometer).unwrap();
        registry.register(SensorKind::Gyroscope).unwrap();
        registry.register(SensorKind::Light).unwrap();

        assert_matches!(
            registry.start_all(),
            Err(SensorError::ResourceUnavailable {
                kind: SensorKind::Gyroscope,
                ..
            })
        );
        assert!(registry.is_sensing(SensorKind::Accelerometer).unwrap());
        assert!(!registry.is_sensing(SensorKind::Gyroscope).unwrap());
        assert!(registry.is_sensing(SensorKind::Light).unwrap());

        registry.stop_all().unwrap();
        for kind in registry.registered_kinds() {
            assert!(!registry.is_sensing(kind).unwrap());
        }
    }

    #[test]
    fn test_start_all_skips_sensing_sensors() {
        let (mut registry, platform) = registry();
        registry.register(SensorKind::Light).unwrap();
        registry.register(SensorKind::Humidity).unwrap();
        registry.start_sensing(SensorKind::Light).unwrap();

        registry.start_all().unwrap();
        assert_eq!(platform.acquisitions(), 2);
    }

    #[test]
    fn test_permission_denied_is_resource_unavailable() {
        let (mut registry, platform) = registry();
        platform.set_permission(Permission::RecordAudio, false);

        registry.register(SensorKind::AudioLevel).unwrap();
        assert!(!registry.is_permission_granted(SensorKind::AudioLevel));
        assert!(registry.is_permission_granted(SensorKind::Light));
        assert_matches!(
            registry.start_sensing(SensorKind::AudioLevel),
            Err(SensorError::ResourceUnavailable { .. })
        );
        assert!(!registry.is_sensing(SensorKind::AudioLevel).unwrap());
    }

    #[test]
    fn test_set_configuration_checks_kind() {
        let (mut registry, _) = registry();
        registry.register(SensorKind::Location).unwrap();

        assert_matches!(
            registry.set_configuration(
                SensorKind::Location,
                SensorConfiguration::default_for(SensorKind::Activity)
            ),
            Err(SensorError::InvalidConfiguration { .. })
        );
        assert_eq!(
            registry.configuration(SensorKind::Location).unwrap(),
            SensorConfiguration::default_for(SensorKind::Location)
        );
    }

    #[test]
    fn test_registered_kinds_in_declaration_order() {
        let (mut registry, _) = registry();
        registry.register(SensorKind::AirPressure).unwrap();
        registry.register(SensorKind::Accelerometer).unwrap();
        registry.register(SensorKind::Battery).unwrap();

        assert_eq!(
            registry.registered_kinds(),
            vec![
                SensorKind::Accelerometer,
                SensorKind::Battery,
                SensorKind::AirPressure
            ]
        );
    }

    #[test]
    fn test_custom_factory_replaces_driver() {
        struct Inverted;

        impl SensorDriver for Inverted {
            fn kind(&self) -> SensorKind {
                SensorKind::Accelerometer
            }

            fn build_data(&mut self, payload: &EventPayload) -> Result<SensorData, SensorError> {
                match NativeDriver::new(SensorKind::Accelerometer).build_data(payload)? {
                    SensorData::Motion(m) => Ok(SensorData::Motion(MotionData {
                        x: -m.x,
                        y: -m.y,
                        z: -m.z,
                    })),
                    other => Ok(other),
                }
            }
        }

        fn inverted(_: SensorKind) -> Box<dyn SensorDriver> {
            Box::new(Inverted)
        }

        let factory = DriverFactory::default().with(SensorKind::Accelerometer, inverted);
        let mut registry = SensorRegistry::with_factory(InMemoryPlatform::new(), factory);
        let (listener, rx) = SensorDataListener::channel();

        registry.register(SensorKind::Accelerometer).unwrap();
        registry.subscribe(SensorKind::Accelerometer, listener).unwrap();
        registry.start_sensing(SensorKind::Accelerometer).unwrap();
        registry
            .dispatch(
                SensorKind::Accelerometer,
                &PlatformEvent::values(1, [1.0, 2.0, 3.0]),
            )
            .unwrap();

        assert_eq!(
            rx.try_recv().unwrap().data,
            SensorData::Motion(MotionData {
                x: -1.0,
                y: -2.0,
                z: -3.0
            })
        );
    }

    #[test]
    fn test_csv_header_available_without_registration() {
        let (registry, _) = registry();
        assert_eq!(registry.csv_header(SensorKind::Accelerometer), "timestamp,x,y,z");
    }
}
