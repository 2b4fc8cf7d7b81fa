use super::{unexpected_payload, SensorDriver};
use crate::data::{BatteryData, SensorData};
use crate::error::SensorError;
use crate::event::EventPayload;
use crate::types::SensorKind;

/// Driver for battery broadcasts.
///
/// The platform rebroadcasts battery state frequently without any change;
/// only readings that differ from the last published one are posted.
#[derive(Default)]
pub struct BatteryDriver {
    last_posted: Option<BatteryData>,
}

impl SensorDriver for BatteryDriver {
    fn kind(&self) -> SensorKind {
        SensorKind::Battery
    }

    fn build_data(&mut self, payload: &EventPayload) -> Result<SensorData, SensorError> {
        match payload {
            EventPayload::Battery(state) => Ok(SensorData::Battery(*state)),
            other => Err(unexpected_payload(SensorKind::Battery, other)),
        }
    }

    fn should_post(&mut self, data: &SensorData) -> bool {
        let SensorData::Battery(state) = data else {
            return true;
        };
        if self.last_posted.as_ref() == Some(state) {
            return false;
        }
        self.last_posted = Some(*state);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{BatteryHealth, BatteryStatus, PowerSource};

    fn battery(level: i32) -> SensorData {
        SensorData::Battery(BatteryData {
            level,
            scale: 100,
            temperature: 300,
            voltage: 3900,
            plugged: PowerSource::Unplugged,
            status: BatteryStatus::Discharging,
            health: BatteryHealth::Good,
        })
    }

    #[test]
    fn test_duplicate_state_suppressed() {
        let mut driver = BatteryDriver::default();
        assert!(driver.should_post(&battery(80)));
        assert!(!driver.should_post(&battery(80)));
        assert!(driver.should_post(&battery(79)));
        assert!(driver.should_post(&battery(80)));
    }
}
