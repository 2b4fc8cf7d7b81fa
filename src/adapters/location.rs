use super::{unexpected_payload, SensorDriver};
use crate::data::SensorData;
use crate::error::SensorError;
use crate::event::EventPayload;
use crate::types::SensorKind;

/// Driver for location fixes
pub struct LocationDriver;

impl SensorDriver for LocationDriver {
    fn kind(&self) -> SensorKind {
        SensorKind::Location
    }

    fn build_data(&mut self, payload: &EventPayload) -> Result<SensorData, SensorError> {
        match payload {
            EventPayload::Location(fix) => {
                if !(-90.0..=90.0).contains(&fix.latitude)
                    || !(-180.0..=180.0).contains(&fix.longitude)
                {
                    return Err(SensorError::InvalidEvent {
                        kind: SensorKind::Location,
                        reason: format!(
                            "coordinates out of range ({}, {})",
                            fix.latitude, fix.longitude
                        ),
                    });
                }
                Ok(SensorData::Location(*fix))
            }
            other => Err(unexpected_payload(SensorKind::Location, other)),
        }
    }
}
