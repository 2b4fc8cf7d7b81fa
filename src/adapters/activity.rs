use super::{unexpected_payload, SensorDriver};
use crate::data::SensorData;
use crate::error::SensorError;
use crate::event::EventPayload;
use crate::types::SensorKind;

/// Driver for activity recognition results
pub struct ActivityDriver;

impl SensorDriver for ActivityDriver {
    fn kind(&self) -> SensorKind {
        SensorKind::Activity
    }

    fn build_data(&mut self, payload: &EventPayload) -> Result<SensorData, SensorError> {
        match payload {
            EventPayload::Activity(result) if result.confidence > 100 => Err(SensorError::InvalidEvent {
                kind: SensorKind::Activity,
                reason: format!("confidence {} exceeds 100", result.confidence),
            }),
            EventPayload::Activity(result) => Ok(SensorData::Activity(*result)),
            other => Err(unexpected_payload(SensorKind::Activity, other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ActivityData, ActivityType};

    #[test]
    fn test_activity_result() {
        let result = ActivityData {
            activity: ActivityType::Walking,
            confidence: 87,
        };
        assert_eq!(
            ActivityDriver
                .build_data(&EventPayload::Activity(result))
                .unwrap(),
            SensorData::Activity(result)
        );
    }

    #[test]
    fn test_confidence_above_hundred_rejected() {
        let result = ActivityData {
            activity: ActivityType::Still,
            confidence: 120,
        };
        assert!(ActivityDriver
            .build_data(&EventPayload::Activity(result))
            .is_err());
    }
}
