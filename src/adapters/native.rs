//! Driver for native sensor events (motion, environment and pedometer)
//!
//! Native events carry a bare value array whose layout depends on the sensor.

use super::{unexpected_payload, SensorDriver};
use crate::data::{MotionData, RotationData, ScalarData, SensorData, StepCountData};
use crate::error::SensorError;
use crate::event::EventPayload;
use crate::types::{SensorFamily, SensorKind};

/// Driver for sensors delivering native value arrays
pub struct NativeDriver {
    kind: SensorKind,
}

impl NativeDriver {
    pub fn new(kind: SensorKind) -> Self {
        debug_assert!(matches!(
            kind.family(),
            SensorFamily::Motion | SensorFamily::Environment | SensorFamily::Step
        ));
        Self { kind }
    }

    fn require(&self, values: &[f32], len: usize) -> Result<(), SensorError> {
        if values.len() < len {
            return Err(SensorError::InvalidEvent {
                kind: self.kind,
                reason: format!("expected at least {} values, got {}", len, values.len()),
            });
        }
        Ok(())
    }
}

impl SensorDriver for NativeDriver {
    fn kind(&self) -> SensorKind {
        self.kind
    }

    fn build_data(&mut self, payload: &EventPayload) -> Result<SensorData, SensorError> {
        let EventPayload::Values { values } = payload else {
            return Err(unexpected_payload(self.kind, payload));
        };

        match self.kind {
            SensorKind::Rotation => {
                self.require(values, 3)?;
                Ok(SensorData::Rotation(RotationData {
                    x: values[0],
                    y: values[1],
                    z: values[2],
                    cos: values.get(3).copied(),
                    heading_accuracy: values.get(4).copied(),
                }))
            }
            SensorKind::StepDetector => Ok(SensorData::StepDetected),
            SensorKind::StepCounter => {
                self.require(values, 1)?;
                if !values[0].is_finite() || values[0] < 0.0 {
                    return Err(SensorError::InvalidEvent {
                        kind: self.kind,
                        reason: format!("invalid step count {}", values[0]),
                    });
                }
                Ok(SensorData::StepCount(StepCountData {
                    steps: values[0] as u64,
                }))
            }
            kind if kind.family() == SensorFamily::Environment => {
                self.require(values, 1)?;
                Ok(SensorData::Scalar(ScalarData { value: values[0] }))
            }
            _ => {
                self.require(values, 3)?;
                Ok(SensorData::Motion(MotionData {
                    x: values[0],
                    y: values[1],
                    z: values[2],
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    fn values(values: &[f32]) -> EventPayload {
        EventPayload::Values {
            values: values.to_vec(),
        }
    }

    #[test]
    fn test_motion_vector() {
        let mut driver = NativeDriver::new(SensorKind::Gyroscope);
        assert_eq!(
            driver.build_data(&values(&[0.1, 0.2, 0.3])).unwrap(),
            SensorData::Motion(MotionData {
                x: 0.1,
                y: 0.2,
                z: 0.3
            })
        );
    }

    #[test]
    fn test_short_motion_vector_rejected() {
        let mut driver = NativeDriver::new(SensorKind::Accelerometer);
        assert_matches!(
            driver.build_data(&values(&[1.0, 2.0])),
            Err(SensorError::InvalidEvent { .. })
        );
    }

    #[test]
    fn test_rotation_optional_components() {
        let mut driver = NativeDriver::new(SensorKind::Rotation);
        assert_eq!(
            driver.build_data(&values(&[0.0, 0.5, 1.0, 0.7])).unwrap(),
            SensorData::Rotation(RotationData {
                x: 0.0,
                y: 0.5,
                z: 1.0,
                cos: Some(0.7),
                heading_accuracy: None,
            })
        );
    }

    #[test]
    fn test_environment_scalar() {
        let mut driver = NativeDriver::new(SensorKind::AirPressure);
        assert_eq!(
            driver.build_data(&values(&[1013.25])).unwrap(),
            SensorData::Scalar(ScalarData { value: 1013.25 })
        );
    }

    #[test]
    fn test_step_counter() {
        let mut driver = NativeDriver::new(SensorKind::StepCounter);
        assert_eq!(
            driver.build_data(&values(&[1234.0])).unwrap(),
            SensorData::StepCount(StepCountData { steps: 1234 })
        );
        assert!(driver.build_data(&values(&[-1.0])).is_err());
    }

    #[test]
    fn test_step_detector_ignores_values() {
        let mut driver = NativeDriver::new(SensorKind::StepDetector);
        assert_eq!(
            driver.build_data(&values(&[1.0])).unwrap(),
            SensorData::StepDetected
        );
    }
}
