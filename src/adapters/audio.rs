use super::{unexpected_payload, SensorDriver};
use crate::data::{AudioLevelData, RecorderData, SensorData};
use crate::error::SensorError;
use crate::event::EventPayload;
use crate::types::SensorKind;

/// Driver for microphone level readings
pub struct AudioLevelDriver;

impl SensorDriver for AudioLevelDriver {
    fn kind(&self) -> SensorKind {
        SensorKind::AudioLevel
    }

    fn build_data(&mut self, payload: &EventPayload) -> Result<SensorData, SensorError> {
        match payload {
            EventPayload::AudioLevel { amplitude } => Ok(SensorData::AudioLevel(AudioLevelData {
                level: amplitude.saturating_abs(),
            })),
            other => Err(unexpected_payload(SensorKind::AudioLevel, other)),
        }
    }
}

/// Driver for the audio recorder's status notifications
pub struct AudioRecorderDriver;

impl SensorDriver for AudioRecorderDriver {
    fn kind(&self) -> SensorKind {
        SensorKind::AudioRecorder
    }

    fn build_data(&mut self, payload: &EventPayload) -> Result<SensorData, SensorError> {
        match payload {
            EventPayload::Recorder { status, path } => Ok(SensorData::AudioRecorder(RecorderData {
                status: *status,
                path: path.clone(),
            })),
            other => Err(unexpected_payload(SensorKind::AudioRecorder, other)),
        }
    }
}
