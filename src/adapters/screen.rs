use super::{unexpected_payload, SensorDriver};
use crate::data::{ScreenData, ScreenState, SensorData};
use crate::error::SensorError;
use crate::event::EventPayload;
use crate::types::SensorKind;

/// Driver for screen on/off broadcasts; repeated states are not posted
#[derive(Default)]
pub struct ScreenStatusDriver {
    last_posted: Option<ScreenState>,
}

impl SensorDriver for ScreenStatusDriver {
    fn kind(&self) -> SensorKind {
        SensorKind::ScreenStatus
    }

    fn build_data(&mut self, payload: &EventPayload) -> Result<SensorData, SensorError> {
        match payload {
            EventPayload::Screen { state } => Ok(SensorData::Screen(ScreenData { state: *state })),
            other => Err(unexpected_payload(SensorKind::ScreenStatus, other)),
        }
    }

    fn should_post(&mut self, data: &SensorData) -> bool {
        let SensorData::Screen(screen) = data else {
            return true;
        };
        if self.last_posted == Some(screen.state) {
            return false;
        }
        self.last_posted = Some(screen.state);
        true
    }
}
