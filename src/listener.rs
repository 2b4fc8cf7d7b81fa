//! Data listeners
//!
//! A [`SensorDataListener`] wraps an application callback. Each listener gets a
//! unique id on creation; clones share it, and subscription bookkeeping only
//! ever compares ids.

use crate::data::SensorReading;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Failure reported by a listener while handling a reading
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("Listener failed: {0}")]
    Failed(String),

    #[error("Listener receiver disconnected")]
    Disconnected,

    #[error("Listener panicked: {0}")]
    Panicked(String),
}

type Callback = dyn Fn(&SensorReading) -> Result<(), ListenerError> + Send + Sync;

/// Application callback receiving sensor readings
#[derive(Clone)]
pub struct SensorDataListener {
    id: Uuid,
    callback: Arc<Callback>,
}

impl SensorDataListener {
    /// Create a listener from a fallible callback
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&SensorReading) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        Self {
            id: Uuid::new_v4(),
            callback: Arc::new(callback),
        }
    }

    /// Create a listener from a callback that cannot fail
    pub fn from_fn<F>(callback: F) -> Self
    where
        F: Fn(&SensorReading) + Send + Sync + 'static,
    {
        Self::new(move |reading| {
            callback(reading);
            Ok(())
        })
    }

    /// Create a listener that forwards every reading into a channel
    pub fn channel() -> (Self, Receiver<SensorReading>) {
        let (tx, rx) = channel();
        (Self::forwarding(tx), rx)
    }

    /// Create a listener that forwards every reading to `tx`
    pub fn forwarding(tx: Sender<SensorReading>) -> Self {
        Self::new(move |reading| {
            tx.send(reading.clone())
                .map_err(|_| ListenerError::Disconnected)
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Invoke the callback, converting a panic into [`ListenerError::Panicked`]
    pub(crate) fn notify(&self, reading: &SensorReading) -> Result<(), ListenerError> {
        match panic::catch_unwind(AssertUnwindSafe(|| (self.callback)(reading))) {
            Ok(result) => result,
            Err(payload) => Err(ListenerError::Panicked(panic_message(payload.as_ref()))),
        }
    }
}

impl PartialEq for SensorDataListener {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for SensorDataListener {}

impl fmt::Debug for SensorDataListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SensorDataListener")
            .field("id", &self.id)
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{SensorData, StepCountData};
    use crate::types::SensorKind;
    use assert_matches::assert_matches;

    fn reading() -> SensorReading {
        SensorReading::new(
            SensorKind::StepCounter,
            1,
            SensorData::StepCount(StepCountData { steps: 10 }),
        )
    }

    #[test]
    fn test_clones_share_identity() {
        let listener = SensorDataListener::from_fn(|_| {});
        let other = SensorDataListener::from_fn(|_| {});
        assert_eq!(listener, listener.clone());
        assert_ne!(listener, other);
    }

    #[test]
    fn test_channel_listener_forwards() {
        let (listener, rx) = SensorDataListener::channel();
        listener.notify(&reading()).unwrap();
        assert_eq!(rx.try_recv().unwrap(), reading());
    }

    #[test]
    fn test_channel_listener_reports_disconnect() {
        let (listener, rx) = SensorDataListener::channel();
        drop(rx);
        assert_matches!(listener.notify(&reading()), Err(ListenerError::Disconnected));
    }

    #[test]
    fn test_panic_is_captured() {
        let listener = SensorDataListener::from_fn(|_| panic!("boom"));
        assert_matches!(
            listener.notify(&reading()),
            Err(ListenerError::Panicked(msg)) if msg == "boom"
        );
    }
}
