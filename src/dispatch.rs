//! Event dispatcher thread
//!
//! Platform callbacks usually arrive on threads the host does not control.
//! The dispatcher gives them a single place to go: events are pushed through
//! an [`EventSender`] and delivered one at a time, in order, by a dedicated
//! thread that holds the registry lock for each delivery.

use crate::error::SensorError;
use crate::event::PlatformEvent;
use crate::registry::SharedRegistry;
use crate::types::SensorKind;
use log::{debug, warn};
use std::sync::mpsc::{channel, Receiver, SendError, Sender};
use std::sync::PoisonError;
use std::thread::{self, JoinHandle};

enum DispatcherMessage {
    Event(SensorKind, PlatformEvent),
    Shutdown,
}

/// Cloneable handle used by platform callbacks to enqueue events
#[derive(Clone)]
pub struct EventSender {
    tx: Sender<DispatcherMessage>,
}

impl EventSender {
    /// Enqueue an event for `kind`. Fails only once the dispatcher has shut down.
    pub fn send(&self, kind: SensorKind, event: PlatformEvent) -> Result<(), SensorError> {
        self.tx
            .send(DispatcherMessage::Event(kind, event))
            .map_err(|SendError(_)| SensorError::ResourceUnavailable {
                kind,
                reason: "event dispatcher has shut down".to_string(),
            })
    }
}

/// Thread draining platform events into a shared registry
pub struct EventDispatcher {
    sender: EventSender,
    handle: Option<JoinHandle<()>>,
}

impl EventDispatcher {
    pub fn spawn(registry: SharedRegistry) -> Self {
        let (tx, rx) = channel();
        let handle = thread::spawn(move || run(registry, rx));

        Self {
            sender: EventSender { tx },
            handle: Some(handle),
        }
    }

    pub fn sender(&self) -> EventSender {
        self.sender.clone()
    }

    /// Stop the thread after the events already queued have been delivered
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        // The thread may already be gone if every sender was dropped
        let _ = self.sender.tx.send(DispatcherMessage::Shutdown);
        if handle.join().is_err() {
            warn!("Event dispatcher thread panicked");
        }
    }
}

impl Drop for EventDispatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(registry: SharedRegistry, rx: Receiver<DispatcherMessage>) {
    debug!("Event dispatcher started");

    while let Ok(message) = rx.recv() {
        match message {
            DispatcherMessage::Event(kind, event) => {
                let mut registry = registry.lock().unwrap_or_else(PoisonError::into_inner);
                if let Err(e) = registry.dispatch(kind, &event) {
                    warn!("Dropping {} event for {}: {}", event.payload.name(), kind, e);
                }
            }
            DispatcherMessage::Shutdown => break,
        }
    }

    debug!("Event dispatcher stopped");
}
