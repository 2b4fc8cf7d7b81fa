//! Host platform abstraction
//!
//! The registry never talks to an operating system directly. A host provides a
//! [`SensorPlatform`] that opens one [`PlatformHandle`] per registered sensor;
//! the handle acquires and releases the underlying sensor service.
//!
//! [`InMemoryPlatform`] is a platform whose availability and permissions are
//! set programmatically. It backs the CLI replay mode, the C ABI (where the
//! host pushes events itself) and the tests.

use crate::config::SensorConfiguration;
use crate::types::{Permission, SensorKind};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// Failure to acquire a platform sensor service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    #[error("sensor is not available on this device")]
    NotAvailable,

    #[error("permission {} was not granted", .0.as_str())]
    PermissionDenied(Permission),

    #[error("{0}")]
    Failed(String),
}

/// Exclusive handle to one platform sensor service
pub trait PlatformHandle: Send {
    /// Begin callback delivery with the given configuration
    fn acquire(&mut self, config: &SensorConfiguration) -> Result<(), PlatformError>;

    /// Stop callback delivery. Once this returns the platform must not
    /// deliver further events for this handle.
    fn release(&mut self);
}

/// Host capability that hands out sensor handles
pub trait SensorPlatform: Send {
    /// Open a handle for `kind`. Opening never acquires the service.
    fn open(&self, kind: SensorKind) -> Box<dyn PlatformHandle>;

    /// Whether the device has the hardware or service backing `kind`
    fn is_available(&self, kind: SensorKind) -> bool;

    /// Whether the host granted `permission`
    fn is_permission_granted(&self, permission: Permission) -> bool;
}

#[derive(Debug, Default)]
struct PlatformState {
    unavailable: HashSet<SensorKind>,
    denied: HashSet<Permission>,
    failing: HashMap<SensorKind, String>,
    active: HashMap<SensorKind, SensorConfiguration>,
    acquisitions: usize,
}

/// Programmable platform: every sensor is available and every permission is
/// granted until told otherwise.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPlatform {
    state: Arc<Mutex<PlatformState>>,
}

impl InMemoryPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, PlatformState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mark the sensor backing `kind` as present or absent
    pub fn set_available(&self, kind: SensorKind, available: bool) {
        let mut state = self.state();
        if available {
            state.unavailable.remove(&kind);
        } else {
            state.unavailable.insert(kind);
        }
    }

    /// Grant or revoke a runtime permission
    pub fn set_permission(&self, permission: Permission, granted: bool) {
        let mut state = self.state();
        if granted {
            state.denied.remove(&permission);
        } else {
            state.denied.insert(permission);
        }
    }

    /// Make the next acquisitions of `kind` fail with `reason`
    pub fn fail_acquire(&self, kind: SensorKind, reason: impl Into<String>) {
        self.state().failing.insert(kind, reason.into());
    }

    /// Whether a handle for `kind` currently holds the service
    pub fn is_active(&self, kind: SensorKind) -> bool {
        self.state().active.contains_key(&kind)
    }

    /// Configuration the active handle for `kind` was acquired with
    pub fn active_configuration(&self, kind: SensorKind) -> Option<SensorConfiguration> {
        self.state().active.get(&kind).cloned()
    }

    /// Number of successful acquisitions so far
    pub fn acquisitions(&self) -> usize {
        self.state().acquisitions
    }
}

impl SensorPlatform for InMemoryPlatform {
    fn open(&self, kind: SensorKind) -> Box<dyn PlatformHandle> {
        Box::new(InMemoryHandle {
            kind,
            state: Arc::clone(&self.state),
        })
    }

    fn is_available(&self, kind: SensorKind) -> bool {
        !self.state().unavailable.contains(&kind)
    }

    fn is_permission_granted(&self, permission: Permission) -> bool {
        !self.state().denied.contains(&permission)
    }
}

struct InMemoryHandle {
    kind: SensorKind,
    state: Arc<Mutex<PlatformState>>,
}

impl PlatformHandle for InMemoryHandle {
    fn acquire(&mut self, config: &SensorConfiguration) -> Result<(), PlatformError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        if state.unavailable.contains(&self.kind) {
            return Err(PlatformError::NotAvailable);
        }
        if let Some(permission) = self
            .kind
            .required_permissions()
            .iter()
            .find(|p| state.denied.contains(*p))
        {
            return Err(PlatformError::PermissionDenied(*permission));
        }
        if let Some(reason) = state.failing.get(&self.kind) {
            return Err(PlatformError::Failed(reason.clone()));
        }

        state.active.insert(self.kind, config.clone());
        state.acquisitions += 1;
        Ok(())
    }

    fn release(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.active.remove(&self.kind);
    }
}
