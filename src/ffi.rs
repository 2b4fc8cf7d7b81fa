//! FFI bindings for SenseKit
//!
//! This module provides C-compatible functions for driving a sensor registry
//! from other languages. Sensor kinds are passed as their snake_case names,
//! configurations and events as JSON. Returned strings are allocated and must
//! be freed by the caller using `sk_free_string`.
//!
//! Status-returning functions use 0 for success and -1 for failure; on
//! failure `sk_last_error` describes what went wrong.

use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::{c_void, CStr, CString};
use std::os::raw::c_char;
use std::ptr;
use std::str::FromStr;

use crate::config::SensorConfiguration;
use crate::error::SensorError;
use crate::event::PlatformEvent;
use crate::listener::{ListenerError, SensorDataListener};
use crate::platform::InMemoryPlatform;
use crate::registry::SensorRegistry;
use crate::types::SensorKind;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Helper to parse a sensor kind name, recording the error on failure
unsafe fn parse_kind(ptr: *const c_char) -> Option<SensorKind> {
    let Some(name) = cstr_to_string(ptr) else {
        set_last_error("Invalid sensor kind string pointer");
        return None;
    };
    match SensorKind::from_str(&name) {
        Ok(kind) => Some(kind),
        Err(e) => {
            set_last_error(&e.to_string());
            None
        }
    }
}

/// Helper to map an operation result to a status code
fn status(result: Result<(), SensorError>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

// ============================================================================
// Registry Lifecycle
// ============================================================================

/// Callback receiving each reading as a JSON string.
///
/// The string is only valid for the duration of the call.
pub type SkReadingCallback = extern "C" fn(reading_json: *const c_char, user_data: *mut c_void);

/// Opaque handle to a sensor registry
pub struct SkRegistryHandle {
    registry: SensorRegistry,
    platform: InMemoryPlatform,
    subscriptions: HashMap<u64, (SensorKind, SensorDataListener)>,
    next_subscription: u64,
}

struct UserData(*mut c_void);

// The caller owns user_data and guarantees it may be used from the thread
// events are injected on.
unsafe impl Send for UserData {}
unsafe impl Sync for UserData {}

impl UserData {
    fn get(&self) -> *mut c_void {
        self.0
    }
}

/// Create a new registry backed by an in-memory platform.
///
/// # Safety
/// - Returns a pointer to a newly allocated registry.
/// - Must be freed with `sk_registry_free`.
#[no_mangle]
pub unsafe extern "C" fn sk_registry_new() -> *mut SkRegistryHandle {
    clear_last_error();

    let platform = InMemoryPlatform::new();
    let handle = Box::new(SkRegistryHandle {
        registry: SensorRegistry::new(platform.clone()),
        platform,
        subscriptions: HashMap::new(),
        next_subscription: 1,
    });
    Box::into_raw(handle)
}

/// Free a registry. Sensors still sensing release their platform resources.
///
/// # Safety
/// - `registry` must be a valid pointer returned by `sk_registry_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn sk_registry_free(registry: *mut SkRegistryHandle) {
    if !registry.is_null() {
        drop(Box::from_raw(registry));
    }
}

/// Mark a sensor kind as present or absent on the in-memory platform.
///
/// # Safety
/// - `registry` must be a valid pointer returned by `sk_registry_new`.
/// - `kind` must be a valid null-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn sk_set_available(
    registry: *mut SkRegistryHandle,
    kind: *const c_char,
    available: bool,
) -> i32 {
    clear_last_error();

    if registry.is_null() {
        set_last_error("Null registry pointer");
        return -1;
    }
    let handle = &*registry;

    let Some(kind) = parse_kind(kind) else {
        return -1;
    };
    handle.platform.set_available(kind, available);
    0
}

/// Register a sensor with its default configuration.
///
/// # Safety
/// - `registry` must be a valid pointer returned by `sk_registry_new`.
/// - `kind` must be a valid null-terminated C string.
/// - Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn sk_register(registry: *mut SkRegistryHandle, kind: *const c_char) -> i32 {
    clear_last_error();

    if registry.is_null() {
        set_last_error("Null registry pointer");
        return -1;
    }
    let handle = &mut *registry;

    let Some(kind) = parse_kind(kind) else {
        return -1;
    };
    status(handle.registry.register(kind))
}

/// Register a sensor with a JSON configuration. The kind is taken from the
/// configuration itself.
///
/// # Safety
/// - `registry` must be a valid pointer returned by `sk_registry_new`.
/// - `config_json` must be a valid null-terminated C string.
/// - Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn sk_register_with_configuration(
    registry: *mut SkRegistryHandle,
    config_json: *const c_char,
) -> i32 {
    clear_last_error();

    if registry.is_null() {
        set_last_error("Null registry pointer");
        return -1;
    }
    let handle = &mut *registry;

    let json_str = match cstr_to_string(config_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return -1;
        }
    };

    status(
        SensorConfiguration::from_json(&json_str).and_then(|config| {
            handle
                .registry
                .register_with_configuration(config.kind, config)
        }),
    )
}

/// Deregister a sensor, dropping its subscriptions.
///
/// # Safety
/// - `registry` must be a valid pointer returned by `sk_registry_new`.
/// - `kind` must be a valid null-terminated C string.
/// - Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn sk_deregister(registry: *mut SkRegistryHandle, kind: *const c_char) -> i32 {
    clear_last_error();

    if registry.is_null() {
        set_last_error("Null registry pointer");
        return -1;
    }
    let handle = &mut *registry;

    let Some(kind) = parse_kind(kind) else {
        return -1;
    };
    let result = handle.registry.deregister(kind);
    if result.is_ok() {
        handle.subscriptions.retain(|_, (k, _)| *k != kind);
    }
    status(result)
}

/// Start sensing with a registered sensor.
///
/// # Safety
/// - `registry` must be a valid pointer returned by `sk_registry_new`.
/// - `kind` must be a valid null-terminated C string.
/// - Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn sk_start_sensing(
    registry: *mut SkRegistryHandle,
    kind: *const c_char,
) -> i32 {
    clear_last_error();

    if registry.is_null() {
        set_last_error("Null registry pointer");
        return -1;
    }
    let handle = &mut *registry;

    let Some(kind) = parse_kind(kind) else {
        return -1;
    };
    status(handle.registry.start_sensing(kind))
}

/// Stop sensing with a registered sensor.
///
/// # Safety
/// - `registry` must be a valid pointer returned by `sk_registry_new`.
/// - `kind` must be a valid null-terminated C string.
/// - Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn sk_stop_sensing(
    registry: *mut SkRegistryHandle,
    kind: *const c_char,
) -> i32 {
    clear_last_error();

    if registry.is_null() {
        set_last_error("Null registry pointer");
        return -1;
    }
    let handle = &mut *registry;

    let Some(kind) = parse_kind(kind) else {
        return -1;
    };
    status(handle.registry.stop_sensing(kind))
}

/// Start every registered sensor that is idle.
///
/// # Safety
/// - `registry` must be a valid pointer returned by `sk_registry_new`.
/// - Returns 0 if every sensor started, -1 otherwise (the first error is kept).
#[no_mangle]
pub unsafe extern "C" fn sk_start_all(registry: *mut SkRegistryHandle) -> i32 {
    clear_last_error();

    if registry.is_null() {
        set_last_error("Null registry pointer");
        return -1;
    }
    status((*registry).registry.start_all())
}

/// Stop every sensing sensor.
///
/// # Safety
/// - `registry` must be a valid pointer returned by `sk_registry_new`.
/// - Returns 0 if every sensor stopped, -1 otherwise (the first error is kept).
#[no_mangle]
pub unsafe extern "C" fn sk_stop_all(registry: *mut SkRegistryHandle) -> i32 {
    clear_last_error();

    if registry.is_null() {
        set_last_error("Null registry pointer");
        return -1;
    }
    status((*registry).registry.stop_all())
}

// ============================================================================
// Queries
// ============================================================================

/// Whether a sensor is registered.
///
/// # Safety
/// - `registry` must be a valid pointer returned by `sk_registry_new`.
/// - `kind` must be a valid null-terminated C string.
/// - Returns 1 if registered, 0 if not, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn sk_is_registered(
    registry: *const SkRegistryHandle,
    kind: *const c_char,
) -> i32 {
    clear_last_error();

    if registry.is_null() {
        set_last_error("Null registry pointer");
        return -1;
    }
    let handle = &*registry;

    let Some(kind) = parse_kind(kind) else {
        return -1;
    };
    i32::from(handle.registry.is_registered(kind))
}

/// Whether a registered sensor is sensing.
///
/// # Safety
/// - `registry` must be a valid pointer returned by `sk_registry_new`.
/// - `kind` must be a valid null-terminated C string.
/// - Returns 1 if sensing, 0 if idle, -1 on error (including not registered).
#[no_mangle]
pub unsafe extern "C" fn sk_is_sensing(
    registry: *const SkRegistryHandle,
    kind: *const c_char,
) -> i32 {
    clear_last_error();

    if registry.is_null() {
        set_last_error("Null registry pointer");
        return -1;
    }
    let handle = &*registry;

    let Some(kind) = parse_kind(kind) else {
        return -1;
    };
    match handle.registry.is_sensing(kind) {
        Ok(sensing) => i32::from(sensing),
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

/// Get the configuration of a registered sensor as JSON.
///
/// # Safety
/// - `registry` must be a valid pointer returned by `sk_registry_new`.
/// - `kind` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `sk_free_string`.
/// - Returns NULL on error; call `sk_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn sk_configuration(
    registry: *const SkRegistryHandle,
    kind: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if registry.is_null() {
        set_last_error("Null registry pointer");
        return ptr::null_mut();
    }
    let handle = &*registry;

    let Some(kind) = parse_kind(kind) else {
        return ptr::null_mut();
    };
    match handle
        .registry
        .configuration(kind)
        .and_then(|config| config.to_json())
    {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Get the CSV header of a sensor kind.
///
/// # Safety
/// - `kind` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `sk_free_string`.
/// - Returns NULL on error; call `sk_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn sk_csv_header(kind: *const c_char) -> *mut c_char {
    clear_last_error();

    match parse_kind(kind) {
        Some(kind) => string_to_cstr(crate::data::csv_header(kind)),
        None => ptr::null_mut(),
    }
}

// ============================================================================
// Subscriptions and Events
// ============================================================================

/// Subscribe a C callback to a registered sensor.
///
/// # Safety
/// - `registry` must be a valid pointer returned by `sk_registry_new`.
/// - `kind` must be a valid null-terminated C string.
/// - `user_data` is passed back unchanged and must stay valid until the
///   subscription is removed.
/// - Returns a non-zero subscription id, or 0 on error.
#[no_mangle]
pub unsafe extern "C" fn sk_subscribe(
    registry: *mut SkRegistryHandle,
    kind: *const c_char,
    callback: SkReadingCallback,
    user_data: *mut c_void,
) -> u64 {
    clear_last_error();

    if registry.is_null() {
        set_last_error("Null registry pointer");
        return 0;
    }
    let handle = &mut *registry;

    let Some(kind) = parse_kind(kind) else {
        return 0;
    };

    let user_data = UserData(user_data);
    let listener = SensorDataListener::new(move |reading| {
        let json = serde_json::to_string(reading)
            .map_err(|e| ListenerError::Failed(e.to_string()))?;
        let cstr = CString::new(json).map_err(|e| ListenerError::Failed(e.to_string()))?;
        callback(cstr.as_ptr(), user_data.get());
        Ok(())
    });

    if let Err(e) = handle.registry.subscribe(kind, listener.clone()) {
        set_last_error(&e.to_string());
        return 0;
    }

    let id = handle.next_subscription;
    handle.next_subscription += 1;
    handle.subscriptions.insert(id, (kind, listener));
    id
}

/// Remove a subscription created by `sk_subscribe`.
///
/// # Safety
/// - `registry` must be a valid pointer returned by `sk_registry_new`.
/// - Returns 0 on success, -1 if the subscription is unknown.
#[no_mangle]
pub unsafe extern "C" fn sk_unsubscribe(registry: *mut SkRegistryHandle, subscription: u64) -> i32 {
    clear_last_error();

    if registry.is_null() {
        set_last_error("Null registry pointer");
        return -1;
    }
    let handle = &mut *registry;

    let Some((kind, listener)) = handle.subscriptions.remove(&subscription) else {
        set_last_error(&format!("Unknown subscription {}", subscription));
        return -1;
    };
    status(handle.registry.unsubscribe(kind, &listener))
}

/// Remove every listener of a registered sensor.
///
/// # Safety
/// - `registry` must be a valid pointer returned by `sk_registry_new`.
/// - `kind` must be a valid null-terminated C string.
/// - Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn sk_unsubscribe_all(
    registry: *mut SkRegistryHandle,
    kind: *const c_char,
) -> i32 {
    clear_last_error();

    if registry.is_null() {
        set_last_error("Null registry pointer");
        return -1;
    }
    let handle = &mut *registry;

    let Some(kind) = parse_kind(kind) else {
        return -1;
    };
    let result = handle.registry.unsubscribe_all(kind);
    if result.is_ok() {
        handle.subscriptions.retain(|_, (k, _)| *k != kind);
    }
    status(result)
}

/// Inject a platform event, given as JSON, for a sensor.
///
/// Callbacks run synchronously before this function returns. Events for
/// sensors that are not registered or not sensing are dropped and still
/// count as success.
///
/// # Safety
/// - `registry` must be a valid pointer returned by `sk_registry_new`.
/// - `kind` and `event_json` must be valid null-terminated C strings.
/// - Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn sk_dispatch_event(
    registry: *mut SkRegistryHandle,
    kind: *const c_char,
    event_json: *const c_char,
) -> i32 {
    clear_last_error();

    if registry.is_null() {
        set_last_error("Null registry pointer");
        return -1;
    }
    let handle = &mut *registry;

    let Some(kind) = parse_kind(kind) else {
        return -1;
    };
    let json_str = match cstr_to_string(event_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return -1;
        }
    };

    let result = serde_json::from_str::<PlatformEvent>(&json_str)
        .map_err(SensorError::from)
        .and_then(|event| handle.registry.dispatch(kind, &event))
        .map(|_| ());
    status(result)
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by SenseKit functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a SenseKit function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn sk_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next SenseKit function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn sk_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the SenseKit library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn sk_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
