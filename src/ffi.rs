//! FFI bindings for Tabnudge
//!
//! This module provides C-compatible functions for driving the evaluator from a
//! host shell (a browser extension's native host, WASM glue, a mobile app).
//! Events and timestamps cross the boundary as null-terminated JSON/RFC 3339
//! strings; fired triggers come back as a JSON array that must be freed by the
//! caller using `tabnudge_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use chrono::{DateTime, FixedOffset};

use crate::catalog::Catalog;
use crate::config::EngineConfig;
use crate::engine::Evaluator;
use crate::error::EngineError;
use crate::events::TimedEvent;
use crate::types::FiredTrigger;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

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

/// NULL means "not provided"; a non-NULL string that is not UTF-8 is an error
unsafe fn optional_cstr(ptr: *const c_char, what: &str) -> Result<Option<String>, EngineError> {
    if ptr.is_null() {
        return Ok(None);
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map(|s| Some(s.to_string()))
        .map_err(|e| EngineError::InvalidConfig(format!("{what} is not valid UTF-8: {e}")))
}

unsafe fn parse_time(ptr: *const c_char) -> Result<DateTime<FixedOffset>, String> {
    let raw = cstr_to_string(ptr).ok_or_else(|| "Invalid timestamp string pointer".to_string())?;
    DateTime::parse_from_rfc3339(raw.trim()).map_err(|e| format!("Invalid timestamp {raw:?}: {e}"))
}

fn fired_to_cstr(fired: &[FiredTrigger]) -> *mut c_char {
    match serde_json::to_string(fired) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Engine API
// ============================================================================

/// Opaque handle to an Evaluator
pub struct TabnudgeEngineHandle {
    evaluator: Evaluator,
}

/// Create an evaluator.
///
/// # Safety
/// - `catalog_json` and `config_json` may be NULL (built-in catalog, default
///   config) or valid null-terminated C strings.
/// - Returns a pointer that must be freed with `tabnudge_engine_free`.
/// - Returns NULL on error; call `tabnudge_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn tabnudge_engine_new(
    catalog_json: *const c_char,
    config_json: *const c_char,
) -> *mut TabnudgeEngineHandle {
    clear_last_error();

    let build = || -> Result<Evaluator, EngineError> {
        let catalog = match optional_cstr(catalog_json, "catalog")? {
            Some(json) => Catalog::from_json(&json)?,
            None => Catalog::builtin(),
        };
        let config = match optional_cstr(config_json, "config")? {
            Some(json) => EngineConfig::from_json(&json)?,
            None => EngineConfig::default(),
        };
        Evaluator::new(catalog, config)
    };

    match build() {
        Ok(evaluator) => Box::into_raw(Box::new(TabnudgeEngineHandle { evaluator })),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free an evaluator.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `tabnudge_engine_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn tabnudge_engine_free(engine: *mut TabnudgeEngineHandle) {
    if !engine.is_null() {
        drop(Box::from_raw(engine));
    }
}

/// Start the evaluator at the given RFC 3339 time.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `tabnudge_engine_new`.
/// - `now` must be a valid null-terminated C string.
/// - Returns 0 on success, non-zero on error.
#[no_mangle]
pub unsafe extern "C" fn tabnudge_engine_start(
    engine: *mut TabnudgeEngineHandle,
    now: *const c_char,
) -> i32 {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return -1;
    }
    let handle = &mut *engine;

    match parse_time(now) {
        Ok(at) => {
            handle.evaluator.start(at);
            0
        }
        Err(msg) => {
            set_last_error(&msg);
            -1
        }
    }
}

/// Stop the evaluator, cancelling its timers.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `tabnudge_engine_new`, or NULL.
#[no_mangle]
pub unsafe extern "C" fn tabnudge_engine_stop(engine: *mut TabnudgeEngineHandle) {
    if let Some(handle) = engine.as_mut() {
        handle.evaluator.stop();
    }
}

/// Handle one timestamped event and return the triggers it fired.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `tabnudge_engine_new`.
/// - `event_json` must be a valid null-terminated C string holding one event.
/// - Returns a newly allocated JSON array that must be freed with `tabnudge_free_string`.
/// - Returns NULL on error; call `tabnudge_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn tabnudge_engine_handle_event(
    engine: *mut TabnudgeEngineHandle,
    event_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return ptr::null_mut();
    }
    let handle = &mut *engine;

    let json = match cstr_to_string(event_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid event string pointer");
            return ptr::null_mut();
        }
    };

    match TimedEvent::from_json(&json) {
        Ok(event) => fired_to_cstr(&handle.evaluator.handle(&event)),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Advance the evaluator's timers to `now` and return the triggers they fired.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `tabnudge_engine_new`.
/// - `now` must be a valid null-terminated RFC 3339 C string.
/// - Returns a newly allocated JSON array that must be freed with `tabnudge_free_string`.
/// - Returns NULL on error; call `tabnudge_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn tabnudge_engine_tick(
    engine: *mut TabnudgeEngineHandle,
    now: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return ptr::null_mut();
    }
    let handle = &mut *engine;

    match parse_time(now) {
        Ok(at) => fired_to_cstr(&handle.evaluator.tick(at)),
        Err(msg) => {
            set_last_error(&msg);
            ptr::null_mut()
        }
    }
}

/// Export the persistent trigger state as JSON (`null` before the first start).
///
/// # Safety
/// - `engine` must be a valid pointer returned by `tabnudge_engine_new`.
/// - Returns a newly allocated string that must be freed with `tabnudge_free_string`.
/// - Returns NULL on error; call `tabnudge_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn tabnudge_engine_state(engine: *mut TabnudgeEngineHandle) -> *mut c_char {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return ptr::null_mut();
    }
    let handle = &*engine;

    let json = handle
        .evaluator
        .state()
        .map_err(EngineError::from)
        .and_then(|state| serde_json::to_string(&state).map_err(EngineError::from));
    match json {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Tabnudge functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Tabnudge function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn tabnudge_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next Tabnudge function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn tabnudge_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the Tabnudge library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn tabnudge_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
