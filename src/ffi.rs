//! FFI bindings for Synheart Wellness
//!
//! This module provides C-compatible functions for calling the wellness core
//! from other languages. All payloads are JSON in null-terminated C strings.
//! Returned strings are allocated here and must be freed by the caller using
//! `wellness_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::config::WellnessConfig;
use crate::error::WellnessError;
use crate::pipeline::{
    analyze_trend_json, evaluate_anomalies_json, resolve_sleep_json, score_day_json,
    WellnessProcessor,
};
use crate::types::{Consent, DailyMetrics};

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

/// Run a JSON-in/JSON-out operation, translating errors into LAST_ERROR
unsafe fn json_call(
    input: *const c_char,
    op: fn(&str) -> Result<String, WellnessError>,
) -> *mut c_char {
    clear_last_error();

    let Some(json) = cstr_to_string(input) else {
        set_last_error("Invalid JSON string pointer");
        return ptr::null_mut();
    };

    match op(&json) {
        Ok(result) => string_to_cstr(&result),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Score one day of metrics.
///
/// Input is a `DailyMetrics` JSON object; output is
/// `{ date, wellness_score, sub_scores }`.
///
/// # Safety
/// - `metrics_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `wellness_free_string`.
/// - Returns NULL on error; call `wellness_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn wellness_score_day(metrics_json: *const c_char) -> *mut c_char {
    json_call(metrics_json, score_day_json)
}

/// Resolve one night's sleep.
///
/// Input is `{ night, window?, sensor_session?, events? }`; output is a
/// `SleepEstimate` JSON object.
///
/// # Safety
/// - `request_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `wellness_free_string`.
/// - Returns NULL on error; call `wellness_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn wellness_resolve_sleep(request_json: *const c_char) -> *mut c_char {
    json_call(request_json, resolve_sleep_json)
}

/// Evaluate a JSON array of history records, returning a JSON array of alerts.
///
/// # Safety
/// - `history_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `wellness_free_string`.
/// - Returns NULL on error; call `wellness_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn wellness_evaluate_anomalies(history_json: *const c_char) -> *mut c_char {
    json_call(history_json, evaluate_anomalies_json)
}

/// Summarize trends and patterns over a JSON array of history records.
///
/// # Safety
/// - `history_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `wellness_free_string`.
/// - Returns NULL on error; call `wellness_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn wellness_analyze_trend(history_json: *const c_char) -> *mut c_char {
    json_call(history_json, analyze_trend_json)
}

// ============================================================================
// Stateful Processor API
// ============================================================================

/// Opaque handle to a WellnessProcessor
pub struct WellnessProcessorHandle {
    processor: WellnessProcessor,
}

/// Create a processor with in-memory history and local-only alerts.
///
/// # Safety
/// - `config_json` may be NULL (defaults) or a valid null-terminated C string.
/// - Returns a pointer that must be freed with `wellness_processor_free`.
/// - Returns NULL on error; call `wellness_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn wellness_processor_new(
    config_json: *const c_char,
) -> *mut WellnessProcessorHandle {
    clear_last_error();

    let config = if config_json.is_null() {
        WellnessConfig::default()
    } else {
        let Some(json) = cstr_to_string(config_json) else {
            set_last_error("Invalid config string pointer");
            return ptr::null_mut();
        };
        match WellnessConfig::from_json(&json) {
            Ok(config) => config,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        }
    };

    let handle = Box::new(WellnessProcessorHandle {
        processor: WellnessProcessor::new(config),
    });
    Box::into_raw(handle)
}

/// Free a processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `wellness_processor_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn wellness_processor_free(processor: *mut WellnessProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Submit one day of metrics and return the submission report.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `wellness_processor_new`.
/// - `metrics_json` must be a valid null-terminated C string.
/// - `usage_tracking` is the consent flag (non-zero = consented).
/// - Returns a newly allocated string that must be freed with `wellness_free_string`.
/// - Returns NULL on error; call `wellness_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn wellness_processor_submit(
    processor: *mut WellnessProcessorHandle,
    metrics_json: *const c_char,
    usage_tracking: i32,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &mut *processor;

    let Some(json) = cstr_to_string(metrics_json) else {
        set_last_error("Invalid JSON string pointer");
        return ptr::null_mut();
    };

    let consent = Consent {
        usage_tracking: usage_tracking != 0,
    };

    let result = serde_json::from_str::<DailyMetrics>(&json)
        .map_err(WellnessError::from)
        .and_then(|metrics| handle.processor.submit_metrics(metrics, consent))
        .and_then(|report| serde_json::to_string(&report).map_err(WellnessError::from));

    match result {
        Ok(report) => string_to_cstr(&report),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Trend summary over the processor's history.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `wellness_processor_new`.
/// - Returns a newly allocated string that must be freed with `wellness_free_string`.
/// - Returns NULL on error; call `wellness_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn wellness_processor_trend(
    processor: *mut WellnessProcessorHandle,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &*processor;

    let result = handle
        .processor
        .trend_summary()
        .and_then(|summary| serde_json::to_string(&summary).map_err(WellnessError::from));

    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Mark a stored alert as acknowledged.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `wellness_processor_new`.
/// - `alert_id` must be a valid null-terminated C string.
/// - Returns 0 on success, non-zero on error.
#[no_mangle]
pub unsafe extern "C" fn wellness_processor_acknowledge_alert(
    processor: *mut WellnessProcessorHandle,
    alert_id: *const c_char,
) -> i32 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }

    let handle = &mut *processor;

    let Some(id) = cstr_to_string(alert_id) else {
        set_last_error("Invalid alert id pointer");
        return -1;
    };

    match handle.processor.acknowledge_alert(&id) {
        Ok(()) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

/// Save processor history to JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `wellness_processor_new`.
/// - Returns a newly allocated string that must be freed with `wellness_free_string`.
/// - Returns NULL on error; call `wellness_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn wellness_processor_save_history(
    processor: *mut WellnessProcessorHandle,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &*processor;

    match handle.processor.export_history() {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Load history records from JSON into the processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `wellness_processor_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns 0 on success, non-zero on error.
#[no_mangle]
pub unsafe extern "C" fn wellness_processor_load_history(
    processor: *mut WellnessProcessorHandle,
    json: *const c_char,
) -> i32 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }

    let handle = &mut *processor;

    let Some(json_str) = cstr_to_string(json) else {
        set_last_error("Invalid JSON string pointer");
        return -1;
    };

    match handle.processor.load_history(&json_str) {
        Ok(_) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by a wellness function.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a wellness function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn wellness_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next wellness call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn wellness_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn wellness_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
