//! C-ABI wrapper around `dynrest-core`.
//!
//! # Overview
//! Exposes dynamic dispatch through `extern "C"` functions in host-does-IO
//! form: the C caller asks for a built request, executes it with whatever
//! HTTP stack it has, and passes the response back to be formatted.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - A dispatch is `dynrest_build_call` → (caller I/O) →
//!   `dynrest_finish_call`. With route verification on, the caller first
//!   runs `dynrest_build_routes_request` and checks the answer with
//!   `dynrest_route_allowed`; on `"false"` it returns
//!   `dynrest_route_not_found()` instead of dispatching.
//! - A single `FfiResult` envelope with `FfiDataTag` + `void* data`
//!   conveys success payloads and errors uniformly.
//! - The C caller owns all returned pointers and must call the matching
//!   `dynrest_free_*` function to release them.

pub mod types;

use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use dynrest_core::{route_listed, ApiClient, Auth, Call, ClientConfig, Detached, StaticToken, ROUTE_NOT_FOUND};
use serde_json::Value;

use types::*;

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a client from a JSON configuration document.
///
/// Returns null if `config_json` is null, is not valid configuration, or
/// if an internal panic occurs. The caller must free the returned pointer
/// with `dynrest_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn dynrest_client_new(config_json: *const c_char) -> *mut FfiApiClient {
    catch_unwind(|| {
        let Some(document) = (unsafe { from_c_str(config_json) }) else {
            return std::ptr::null_mut();
        };
        match ClientConfig::from_json(document) {
            Ok(config) => Box::into_raw(Box::new(FfiApiClient {
                inner: Some(ApiClient::new(config, Detached)),
            })),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `dynrest_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn dynrest_client_free(client: *mut FfiApiClient) {
    if !client.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { Box::from_raw(client) });
        }));
    }
}

// ---------------------------------------------------------------------------
// Client configuration
// ---------------------------------------------------------------------------

/// Send parameters as a JSON body for every verb.
///
/// Returns false if `client` is null.
#[unsafe(no_mangle)]
pub extern "C" fn dynrest_client_to_json(client: *mut FfiApiClient) -> bool {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return false;
        }
        let client = unsafe { &mut *client };
        client.update(|c| c.to_json())
    }))
    .unwrap_or(false)
}

/// Set the element name responses are wrapped under. Has no effect once an
/// element name is frozen.
///
/// Returns false if `client` or `name` is null.
#[unsafe(no_mangle)]
pub extern "C" fn dynrest_client_element(client: *mut FfiApiClient, name: *const c_char) -> bool {
    catch_unwind(AssertUnwindSafe(|| {
        let Some(name) = (unsafe { from_c_str(name) }) else {
            return false;
        };
        if client.is_null() {
            return false;
        }
        let client = unsafe { &mut *client };
        client.update(|c| c.element(name))
    }))
    .unwrap_or(false)
}

/// Attach credentials. `scheme` may be null for basic auth.
///
/// Returns false if `client`, `username` or `password` is null.
#[unsafe(no_mangle)]
pub extern "C" fn dynrest_client_auth(
    client: *mut FfiApiClient,
    username: *const c_char,
    password: *const c_char,
    scheme: *const c_char,
) -> bool {
    catch_unwind(AssertUnwindSafe(|| {
        let (Some(username), Some(password)) =
            (unsafe { from_c_str(username) }, unsafe { from_c_str(password) })
        else {
            return false;
        };
        if client.is_null() {
            return false;
        }
        let auth = match unsafe { from_c_str(scheme) } {
            Some(scheme) => Auth::new(username, password, scheme),
            None => Auth::basic(username, password),
        };
        let client = unsafe { &mut *client };
        client.update(|c| c.auth_with(auth))
    }))
    .unwrap_or(false)
}

/// Use a fixed token for the configured token field.
///
/// Returns false if `client` or `token` is null.
#[unsafe(no_mangle)]
pub extern "C" fn dynrest_client_token(client: *mut FfiApiClient, token: *const c_char) -> bool {
    catch_unwind(AssertUnwindSafe(|| {
        let Some(token) = (unsafe { from_c_str(token) }) else {
            return false;
        };
        if client.is_null() {
            return false;
        }
        let client = unsafe { &mut *client };
        let token = StaticToken(token.to_string());
        client.update(|c| c.with_token_provider(token))
    }))
    .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Route verification
// ---------------------------------------------------------------------------

/// Build the request that fetches the action-routes registry.
///
/// Returns null if `client` is null or route verification is disabled.
/// The caller must free the returned pointer with `dynrest_free_request`.
#[unsafe(no_mangle)]
pub extern "C" fn dynrest_build_routes_request(client: *const FfiApiClient) -> *mut FfiHttpRequest {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let Some(inner) = (unsafe { &*client }).inner.as_ref() else {
            return std::ptr::null_mut();
        };
        match inner.routes_request() {
            Some(req) => FfiHttpRequest::from_core(req).unwrap_or(std::ptr::null_mut()),
            None => std::ptr::null_mut(),
        }
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Check a routes registry response for `action`.
///
/// Returns a result with `data_tag = Text` holding `"true"` or `"false"`.
#[unsafe(no_mangle)]
pub extern "C" fn dynrest_route_allowed(
    client: *const FfiApiClient,
    action: *const c_char,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return FfiResult::null_arg("client");
        }
        let Some(action) = (unsafe { from_c_str(action) }) else {
            return FfiResult::null_arg("action");
        };
        if response.is_null() {
            return FfiResult::null_arg("response");
        }
        let Some(inner) = (unsafe { &*client }).inner.as_ref() else {
            return FfiResult::null_arg("client");
        };
        let response = unsafe { &*response }.to_core();
        let allowed = inner
            .finish(response, None)
            .and_then(|body| route_listed(&body, action));
        match allowed {
            Ok(allowed) => FfiResult::ok_text(allowed.to_string()),
            Err(e) => FfiResult::from_error(e),
        }
    }))
    .unwrap_or_else(|_| FfiResult::panic("panic in dynrest_route_allowed"))
}

/// The payload to return for an action the registry does not list.
/// The caller must free it with `dynrest_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn dynrest_route_not_found() -> *mut c_char {
    to_c_string(ROUTE_NOT_FOUND)
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Build the request for `action` from positional arguments given as a JSON
/// array: `[verb, segments?, params?, headers?]`.
///
/// Freezes the element name on first use and checks the host before the
/// arguments are decoded. Returns a result with `data_tag = Request` on
/// success.
#[unsafe(no_mangle)]
pub extern "C" fn dynrest_build_call(
    client: *const FfiApiClient,
    action: *const c_char,
    args_json: *const c_char,
) -> *mut FfiResult {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return FfiResult::null_arg("client");
        }
        let Some(action) = (unsafe { from_c_str(action) }) else {
            return FfiResult::null_arg("action");
        };
        let Some(args_json) = (unsafe { from_c_str(args_json) }) else {
            return FfiResult::null_arg("args_json");
        };
        let Some(inner) = (unsafe { &*client }).inner.as_ref() else {
            return FfiResult::null_arg("client");
        };
        if let Err(e) = inner.admit(action) {
            return FfiResult::from_error(e);
        }

        let args: Vec<Value> = match serde_json::from_str(args_json) {
            Ok(args) => args,
            Err(e) => {
                return FfiResult::from_error(dynrest_core::ApiError::InvalidArguments(format!(
                    "arguments must be a JSON array: {e}"
                )));
            }
        };
        match Call::from_args(action, &args) {
            Ok(call) => match FfiHttpRequest::from_core(inner.build_request(action, &call)) {
                Ok(req) => FfiResult::ok_request(req),
                Err(e) => FfiResult::from_error(e.into()),
            },
            Err(e) => FfiResult::from_error(e),
        }
    }))
    .unwrap_or_else(|_| FfiResult::panic("panic in dynrest_build_call"))
}

/// Format the response of a request built by `dynrest_build_call`.
///
/// Returns a result with `data_tag = Text` holding the (possibly wrapped)
/// body on success, an `HttpStatus` error for a non-2xx status, or a
/// `ResponseFormat` error if the formatted text holds a NUL byte.
#[unsafe(no_mangle)]
pub extern "C" fn dynrest_finish_call(
    client: *const FfiApiClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return FfiResult::null_arg("client");
        }
        if response.is_null() {
            return FfiResult::null_arg("response");
        }
        let Some(inner) = (unsafe { &*client }).inner.as_ref() else {
            return FfiResult::null_arg("client");
        };
        let response = unsafe { &*response }.to_core();
        match inner.finish(response, inner.element_name()) {
            Ok(text) => FfiResult::ok_text(text),
            Err(e) => FfiResult::from_error(e),
        }
    }))
    .unwrap_or_else(|_| FfiResult::panic("panic in dynrest_finish_call"))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpRequest` returned by `dynrest_build_routes_request`.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn dynrest_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| unsafe { FfiHttpRequest::free(req) });
}

/// Free an `FfiResult` returned by any function above, including the
/// payload `data` points to. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn dynrest_free_result(result: *mut FfiResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        free_c_string(result.error_message);
        if !result.data.is_null() {
            match result.data_tag {
                FfiDataTag::Request => unsafe {
                    FfiHttpRequest::free(result.data as *mut FfiHttpRequest)
                },
                FfiDataTag::Text => free_c_string(result.data as *mut c_char),
                FfiDataTag::None => {}
            }
        }
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn dynrest_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| free_c_string(s));
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
