//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type with C-compatible representations:
//! `*mut c_char` instead of `String`, raw pointer + length instead of `Vec`,
//! and tagged enums with explicit discriminants. Conversion functions live
//! here to keep `lib.rs` focused on the `extern "C"` surface.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use dynrest_core::{ApiClient, ApiError, Detached, HttpRequest, HttpResponse, TransportError};

/// Opaque handle to an `ApiClient`. C callers receive a pointer to this and
/// pass it back into every FFI function.
///
/// The slot is only empty for the duration of a builder call.
pub struct FfiApiClient {
    pub(crate) inner: Option<ApiClient<Detached>>,
}

impl FfiApiClient {
    /// Replace the client with the result of a consuming builder call.
    pub(crate) fn update(&mut self, f: impl FnOnce(ApiClient<Detached>) -> ApiClient<Detached>) -> bool {
        match self.inner.take() {
            Some(client) => {
                self.inner = Some(f(client));
                true
            }
            None => false,
        }
    }
}

/// Copy a Rust string into a heap-allocated C string.
///
/// Interior NUL bytes cannot be represented and truncate the string there;
/// payload strings are checked before they get here, so only error
/// messages can be affected.
pub(crate) fn to_c_string(s: impl Into<Vec<u8>>) -> *mut c_char {
    let mut bytes = s.into();
    if let Some(nul) = bytes.iter().position(|b| *b == 0) {
        bytes.truncate(nul);
    }
    CString::new(bytes).unwrap_or_default().into_raw()
}

/// Borrow a C string as `&str`. Null or invalid UTF-8 yields `None`.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that outlives the
/// returned reference.
pub(crate) unsafe fn from_c_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

/// Free a C string previously produced by `to_c_string`. Null is ignored.
pub(crate) fn free_c_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(unsafe { CString::from_raw(ptr) });
    }
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
///
/// `url` already carries the query string. Auth credentials are rendered
/// into an `authorization` header. `body` and `content_type` are null when
/// the request has no body.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: *mut c_char,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub content_type: *mut c_char,
    pub body: *mut c_char,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    ///
    /// Fails with `InvalidRequest` if any field holds a NUL byte, since it
    /// could not reach the C side intact.
    pub(crate) fn from_core(req: HttpRequest) -> Result<*mut Self, TransportError> {
        let mut headers = req.headers.clone();
        if let Some(auth) = &req.auth {
            headers.push(("authorization".to_string(), auth.header_value()?));
        }
        let method = req.method.as_str().to_string();
        let url = req.full_url();
        let body = req.body.as_ref().map(|body| (body.content_type(), body.encode()));

        let has_nul = [method.as_str(), url.as_str()]
            .into_iter()
            .chain(headers.iter().flat_map(|(k, v)| [k.as_str(), v.as_str()]))
            .chain(body.iter().map(|(_, encoded)| encoded.as_str()))
            .any(|field| field.contains('\0'));
        if has_nul {
            return Err(TransportError::InvalidRequest(format!(
                "{method} request contains a NUL byte"
            )));
        }

        let (content_type, body) = match body {
            Some((content_type, encoded)) => (to_c_string(content_type), to_c_string(encoded)),
            None => (std::ptr::null_mut(), std::ptr::null_mut()),
        };

        let headers_len = headers.len() as u32;
        let headers = if headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Vec<FfiHeader> = headers
                .into_iter()
                .map(|(k, v)| FfiHeader {
                    key: to_c_string(k),
                    value: to_c_string(v),
                })
                .collect();
            Box::into_raw(ffi_headers.into_boxed_slice()) as *mut FfiHeader
        };

        Ok(Box::into_raw(Box::new(FfiHttpRequest {
            method: to_c_string(method),
            url: to_c_string(url),
            headers,
            headers_len,
            content_type,
            body,
        })))
    }

    /// Release a request and every string it owns.
    ///
    /// # Safety
    /// `req` must come from `from_core` and not have been freed.
    pub(crate) unsafe fn free(req: *mut Self) {
        let req = unsafe { Box::from_raw(req) };
        free_c_string(req.method);
        free_c_string(req.url);
        free_c_string(req.content_type);
        free_c_string(req.body);
        if !req.headers.is_null() && req.headers_len > 0 {
            let slice = std::ptr::slice_from_raw_parts_mut(req.headers, req.headers_len as usize);
            let headers = unsafe { Box::from_raw(slice) };
            for h in headers.iter() {
                free_c_string(h.key);
                free_c_string(h.value);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The C caller constructs this after executing a request and passes a
/// pointer back in. The FFI layer reads but does not free these fields.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

impl FfiHttpResponse {
    /// A null body is read as the empty string.
    pub(crate) fn to_core(&self) -> HttpResponse {
        let body = unsafe { from_c_str(self.body) }.unwrap_or("");
        HttpResponse::new(self.status, body)
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    Configuration = 1,
    MissingVerb = 2,
    InvalidArguments = 3,
    Transport = 4,
    HttpStatus = 5,
    ResponseFormat = 6,
    Panic = 7,
    NullArg = 8,
}

/// Tag that tells `dynrest_free_result` what `FfiResult::data` points to.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiDataTag {
    None = 0,
    /// `data` is an `FfiHttpRequest*`.
    Request = 1,
    /// `data` is a NUL-terminated `char*`.
    Text = 2,
}

/// Result envelope for every fallible operation.
///
/// On success `error_code` is `Ok`, `error_message` is null, and `data`
/// points to the payload tagged by `data_tag`. On failure `error_code`
/// names the category, `error_message` is a human-readable C string,
/// `http_status` is set for status errors, and `data` is null.
#[repr(C)]
pub struct FfiResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub data_tag: FfiDataTag,
    pub data: *mut std::ffi::c_void,
}

impl FfiResult {
    fn boxed(
        error_code: FfiErrorCode,
        error_message: *mut c_char,
        http_status: u16,
        data_tag: FfiDataTag,
        data: *mut std::ffi::c_void,
    ) -> *mut Self {
        Box::into_raw(Box::new(FfiResult {
            error_code,
            error_message,
            http_status,
            data_tag,
            data,
        }))
    }

    pub(crate) fn ok_request(req: *mut FfiHttpRequest) -> *mut Self {
        Self::boxed(
            FfiErrorCode::Ok,
            std::ptr::null_mut(),
            0,
            FfiDataTag::Request,
            req as *mut std::ffi::c_void,
        )
    }

    /// Text with an interior NUL byte is reported as `ResponseFormat`
    /// rather than handed to C cut short.
    pub(crate) fn ok_text(text: String) -> *mut Self {
        if text.contains('\0') {
            return Self::from_error(ApiError::ResponseFormat(
                "body contains a NUL byte and cannot be returned as a C string".to_string(),
            ));
        }
        Self::boxed(
            FfiErrorCode::Ok,
            std::ptr::null_mut(),
            0,
            FfiDataTag::Text,
            to_c_string(text) as *mut std::ffi::c_void,
        )
    }

    /// Build an error result from an `ApiError`.
    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        let (error_code, http_status) = match &err {
            ApiError::Configuration(_) => (FfiErrorCode::Configuration, 0),
            ApiError::MissingVerb { .. } => (FfiErrorCode::MissingVerb, 0),
            ApiError::InvalidArguments(_) => (FfiErrorCode::InvalidArguments, 0),
            ApiError::Transport(TransportError::Status { status, .. }) => {
                (FfiErrorCode::HttpStatus, *status)
            }
            ApiError::Transport(_) => (FfiErrorCode::Transport, 0),
            ApiError::ResponseFormat(_) => (FfiErrorCode::ResponseFormat, 0),
        };
        Self::boxed(
            error_code,
            to_c_string(err.to_string()),
            http_status,
            FfiDataTag::None,
            std::ptr::null_mut(),
        )
    }

    /// Build an error result for a null (or non-UTF-8) argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::boxed(
            FfiErrorCode::NullArg,
            to_c_string(format!("null argument: {name}")),
            0,
            FfiDataTag::None,
            std::ptr::null_mut(),
        )
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::boxed(
            FfiErrorCode::Panic,
            to_c_string(msg),
            0,
            FfiDataTag::None,
            std::ptr::null_mut(),
        )
    }
}
