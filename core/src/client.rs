//! The dynamic REST client.
//!
//! # Design
//! `ApiClient` turns an action name plus a `Call` into an HTTP request:
//! the action becomes the first path segment after the configured base URL
//! and, on the first call, the element name responses are wrapped under.
//! The pipeline is split into deterministic halves (`prepare`, `finish`,
//! `routes_request`, `route_listed`) so a caller can run the I/O itself;
//! `invoke` strings them together around a `Transport`.
//!
//! Configuration is fixed once the client is built. The only state that
//! changes afterwards is the element name, which is written at most once.

use std::fmt;
use std::sync::OnceLock;

use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::config::{ClientConfig, WrapMode};
use crate::error::{ApiError, TransportError};
use crate::http::{Auth, HttpMethod, HttpRequest, HttpResponse, RequestBody, Transport};
use crate::token::{NoToken, TokenProvider};
use crate::types::{render_scalar, Call, Params};

/// Payload returned, as a successful result, for an action the routes
/// registry does not list.
pub const ROUTE_NOT_FOUND: &str = r#"{"error":"Route not found!"}"#;

/// A built request together with the element name its response is wrapped
/// under.
#[derive(Debug, Clone, PartialEq)]
pub struct Prepared {
    pub request: HttpRequest,
    pub element: Option<String>,
}

pub struct ApiClient<T> {
    config: ClientConfig,
    transport: T,
    token: Box<dyn TokenProvider + Send + Sync>,
    element: OnceLock<String>,
}

impl<T: fmt::Debug> fmt::Debug for ApiClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.config)
            .field("transport", &self.transport)
            .field("element", &self.element.get())
            .finish_non_exhaustive()
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn new(config: ClientConfig, transport: T) -> Self {
        Self {
            config,
            transport,
            token: Box::new(NoToken),
            element: OnceLock::new(),
        }
    }

    pub fn with_token_provider<P>(mut self, provider: P) -> Self
    where
        P: TokenProvider + Send + Sync + 'static,
    {
        self.token = Box::new(provider);
        self
    }

    /// Name the element responses are wrapped under.
    ///
    /// Like the name derived from the first action, it is set at most once:
    /// a blank name or an already-frozen element leaves things unchanged.
    pub fn element(self, name: &str) -> Self {
        self.freeze_element(name.trim());
        self
    }

    /// Send parameters as a JSON body for every verb.
    pub fn to_json(mut self) -> Self {
        self.config.to_json = true;
        self
    }

    /// Attach basic-auth credentials.
    pub fn auth(self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth_with(Auth::basic(username, password))
    }

    /// Attach credentials with an explicit scheme.
    ///
    /// The scheme is carried on each request as-is. `UreqTransport` and the
    /// C interface render `basic` and `bearer` only; any other scheme
    /// (`digest`, `ntlm`, ...) fails with `TransportError::UnsupportedAuth`
    /// when the request is sent, so a custom `Transport` has to handle it.
    pub fn auth_with(mut self, auth: Auth) -> Self {
        self.config.auth = Some(auth);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The name responses are currently wrapped under, if any.
    pub fn element_name(&self) -> Option<&str> {
        if !self.config.named_return {
            return None;
        }
        self.element
            .get()
            .map(String::as_str)
            .filter(|name| !name.is_empty())
    }

    /// Dispatch `action` with the given call arguments.
    ///
    /// Returns the (possibly wrapped) response body, or [`ROUTE_NOT_FOUND`]
    /// when route verification is enabled and rejects the action.
    pub fn invoke(&self, action: &str, call: Call) -> Result<String, ApiError> {
        self.admit(action)?;
        self.dispatch(action, &call)
    }

    /// Dispatch `action` with positional arguments
    /// `[verb, segments?, params?, headers?]`.
    ///
    /// The element name and host are settled before the arguments are
    /// decoded, so a blank host is reported as such whatever the arguments.
    pub fn call(&self, action: &str, args: &[Value]) -> Result<String, ApiError> {
        self.admit(action)?;
        let call = Call::from_args(action, args)?;
        self.dispatch(action, &call)
    }

    /// Freeze the element name on `action`, then check the host.
    ///
    /// Every dispatch starts here, before route verification and before the
    /// request (and its token) is built.
    pub fn admit(&self, action: &str) -> Result<(), ApiError> {
        self.freeze_element(action);
        self.config.ensure_host()
    }

    fn dispatch(&self, action: &str, call: &Call) -> Result<String, ApiError> {
        if !self.is_route_allowed(action)? {
            warn!(action, "action not listed by the routes registry");
            return Ok(ROUTE_NOT_FOUND.to_string());
        }

        let request = self.build_request(action, call);
        debug!(
            action,
            method = %request.method,
            url = %request.full_url(),
            "dispatching call"
        );
        let response = self.transport.send(&request)?;
        self.finish(response, self.element_name())
    }

    /// Whether the routes registry lists `action`. Always true when
    /// verification is disabled.
    pub fn is_route_allowed(&self, action: &str) -> Result<bool, ApiError> {
        let Some(request) = self.routes_request() else {
            return Ok(true);
        };
        debug!(url = %request.full_url(), "fetching action routes");
        let response = self.transport.send(&request)?;
        let body = self.finish(response, None)?;
        route_listed(&body, action)
    }

    /// The request that fetches the routes registry, if verification is
    /// enabled.
    pub fn routes_request(&self) -> Option<HttpRequest> {
        let path = self.config.routes_path()?;
        Some(self.build_request(path, &Call::post()))
    }

    /// Host check, element freezing and request construction, without I/O.
    pub fn prepare(&self, action: &str, call: &Call) -> Result<Prepared, ApiError> {
        self.admit(action)?;
        Ok(Prepared {
            request: self.build_request(action, call),
            element: self.element_name().map(str::to_owned),
        })
    }

    /// Build the request for `action` without touching element state.
    pub fn build_request(&self, action: &str, call: &Call) -> HttpRequest {
        let url = format!(
            "{}{}",
            self.config.base_url(),
            request_path(action, &call.segments)
        );

        let mut params = call.params.clone();
        if let Some(field) = self.config.token_field() {
            params.insert(
                field.to_string(),
                Value::String(self.token.generate_token()),
            );
        }

        let (query, body) = if self.config.to_json {
            (None, Some(RequestBody::Json(params)))
        } else if call.method == HttpMethod::Get {
            (Some(query_string(&params)).filter(|q| !q.is_empty()), None)
        } else {
            (None, Some(RequestBody::Form(params)))
        };

        HttpRequest {
            method: call.method.clone(),
            url,
            query,
            headers: call.headers.clone(),
            body,
            auth: self.config.auth.clone(),
        }
    }

    /// Check the status and apply element wrapping to a response.
    pub fn finish(&self, response: HttpResponse, element: Option<&str>) -> Result<String, ApiError> {
        check_status(&response)?;
        trace!(
            status = response.status,
            bytes = response.body.len(),
            "received response"
        );
        match element {
            Some(name) if !name.is_empty() => wrap(self.config.wrap_mode, name, response.body),
            _ => Ok(response.body),
        }
    }

    fn freeze_element(&self, name: &str) {
        if name.trim().is_empty() {
            return;
        }
        if self.element.set(name.to_string()).is_ok() {
            debug!(element = name, "response element name frozen");
        }
    }
}

/// `action`, then the segments joined by `/`.
///
/// A separator is inserted before the segments unless the first one
/// already starts with `/`.
pub fn request_path(action: &str, segments: &[String]) -> String {
    let Some(first) = segments.first() else {
        return action.to_string();
    };
    let joined = segments.join("/");
    if first.starts_with('/') {
        format!("{action}{joined}")
    } else {
        format!("{action}/{joined}")
    }
}

/// `key=value` pairs joined by `&`, in insertion order.
///
/// Keys and values are not percent-encoded.
pub fn query_string(params: &Params) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{key}={}", render_scalar(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Whether a routes registry payload lists `action`.
///
/// The payload must be a JSON array; entries without a string `action`
/// never match.
pub fn route_listed(body: &str, action: &str) -> Result<bool, ApiError> {
    let routes: Vec<Value> = serde_json::from_str(body)
        .map_err(|e| ApiError::ResponseFormat(format!("action routes: {e}")))?;
    Ok(routes
        .iter()
        .any(|route| route.get("action").and_then(Value::as_str) == Some(action)))
}

fn check_status(response: &HttpResponse) -> Result<(), TransportError> {
    if response.is_success() {
        return Ok(());
    }
    Err(TransportError::Status {
        status: response.status,
        body: response.body.clone(),
    })
}

fn wrap(mode: WrapMode, name: &str, body: String) -> Result<String, ApiError> {
    match mode {
        WrapMode::Literal => Ok(format!("{{\"{name}\":{body}}}")),
        WrapMode::Structured => {
            let value: Value = serde_json::from_str(&body)
                .map_err(|e| ApiError::ResponseFormat(format!("body of `{name}`: {e}")))?;
            let mut wrapped = Params::new();
            wrapped.insert(name.to_string(), value);
            Ok(Value::Object(wrapped).to_string())
        }
    }
}
