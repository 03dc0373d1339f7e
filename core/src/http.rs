//! HTTP request/response data and the transport seam.
//!
//! # Design
//! Requests and responses are plain data. `ApiClient` builds an
//! `HttpRequest` and either hands it to a `Transport` or returns it to a
//! caller that executes the round-trip itself (the FFI layer does this).
//! All fields use owned types so values can cross FFI boundaries without
//! lifetime concerns.

use std::fmt;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TransportError;
use crate::types::{render_scalar, Params};

/// HTTP method for a request.
///
/// Verbs outside the common set are kept verbatim (upper-cased) and passed
/// through to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Other(String),
}

impl HttpMethod {
    /// Parse a verb case-insensitively.
    pub fn parse(verb: &str) -> Self {
        let upper = verb.trim().to_ascii_uppercase();
        match upper.as_str() {
            "GET" => HttpMethod::Get,
            "POST" => HttpMethod::Post,
            "PUT" => HttpMethod::Put,
            "PATCH" => HttpMethod::Patch,
            "DELETE" => HttpMethod::Delete,
            "HEAD" => HttpMethod::Head,
            "OPTIONS" => HttpMethod::Options,
            _ => HttpMethod::Other(upper),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Other(verb) => verb,
        }
    }
}

impl From<&str> for HttpMethod {
    fn from(verb: &str) -> Self {
        HttpMethod::parse(verb)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_scheme() -> String {
    "basic".to_string()
}

/// Credentials attached to every request of a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Auth {
    pub username: String,
    pub password: String,
    #[serde(default = "default_scheme")]
    pub scheme: String,
}

impl Auth {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        scheme: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            scheme: scheme.into(),
        }
    }

    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::new(username, password, default_scheme())
    }

    pub fn is_basic(&self) -> bool {
        self.scheme.eq_ignore_ascii_case("basic")
    }

    /// Render the `Authorization` header value for this scheme.
    ///
    /// `basic` encodes `username:password`; `bearer` sends the password as
    /// the token. Anything else has no header form.
    pub fn header_value(&self) -> Result<String, TransportError> {
        if self.is_basic() {
            let raw = format!("{}:{}", self.username, self.password);
            return Ok(format!("Basic {}", STANDARD.encode(raw)));
        }
        if self.scheme.eq_ignore_ascii_case("bearer") {
            return Ok(format!("Bearer {}", self.password));
        }
        Err(TransportError::UnsupportedAuth(self.scheme.clone()))
    }
}

/// Body of a request that carries parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// `application/x-www-form-urlencoded`
    Form(Params),
    /// `application/json`
    Json(Params),
}

impl RequestBody {
    pub fn content_type(&self) -> &'static str {
        match self {
            RequestBody::Form(_) => "application/x-www-form-urlencoded",
            RequestBody::Json(_) => "application/json",
        }
    }

    pub fn params(&self) -> &Params {
        match self {
            RequestBody::Form(params) | RequestBody::Json(params) => params,
        }
    }

    /// Serialize the body to the text sent on the wire.
    pub fn encode(&self) -> String {
        match self {
            RequestBody::Form(params) => {
                let mut form = url::form_urlencoded::Serializer::new(String::new());
                for (key, value) in params {
                    form.append_pair(key, &render_scalar(value));
                }
                form.finish()
            }
            RequestBody::Json(params) => Value::Object(params.clone()).to_string(),
        }
    }
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    /// Absolute URL without the query string.
    pub url: String,
    /// Raw query string, appended verbatim after `?`.
    pub query: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
    pub auth: Option<Auth>,
}

impl HttpRequest {
    pub fn full_url(&self) -> String {
        match &self.query {
            Some(query) => format!("{}?{query}", self.url),
            None => self.url.clone(),
        }
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The HTTP collaborator a client sends its requests through.
///
/// Implementations return every response as data, whatever its status;
/// the client decides what counts as a failure.
pub trait Transport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request)
    }
}

/// Transport for callers that execute prepared requests themselves.
///
/// Any attempt to send through it fails; use `ApiClient::prepare` and
/// `ApiClient::finish` instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct Detached;

impl Transport for Detached {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        Err(TransportError::Connection(format!(
            "no transport attached for {} {}",
            request.method,
            request.full_url()
        )))
    }
}
