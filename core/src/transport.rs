//! Blocking `Transport` backed by ureq.

use std::fmt;
use std::time::Duration;

use tracing::trace;
use ureq::{Agent, Body, RequestBuilder};

use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};

/// Executes requests with a ureq agent.
///
/// Status codes are never treated as errors here; every response comes
/// back as data and `ApiClient` applies its own status check.
#[derive(Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqTransport").finish_non_exhaustive()
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl UreqTransport {
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Fail any request that takes longer than `timeout` overall.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::build(Some(timeout))
    }

    fn build(timeout: Option<Duration>) -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = request.full_url();
        let mut headers = request.headers.clone();
        if let Some(auth) = &request.auth {
            headers.push(("authorization".to_string(), auth.header_value()?));
        }
        let body = request
            .body
            .as_ref()
            .map(|body| (body.content_type(), body.encode()));

        trace!(method = %request.method, url = %url, "sending request");

        let result = match &request.method {
            HttpMethod::Get => send_without_body(self.agent.get(&url), &headers, body),
            HttpMethod::Delete => send_without_body(self.agent.delete(&url), &headers, body),
            HttpMethod::Head => send_without_body(self.agent.head(&url), &headers, body),
            HttpMethod::Options => send_without_body(self.agent.options(&url), &headers, body),
            HttpMethod::Post => send_with_body(self.agent.post(&url), &headers, body),
            HttpMethod::Put => send_with_body(self.agent.put(&url), &headers, body),
            HttpMethod::Patch => send_with_body(self.agent.patch(&url), &headers, body),
            HttpMethod::Other(verb) => send_custom(&self.agent, verb, &url, &headers, body),
        };

        let mut response = result.map_err(map_error)?;
        let status = response.status().as_u16();
        let response_headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| TransportError::Body(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers: response_headers,
            body,
        })
    }
}

type Encoded = Option<(&'static str, String)>;

fn with_headers<B>(mut builder: RequestBuilder<B>, headers: &[(String, String)]) -> RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn send_without_body(
    builder: RequestBuilder<ureq::typestate::WithoutBody>,
    headers: &[(String, String)],
    body: Encoded,
) -> Result<ureq::http::Response<Body>, ureq::Error> {
    let builder = with_headers(builder, headers);
    match body {
        Some(_) => send_with_body(builder.force_send_body(), &[], body),
        None => builder.call(),
    }
}

fn send_with_body(
    builder: RequestBuilder<ureq::typestate::WithBody>,
    headers: &[(String, String)],
    body: Encoded,
) -> Result<ureq::http::Response<Body>, ureq::Error> {
    let builder = with_headers(builder, headers);
    match body {
        Some((content_type, text)) => builder.content_type(content_type).send(text.as_bytes()),
        None => builder.send_empty(),
    }
}

fn send_custom(
    agent: &Agent,
    verb: &str,
    url: &str,
    headers: &[(String, String)],
    body: Encoded,
) -> Result<ureq::http::Response<Body>, ureq::Error> {
    let mut builder = ureq::http::Request::builder().method(verb).uri(url);
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    let text = match body {
        Some((content_type, text)) => {
            builder = builder.header("content-type", content_type);
            text
        }
        None => String::new(),
    };
    let request = builder.body(text)?;
    agent.run(request)
}

fn map_error(err: ureq::Error) -> TransportError {
    match err {
        ureq::Error::Timeout(timeout) => TransportError::Timeout(timeout.to_string()),
        ureq::Error::Http(e) => TransportError::InvalidRequest(e.to_string()),
        other => TransportError::Connection(other.to_string()),
    }
}
