//! Error types for the dynamic API client.
//!
//! # Design
//! `TransportError` covers everything that goes wrong on the wire, including
//! non-2xx statuses, and is carried unmodified inside `ApiError::Transport`.
//! A route rejected by the action registry is not an error at all: it comes
//! back as a successful `{"error":"Route not found!"}` payload.

use thiserror::Error;

/// Failures raised by a `Transport` or by the status check applied to its
/// responses.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request never produced a response (DNS, refused, reset, ...).
    #[error("connection failed: {0}")]
    Connection(String),

    /// The transport gave up waiting for the server.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The request could not be expressed for the underlying client.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The auth scheme has no mapping onto an `Authorization` header.
    #[error("unsupported auth scheme `{0}`")]
    UnsupportedAuth(String),

    /// The response body could not be read as text.
    #[error("failed to read response body: {0}")]
    Body(String),
}

/// Errors returned by `ApiClient` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The client is not usable as configured, e.g. the host is blank.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A positional argument list did not start with an HTTP verb.
    #[error("missing HTTP verb for action `{action}`")]
    MissingVerb { action: String },

    /// A positional argument had the wrong shape.
    #[error("invalid call arguments: {0}")]
    InvalidArguments(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A payload the client has to parse was not the JSON it expected.
    #[error("malformed response: {0}")]
    ResponseFormat(String),
}

impl ApiError {
    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Transport(TransportError::Status { status, .. }) => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_displays_code_and_body() {
        let err = ApiError::from(TransportError::Status {
            status: 503,
            body: "down".to_string(),
        });
        assert_eq!(err.to_string(), "HTTP 503: down");
        assert_eq!(err.status(), Some(503));
    }

    #[test]
    fn non_status_errors_have_no_status() {
        let err = ApiError::Configuration("host is blank".to_string());
        assert_eq!(err.status(), None);
        assert_eq!(err.to_string(), "configuration error: host is blank");
    }

    #[test]
    fn missing_verb_names_the_action() {
        let err = ApiError::MissingVerb {
            action: "users".to_string(),
        };
        assert_eq!(err.to_string(), "missing HTTP verb for action `users`");
    }
}
