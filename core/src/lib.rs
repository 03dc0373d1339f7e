//! Dynamic REST client core.
//!
//! # Overview
//! Calls an arbitrary REST action by name: the action becomes the URL path
//! segment after the configured base URL, and the first action invoked on
//! a client becomes the JSON key its responses are wrapped under.
//!
//! # Design
//! - `ApiClient::invoke(action, call)` is the single dispatch entry point;
//!   `api_actions!` generates named methods on top of it.
//! - Requests and responses are plain data (`HttpRequest`,
//!   `HttpResponse`). A `Transport` executes them; `UreqTransport` is the
//!   blocking default behind the `ureq` feature.
//! - `prepare` / `finish` expose the pipeline without I/O so a host (the
//!   FFI layer, for one) can run the round-trip itself.
//! - Optional route verification checks each action against a remote
//!   registry first; unlisted actions yield [`ROUTE_NOT_FOUND`] as a normal
//!   result.

pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod token;
#[cfg(feature = "ureq")]
pub mod transport;
pub mod types;

pub use client::{query_string, request_path, route_listed, ApiClient, Prepared, ROUTE_NOT_FOUND};
pub use config::{ClientConfig, WrapMode};
pub use dispatch::Invoke;
pub use error::{ApiError, TransportError};
pub use http::{Auth, Detached, HttpMethod, HttpRequest, HttpResponse, RequestBody, Transport};
pub use token::{NoToken, StaticToken, TokenProvider};
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
pub use types::{render_scalar, Call, Params};
