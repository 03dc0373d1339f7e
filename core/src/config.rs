//! Client configuration.
//!
//! # Design
//! `ClientConfig` is moved into the `ApiClient` at construction and never
//! changes afterwards. It can be assembled in code, deserialized from a JSON
//! document, or read from `DYNREST_*` environment variables.

use serde::Deserialize;

use crate::error::ApiError;
use crate::http::Auth;

/// How a response body is placed under the element name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WrapMode {
    /// Splice the raw body into `{"<name>":<body>}` without parsing it.
    #[default]
    Literal,
    /// Parse the body and re-serialize it under the name.
    Structured,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientConfig {
    /// Scheme and host, e.g. `https://api.example.com`. Required.
    pub host: String,
    /// Appended right after the host; include the leading `:`.
    pub port: String,
    /// Path prefix appended after the port, e.g. `/api`.
    pub prefix: String,
    /// Path of the action-routes registry. Verification is off when unset.
    pub action_routes: Option<String>,
    /// Wrap responses under the element name.
    pub named_return: bool,
    /// Parameter that receives a generated token on every request.
    pub token_field: Option<String>,
    /// Send parameters as a JSON body regardless of verb.
    pub to_json: bool,
    pub wrap_mode: WrapMode,
    pub auth: Option<Auth>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: String::new(),
            prefix: String::new(),
            action_routes: None,
            named_return: true,
            token_field: None,
            to_json: false,
            wrap_mode: WrapMode::Literal,
            auth: None,
        }
    }
}

impl ClientConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    pub fn with_port(mut self, port: impl Into<String>) -> Self {
        self.port = port.into();
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_action_routes(mut self, path: impl Into<String>) -> Self {
        self.action_routes = Some(path.into());
        self
    }

    pub fn with_named_return(mut self, enabled: bool) -> Self {
        self.named_return = enabled;
        self
    }

    pub fn with_token_field(mut self, field: impl Into<String>) -> Self {
        self.token_field = Some(field.into());
        self
    }

    pub fn with_wrap_mode(mut self, mode: WrapMode) -> Self {
        self.wrap_mode = mode;
        self
    }

    /// Parse a JSON configuration document. Missing keys keep defaults.
    pub fn from_json(document: &str) -> Result<Self, ApiError> {
        serde_json::from_str(document)
            .map_err(|e| ApiError::Configuration(format!("invalid client config: {e}")))
    }

    /// Read `DYNREST_*` variables from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(host) = lookup("DYNREST_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("DYNREST_PORT") {
            config.port = port;
        }
        if let Some(prefix) = lookup("DYNREST_PREFIX") {
            config.prefix = prefix;
        }
        config.action_routes = lookup("DYNREST_ACTION_ROUTES");
        if let Some(named) = lookup("DYNREST_NAMED_RETURN") {
            config.named_return = !matches!(named.trim(), "false" | "0");
        }
        config.token_field = lookup("DYNREST_TOKEN_FIELD");
        if let Some(to_json) = lookup("DYNREST_TO_JSON") {
            config.to_json = matches!(to_json.trim(), "true" | "1");
        }
        config
    }

    /// `host + port + prefix + "/"`, concatenated as-is.
    pub fn base_url(&self) -> String {
        format!("{}{}{}/", self.host, self.port, self.prefix)
    }

    pub fn ensure_host(&self) -> Result<(), ApiError> {
        if self.host.trim().is_empty() {
            return Err(ApiError::Configuration("host is required".to_string()));
        }
        Ok(())
    }

    /// Routes registry path, if verification is enabled.
    pub fn routes_path(&self) -> Option<&str> {
        self.action_routes
            .as_deref()
            .filter(|path| !path.trim().is_empty())
    }

    pub fn token_field(&self) -> Option<&str> {
        self.token_field.as_deref().filter(|field| !field.is_empty())
    }
}
