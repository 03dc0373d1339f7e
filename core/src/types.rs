//! Per-call argument types.
//!
//! # Design
//! A `Call` is what a dynamic method invocation carries besides its name:
//! the verb, extra path segments, parameters and headers. It can be built
//! fluently from Rust or decoded from the positional list
//! `[verb, segments?, params?, headers?]` used by dynamic callers.

use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::http::HttpMethod;

/// Request parameters in insertion order.
pub type Params = Map<String, Value>;

/// Render a JSON value the way it appears in a query string or form field.
///
/// Strings are emitted verbatim, `null` as the empty string, and nested
/// arrays or objects as compact JSON text.
pub fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        nested => nested.to_string(),
    }
}

/// Arguments of one dynamic call.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: HttpMethod,
    pub segments: Vec<String>,
    pub params: Params,
    pub headers: Vec<(String, String)>,
}

impl Call {
    pub fn new(verb: impl AsRef<str>) -> Self {
        Self {
            method: HttpMethod::parse(verb.as_ref()),
            segments: Vec::new(),
            params: Params::new(),
            headers: Vec::new(),
        }
    }

    pub fn get() -> Self {
        Self::new("GET")
    }

    pub fn post() -> Self {
        Self::new("POST")
    }

    pub fn put() -> Self {
        Self::new("PUT")
    }

    pub fn patch() -> Self {
        Self::new("PATCH")
    }

    pub fn delete() -> Self {
        Self::new("DELETE")
    }

    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    pub fn segments<I, S>(mut self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.segments.extend(segments.into_iter().map(Into::into));
        self
    }

    /// Set a parameter, replacing any earlier value under the same key.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn params(mut self, params: Params) -> Self {
        self.params.extend(params);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Decode the positional argument list `[verb, segments?, params?, headers?]`.
    ///
    /// Absent or `null` optional slots are treated as empty. Arguments past
    /// the fourth are ignored.
    pub fn from_args(action: &str, args: &[Value]) -> Result<Self, ApiError> {
        let verb = args
            .first()
            .and_then(Value::as_str)
            .filter(|verb| !verb.trim().is_empty())
            .ok_or_else(|| ApiError::MissingVerb {
                action: action.to_string(),
            })?;
        let mut call = Call::new(verb);

        match args.get(1) {
            None | Some(Value::Null) => {}
            Some(Value::Array(items)) => {
                for item in items {
                    if item.is_array() || item.is_object() {
                        return Err(ApiError::InvalidArguments(format!(
                            "path segment of `{action}` must be a scalar, got {item}"
                        )));
                    }
                    call.segments.push(render_scalar(item));
                }
            }
            Some(other) => {
                return Err(ApiError::InvalidArguments(format!(
                    "path segments of `{action}` must be an array, got {other}"
                )));
            }
        }

        match args.get(2) {
            None | Some(Value::Null) => {}
            Some(Value::Object(params)) => call.params = params.clone(),
            Some(other) => {
                return Err(ApiError::InvalidArguments(format!(
                    "parameters of `{action}` must be an object, got {other}"
                )));
            }
        }

        match args.get(3) {
            None | Some(Value::Null) => {}
            Some(Value::Object(headers)) => {
                for (name, value) in headers {
                    if value.is_array() || value.is_object() {
                        return Err(ApiError::InvalidArguments(format!(
                            "header `{name}` of `{action}` must be a scalar"
                        )));
                    }
                    call.headers.push((name.clone(), render_scalar(value)));
                }
            }
            Some(other) => {
                return Err(ApiError::InvalidArguments(format!(
                    "headers of `{action}` must be an object, got {other}"
                )));
            }
        }

        Ok(call)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn render_scalar_variants() {
        assert_eq!(render_scalar(&json!("a b")), "a b");
        assert_eq!(render_scalar(&json!(42)), "42");
        assert_eq!(render_scalar(&json!(1.5)), "1.5");
        assert_eq!(render_scalar(&json!(false)), "false");
        assert_eq!(render_scalar(&Value::Null), "");
        assert_eq!(render_scalar(&json!([1, "x"])), r#"[1,"x"]"#);
    }

    #[test]
    fn builder_collects_everything() {
        let call = Call::post()
            .segment("5")
            .segments(["a", "b"])
            .param("x", 1)
            .param("x", 2)
            .header("X-Trace", "t1");
        assert_eq!(call.method, HttpMethod::Post);
        assert_eq!(call.segments, vec!["5", "a", "b"]);
        assert_eq!(call.params.get("x"), Some(&json!(2)));
        assert_eq!(call.headers, vec![("X-Trace".to_string(), "t1".to_string())]);
    }

    #[test]
    fn from_args_full_list() {
        let args = [
            json!("get"),
            json!(["42", 7]),
            json!({"a": "1", "b": 2}),
            json!({"X-Api": "k", "X-N": 3}),
        ];
        let call = Call::from_args("users", &args).unwrap();
        assert_eq!(call.method, HttpMethod::Get);
        assert_eq!(call.segments, vec!["42", "7"]);
        assert_eq!(call.params.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(
            call.headers,
            vec![
                ("X-Api".to_string(), "k".to_string()),
                ("X-N".to_string(), "3".to_string())
            ]
        );
    }

    #[test]
    fn from_args_verb_only() {
        let call = Call::from_args("users", &[json!("DELETE")]).unwrap();
        assert_eq!(call.method, HttpMethod::Delete);
        assert!(call.segments.is_empty());
        assert!(call.params.is_empty());
        assert!(call.headers.is_empty());
    }

    #[test]
    fn from_args_null_slots_are_empty() {
        let call = Call::from_args("users", &[json!("POST"), Value::Null, json!({"k": "v"})]).unwrap();
        assert!(call.segments.is_empty());
        assert_eq!(call.params.get("k"), Some(&json!("v")));
    }

    #[test]
    fn from_args_without_verb_fails() {
        let err = Call::from_args("users", &[]).unwrap_err();
        assert!(matches!(err, ApiError::MissingVerb { action } if action == "users"));

        let err = Call::from_args("users", &[json!(5)]).unwrap_err();
        assert!(matches!(err, ApiError::MissingVerb { .. }));
    }

    #[test]
    fn from_args_rejects_wrong_shapes() {
        let err = Call::from_args("users", &[json!("GET"), json!("42")]).unwrap_err();
        assert!(matches!(err, ApiError::InvalidArguments(_)));

        let err = Call::from_args("users", &[json!("GET"), json!([["x"]])]).unwrap_err();
        assert!(matches!(err, ApiError::InvalidArguments(_)));

        let err = Call::from_args("users", &[json!("GET"), json!([]), json!([1])]).unwrap_err();
        assert!(matches!(err, ApiError::InvalidArguments(_)));

        let err = Call::from_args("users", &[json!("GET"), json!([]), json!({}), json!({"h": {}})])
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidArguments(_)));
    }
}
