//! Request token generation.

/// Supplies the value injected under `ClientConfig::token_field`.
///
/// The default implementation yields an empty token. Clients that need a
/// real one plug in their own provider, e.g. one reading a cached
/// credential, or simply a closure.
pub trait TokenProvider {
    fn generate_token(&self) -> String {
        String::new()
    }
}

/// The default provider: always an empty token.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoToken;

impl TokenProvider for NoToken {}

/// A fixed token handed in by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticToken(pub String);

impl TokenProvider for StaticToken {
    fn generate_token(&self) -> String {
        self.0.clone()
    }
}

impl<F> TokenProvider for F
where
    F: Fn() -> String,
{
    fn generate_token(&self) -> String {
        self()
    }
}
