//! Session token lookup.
//!
//! The token is resolved per server every time a connection is attempted, so a token that is
//! refreshed by the embedding application is picked up on the next reconnect.

use async_trait::async_trait;
/// Secret string types that redact values in debug output for security.
pub use secrecy::{ExposeSecret, SecretString};

use crate::Result;

/// Capability that yields the session token used in the `authentication_challenge` frame.
///
/// Returning `Ok(None)` means the connection is opened without an authentication challenge.
#[async_trait]
pub trait TokenProvider: Send + Sync + 'static {
    async fn token(&self, server_url: &str) -> Result<Option<SecretString>>;
}

/// A fixed token, independent of the server.
#[async_trait]
impl TokenProvider for SecretString {
    async fn token(&self, _server_url: &str) -> Result<Option<SecretString>> {
        Ok(Some(self.clone()))
    }
}

/// Never authenticates.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default)]
pub struct NoToken;

#[async_trait]
impl TokenProvider for NoToken {
    async fn token(&self, _server_url: &str) -> Result<Option<SecretString>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_token_is_returned_for_any_server() {
        let provider = SecretString::from("session-token".to_owned());

        let token = provider.token("https://a.example.com").await.unwrap();
        assert_eq!(token.unwrap().expose_secret(), "session-token");

        let token = provider.token("https://b.example.com").await.unwrap();
        assert_eq!(token.unwrap().expose_secret(), "session-token");
    }

    #[tokio::test]
    async fn no_token_yields_none() {
        assert!(NoToken.token("https://a.example.com").await.unwrap().is_none());
    }
}
