//! Server configuration lookup.
//!
//! The client never reads global state: the endpoint, the server version and the reliable
//! WebSocket flag all come from a [`ConfigProvider`] injected at construction.

#![expect(
    clippy::module_name_repetitions,
    reason = "Configuration types intentionally mirror the module name for clarity"
)]

use async_trait::async_trait;
use bon::Builder;
use serde::Deserialize;
use url::Url;

use crate::Result;
use crate::error::Error;

/// Subset of the remote server configuration the WebSocket client depends on.
#[non_exhaustive]
#[derive(Clone, Debug, Default, Deserialize, Builder)]
pub struct ServerConfig {
    /// Overrides the WebSocket endpoint base. When absent the server URL is used with its
    /// scheme switched to `ws`/`wss`.
    #[builder(into)]
    #[serde(default)]
    pub websocket_url: Option<String>,
    /// Version reported by the server, e.g. `9.4.1`
    #[builder(into)]
    #[serde(default)]
    pub version: Option<String>,
    /// Oldest server version that supports reliable WebSockets
    #[builder(into)]
    #[serde(default)]
    pub minimum_version: Option<String>,
    /// Server-side reliable WebSocket feature flag
    #[builder(default)]
    #[serde(default)]
    pub reliable_websocket: bool,
}

impl ServerConfig {
    /// Whether the server can replay missed events for a reconnecting client.
    #[must_use]
    pub fn supports_reliable_websocket(&self) -> bool {
        if !self.reliable_websocket {
            return false;
        }

        let Some(minimum) = self.minimum_version.as_deref() else {
            return true;
        };

        match (
            self.version.as_deref().and_then(parse_version),
            parse_version(minimum),
        ) {
            (Some(version), Some(minimum)) => version >= minimum,
            _ => false,
        }
    }

    /// Resolves the WebSocket endpoint for `server_url`, appending `api_path`.
    pub fn websocket_endpoint(&self, server_url: &str, api_path: &str) -> Result<Url> {
        let base = self.websocket_url.as_deref().unwrap_or(server_url);
        let mut url = Url::parse(base)?;

        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => {
                return Err(Error::validation(format!(
                    "unsupported scheme `{other}` for WebSocket endpoint {base}"
                )));
            }
        };
        if url.set_scheme(scheme).is_err() {
            return Err(Error::validation(format!(
                "unable to use scheme `{scheme}` for {base}"
            )));
        }

        let path = format!(
            "{}/{}",
            url.path().trim_end_matches('/'),
            api_path.trim_start_matches('/')
        );
        url.set_path(&path);
        url.set_query(None);

        Ok(url)
    }
}

/// Capability that yields the [`ServerConfig`] for a server.
#[async_trait]
pub trait ConfigProvider: Send + Sync + 'static {
    async fn server_config(&self, server_url: &str) -> Result<ServerConfig>;
}

/// A fixed configuration, independent of the server.
#[async_trait]
impl ConfigProvider for ServerConfig {
    async fn server_config(&self, _server_url: &str) -> Result<ServerConfig> {
        Ok(self.clone())
    }
}

/// Parses the leading `major.minor.patch` of a version string. Missing components count as zero
/// and anything after the third component is ignored (`9.4.1.9.4.1.abc` is `9.4.1`).
fn parse_version(version: &str) -> Option<(u32, u32, u32)> {
    let mut parts = version.trim().trim_start_matches('v').split('.').map(|part| {
        let digits: String = part.chars().take_while(char::is_ascii_digit).collect();
        digits.parse::<u32>().ok()
    });

    let major = parts.next().flatten()?;
    let minor = parts.next().flatten().unwrap_or(0);
    let patch = parts.next().flatten().unwrap_or(0);

    Some((major, minor, patch))
}
