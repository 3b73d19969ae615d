#![expect(
    clippy::module_name_repetitions,
    reason = "Configuration types intentionally mirror the module name for clarity"
)]

use std::time::Duration;

use bon::Builder;

use super::retry::LinearBackoff;

const DEFAULT_PING_INTERVAL_DURATION: Duration = Duration::from_secs(30);
const DEFAULT_CONNECT_TIMEOUT_DURATION: Duration = Duration::from_secs(5);
const DEFAULT_BASE_RETRY_DELAY: Duration = Duration::from_secs(3);
const DEFAULT_MAX_RETRY_DELAY: Duration = Duration::from_secs(300);

/// Path of the WebSocket API, appended to the endpoint base.
pub const DEFAULT_API_PATH: &str = "/api/v4/websocket";

/// Configuration for WebSocket client behavior.
#[non_exhaustive]
#[derive(Debug, Clone, Builder)]
pub struct Config {
    /// Interval between PING frames. A ping left unanswered for a whole interval closes the
    /// connection.
    #[builder(default = DEFAULT_PING_INTERVAL_DURATION)]
    pub ping_interval: Duration,
    /// Handed to the transport as the handshake timeout
    #[builder(default = DEFAULT_CONNECT_TIMEOUT_DURATION)]
    pub connect_timeout: Duration,
    /// Path appended to the endpoint base
    #[builder(into, default = DEFAULT_API_PATH.to_owned())]
    pub api_path: String,
    /// Sent as the `User-Agent` header when present
    #[builder(into)]
    pub user_agent: Option<String>,
    /// Reconnection strategy configuration
    #[builder(default)]
    pub reconnect: ReconnectConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Configuration for automatic reconnection behavior.
///
/// Delays grow linearly with the attempt number and are capped, see [`LinearBackoff`].
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt
    pub base_delay: Duration,
    /// Upper bound for any reconnection delay
    pub max_delay: Duration,
}

impl ReconnectConfig {
    #[must_use]
    pub fn new(base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            base_delay,
            max_delay,
        }
    }
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            base_delay: DEFAULT_BASE_RETRY_DELAY,
            max_delay: DEFAULT_MAX_RETRY_DELAY,
        }
    }
}

impl From<&ReconnectConfig> for LinearBackoff {
    fn from(config: &ReconnectConfig) -> Self {
        LinearBackoff::new(config.base_delay, config.max_delay)
    }
}
