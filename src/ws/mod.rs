//! Resilient WebSocket session.
//!
//! # Architecture
//!
//! - [`WebSocketClient`]: connection lifecycle, keepalive, reconnection and sequencing
//! - [`Callbacks`]: hooks the embedding application registers
//! - [`TransportFactory`] / [`Transport`]: the socket underneath, see [`tungstenite`] for the
//!   production implementation (feature `tungstenite`)
//!
//! # Example
//!
//! ```ignore
//! let client = WebSocketClient::builder()
//!     .server_url("https://chat.example.com")
//!     .config_provider(Arc::new(ServerConfig::default()))
//!     .token_provider(Arc::new(SecretString::from(token)))
//!     .transport(Arc::new(TungsteniteTransport::default()))
//!     .build()?;
//!
//! client.initiate_connection(true).await?;
//! client.send_user_typing_event("channel-id", None);
//! ```

pub mod callbacks;
pub mod client;
pub mod config;
pub mod error;
pub mod frame;
pub(crate) mod keepalive;
pub mod retry;
pub(crate) mod sequence;
pub mod transport;
#[cfg(feature = "tungstenite")]
pub mod tungstenite;

pub use callbacks::{Callbacks, CloseEvent, ErrorEvent, Notification};
pub use client::{ConnectionState, WebSocketClient};
#[expect(
    clippy::module_name_repetitions,
    reason = "WsError includes module name for clarity when used outside this module"
)]
pub use error::WsError;
pub use frame::{Action, WebSocketEvent};
pub use transport::{ConnectRequest, ReadyState, Transport, TransportEvents, TransportFactory};
#[cfg(feature = "tungstenite")]
pub use tungstenite::TungsteniteTransport;
