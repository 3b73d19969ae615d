//! Boundary between the client and the socket implementation.
//!
//! A [`TransportFactory`] opens one [`Transport`] per connection attempt. The transport reports
//! what happens on the socket through the [`TransportEvents`] handle it was created with; the
//! handle is bound to that one attempt, so events from a superseded transport are ignored.

#![expect(
    clippy::module_name_repetitions,
    reason = "Transport types carry the module name so they read clearly when re-exported"
)]

use std::sync::Weak;
use std::time::Duration;

use url::Url;

use super::callbacks::CloseEvent;
use super::client::ClientInner;
use crate::Result;

/// Readiness of a transport, mirroring the WebSocket `readyState` values.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadyState {
    Connecting,
    Open,
    Closing,
    Closed,
}

/// Everything a transport needs to open a connection.
#[non_exhaustive]
#[derive(Clone, Debug)]
pub struct ConnectRequest {
    pub url: Url,
    pub headers: Vec<(String, String)>,
    /// Handshake timeout
    pub timeout: Duration,
}

/// An open (or opening) socket.
///
/// `send` and `close` are called while the client holds its session lock: implementations must
/// not report events synchronously from inside them.
pub trait Transport: Send + Sync + 'static {
    /// Queues a text frame.
    fn send(&self, text: String) -> Result<()>;

    /// Closes the socket. Idempotent.
    fn close(&self);

    fn ready_state(&self) -> ReadyState;
}

/// Opens transports.
pub trait TransportFactory: Send + Sync + 'static {
    /// Starts connecting to `request.url`.
    ///
    /// Called while the client holds its session lock, so the returned transport must report the
    /// outcome through `events` asynchronously, never from inside this call.
    fn connect(
        &self,
        request: ConnectRequest,
        events: TransportEvents,
    ) -> Result<Box<dyn Transport>>;
}

/// Handle a transport uses to report socket events back to its client.
#[derive(Clone, Debug)]
pub struct TransportEvents {
    client: Weak<ClientInner>,
    generation: u64,
}

impl TransportEvents {
    pub(crate) fn new(client: Weak<ClientInner>, generation: u64) -> Self {
        Self { client, generation }
    }

    /// The socket finished its handshake.
    pub fn opened(&self) {
        if let Some(client) = self.client.upgrade() {
            client.on_transport_open(self.generation);
        }
    }

    /// The socket closed, or failed to open.
    pub fn closed(&self, close: CloseEvent) {
        if let Some(client) = self.client.upgrade() {
            client.on_transport_close(self.generation, close);
        }
    }

    /// The socket reported an error. A matching [`TransportEvents::closed`] is expected to
    /// follow.
    pub fn errored<S: Into<String>>(&self, message: S) {
        if let Some(client) = self.client.upgrade() {
            client.on_transport_error(self.generation, message.into());
        }
    }

    /// A text frame arrived.
    pub fn message(&self, text: &str) {
        if let Some(client) = self.client.upgrade() {
            client.on_transport_message(self.generation, text);
        }
    }
}
