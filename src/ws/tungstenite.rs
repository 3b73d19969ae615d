//! [`TransportFactory`] backed by `tokio-tungstenite`.
//!
//! **Feature flag:** `tungstenite`

#![expect(
    clippy::module_name_repetitions,
    reason = "The transport is named after the library it wraps"
)]

use std::time::Duration;

use futures::{SinkExt as _, StreamExt as _};
use tokio::sync::{mpsc, watch};
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest as _;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_util::sync::CancellationToken;

use super::callbacks::CloseEvent;
use super::error::WsError;
use super::transport::{ConnectRequest, ReadyState, Transport, TransportEvents, TransportFactory};
use crate::Result;

/// Opens connections with [`connect_async`], TLS through rustls with the native roots.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default)]
pub struct TungsteniteTransport;

impl TransportFactory for TungsteniteTransport {
    fn connect(
        &self,
        request: ConnectRequest,
        events: TransportEvents,
    ) -> Result<Box<dyn Transport>> {
        let mut handshake = request.url.as_str().into_client_request()?;
        for (name, value) in &request.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_e| WsError::InvalidHeader(name.clone()))?;
            let header_value =
                HeaderValue::from_str(value).map_err(|_e| WsError::InvalidHeader(name.clone()))?;
            handshake.headers_mut().insert(header_name, header_value);
        }

        let (sender_tx, sender_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ReadyState::Connecting);
        let cancel = CancellationToken::new();

        tokio::spawn(connection_task(
            handshake,
            request.timeout,
            sender_rx,
            state_tx,
            cancel.clone(),
            events,
        ));

        Ok(Box::new(TungsteniteConnection {
            sender_tx,
            state_rx,
            cancel,
        }))
    }
}

/// Handle to one socket. Dropping it closes the socket.
struct TungsteniteConnection {
    /// Sender channel for outgoing frames
    sender_tx: mpsc::UnboundedSender<String>,
    state_rx: watch::Receiver<ReadyState>,
    cancel: CancellationToken,
}

impl Transport for TungsteniteConnection {
    fn send(&self, text: String) -> Result<()> {
        self.sender_tx
            .send(text)
            .map_err(|_e| WsError::ConnectionClosed)?;
        Ok(())
    }

    fn close(&self) {
        self.cancel.cancel();
    }

    fn ready_state(&self) -> ReadyState {
        *self.state_rx.borrow()
    }
}

impl Drop for TungsteniteConnection {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Connects, then pumps frames both ways until either side closes.
async fn connection_task(
    handshake: Request,
    connect_timeout: Duration,
    mut sender_rx: mpsc::UnboundedReceiver<String>,
    state_tx: watch::Sender<ReadyState>,
    cancel: CancellationToken,
    events: TransportEvents,
) {
    let connected = tokio::select! {
        () = cancel.cancelled() => {
            state_tx.send_replace(ReadyState::Closed);
            return;
        }
        result = timeout(connect_timeout, connect_async(handshake)) => result,
    };

    let ws_stream = match connected {
        Ok(Ok((ws_stream, _))) => ws_stream,
        Ok(Err(e)) => {
            let code = if matches!(e, tungstenite::Error::Tls(_)) {
                CloseEvent::TLS_HANDSHAKE_FAILURE
            } else {
                CloseEvent::ABNORMAL
            };
            state_tx.send_replace(ReadyState::Closed);
            events.errored(e.to_string());
            events.closed(CloseEvent::new(Some(code), e.to_string()));
            return;
        }
        Err(_elapsed) => {
            let error = WsError::Timeout.to_string();
            state_tx.send_replace(ReadyState::Closed);
            events.errored(error.clone());
            events.closed(CloseEvent::new(Some(CloseEvent::ABNORMAL), error));
            return;
        }
    };

    state_tx.send_replace(ReadyState::Open);
    events.opened();

    let (mut write, mut read) = ws_stream.split();

    let close = loop {
        tokio::select! {
            () = cancel.cancelled() => {
                state_tx.send_replace(ReadyState::Closing);
                _ = write.send(Message::Close(None)).await;
                break CloseEvent::new(Some(CloseEvent::NORMAL), "closed by client");
            }

            // Handle incoming frames
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        #[cfg(feature = "tracing")]
                        tracing::trace!(text = text.as_str(), "Received WebSocket text message");
                        events.message(text.as_str());
                    }
                    Some(Ok(Message::Close(frame))) => {
                        break frame.map_or_else(
                            || CloseEvent::new(None, ""),
                            |frame| {
                                CloseEvent::new(Some(u16::from(frame.code)), frame.reason.as_str())
                            },
                        );
                    }
                    Some(Ok(_)) => {
                        // Binary frames and protocol-level ping/pong are not part of the session
                    }
                    Some(Err(e)) => {
                        events.errored(e.to_string());
                        break CloseEvent::new(Some(CloseEvent::ABNORMAL), e.to_string());
                    }
                    None => {
                        break CloseEvent::new(Some(CloseEvent::ABNORMAL), "connection reset");
                    }
                }
            }

            // Handle outgoing frames from the client
            Some(text) = sender_rx.recv() => {
                if let Err(e) = write.send(Message::Text(text.into())).await {
                    events.errored(e.to_string());
                    break CloseEvent::new(Some(CloseEvent::ABNORMAL), e.to_string());
                }
            }
        }
    };

    state_tx.send_replace(ReadyState::Closed);
    events.closed(close);
}
