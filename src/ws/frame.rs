//! JSON frames exchanged with the server.
//!
//! Outgoing frames are `{action, seq, data?}`. Incoming frames are either server pushed events
//! (carrying `seq`) or replies to an outgoing frame (carrying `seq_reply`).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::Display;

/// Event name the server uses to greet a new connection.
pub const HELLO_EVENT: &str = "hello";

const PONG: &str = "pong";

/// Actions the client may send.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Action {
    AuthenticationChallenge,
    Ping,
    UserTyping,
    GetStatuses,
    GetStatusesByIds,
}

/// Frame sent by the client, stamped with the connection's next outgoing sequence number.
#[non_exhaustive]
#[derive(Clone, Debug, Serialize)]
pub struct OutgoingFrame {
    pub action: Action,
    pub seq: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl OutgoingFrame {
    #[must_use]
    pub fn new(action: Action, seq: u64, data: Option<Value>) -> Self {
        Self { action, seq, data }
    }
}

/// Envelope of a frame received from the server.
///
/// Only the fields needed for sequencing are interpreted; `data` and `broadcast` are passed
/// through untouched.
#[non_exhaustive]
#[derive(Clone, Debug, Default, Deserialize)]
pub struct InboundFrame {
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub broadcast: Option<Value>,
    #[serde(default)]
    pub seq: Option<u64>,
    #[serde(default)]
    pub seq_reply: Option<u64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error: Option<Value>,
}

impl InboundFrame {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Whether this reply acknowledges a ping.
    #[must_use]
    pub fn is_pong(&self) -> bool {
        self.event.as_deref() == Some(PONG)
            || self
                .data
                .as_ref()
                .and_then(|data| data.get("text"))
                .and_then(Value::as_str)
                == Some(PONG)
    }

    /// `data.connection_id` of a `hello` event.
    #[must_use]
    pub fn connection_id(&self) -> Option<&str> {
        if self.event.as_deref() != Some(HELLO_EVENT) {
            return None;
        }

        self.data
            .as_ref()?
            .get("connection_id")
            .and_then(Value::as_str)
    }
}

/// Server pushed event handed to the event callback.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq)]
pub struct WebSocketEvent {
    pub event: String,
    pub seq: u64,
    pub data: Value,
    pub broadcast: Value,
}

impl WebSocketEvent {
    pub(crate) fn from_frame(frame: InboundFrame, seq: u64) -> Self {
        Self {
            event: frame.event.unwrap_or_default(),
            seq,
            data: frame.data.unwrap_or(Value::Null),
            broadcast: frame.broadcast.unwrap_or(Value::Null),
        }
    }
}
