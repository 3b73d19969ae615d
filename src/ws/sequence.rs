use serde_json::Value;
use url::Url;

use super::frame::{InboundFrame, WebSocketEvent};

/// What the client should do with an inbound frame.
#[derive(Debug)]
pub(crate) enum Inbound {
    /// Reply to a frame this client sent.
    Reply {
        seq_reply: u64,
        error: Option<Value>,
        pong: bool,
    },
    /// Accepted server event. `continuity_broken` is only ever set outside reliable mode.
    Event {
        event: WebSocketEvent,
        continuity_broken: bool,
    },
    /// Reliable mode only: the event was dropped because its sequence was not the expected one.
    Gap { expected: u64, actual: u64 },
    /// Neither `seq` nor `seq_reply`.
    Unsequenced,
}

/// Outgoing and server sequence bookkeeping for one connection.
#[derive(Debug, Default)]
pub(crate) struct SequenceTracker {
    outgoing: u64,
    server: u64,
    connection_id: String,
    reliable: bool,
}

impl SequenceTracker {
    /// Sequence number for the next outgoing frame; the first frame of a connection gets 1.
    pub(crate) fn next_outgoing(&mut self) -> u64 {
        self.outgoing += 1;
        self.outgoing
    }

    pub(crate) fn outgoing(&self) -> u64 {
        self.outgoing
    }

    pub(crate) fn server(&self) -> u64 {
        self.server
    }

    pub(crate) fn connection_id(&self) -> &str {
        &self.connection_id
    }

    pub(crate) fn is_reliable(&self) -> bool {
        self.reliable
    }

    pub(crate) fn set_reliable(&mut self, reliable: bool) {
        self.reliable = reliable;
    }

    /// Clears sequences and connection identity. Reliable mode is kept; it is decided per
    /// connection attempt from the server configuration.
    pub(crate) fn reset(&mut self) {
        self.outgoing = 0;
        self.server = 0;
        self.connection_id.clear();
    }

    /// `base` with the replay parameters a reliable server needs to resume this session.
    pub(crate) fn reconnect_url(&self, base: &Url) -> Url {
        let mut url = base.clone();
        url.query_pairs_mut()
            .clear()
            .append_pair("connection_id", &self.connection_id)
            .append_pair("sequence_number", &self.server.to_string());
        url
    }

    pub(crate) fn observe(&mut self, frame: InboundFrame) -> Inbound {
        if let Some(seq_reply) = frame.seq_reply {
            let pong = frame.is_pong();
            return Inbound::Reply {
                seq_reply,
                error: frame.error,
                pong,
            };
        }

        let Some(seq) = frame.seq else {
            return Inbound::Unsequenced;
        };

        let expected = self.server;
        if self.reliable {
            if seq != expected {
                self.connection_id.clear();
                return Inbound::Gap {
                    expected,
                    actual: seq,
                };
            }

            if let Some(id) = frame.connection_id() {
                id.clone_into(&mut self.connection_id);
            }
        }

        self.server += 1;
        Inbound::Event {
            event: WebSocketEvent::from_frame(frame, seq),
            continuity_broken: !self.reliable && seq != expected,
        }
    }
}
