#![allow(
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    reason = "Do not need additional syntax for setting up tests, and https://github.com/rust-lang/rust-clippy/issues/13981"
)]
#![allow(
    unused,
    reason = "Deeply nested uses in sub-modules are falsely flagged as being unused"
)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use resilient_ws::Result;
use resilient_ws::auth::SecretString;
use resilient_ws::config::{ConfigProvider, ServerConfig};
use resilient_ws::error::Error;
use resilient_ws::ws::{
    CloseEvent, ConnectRequest, ReadyState, Transport, TransportEvents, TransportFactory,
    WebSocketClient,
};
use serde_json::{Value, json};

pub const SERVER_URL: &str = "https://chat.example.com";
pub const TOKEN: &str = "session-token";

/// One transport handed out by [`MockFactory`], driven by the test.
#[derive(Debug)]
pub struct MockConnection {
    pub request: ConnectRequest,
    events: TransportEvents,
    sent: Mutex<Vec<String>>,
    state: Mutex<ReadyState>,
}

impl MockConnection {
    pub fn url(&self) -> String {
        self.request.url.to_string()
    }

    pub fn header(&self, name: &str) -> Option<String> {
        self.request
            .headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.clone())
    }

    /// Frames the client sent, parsed.
    pub fn sent(&self) -> Vec<Value> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|text| serde_json::from_str(text).unwrap())
            .collect()
    }

    pub fn is_closed(&self) -> bool {
        *self.state.lock().unwrap() == ReadyState::Closed
    }

    /// Completes the handshake.
    pub fn open(&self) {
        *self.state.lock().unwrap() = ReadyState::Open;
        self.events.opened();
    }

    /// The server (or the network) closes the socket.
    pub fn close_from_server(&self, code: u16, reason: &str) {
        *self.state.lock().unwrap() = ReadyState::Closed;
        self.events.closed(CloseEvent::new(Some(code), reason));
    }

    pub fn error(&self, message: &str) {
        self.events.errored(message);
    }

    pub fn receive(&self, frame: &Value) {
        self.events.message(&frame.to_string());
    }
}

struct MockTransport(Arc<MockConnection>);

impl Transport for MockTransport {
    fn send(&self, text: String) -> Result<()> {
        self.0.sent.lock().unwrap().push(text);
        Ok(())
    }

    fn close(&self) {
        *self.0.state.lock().unwrap() = ReadyState::Closed;
    }

    fn ready_state(&self) -> ReadyState {
        *self.0.state.lock().unwrap()
    }
}

/// Records every connection the client opens.
#[derive(Debug, Default)]
pub struct MockFactory {
    connections: Mutex<Vec<Arc<MockConnection>>>,
}

impl MockFactory {
    pub fn count(&self) -> usize {
        self.connections.lock().unwrap().len()
    }

    pub fn connection(&self, index: usize) -> Arc<MockConnection> {
        Arc::clone(&self.connections.lock().unwrap()[index])
    }

    pub fn last(&self) -> Arc<MockConnection> {
        Arc::clone(self.connections.lock().unwrap().last().unwrap())
    }
}

impl TransportFactory for MockFactory {
    fn connect(
        &self,
        request: ConnectRequest,
        events: TransportEvents,
    ) -> Result<Box<dyn Transport>> {
        let connection = Arc::new(MockConnection {
            request,
            events,
            sent: Mutex::new(Vec::new()),
            state: Mutex::new(ReadyState::Connecting),
        });
        self.connections.lock().unwrap().push(Arc::clone(&connection));
        Ok(Box::new(MockTransport(connection)))
    }
}

/// Server configuration lookup that always fails.
#[derive(Debug)]
pub struct UnreachableServer;

#[async_trait]
impl ConfigProvider for UnreachableServer {
    async fn server_config(&self, server_url: &str) -> Result<ServerConfig> {
        Err(Error::configuration(format!("no server config for {server_url}")))
    }
}

/// Yields once before delegating, so overlapping connection attempts interleave.
#[derive(Debug)]
pub struct Slow<P>(pub P);

#[async_trait]
impl<P: ConfigProvider> ConfigProvider for Slow<P> {
    async fn server_config(&self, server_url: &str) -> Result<ServerConfig> {
        tokio::task::yield_now().await;
        self.0.server_config(server_url).await
    }
}

pub fn client_using(provider: Arc<dyn ConfigProvider>) -> (WebSocketClient, Arc<MockFactory>) {
    let factory = Arc::new(MockFactory::default());
    let client = WebSocketClient::builder()
        .server_url(SERVER_URL)
        .config_provider(provider)
        .token_provider(Arc::new(SecretString::from(TOKEN.to_owned())))
        .transport(Arc::clone(&factory) as Arc<dyn TransportFactory>)
        .build()
        .unwrap();
    (client, factory)
}

/// Hook invocations, in order, as short labels.
#[derive(Clone, Debug, Default)]
pub struct Recorder(Arc<Mutex<Vec<String>>>);

impl Recorder {
    pub fn attach(client: &WebSocketClient) -> Self {
        let recorder = Self::default();
        let callbacks = client.callbacks();

        let log = recorder.clone();
        callbacks.set_connecting_callback(move || log.push("connecting"));
        let log = recorder.clone();
        callbacks.set_first_connect_callback(move || log.push("first_connect"));
        let log = recorder.clone();
        callbacks.set_reconnect_callback(move || log.push("reconnect"));
        let log = recorder.clone();
        callbacks.set_reliable_reconnect_callback(move || log.push("reliable_reconnect"));
        let log = recorder.clone();
        callbacks.set_missed_events_callback(move || log.push("missed_events"));
        let log = recorder.clone();
        callbacks.set_close_callback(move |close| {
            log.push(format!("close:{}", close.code.unwrap_or_default()));
        });
        let log = recorder.clone();
        callbacks.set_error_callback(move |error| log.push(format!("error:{}", error.url)));
        let log = recorder.clone();
        callbacks.set_event_callback(move |event| {
            log.push(format!("event:{}:{}", event.event, event.seq));
        });

        recorder
    }

    fn push<S: Into<String>>(&self, label: S) {
        self.0.lock().unwrap().push(label.into());
    }

    /// Drains the labels recorded so far.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }
}

pub fn client_with(server: ServerConfig) -> (WebSocketClient, Arc<MockFactory>) {
    client_using(Arc::new(server))
}

pub fn client() -> (WebSocketClient, Arc<MockFactory>) {
    client_with(ServerConfig::default())
}

pub fn reliable_server() -> ServerConfig {
    ServerConfig::builder()
        .version("9.4.0")
        .minimum_version("9.1.0")
        .reliable_websocket(true)
        .build()
}

pub fn event(name: &str, seq: u64) -> Value {
    json!({ "event": name, "seq": seq, "data": {}, "broadcast": { "channel_id": "town-square" } })
}

pub fn hello(seq: u64, connection_id: &str) -> Value {
    json!({
        "event": "hello",
        "seq": seq,
        "data": { "connection_id": connection_id, "server_version": "9.4.0" },
        "broadcast": {}
    })
}

/// Lets spawned tasks (timers, reconnects) run.
pub async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}
