#![cfg(feature = "tungstenite")]
#![allow(
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    reason = "Do not need additional syntax for setting up tests"
)]

mod common;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt as _, StreamExt as _};
use resilient_ws::auth::SecretString;
use resilient_ws::config::ServerConfig;
use resilient_ws::ws::config::{Config, ReconnectConfig};
use resilient_ws::ws::{
    CloseEvent, ConnectionState, ErrorEvent, TungsteniteTransport, WebSocketClient,
    WebSocketEvent,
};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

/// Handshake as seen by the server.
#[derive(Debug)]
struct Handshake {
    uri: String,
    origin: Option<String>,
}

/// Mock WebSocket server.
struct MockWsServer {
    addr: SocketAddr,
    /// Broadcast messages to ALL connected clients
    message_tx: broadcast::Sender<String>,
    /// Asks every connection to close itself
    close_tx: broadcast::Sender<()>,
    /// Frames sent by clients
    frame_rx: mpsc::UnboundedReceiver<Value>,
    handshake_rx: mpsc::UnboundedReceiver<Handshake>,
}

impl MockWsServer {
    /// Start a mock WebSocket server on a random port.
    async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (message_tx, _) = broadcast::channel::<String>(100);
        let (close_tx, _) = broadcast::channel::<()>(4);
        let (frame_tx, frame_rx) = mpsc::unbounded_channel::<Value>();
        let (handshake_tx, handshake_rx) = mpsc::unbounded_channel::<Handshake>();

        let broadcast_tx = message_tx.clone();
        let shutdown_tx = close_tx.clone();

        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };

                let handshakes = handshake_tx.clone();
                let callback = move |request: &Request, response: Response| {
                    let origin = request
                        .headers()
                        .get("origin")
                        .and_then(|value| value.to_str().ok())
                        .map(str::to_owned);
                    drop(handshakes.send(Handshake {
                        uri: request.uri().to_string(),
                        origin,
                    }));
                    Ok::<_, ErrorResponse>(response)
                };
                let Ok(ws_stream) = tokio_tungstenite::accept_hdr_async(stream, callback).await
                else {
                    continue;
                };

                let (mut write, mut read) = ws_stream.split();
                let frames = frame_tx.clone();
                let mut msg_rx = broadcast_tx.subscribe();
                let mut close_rx = shutdown_tx.subscribe();

                // Spawn a task to handle this connection
                tokio::spawn(async move {
                    loop {
                        tokio::select! {
                            msg = read.next() => {
                                match msg {
                                    Some(Ok(Message::Text(text))) => {
                                        let frame = serde_json::from_str(text.as_str()).unwrap();
                                        drop(frames.send(frame));
                                    }
                                    Some(Ok(_)) => {}
                                    _ => break,
                                }
                            }
                            msg = msg_rx.recv() => {
                                match msg {
                                    Ok(text) => {
                                        if write.send(Message::Text(text.into())).await.is_err() {
                                            break;
                                        }
                                    }
                                    Err(_) => break,
                                }
                            }
                            _ = close_rx.recv() => {
                                drop(write.send(Message::Close(Some(CloseFrame {
                                    code: CloseCode::Away,
                                    reason: "restarting".into(),
                                }))).await);
                                break;
                            }
                        }
                    }
                });
            }
        });

        Self {
            addr,
            message_tx,
            close_tx,
            frame_rx,
            handshake_rx,
        }
    }

    fn http_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Send a message to all connected clients.
    fn send(&self, message: &Value) {
        drop(self.message_tx.send(message.to_string()));
    }

    fn close_all(&self) {
        drop(self.close_tx.send(()));
    }

    async fn recv_frame(&mut self) -> Option<Value> {
        timeout(Duration::from_secs(2), self.frame_rx.recv())
            .await
            .ok()
            .flatten()
    }

    async fn recv_handshake(&mut self) -> Option<Handshake> {
        timeout(Duration::from_secs(2), self.handshake_rx.recv())
            .await
            .ok()
            .flatten()
    }
}

fn client(server_url: &str) -> WebSocketClient {
    let config = Config::builder()
        .reconnect(ReconnectConfig::new(
            Duration::from_millis(50),
            Duration::from_millis(200),
        ))
        .build();

    WebSocketClient::builder()
        .server_url(server_url)
        .config(config)
        .config_provider(Arc::new(ServerConfig::default()))
        .token_provider(Arc::new(SecretString::from(common::TOKEN.to_owned())))
        .transport(Arc::new(TungsteniteTransport::default()))
        .build()
        .unwrap()
}

async fn wait_for_state(client: &WebSocketClient, state: ConnectionState) {
    let mut states = client.state_receiver();
    timeout(Duration::from_secs(2), states.wait_for(|current| *current == state))
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn authenticates_and_receives_events() {
    let mut server = MockWsServer::start().await;
    let client = client(&server.http_url());

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<WebSocketEvent>();
    client
        .callbacks()
        .set_event_callback(move |event| drop(event_tx.send(event.clone())));

    client.initiate_connection(true).await.unwrap();

    let handshake = server.recv_handshake().await.unwrap();
    assert_eq!(handshake.uri, "/api/v4/websocket");
    assert_eq!(handshake.origin, Some(server.http_url()));

    let auth = server.recv_frame().await.unwrap();
    assert_eq!(
        auth,
        json!({
            "action": "authentication_challenge",
            "seq": 1,
            "data": { "token": common::TOKEN }
        })
    );
    wait_for_state(&client, ConnectionState::Open).await;

    client.send_user_typing_event("town-square", None);
    let typing = server.recv_frame().await.unwrap();
    assert_eq!(typing["action"], "user_typing");
    assert_eq!(typing["seq"], 2);

    server.send(&common::hello(0, "conn-1"));
    server.send(&common::event("posted", 1));

    let hello = timeout(Duration::from_secs(2), event_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(hello.event, "hello");
    let posted = timeout(Duration::from_secs(2), event_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(posted.seq, 1);
    assert_eq!(posted.broadcast["channel_id"], "town-square");

    client.close(true);
}

#[tokio::test]
async fn server_close_triggers_reconnect() {
    let mut server = MockWsServer::start().await;
    let client = client(&server.http_url());

    let (close_tx, mut close_rx) = mpsc::unbounded_channel::<CloseEvent>();
    client
        .callbacks()
        .set_close_callback(move |close| drop(close_tx.send(close.clone())));

    client.initiate_connection(true).await.unwrap();
    server.recv_frame().await.unwrap();
    wait_for_state(&client, ConnectionState::Open).await;

    server.close_all();

    let close = timeout(Duration::from_secs(2), close_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(close.code, Some(1001));
    assert_eq!(close.reason, "restarting");

    server.recv_handshake().await.unwrap();
    server.recv_handshake().await.unwrap();
    let auth = server.recv_frame().await.unwrap();
    assert_eq!(auth["seq"], 1, "sequence did not restart on reconnect");
    wait_for_state(&client, ConnectionState::Open).await;

    client.close(true);
    assert_eq!(client.state(), ConnectionState::Closed);
}

#[tokio::test]
async fn unreachable_server_reports_error_and_close() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client(&format!("http://{addr}"));
    let (error_tx, mut error_rx) = mpsc::unbounded_channel::<ErrorEvent>();
    client
        .callbacks()
        .set_error_callback(move |error| drop(error_tx.send(error.clone())));
    let (close_tx, mut close_rx) = mpsc::unbounded_channel::<CloseEvent>();
    client
        .callbacks()
        .set_close_callback(move |close| drop(close_tx.send(close.clone())));

    client.initiate_connection(false).await.unwrap();

    let error = timeout(Duration::from_secs(2), error_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(error.url, format!("ws://{addr}/api/v4/websocket"));

    let close = timeout(Duration::from_secs(2), close_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(close.code, Some(CloseEvent::ABNORMAL));
    assert!(client.retry_count() >= 1);

    client.close(true);
}
