//! Connects to a chat server, logs every lifecycle hook and event, and sends a typing
//! notification every ten seconds.
//!
//! Run with tracing enabled:
//! ```sh
//! SERVER_URL=https://chat.example.com SESSION_TOKEN=... CHANNEL_ID=... \
//!     RUST_LOG=info cargo run --example typing --features tungstenite,tracing
//! ```

use std::env;
use std::sync::Arc;
use std::time::Duration;

use resilient_ws::auth::SecretString;
use resilient_ws::config::ServerConfig;
use resilient_ws::ws::{TungsteniteTransport, WebSocketClient};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let server_url = env::var("SERVER_URL")?;
    let token = SecretString::from(env::var("SESSION_TOKEN")?);
    let channel_id = env::var("CHANNEL_ID")?;

    let client = WebSocketClient::builder()
        .server_url(server_url)
        .config_provider(Arc::new(ServerConfig::default()))
        .token_provider(Arc::new(token))
        .transport(Arc::new(TungsteniteTransport::default()))
        .build()?;

    let callbacks = client.callbacks();
    callbacks.set_first_connect_callback(|| info!(hook = "first_connect"));
    callbacks.set_reconnect_callback(|| info!(hook = "reconnect", "Resynchronize state"));
    callbacks.set_close_callback(|close| {
        info!(hook = "close", code = ?close.code, reason = %close.reason);
    });
    callbacks.set_error_callback(|error| {
        warn!(hook = "error", url = %error.url, message = %error.message);
    });
    callbacks.set_event_callback(|event| {
        info!(hook = "event", event = %event.event, seq = event.seq, data = %event.data);
    });

    client.initiate_connection(true).await?;

    let mut ticks = tokio::time::interval(Duration::from_secs(10));
    loop {
        tokio::select! {
            _ = ticks.tick() => {
                if client.is_connected() {
                    client.send_user_typing_event(&channel_id, None);
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    client.close(true);
    Ok(())
}
