#![expect(
    clippy::module_name_repetitions,
    reason = "Client types expose their domain in the name for clarity"
)]

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use backoff::backoff::Backoff as _;
use bon::bon;
use secrecy::{ExposeSecret as _, SecretString};
use serde_json::{Value, json};
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep};
use tokio_util::sync::CancellationToken;
use url::Url;

use super::callbacks::{Callbacks, CloseEvent, ErrorEvent, Notification};
use super::config::Config;
use super::frame::{Action, InboundFrame, OutgoingFrame};
use super::keepalive::Keepalive;
use super::retry::LinearBackoff;
use super::sequence::{Inbound, SequenceTracker};
use super::transport::{ConnectRequest, ReadyState, Transport, TransportEvents, TransportFactory};
use crate::Result;
use crate::auth::TokenProvider;
use crate::config::ConfigProvider;
use crate::error::Error;

/// Connection state tracking.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No transport, possibly waiting for a scheduled reconnect
    Closed,
    /// A transport is being opened
    Connecting,
    /// Handshake done, authentication challenge sent
    Open,
}

impl ConnectionState {
    /// Check if the connection is currently active.
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Open)
    }
}

/// Resilient WebSocket session client.
///
/// Owns a single logical connection to the server's event stream:
/// - Establishes the connection and sends the `authentication_challenge`
/// - Pings on a fixed interval and closes connections whose pong never arrives
/// - Reconnects after a linear, capped backoff unless closed by its owner
/// - Stamps outgoing frames and tracks the server sequence, detecting gaps in reliable mode
///
/// All hooks are registered through [`WebSocketClient::callbacks`].
///
/// # Example
///
/// ```ignore
/// let client = WebSocketClient::builder()
///     .server_url("https://chat.example.com")
///     .config_provider(Arc::new(server_config))
///     .token_provider(Arc::new(SecretString::from(token)))
///     .transport(Arc::new(TungsteniteTransport::default()))
///     .build()?;
///
/// client.callbacks().set_event_callback(|event| println!("{}", event.event));
/// client.initiate_connection(false).await?;
/// ```
#[derive(Clone, Debug)]
pub struct WebSocketClient {
    inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    server_url: String,
    origin: String,
    config: Config,
    config_provider: Arc<dyn ConfigProvider>,
    token_provider: Arc<dyn TokenProvider>,
    transport_factory: Arc<dyn TransportFactory>,
    callbacks: Callbacks,
    session: Mutex<Session>,
    state_tx: watch::Sender<ConnectionState>,
}

impl std::fmt::Debug for ClientInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientInner")
            .field("server_url", &self.server_url)
            .field("config", &self.config)
            .field("state", &*self.state_tx.borrow())
            .finish_non_exhaustive()
    }
}

/// Mutable per-client state. Everything a close must reset lives here so it is reset in one
/// step under one lock.
struct Session {
    state: ConnectionState,
    /// Bumped for every connection attempt and every forced close. Transport events carry the
    /// generation they were created for; anything else is stale.
    generation: u64,
    transport: Option<Box<dyn Transport>>,
    url: Option<Url>,
    token: Option<SecretString>,
    sequence: SequenceTracker,
    keepalive: Keepalive,
    backoff: LinearBackoff,
    reconnect_timer: Option<CancellationToken>,
    /// Outcome of the latest connection attempt, `None` while it is still resolving.
    attempt: Option<watch::Receiver<Option<AttemptOutcome>>>,
    /// Set by an explicit close, cleared by the next `initiate_connection`.
    stopped: bool,
    skip_initial_sync: bool,
    has_opened: bool,
}

impl Session {
    fn new(backoff: LinearBackoff) -> Self {
        Self {
            state: ConnectionState::Closed,
            generation: 0,
            transport: None,
            url: None,
            token: None,
            sequence: SequenceTracker::default(),
            keepalive: Keepalive::default(),
            backoff,
            reconnect_timer: None,
            attempt: None,
            stopped: false,
            skip_initial_sync: false,
            has_opened: false,
        }
    }

    /// Drops the transport and clears sequences, connection identity and keepalive.
    fn reset(&mut self) {
        if let Some(transport) = self.transport.take() {
            transport.close();
        }
        self.sequence.reset();
        self.keepalive.disarm();
    }

    fn cancel_reconnect(&mut self) {
        if let Some(timer) = self.reconnect_timer.take() {
            timer.cancel();
        }
    }

    fn is_ready(&self) -> bool {
        self.state == ConnectionState::Open
            && self
                .transport
                .as_ref()
                .is_some_and(|transport| transport.ready_state() == ReadyState::Open)
    }

    /// Stamps and sends a frame on the current transport. The sequence is consumed even when the
    /// transport rejects the frame.
    fn send(&mut self, action: Action, data: Option<Value>) -> Option<u64> {
        let transport = self.transport.as_ref()?;
        let seq = self.sequence.next_outgoing();
        let frame = OutgoingFrame::new(action, seq, data);

        let result = serde_json::to_string(&frame)
            .map_err(Error::from)
            .and_then(|text| transport.send(text));
        if let Err(e) = result {
            #[cfg(feature = "tracing")]
            tracing::warn!(%action, seq, error = %e, "Failed to send WebSocket frame");
            #[cfg(not(feature = "tracing"))]
            let _ = &e;
        }

        Some(seq)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.cancel_reconnect();
        self.keepalive.disarm();
    }
}

enum Attempt {
    Initial { skip_initial_sync: bool },
    Retry(CancellationToken),
}

type AttemptOutcome = std::result::Result<(), Arc<Error>>;

/// How a call to `connect` relates to the attempt in flight.
enum Start {
    /// This call drives a new attempt and publishes its outcome.
    Lead {
        generation: u64,
        outcome: watch::Sender<Option<AttemptOutcome>>,
    },
    /// An attempt is already in flight or done; wait for its outcome.
    Join(watch::Receiver<Option<AttemptOutcome>>),
    Skip,
}

#[bon]
impl WebSocketClient {
    /// Create a new client for `server_url`. No connection is made until
    /// [`WebSocketClient::initiate_connection`] is called.
    #[builder]
    pub fn new(
        #[builder(into)] server_url: String,
        #[builder(default)] config: Config,
        config_provider: Arc<dyn ConfigProvider>,
        token_provider: Arc<dyn TokenProvider>,
        transport: Arc<dyn TransportFactory>,
    ) -> Result<Self> {
        let origin = Url::parse(&server_url)?.origin().ascii_serialization();
        let (state_tx, _) = watch::channel(ConnectionState::Closed);
        let backoff = LinearBackoff::from(&config.reconnect);

        Ok(Self {
            inner: Arc::new(ClientInner {
                server_url,
                origin,
                config,
                config_provider,
                token_provider,
                transport_factory: transport,
                callbacks: Callbacks::default(),
                session: Mutex::new(Session::new(backoff)),
                state_tx,
            }),
        })
    }

    /// Start connecting, unless an attempt is already in flight or the client is open, in which
    /// case this is a no-op.
    ///
    /// With `skip_initial_sync` the first successful open fires the first-connect hook instead of
    /// the resync hooks. A pending scheduled reconnect is replaced by this attempt.
    ///
    /// Errors resolving the server configuration, the token or the transport are returned, and
    /// the attempt is retried after the usual backoff.
    pub async fn initiate_connection(&self, skip_initial_sync: bool) -> Result<()> {
        self.inner
            .connect(Attempt::Initial { skip_initial_sync })
            .await
    }

    /// Close the connection.
    ///
    /// With `explicit` the client is torn down: the reconnect timer and keepalive are cancelled,
    /// the transport is closed and no hook fires until [`WebSocketClient::initiate_connection`]
    /// is called again. Without it only the current transport is severed and the usual
    /// close-and-reconnect path runs.
    pub fn close(&self, explicit: bool) {
        if explicit {
            self.inner.shutdown();
        } else {
            self.inner.sever();
        }
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Get the current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.inner.state_tx.borrow()
    }

    /// Subscribe to connection state changes.
    #[must_use]
    pub fn state_receiver(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state_tx.subscribe()
    }

    /// Hooks invoked by this client.
    #[must_use]
    pub fn callbacks(&self) -> &Callbacks {
        &self.inner.callbacks
    }

    #[must_use]
    pub fn server_url(&self) -> &str {
        &self.inner.server_url
    }

    /// Sequence number of the last frame sent on the current connection.
    #[must_use]
    pub fn outgoing_sequence(&self) -> u64 {
        self.inner.lock().sequence.outgoing()
    }

    /// Number of server events accepted on the current connection.
    #[must_use]
    pub fn server_sequence(&self) -> u64 {
        self.inner.lock().sequence.server()
    }

    /// Connection identity issued by a reliable server, empty when unknown.
    #[must_use]
    pub fn connection_id(&self) -> String {
        self.inner.lock().sequence.connection_id().to_owned()
    }

    /// Whether the current (or last) connection attempt uses reliable mode.
    #[must_use]
    pub fn is_reliable(&self) -> bool {
        self.inner.lock().sequence.is_reliable()
    }

    /// Failed or lost connections since the last successful open.
    #[must_use]
    pub fn retry_count(&self) -> u32 {
        self.inner.lock().backoff.attempt()
    }

    /// Send an application action. Silently dropped unless the connection is open.
    pub fn send_action(&self, action: Action, data: Option<Value>) {
        let mut session = self.inner.lock();
        if !session.is_ready() {
            #[cfg(feature = "tracing")]
            tracing::debug!(%action, "Dropping WebSocket action while not connected");
            return;
        }

        session.send(action, data);
    }

    /// Notify the server that the user is typing in `channel_id` (or in the thread `parent_id`).
    pub fn send_user_typing_event(&self, channel_id: &str, parent_id: Option<&str>) {
        let mut data = json!({ "channel_id": channel_id });
        if let (Some(parent_id), Value::Object(map)) = (parent_id, &mut data) {
            map.insert("parent_id".to_owned(), Value::from(parent_id));
        }

        self.send_action(Action::UserTyping, Some(data));
    }

    /// Ask the server for the statuses of all users it tracks for this session.
    pub fn get_statuses(&self) {
        self.send_action(Action::GetStatuses, None);
    }

    /// Ask the server for the statuses of `user_ids`.
    pub fn get_statuses_by_ids<S: AsRef<str>>(&self, user_ids: &[S]) {
        let ids: Vec<&str> = user_ids.iter().map(AsRef::as_ref).collect();
        self.send_action(Action::GetStatusesByIds, Some(json!({ "user_ids": ids })));
    }
}

impl ClientInner {
    fn lock(&self) -> MutexGuard<'_, Session> {
        // Every mutation of the session completes before the lock is released, so a poisoned
        // session is still consistent.
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, session: &mut Session, state: ConnectionState) {
        session.state = state;
        self.state_tx.send_replace(state);
    }

    fn headers(&self) -> Vec<(String, String)> {
        let mut headers = vec![("Origin".to_owned(), self.origin.clone())];
        if let Some(user_agent) = &self.config.user_agent {
            headers.push(("User-Agent".to_owned(), user_agent.clone()));
        }
        headers
    }

    async fn connect(self: &Arc<Self>, attempt: Attempt) -> Result<()> {
        let (generation, outcome) = match self.begin(attempt) {
            Start::Lead {
                generation,
                outcome,
            } => (generation, outcome),
            Start::Join(pending) => return Self::join(pending).await,
            Start::Skip => return Ok(()),
        };

        self.callbacks.dispatch(&Notification::Connecting);

        match self.open_transport(generation).await {
            Ok(()) => {
                outcome.send_replace(Some(Ok(())));
                Ok(())
            }
            Err(e) => {
                self.abandon_attempt(generation, &e);
                let shared = Arc::new(e);
                outcome.send_replace(Some(Err(Arc::clone(&shared))));
                Err(Error::shared(&shared))
            }
        }
    }

    fn begin(&self, attempt: Attempt) -> Start {
        let mut session = self.lock();
        match attempt {
            Attempt::Initial { skip_initial_sync } => {
                if session.state != ConnectionState::Closed {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        state = ?session.state,
                        "Joining connection attempt already in flight"
                    );
                    return session.attempt.clone().map_or(Start::Skip, Start::Join);
                }
                session.stopped = false;
                session.skip_initial_sync = skip_initial_sync;
                session.cancel_reconnect();
            }
            Attempt::Retry(timer) => {
                if timer.is_cancelled()
                    || session.stopped
                    || session.state != ConnectionState::Closed
                {
                    return Start::Skip;
                }
                session.reconnect_timer = None;
            }
        }

        session.generation += 1;
        self.set_state(&mut session, ConnectionState::Connecting);
        let (outcome, pending) = watch::channel(None);
        session.attempt = Some(pending);

        Start::Lead {
            generation: session.generation,
            outcome,
        }
    }

    /// Waits for the attempt another caller is driving and reports the same outcome.
    async fn join(mut pending: watch::Receiver<Option<AttemptOutcome>>) -> Result<()> {
        let outcome = match pending.wait_for(Option::is_some).await {
            Ok(outcome) => (*outcome).clone(),
            // The leading caller was dropped before its attempt resolved
            Err(_closed) => return Ok(()),
        };

        match outcome {
            Some(Err(e)) => Err(Error::shared(&e)),
            Some(Ok(())) | None => Ok(()),
        }
    }

    async fn open_transport(self: &Arc<Self>, generation: u64) -> Result<()> {
        let server = self.config_provider.server_config(&self.server_url).await?;
        let token = self.token_provider.token(&self.server_url).await?;
        let endpoint = server.websocket_endpoint(&self.server_url, &self.config.api_path)?;
        let reliable = server.supports_reliable_websocket();

        let mut session = self.lock();
        if session.generation != generation || session.state != ConnectionState::Connecting {
            #[cfg(feature = "tracing")]
            tracing::debug!("Connection attempt superseded before the transport was created");
            return Ok(());
        }

        session.sequence.set_reliable(reliable);
        let url = if reliable {
            session.sequence.reconnect_url(&endpoint)
        } else {
            endpoint
        };

        let request = ConnectRequest {
            url: url.clone(),
            headers: self.headers(),
            timeout: self.config.connect_timeout,
        };
        let events = TransportEvents::new(Arc::downgrade(self), generation);
        let transport = self.transport_factory.connect(request, events)?;

        #[cfg(feature = "tracing")]
        tracing::info!(%url, reliable, "Opening WebSocket connection");

        session.transport = Some(transport);
        session.url = Some(url);
        session.token = token;
        Ok(())
    }

    /// A connection attempt failed before its transport existed.
    fn abandon_attempt(self: &Arc<Self>, generation: u64, error: &Error) {
        let mut notifications = Vec::new();
        {
            let mut session = self.lock();
            if session.generation != generation || session.state != ConnectionState::Connecting {
                return;
            }

            #[cfg(feature = "tracing")]
            tracing::error!(error = %error, "Unable to start WebSocket connection");

            notifications.push(Notification::Error(ErrorEvent::new(
                self.server_url.clone(),
                error.to_string(),
            )));
            self.finish_close(
                &mut session,
                CloseEvent::new(None, error.to_string()),
                &mut notifications,
            );
        }
        self.callbacks.dispatch_all(notifications);
    }

    /// Moves to `Closed`, resetting the session, and schedules a reconnect unless the owner
    /// stopped the client.
    fn finish_close(
        self: &Arc<Self>,
        session: &mut Session,
        close: CloseEvent,
        notifications: &mut Vec<Notification>,
    ) {
        session.reset();
        self.set_state(session, ConnectionState::Closed);

        #[cfg(feature = "tracing")]
        {
            if close.is_tls_handshake_failure() {
                tracing::error!(reason = %close.reason, "WebSocket closed: TLS handshake failed");
            } else {
                tracing::info!(code = ?close.code, reason = %close.reason, "WebSocket closed");
            }
        }

        notifications.push(Notification::Close(close));

        if !session.stopped {
            self.schedule_reconnect(session);
        }
    }

    /// Severs the current transport and runs the close path. The transport's own close event,
    /// if it ever arrives, is stale.
    fn force_close(
        self: &Arc<Self>,
        session: &mut Session,
        close: CloseEvent,
        notifications: &mut Vec<Notification>,
    ) {
        session.generation += 1;
        self.finish_close(session, close, notifications);
    }

    fn schedule_reconnect(self: &Arc<Self>, session: &mut Session) {
        let delay = session
            .backoff
            .next_backoff()
            .unwrap_or(self.config.reconnect.max_delay);

        let timer = CancellationToken::new();
        session.cancel_reconnect();
        session.reconnect_timer = Some(timer.clone());

        #[cfg(feature = "tracing")]
        tracing::info!(
            attempt = session.backoff.attempt(),
            ?delay,
            "Scheduling WebSocket reconnect"
        );

        let client = Arc::downgrade(self);
        let retry = timer.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = timer.cancelled() => {}
                () = sleep(delay) => {
                    if let Some(client) = client.upgrade()
                        && let Err(e) = client.connect(Attempt::Retry(retry)).await
                    {
                        #[cfg(feature = "tracing")]
                        tracing::warn!(error = %e, "WebSocket reconnect attempt failed");
                        #[cfg(not(feature = "tracing"))]
                        let _ = &e;
                    }
                }
            }
        });
    }

    fn arm_keepalive(self: &Arc<Self>, session: &mut Session) {
        let timer = CancellationToken::new();
        let epoch = session.keepalive.arm(timer.clone());
        let period = self.config.ping_interval;
        let client = Arc::downgrade(self);

        tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    () = timer.cancelled() => break,
                    at = ticks.tick() => {
                        let Some(client) = client.upgrade() else {
                            break;
                        };
                        if !client.on_keepalive_tick(epoch, at) {
                            break;
                        }
                    }
                }
            }
        });
    }

    /// Returns whether the keepalive task should keep ticking. `at` is the instant the tick was
    /// scheduled for, so a pong deadline armed one period earlier falls due exactly on it.
    fn on_keepalive_tick(self: &Arc<Self>, epoch: u64, at: Instant) -> bool {
        let mut notifications = Vec::new();
        let keep_ticking = {
            let mut session = self.lock();
            if !session.keepalive.is_current(epoch) || session.state != ConnectionState::Open {
                return false;
            }

            if session.keepalive.pong_overdue(at) {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    interval = ?self.config.ping_interval,
                    "No pong received within ping interval, closing WebSocket"
                );
                self.force_close(
                    &mut session,
                    CloseEvent::new(Some(CloseEvent::ABNORMAL), "pong timeout"),
                    &mut notifications,
                );
                false
            } else if session.keepalive.awaiting_pong() {
                // Ticks never run early; this only covers a deadline pushed past the tick
                true
            } else {
                if let Some(seq) = session.send(Action::Ping, None) {
                    session
                        .keepalive
                        .ping_sent(seq, at + self.config.ping_interval);
                }
                true
            }
        };

        self.callbacks.dispatch_all(notifications);
        keep_ticking
    }

    pub(crate) fn on_transport_open(self: &Arc<Self>, generation: u64) {
        let notifications = {
            let mut session = self.lock();
            if session.generation != generation || session.state != ConnectionState::Connecting {
                #[cfg(feature = "tracing")]
                tracing::debug!(generation, "Ignoring open from superseded transport");
                return;
            }

            self.set_state(&mut session, ConnectionState::Open);
            let first = !session.has_opened;
            session.has_opened = true;
            session.sequence.reset();
            session.backoff.reset();

            let challenge = session
                .token
                .as_ref()
                .map(|token| json!({ "token": token.expose_secret() }));
            if let Some(data) = challenge {
                session.send(Action::AuthenticationChallenge, Some(data));
            } else {
                #[cfg(feature = "tracing")]
                tracing::warn!("No session token, skipping authentication challenge");
            }

            self.arm_keepalive(&mut session);

            let reliable = session.sequence.is_reliable();
            #[cfg(feature = "tracing")]
            tracing::info!(reliable, first, "WebSocket connected");

            if first && session.skip_initial_sync {
                vec![Notification::FirstConnect]
            } else if reliable {
                vec![Notification::ReliableReconnect, Notification::MissedEvents]
            } else {
                vec![Notification::Reconnect]
            }
        };

        self.callbacks.dispatch_all(notifications);
    }

    pub(crate) fn on_transport_close(self: &Arc<Self>, generation: u64, close: CloseEvent) {
        let mut notifications = Vec::new();
        {
            let mut session = self.lock();
            if session.generation != generation || session.state == ConnectionState::Closed {
                #[cfg(feature = "tracing")]
                tracing::debug!(generation, "Ignoring close from superseded transport");
                return;
            }

            self.finish_close(&mut session, close, &mut notifications);
        }
        self.callbacks.dispatch_all(notifications);
    }

    pub(crate) fn on_transport_error(&self, generation: u64, message: String) {
        let url = {
            let session = self.lock();
            if session.generation != generation {
                return;
            }
            session
                .url
                .as_ref()
                .map_or_else(|| self.server_url.clone(), Url::to_string)
        };

        #[cfg(feature = "tracing")]
        tracing::warn!(%url, error = %message, "WebSocket error");

        self.callbacks
            .dispatch(&Notification::Error(ErrorEvent::new(url, message)));
    }

    pub(crate) fn on_transport_message(self: &Arc<Self>, generation: u64, text: &str) {
        let frame = match InboundFrame::parse(text) {
            Ok(frame) => frame,
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(%text, error = %e, "Failed to parse WebSocket frame");
                #[cfg(not(feature = "tracing"))]
                let _ = &e;
                return;
            }
        };

        let notifications = {
            let mut guard = self.lock();
            if guard.generation != generation || guard.state != ConnectionState::Open {
                return;
            }
            let session = &mut *guard;

            match session.sequence.observe(frame) {
                Inbound::Reply {
                    seq_reply,
                    error,
                    pong,
                } => {
                    if let Some(error) = error {
                        #[cfg(feature = "tracing")]
                        tracing::warn!(seq_reply, %error, "WebSocket request failed");
                        #[cfg(not(feature = "tracing"))]
                        let _ = &error;
                    }
                    if pong && session.keepalive.pong_received(seq_reply) {
                        #[cfg(feature = "tracing")]
                        tracing::trace!(seq_reply, "Pong received");
                    }
                    Vec::new()
                }
                Inbound::Event {
                    event,
                    continuity_broken,
                } => {
                    if continuity_broken {
                        #[cfg(feature = "tracing")]
                        tracing::info!(
                            actual = event.seq,
                            expected = session.sequence.server() - 1,
                            "WebSocket event out of sequence, requesting resync"
                        );
                        vec![Notification::Reconnect, Notification::Event(event)]
                    } else {
                        vec![Notification::Event(event)]
                    }
                }
                Inbound::Gap { expected, actual } => {
                    #[cfg(feature = "tracing")]
                    {
                        let url = session
                            .url
                            .as_ref()
                            .map(|url| session.sequence.reconnect_url(url).to_string())
                            .unwrap_or_default();
                        tracing::warn!(
                            expected,
                            actual,
                            %url,
                            "Missed WebSocket event, closing to resync"
                        );
                    }
                    #[cfg(not(feature = "tracing"))]
                    let _ = (expected, actual);

                    // Every later event would be out of sequence too; the reconnect fires the
                    // reliable resync hooks
                    let mut notifications = Vec::new();
                    self.force_close(
                        session,
                        CloseEvent::new(Some(CloseEvent::ABNORMAL), "missed event"),
                        &mut notifications,
                    );
                    notifications
                }
                Inbound::Unsequenced => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(%text, "Ignoring WebSocket frame without sequence");
                    Vec::new()
                }
            }
        };

        self.callbacks.dispatch_all(notifications);
    }

    fn shutdown(&self) {
        let mut session = self.lock();
        session.stopped = true;
        session.cancel_reconnect();
        session.generation += 1;
        session.reset();
        session.backoff.reset();
        self.set_state(&mut session, ConnectionState::Closed);

        #[cfg(feature = "tracing")]
        tracing::info!("WebSocket closed by owner");
    }

    fn sever(self: &Arc<Self>) {
        let mut notifications = Vec::new();
        {
            let mut session = self.lock();
            if session.transport.is_none() {
                return;
            }
            self.force_close(
                &mut session,
                CloseEvent::new(Some(CloseEvent::NORMAL), "closed by client"),
                &mut notifications,
            );
        }
        self.callbacks.dispatch_all(notifications);
    }
}
