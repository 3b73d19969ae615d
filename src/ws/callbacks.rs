//! Hooks the embedding application registers on the client.
//!
//! Every hook is optional. Hooks run synchronously on whichever task delivered the transport
//! event or timer tick that triggered them, and never while the client holds its session lock,
//! so a hook may call back into the client.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use super::frame::WebSocketEvent;

/// Reason a connection closed.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CloseEvent {
    /// WebSocket close code, absent when the connection failed before a close frame
    pub code: Option<u16>,
    pub reason: String,
}

impl CloseEvent {
    /// Close code reported when the TLS handshake fails.
    pub const TLS_HANDSHAKE_FAILURE: u16 = 1015;
    pub const NORMAL: u16 = 1000;
    pub const ABNORMAL: u16 = 1006;

    #[must_use]
    pub fn new<S: Into<String>>(code: Option<u16>, reason: S) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn is_tls_handshake_failure(&self) -> bool {
        self.code == Some(Self::TLS_HANDSHAKE_FAILURE)
    }
}

/// Transport failure, reported with the URL of the connection it happened on.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorEvent {
    pub url: String,
    pub message: String,
}

impl ErrorEvent {
    #[must_use]
    pub fn new<U: Into<String>, M: Into<String>>(url: U, message: M) -> Self {
        Self {
            url: url.into(),
            message: message.into(),
        }
    }
}

/// Lifecycle notification, delivered to the matching hook.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq)]
pub enum Notification {
    Connecting,
    FirstConnect,
    Reconnect,
    ReliableReconnect,
    MissedEvents,
    Close(CloseEvent),
    Error(ErrorEvent),
    Event(WebSocketEvent),
}

type Hook = Arc<dyn Fn() + Send + Sync>;
type HookWith<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Slot<F: ?Sized>(RwLock<Option<Arc<F>>>);

impl<F: ?Sized> Default for Slot<F> {
    fn default() -> Self {
        Self(RwLock::new(None))
    }
}

impl<F: ?Sized> Slot<F> {
    fn set(&self, hook: Arc<F>) {
        // A poisoned slot only ever holds a complete hook, so it is safe to keep using.
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = Some(hook);
    }

    fn get(&self) -> Option<Arc<F>> {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Table of application hooks, all defaulting to no-ops.
#[derive(Default)]
pub struct Callbacks {
    connecting: Slot<dyn Fn() + Send + Sync>,
    first_connect: Slot<dyn Fn() + Send + Sync>,
    reconnect: Slot<dyn Fn() + Send + Sync>,
    reliable_reconnect: Slot<dyn Fn() + Send + Sync>,
    missed_events: Slot<dyn Fn() + Send + Sync>,
    close: Slot<dyn Fn(&CloseEvent) + Send + Sync>,
    error: Slot<dyn Fn(&ErrorEvent) + Send + Sync>,
    event: Slot<dyn Fn(&WebSocketEvent) + Send + Sync>,
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks").finish_non_exhaustive()
    }
}

impl Callbacks {
    /// Called once per connection attempt, as it starts.
    pub fn set_connecting_callback<F: Fn() + Send + Sync + 'static>(&self, hook: F) {
        self.connecting.set(Arc::new(hook) as Hook);
    }

    /// Called on the first open of a client that asked to skip its initial sync.
    pub fn set_first_connect_callback<F: Fn() + Send + Sync + 'static>(&self, hook: F) {
        self.first_connect.set(Arc::new(hook) as Hook);
    }

    /// Called when the application should resynchronize: on reconnects outside reliable mode,
    /// and whenever an event arrives out of sequence outside reliable mode.
    pub fn set_reconnect_callback<F: Fn() + Send + Sync + 'static>(&self, hook: F) {
        self.reconnect.set(Arc::new(hook) as Hook);
    }

    pub fn set_reliable_reconnect_callback<F: Fn() + Send + Sync + 'static>(&self, hook: F) {
        self.reliable_reconnect.set(Arc::new(hook) as Hook);
    }

    pub fn set_missed_events_callback<F: Fn() + Send + Sync + 'static>(&self, hook: F) {
        self.missed_events.set(Arc::new(hook) as Hook);
    }

    pub fn set_close_callback<F: Fn(&CloseEvent) + Send + Sync + 'static>(&self, hook: F) {
        self.close.set(Arc::new(hook) as HookWith<CloseEvent>);
    }

    pub fn set_error_callback<F: Fn(&ErrorEvent) + Send + Sync + 'static>(&self, hook: F) {
        self.error.set(Arc::new(hook) as HookWith<ErrorEvent>);
    }

    pub fn set_event_callback<F: Fn(&WebSocketEvent) + Send + Sync + 'static>(&self, hook: F) {
        self.event.set(Arc::new(hook) as HookWith<WebSocketEvent>);
    }

    /// Invokes the hook registered for `notification`, if any.
    pub fn dispatch(&self, notification: &Notification) {
        match notification {
            Notification::Connecting => call(self.connecting.get()),
            Notification::FirstConnect => call(self.first_connect.get()),
            Notification::Reconnect => call(self.reconnect.get()),
            Notification::ReliableReconnect => call(self.reliable_reconnect.get()),
            Notification::MissedEvents => call(self.missed_events.get()),
            Notification::Close(close) => {
                if let Some(hook) = self.close.get() {
                    hook(close);
                }
            }
            Notification::Error(error) => {
                if let Some(hook) = self.error.get() {
                    hook(error);
                }
            }
            Notification::Event(event) => {
                if let Some(hook) = self.event.get() {
                    hook(event);
                }
            }
        }
    }

    pub(crate) fn dispatch_all(&self, notifications: Vec<Notification>) {
        for notification in &notifications {
            self.dispatch(notification);
        }
    }
}

fn call(hook: Option<Hook>) {
    if let Some(hook) = hook {
        hook();
    }
}
