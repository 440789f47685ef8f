//! Session configuration and the embedder-facing notification slots.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use wirelink_buffer::ByteBuffer;

/// Default fixed capacity of the read cache.
pub const DEFAULT_READ_CACHE_SIZE: usize = 8192;

/// Addressing, timing, and protocol-shape parameters for one session.
///
/// Assembled by the embedder before `connect` and read-only once `connect`
/// has been invoked. Callback registrations live separately in
/// [`EventHandlers`]; closures are not serializable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Remote host name or address.
    pub host: String,
    /// Remote TCP port.
    pub port: u16,
    /// Deadline for each connect attempt.
    pub connect_timeout: Duration,
    /// Deadline for each read operation.
    pub read_timeout: Duration,
    /// Idle interval between heartbeat frames.
    pub heartbeat_interval: Duration,
    /// Expected 2-byte guard at frame offset 4; 0 disables the check.
    pub magic_key: u16,
    /// Bytes stripped from the front of each decoded frame before it is
    /// handed to the `message` handler (conventionally header plus magic
    /// key length).
    pub read_skip_length: usize,
    /// Fixed capacity of the read cache. An incoming frame whose declared
    /// length exceeds this is a protocol error, never a resize.
    pub read_cache_size: usize,
    /// Pre-built heartbeat frame wire image, sent as-is when the connection
    /// idles for a full heartbeat interval.
    pub heartbeat: Bytes,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 0,
            connect_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(60),
            heartbeat_interval: Duration::from_secs(3),
            magic_key: 0,
            read_skip_length: 4,
            read_cache_size: DEFAULT_READ_CACHE_SIZE,
            heartbeat: Bytes::new(),
        }
    }
}

type ConnectedHandler = Arc<dyn Fn(&str) + Send + Sync>;
type MessageHandler = Arc<dyn Fn(ByteBuffer) + Send + Sync>;
type ClosedHandler = Arc<dyn Fn() + Send + Sync>;
type ErrorHandler = Arc<dyn Fn(&str) + Send + Sync>;

/// The four notification slots a session reports through.
///
/// Each handler is invoked from the session's serialized execution context,
/// never re-entrantly from within another handler's call frame. Unset slots
/// drop their notifications. Cloning shares the underlying handlers.
#[derive(Clone, Default)]
pub struct EventHandlers {
    on_connected: Option<ConnectedHandler>,
    on_message: Option<MessageHandler>,
    on_closed: Option<ClosedHandler>,
    on_error: Option<ErrorHandler>,
}

impl EventHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invoked once per successful connect with the endpoint description.
    pub fn on_connected(mut self, handler: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_connected = Some(Arc::new(handler));
        self
    }

    /// Invoked once per decoded frame, in arrival order.
    pub fn on_message(mut self, handler: impl Fn(ByteBuffer) + Send + Sync + 'static) -> Self {
        self.on_message = Some(Arc::new(handler));
        self
    }

    /// Invoked exactly once when the session tears down.
    pub fn on_closed(mut self, handler: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_closed = Some(Arc::new(handler));
        self
    }

    /// Invoked on fatal failures (before `closed`) and on operator misuse.
    pub fn on_error(mut self, handler: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(handler));
        self
    }

    pub(crate) fn connected(&self, endpoint: &str) {
        if let Some(handler) = &self.on_connected {
            handler(endpoint);
        }
    }

    pub(crate) fn message(&self, payload: ByteBuffer) {
        if let Some(handler) = &self.on_message {
            handler(payload);
        }
    }

    pub(crate) fn closed(&self) {
        if let Some(handler) = &self.on_closed {
            handler();
        }
    }

    pub(crate) fn error(&self, message: &str) {
        if let Some(handler) = &self.on_error {
            handler(message);
        }
    }
}

impl fmt::Debug for EventHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHandlers")
            .field("on_connected", &self.on_connected.is_some())
            .field("on_message", &self.on_message.is_some())
            .field("on_closed", &self.on_closed.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}
