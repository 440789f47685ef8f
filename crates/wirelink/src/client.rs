//! Client facade: one session, its configuration, and frame helpers.

use std::time::Duration;

use bytes::Bytes;
use wirelink_buffer::ByteBuffer;
use wirelink_session::{EventHandlers, Session, SessionConfig, HEADER_LENGTH};

/// Default heartbeat frame body.
pub const DEFAULT_HEARTBEAT_BODY: &[u8] = b"heartbeat";

/// Wrap an application payload with its 4-byte big-endian length header.
/// The declared length covers the whole frame including the header.
pub fn frame_payload(payload: &[u8]) -> ByteBuffer {
    let mut buf = ByteBuffer::with_capacity(HEADER_LENGTH + payload.len());
    buf.put_u32((HEADER_LENGTH + payload.len()) as u32);
    buf.put_bytes(payload);
    buf
}

/// Build a heartbeat frame wire image from a payload body.
pub fn heartbeat_frame(body: &[u8]) -> Bytes {
    frame_payload(body).into_bytes()
}

/// A framed TCP client.
///
/// Owns one [`Session`] plus its configuration and forwards `connect`,
/// `send`, and `close`. Composition only; all connection semantics live in
/// the session.
#[derive(Debug)]
pub struct Client {
    session: Session,
}

impl Client {
    /// A client with default configuration and no handlers registered.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Set the target address and start connecting.
    pub fn connect(&mut self, host: &str, port: u16) {
        self.session.config_mut().host = host.to_string();
        self.session.config_mut().port = port;
        self.session.connect();
    }

    /// Connect again to the previously configured address.
    pub fn reconnect(&mut self) {
        self.session.connect();
    }

    /// Length-prefix `payload` and queue it for transmission.
    pub fn send(&self, payload: &[u8]) {
        self.session.send(frame_payload(payload));
    }

    /// Queue a pre-framed buffer for transmission as-is.
    pub fn send_buffer(&self, buffer: ByteBuffer) {
        self.session.send(buffer);
    }

    /// Tear the connection down; `closed` is emitted exactly once.
    pub fn close(&self) {
        self.session.close();
    }

    /// Whether a connection or connection attempt is currently live.
    pub fn is_active(&self) -> bool {
        self.session.is_active()
    }

    /// The underlying session.
    pub fn session(&self) -> &Session {
        &self.session
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        // Close eagerly rather than waiting for the dropped link to be
        // noticed.
        self.session.close();
    }
}

/// Fluent configuration for a [`Client`].
///
/// Defaults: 30s connect timeout, 60s read timeout, 3s heartbeat interval,
/// no magic key, 4-byte read skip (the length header), 8192-byte read
/// cache, and a `"heartbeat"` keep-alive body.
pub struct ClientBuilder {
    config: SessionConfig,
    handlers: EventHandlers,
}

impl ClientBuilder {
    pub fn new() -> Self {
        let config = SessionConfig {
            heartbeat: heartbeat_frame(DEFAULT_HEARTBEAT_BODY),
            ..SessionConfig::default()
        };
        Self {
            config,
            handlers: EventHandlers::new(),
        }
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.config.heartbeat_interval = interval;
        self
    }

    /// Expected 2-byte guard at frame offset 4; 0 disables the check.
    /// Remember to widen [`read_skip_length`](Self::read_skip_length) to 6
    /// when the key is part of the frames the server sends.
    pub fn magic_key(mut self, key: u16) -> Self {
        self.config.magic_key = key;
        self
    }

    /// Bytes stripped from the front of each decoded frame before dispatch.
    pub fn read_skip_length(mut self, skip: usize) -> Self {
        self.config.read_skip_length = skip;
        self
    }

    /// Fixed read-cache capacity; frames longer than this are protocol
    /// errors.
    pub fn read_cache_size(mut self, size: usize) -> Self {
        self.config.read_cache_size = size;
        self
    }

    /// Replace the default heartbeat body; the length header is added here.
    pub fn heartbeat_body(mut self, body: &[u8]) -> Self {
        self.config.heartbeat = heartbeat_frame(body);
        self
    }

    pub fn on_connected(mut self, handler: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.handlers = self.handlers.on_connected(handler);
        self
    }

    pub fn on_message(mut self, handler: impl Fn(ByteBuffer) + Send + Sync + 'static) -> Self {
        self.handlers = self.handlers.on_message(handler);
        self
    }

    pub fn on_closed(mut self, handler: impl Fn() + Send + Sync + 'static) -> Self {
        self.handlers = self.handlers.on_closed(handler);
        self
    }

    pub fn on_error(mut self, handler: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.handlers = self.handlers.on_error(handler);
        self
    }

    pub fn build(self) -> Client {
        Client {
            session: Session::new(self.config, self.handlers),
        }
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
