//! The session: public entry points and the link to its actor.

use std::fmt;
use std::thread;

use tokio::sync::mpsc::{self, UnboundedSender};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use wirelink_buffer::ByteBuffer;

use crate::actor;
use crate::config::{EventHandlers, SessionConfig};
use crate::error::SessionError;

pub(crate) enum Command {
    Send(ByteBuffer),
}

/// Handles to a live connection; re-created by every `connect`.
struct Link {
    commands: UnboundedSender<Command>,
    cancel: CancellationToken,
}

impl Link {
    fn is_live(&self) -> bool {
        !self.commands.is_closed() && !self.cancel.is_cancelled()
    }
}

/// An embeddable TCP client session.
///
/// The session is an asynchronous state machine driven on a dedicated
/// background execution context (one thread per connected session):
/// `connect` spawns it, `send` and `close` marshal work onto it, and every
/// notification is delivered from it. No public entry point blocks the
/// caller, and no two notifications for the same session run concurrently.
///
/// A closed session is reusable: re-invoking [`connect`](Self::connect)
/// re-creates the socket, timers, and execution context.
pub struct Session {
    config: SessionConfig,
    handlers: EventHandlers,
    link: Option<Link>,
}

impl Session {
    pub fn new(config: SessionConfig, handlers: EventHandlers) -> Self {
        Self {
            config,
            handlers,
            link: None,
        }
    }

    /// The session configuration. Read-only while connected.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Mutable configuration access; only meaningful before `connect`.
    pub fn config_mut(&mut self) -> &mut SessionConfig {
        &mut self.config
    }

    /// Whether a connection or connection attempt is currently live.
    pub fn is_active(&self) -> bool {
        self.link.as_ref().is_some_and(Link::is_live)
    }

    /// Start the asynchronous actor chain: resolve the configured address,
    /// try each candidate endpoint in order, then run the read loop,
    /// heartbeat timer, and deadline watcher until `close` or a fatal error.
    ///
    /// Connecting while a previous link is still live is reported through
    /// the `error` handler and otherwise ignored.
    pub fn connect(&mut self) {
        if self.is_active() {
            self.handlers.error("already connected");
            return;
        }

        let (commands, inbox) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let config = self.config.clone();
        let handlers = self.handlers.clone();
        let actor_cancel = cancel.clone();

        debug!(host = %config.host, port = config.port, "connect requested");

        let spawned = thread::Builder::new()
            .name("wirelink-session".into())
            .spawn(move || {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_io()
                    .enable_time()
                    .build();
                match runtime {
                    Ok(runtime) => {
                        runtime.block_on(actor::run(config, handlers.clone(), inbox, actor_cancel));
                    }
                    Err(err) => {
                        handlers.error(&format!("failed to start execution context: {err}"));
                        handlers.closed();
                    }
                }
            });

        match spawned {
            // Detached: the actor owns its own lifetime until it unwinds.
            Ok(_handle) => self.link = Some(Link { commands, cancel }),
            Err(err) => {
                self.handlers
                    .error(&format!("failed to start execution context: {err}"));
            }
        }
    }

    /// Queue `buffer` for transmission. Writes complete strictly in enqueue
    /// order, and a send preempts any scheduled heartbeat.
    ///
    /// Sending on a session that is not connected or connecting is reported
    /// through the `error` handler and otherwise ignored.
    pub fn send(&self, buffer: ByteBuffer) {
        let delivered = self
            .link
            .as_ref()
            .filter(|link| link.is_live())
            .map(|link| link.commands.send(Command::Send(buffer)).is_ok());

        if delivered != Some(true) {
            self.handlers.error(&SessionError::AlreadyClosed.to_string());
        }
    }

    /// Tear the session down: cancel in-flight asynchronous work, shut the
    /// socket down gracefully, and emit `closed` exactly once.
    ///
    /// Idempotent: closing a session that is not connected or connecting
    /// is a silent no-op.
    pub fn close(&self) {
        if let Some(link) = &self.link {
            if link.is_live() {
                debug!("close requested");
                link.cancel.cancel();
            }
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .field("active", &self.is_active())
            .finish()
    }
}
