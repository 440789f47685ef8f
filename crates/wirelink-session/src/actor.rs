//! The session actor.
//!
//! One task on a dedicated current-thread runtime drives resolution, the
//! endpoint trial, the read loop, the outbox, and both timers. All mutable
//! session state lives here, serialized by construction; the public entry
//! points only marshal work in through the command channel and the
//! cancellation token.

use std::collections::VecDeque;
use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};
use wirelink_buffer::ByteBuffer;

use crate::config::{EventHandlers, SessionConfig};
use crate::error::SessionError;
use crate::frame::decode_frame;
use crate::session::Command;
use crate::timer::{Deadline, Heartbeat};

/// A buffer mid-transmission: its compacted wire image plus how far the
/// socket has taken it.
struct Pending {
    wire: ByteBuffer,
    offset: usize,
}

impl Pending {
    fn new(mut wire: ByteBuffer) -> Self {
        wire.compact();
        Self { wire, offset: 0 }
    }

    fn remaining(&self) -> &[u8] {
        &self.wire.as_slice()[self.offset..]
    }
}

/// One write step for the in-flight buffer. With nothing in flight the
/// future parks forever, so a disabled `select!` arm can still be
/// constructed without touching the queue.
async fn write_step(socket: &mut OwnedWriteHalf, pending: Option<&Pending>) -> std::io::Result<usize> {
    match pending {
        Some(pending) => socket.write(pending.remaining()).await,
        None => std::future::pending().await,
    }
}

pub(crate) async fn run(
    config: SessionConfig,
    handlers: EventHandlers,
    mut commands: UnboundedReceiver<Command>,
    cancel: CancellationToken,
) {
    let mut deadline = Deadline::new();

    let (stream, endpoint) = match establish(&config, &mut deadline, &cancel).await {
        Ok(Some(connected)) => connected,
        Ok(None) => {
            // close() arrived during the connect phase: routine teardown.
            handlers.closed();
            return;
        }
        Err(err) => {
            handlers.error(&err.to_string());
            handlers.closed();
            return;
        }
    };

    handlers.connected(&endpoint.to_string());

    let (mut read_half, mut write_half) = stream.into_split();

    // The fixed-capacity read cache with its fill and consume positions.
    // It never grows: a frame longer than this is a protocol error.
    let mut cache = vec![0u8; config.read_cache_size];
    let mut fill = 0usize;
    let mut consume = 0usize;

    let mut outbox: VecDeque<ByteBuffer> = VecDeque::new();
    let mut pending: Option<Pending> = None;

    let mut heartbeat = Heartbeat::new();
    heartbeat.arm(config.heartbeat_interval);
    deadline.arm(config.read_timeout);

    let failure: Option<SessionError> = loop {
        tokio::select! {
            res = read_half.read(&mut cache[fill..]) => match res {
                Ok(0) => break Some(SessionError::PeerClosed),
                Ok(n) => {
                    fill += n;
                    trace!(bytes = n, "read");

                    // Decode as many complete frames as have arrived.
                    let mut fatal = None;
                    loop {
                        match decode_frame(
                            &cache[consume..fill],
                            config.magic_key,
                            config.read_skip_length,
                            config.read_cache_size,
                        ) {
                            Ok(Some((consumed, payload))) => {
                                consume += consumed;
                                handlers.message(payload);
                            }
                            Ok(None) => break,
                            Err(err) => {
                                fatal = Some(err);
                                break;
                            }
                        }
                    }
                    if let Some(err) = fatal {
                        break Some(err);
                    }

                    // Bounded sliding window: reset when drained, otherwise
                    // shift the unread remainder to the front of the cache.
                    if consume == fill {
                        consume = 0;
                        fill = 0;
                    } else {
                        cache.copy_within(consume..fill, 0);
                        fill -= consume;
                        consume = 0;
                    }

                    deadline.arm(config.read_timeout);
                }
                Err(err) => break Some(SessionError::Io(err)),
            },

            res = write_step(&mut write_half, pending.as_ref()), if pending.is_some() => match res {
                Ok(0) => break Some(SessionError::PeerClosed),
                Ok(n) => {
                    if let Some(front) = pending.as_mut() {
                        front.offset += n;
                        if front.offset >= front.wire.len() {
                            trace!(bytes = front.wire.len(), "write complete");
                            pending = outbox.pop_front().map(Pending::new);
                            if pending.is_none() {
                                // Outbox drained; wait before the next
                                // heartbeat or customer message.
                                heartbeat.arm(config.heartbeat_interval);
                            }
                        }
                    }
                }
                Err(err) => break Some(SessionError::Io(err)),
            },

            cmd = commands.recv() => match cmd {
                Some(Command::Send(buffer)) => {
                    if pending.is_none() {
                        // Preempt the scheduled heartbeat.
                        heartbeat.cancel();
                        pending = Some(Pending::new(buffer));
                    } else {
                        outbox.push_back(buffer);
                    }
                }
                None => {
                    debug!("session owner dropped");
                    break None;
                }
            },

            () = heartbeat.elapsed(), if heartbeat.is_armed() => {
                heartbeat.cancel();
                if pending.is_none() && outbox.is_empty() {
                    trace!("heartbeat");
                    pending = Some(Pending::new(ByteBuffer::from(config.heartbeat.clone())));
                }
            }

            () = deadline.expired() => break Some(SessionError::Timeout),

            () = cancel.cancelled() => break None,
        }
    };

    // Single teardown path: at most one error report, then exactly one
    // closed notification. Futures dropped here are routine cancellation.
    if let Some(err) = &failure {
        handlers.error(&err.to_string());
    }

    if let Err(err) = write_half.shutdown().await {
        warn!(%err, "socket shutdown failed");
    }
    drop(write_half);
    drop(read_half);

    debug!(%endpoint, "session closed");
    handlers.closed();
}

/// Resolve the configured address and try each candidate endpoint in order.
///
/// A connect failure or per-candidate timeout closes that socket and
/// advances to the next candidate; an exhausted candidate list is fatal.
/// Returns `Ok(None)` when `close` cancels the attempt.
async fn establish(
    config: &SessionConfig,
    deadline: &mut Deadline,
    cancel: &CancellationToken,
) -> Result<Option<(TcpStream, SocketAddr)>, SessionError> {
    let endpoints = tokio::net::lookup_host((config.host.as_str(), config.port))
        .await
        .map_err(|source| SessionError::Resolve {
            host: config.host.clone(),
            port: config.port,
            source,
        })?;

    for endpoint in endpoints {
        debug!(%endpoint, "trying endpoint");
        deadline.arm(config.connect_timeout);

        tokio::select! {
            res = TcpStream::connect(endpoint) => match res {
                Ok(stream) => {
                    debug!(%endpoint, "connected");
                    return Ok(Some((stream, endpoint)));
                }
                // Dropping the attempt closes the failed socket; move on.
                Err(err) => debug!(%endpoint, %err, "connect failed"),
            },
            () = deadline.expired() => debug!(%endpoint, "connect timed out"),
            () = cancel.cancelled() => return Ok(None),
        }
    }

    Err(SessionError::EndpointsExhausted)
}
