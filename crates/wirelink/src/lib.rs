//! Embeddable framed TCP client.
//!
//! This is the "just works" layer: build a [`Client`] with its address,
//! timing, and protocol-shape parameters plus the four notification
//! handlers, then drive it with `connect`, `send`, and `close`. Payloads go
//! out length-prefixed; incoming frames arrive decoded through the
//! `message` handler; idle connections stay alive with heartbeats.
//!
//! ```no_run
//! use wirelink::Client;
//!
//! let mut client = Client::builder()
//!     .host("127.0.0.1")
//!     .port(9000)
//!     .on_connected(|endpoint| eprintln!("connected to {endpoint}"))
//!     .on_message(|payload| eprintln!("{} byte reply", payload.len()))
//!     .on_closed(|| eprintln!("closed"))
//!     .on_error(|message| eprintln!("error: {message}"))
//!     .build();
//!
//! client.connect("127.0.0.1", 9000);
//! client.send(b"{\"hello\":\"world\"}");
//! client.close();
//! ```

pub mod client;

pub use client::{frame_payload, heartbeat_frame, Client, ClientBuilder};
pub use wirelink_buffer::{ByteBuffer, WireScalar};
pub use wirelink_session::{
    EventHandlers, Session, SessionConfig, SessionError, HEADER_LENGTH, MAGIC_KEY_LENGTH,
};
