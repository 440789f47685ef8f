/// Errors that can occur on a client session.
///
/// Every fatal condition funnels through a single reporting path: at most
/// one `error` notification followed by exactly one `closed` notification.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Host name resolution failed.
    #[error("failed to resolve {host}:{port}: {source}")]
    Resolve {
        host: String,
        port: u16,
        source: std::io::Error,
    },

    /// Every resolved endpoint was tried and none accepted the connection.
    #[error("no more endpoints to try")]
    EndpointsExhausted,

    /// A connect or read deadline passed.
    #[error("connection timeout")]
    Timeout,

    /// A frame declared a length the read cache cannot carry.
    #[error("invalid message length: {0}")]
    InvalidLength(u32),

    /// The 2-byte guard at frame offset 4 did not match the configured key.
    #[error("magic key mismatch (expected {expected:#06x}, got {actual:#06x})")]
    MagicKeyMismatch { expected: u16, actual: u16 },

    /// The peer closed the connection.
    #[error("connection closed by peer")]
    PeerClosed,

    /// An I/O error occurred on the socket.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The session is not connected.
    #[error("connection already closed")]
    AlreadyClosed,
}

pub type Result<T> = std::result::Result<T, SessionError>;
