//! Cursor-based byte buffer with big-endian wire codec.
//!
//! [`ByteBuffer`] is a growable byte container with independent read and
//! write cursors. Every multi-byte scalar is stored in big-endian (network)
//! byte order on the wire regardless of the host's native order; single-byte
//! and raw-bytes operations perform no reordering.
//!
//! Relative typed reads past the end of storage return the zero value of the
//! type rather than faulting; callers track expected lengths themselves.

pub mod buffer;
pub mod scalar;

pub use buffer::{ByteBuffer, DEFAULT_CAPACITY};
pub use scalar::WireScalar;
