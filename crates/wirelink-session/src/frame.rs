//! Frame decoding against the fixed read cache.
//!
//! Wire format per frame:
//!
//! ```text
//! ┌──────────────────┬───────────────────┬───────────────────────┐
//! │ Length (4B BE)   │ Magic key (2B BE) │ Payload               │
//! │ whole frame incl.│ optional, present │ (Length - prefix      │
//! │ this header      │ iff key != 0     │  bytes)               │
//! └──────────────────┴───────────────────┴───────────────────────┘
//! ```
//!
//! The declared length covers the whole frame including the header (and the
//! magic key, when used). The payload handed to the application is the frame
//! with the first `read_skip_length` bytes stripped.

use wirelink_buffer::ByteBuffer;

use crate::error::{Result, SessionError};

/// Length of the big-endian frame length prefix, in bytes. Fixed by the
/// protocol shape; not configurable.
pub const HEADER_LENGTH: usize = 4;

/// Width of the optional magic key at frame offset 4, in bytes.
pub const MAGIC_KEY_LENGTH: usize = 2;

/// Attempt to decode one frame from `window`, the unread span of the cache.
///
/// Returns `Ok(None)` when more bytes are needed, or `Ok(Some((consumed,
/// payload)))` with the number of cache bytes consumed and the payload with
/// the first `skip` bytes stripped.
///
/// A declared length of at most the header, or greater than `cache_size`,
/// is a protocol error; so is a magic-key mismatch when `magic_key != 0`.
/// The stream framing is unrecoverable after either.
pub fn decode_frame(
    window: &[u8],
    magic_key: u16,
    skip: usize,
    cache_size: usize,
) -> Result<Option<(usize, ByteBuffer)>> {
    if window.len() <= HEADER_LENGTH {
        return Ok(None); // need more data
    }

    let declared = u32::from_be_bytes(window[..HEADER_LENGTH].try_into().unwrap());
    let msg_len = declared as usize;

    if msg_len <= HEADER_LENGTH || msg_len > cache_size {
        return Err(SessionError::InvalidLength(declared));
    }

    if magic_key != 0 {
        if window.len() < HEADER_LENGTH + MAGIC_KEY_LENGTH {
            return Ok(None); // wait for the key bytes
        }
        let actual = u16::from_be_bytes(
            window[HEADER_LENGTH..HEADER_LENGTH + MAGIC_KEY_LENGTH]
                .try_into()
                .unwrap(),
        );
        if actual != magic_key {
            return Err(SessionError::MagicKeyMismatch {
                expected: magic_key,
                actual,
            });
        }
    }

    if window.len() < msg_len {
        return Ok(None); // wait for the rest of the frame
    }

    let start = skip.min(msg_len);
    let payload = ByteBuffer::from_slice(&window[start..msg_len]);
    Ok(Some((msg_len, payload)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(magic: Option<u16>, payload: &[u8]) -> Vec<u8> {
        let total = HEADER_LENGTH + magic.map_or(0, |_| MAGIC_KEY_LENGTH) + payload.len();
        let mut wire = (total as u32).to_be_bytes().to_vec();
        if let Some(key) = magic {
            wire.extend_from_slice(&key.to_be_bytes());
        }
        wire.extend_from_slice(payload);
        wire
    }

    #[test]
    fn short_window_needs_more_data() {
        assert!(matches!(decode_frame(&[], 0, 4, 8192), Ok(None)));
        assert!(matches!(
            decode_frame(&[0, 0, 0, 9], 0, 4, 8192),
            Ok(None)
        ));
    }

    #[test]
    fn exact_frame_decodes_once() {
        let wire = frame(None, b"hello");
        let (consumed, payload) = decode_frame(&wire, 0, 4, 8192).unwrap().unwrap();
        assert_eq!(consumed, wire.len());
        assert_eq!(payload.as_slice(), b"hello");
    }

    #[test]
    fn one_byte_short_defers_until_it_arrives() {
        let wire = frame(None, b"hello");
        assert!(matches!(
            decode_frame(&wire[..wire.len() - 1], 0, 4, 8192),
            Ok(None)
        ));
        assert!(decode_frame(&wire, 0, 4, 8192).unwrap().is_some());
    }

    #[test]
    fn declared_length_at_most_header_is_fatal() {
        let mut wire = 4u32.to_be_bytes().to_vec();
        wire.push(0xAA);
        assert!(matches!(
            decode_frame(&wire, 0, 4, 8192),
            Err(SessionError::InvalidLength(4))
        ));
    }

    #[test]
    fn declared_length_beyond_cache_is_fatal() {
        let mut wire = 9000u32.to_be_bytes().to_vec();
        wire.push(0xAA);
        assert!(matches!(
            decode_frame(&wire, 0, 4, 8192),
            Err(SessionError::InvalidLength(9000))
        ));
    }

    #[test]
    fn magic_key_match_passes() {
        let wire = frame(Some(0xCAFE), b"ok");
        let (consumed, payload) = decode_frame(&wire, 0xCAFE, 6, 8192).unwrap().unwrap();
        assert_eq!(consumed, wire.len());
        assert_eq!(payload.as_slice(), b"ok");
    }

    #[test]
    fn magic_key_mismatch_is_fatal_before_full_frame() {
        // Only header + key buffered, payload still in flight: the mismatch
        // must surface anyway.
        let wire = frame(Some(0xBEEF), b"payload");
        let err = decode_frame(&wire[..6], 0xCAFE, 6, 8192).unwrap_err();
        assert!(matches!(
            err,
            SessionError::MagicKeyMismatch {
                expected: 0xCAFE,
                actual: 0xBEEF,
            }
        ));
    }

    #[test]
    fn partial_magic_key_waits_for_both_bytes() {
        let wire = frame(Some(0xCAFE), b"ok");
        assert!(matches!(
            decode_frame(&wire[..5], 0xCAFE, 6, 8192),
            Ok(None)
        ));
    }

    #[test]
    fn magic_key_zero_disables_the_check() {
        // Bytes at offset 4 are payload, not a key, and must not be judged.
        let wire = frame(None, &[0xBE, 0xEF, 1, 2]);
        let (_, payload) = decode_frame(&wire, 0, 4, 8192).unwrap().unwrap();
        assert_eq!(payload.as_slice(), &[0xBE, 0xEF, 1, 2]);
    }

    #[test]
    fn skip_strips_the_frame_front() {
        let wire = frame(Some(0xCAFE), b"payload");
        let (_, payload) = decode_frame(&wire, 0xCAFE, 6, 8192).unwrap().unwrap();
        assert_eq!(payload.as_slice(), b"payload");
        assert_eq!(payload.len(), wire.len() - 6);
    }

    #[test]
    fn skip_beyond_frame_yields_empty_payload() {
        let wire = frame(None, b"x");
        let (consumed, payload) = decode_frame(&wire, 0, 64, 8192).unwrap().unwrap();
        assert_eq!(consumed, wire.len());
        assert!(payload.is_empty());
    }

    #[test]
    fn consecutive_frames_decode_in_order() {
        let mut wire = frame(None, b"first");
        wire.extend_from_slice(&frame(None, b"second"));

        let (consumed, first) = decode_frame(&wire, 0, 4, 8192).unwrap().unwrap();
        assert_eq!(first.as_slice(), b"first");
        let (_, second) = decode_frame(&wire[consumed..], 0, 4, 8192).unwrap().unwrap();
        assert_eq!(second.as_slice(), b"second");
    }
}
