use std::fmt;

use bytes::Bytes;

use crate::scalar::WireScalar;

/// Default number of bytes to preallocate when no capacity is given.
pub const DEFAULT_CAPACITY: usize = 8192;

/// A growable byte container with independent read and write cursors.
///
/// `0 <= rpos <= wpos <= len()` holds after any well-formed operation.
/// Typed reads past the end of storage return the zero value of the type
/// (the "no more data" signal) and still advance the read cursor; callers
/// are expected to track expected lengths.
///
/// Multi-byte scalars are stored big-endian on the wire via [`WireScalar`];
/// single-byte and raw-bytes operations perform no reordering.
pub struct ByteBuffer {
    buf: Vec<u8>,
    rpos: usize,
    wpos: usize,
}

impl ByteBuffer {
    /// Create an empty buffer with the default preallocation.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create an empty buffer preallocating `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            rpos: 0,
            wpos: 0,
        }
    }

    /// Create a buffer holding a copy of `data`, write cursor at the end.
    pub fn from_slice(data: &[u8]) -> Self {
        Self {
            buf: data.to_vec(),
            rpos: 0,
            wpos: data.len(),
        }
    }

    // Core primitives. Every typed accessor below goes through these three,
    // so the zero-on-out-of-bounds and grow-on-append rules live in exactly
    // one place each.

    fn read_at<T: WireScalar>(&self, index: usize) -> T {
        match index
            .checked_add(T::WIDTH)
            .and_then(|end| self.buf.get(index..end))
        {
            Some(src) => T::read_be(src),
            None => T::ZERO,
        }
    }

    fn read_next<T: WireScalar>(&mut self) -> T {
        let value = self.read_at(self.rpos);
        self.rpos += T::WIDTH;
        value
    }

    fn append<T: WireScalar>(&mut self, value: T) {
        let end = self.wpos + T::WIDTH;
        if self.buf.len() < end {
            self.buf.resize(end, 0);
        }
        value.write_be(&mut self.buf[self.wpos..end]);
        self.wpos = end;
    }

    fn overwrite<T: WireScalar>(&mut self, value: T, index: usize) {
        let end = match index.checked_add(T::WIDTH) {
            Some(end) if end <= self.buf.len() => end,
            _ => return, // out of bounds, silently ignored
        };
        value.write_be(&mut self.buf[index..end]);
        self.wpos = end;
    }

    // Read

    /// Read the next byte without advancing the read cursor.
    pub fn peek(&self) -> u8 {
        self.read_at(self.rpos)
    }

    /// Relative read; advances the read cursor.
    pub fn get_u8(&mut self) -> u8 {
        self.read_next()
    }

    /// Absolute read at `index`; cursors are untouched.
    pub fn get_u8_at(&self, index: usize) -> u8 {
        self.read_at(index)
    }

    pub fn get_i8(&mut self) -> i8 {
        self.read_next()
    }

    pub fn get_i8_at(&self, index: usize) -> i8 {
        self.read_at(index)
    }

    pub fn get_u16(&mut self) -> u16 {
        self.read_next()
    }

    pub fn get_u16_at(&self, index: usize) -> u16 {
        self.read_at(index)
    }

    pub fn get_u32(&mut self) -> u32 {
        self.read_next()
    }

    pub fn get_u32_at(&self, index: usize) -> u32 {
        self.read_at(index)
    }

    pub fn get_u64(&mut self) -> u64 {
        self.read_next()
    }

    pub fn get_u64_at(&self, index: usize) -> u64 {
        self.read_at(index)
    }

    pub fn get_f32(&mut self) -> f32 {
        self.read_next()
    }

    pub fn get_f32_at(&self, index: usize) -> f32 {
        self.read_at(index)
    }

    pub fn get_f64(&mut self) -> f64 {
        self.read_next()
    }

    pub fn get_f64_at(&self, index: usize) -> f64 {
        self.read_at(index)
    }

    /// Relative read of `len` bytes. Bytes past the end of storage come back
    /// as zero; the read cursor advances by `len` regardless.
    pub fn get_bytes(&mut self, len: usize) -> Vec<u8> {
        let mut out = vec![0u8; len];
        for slot in out.iter_mut() {
            *slot = self.get_u8();
        }
        out
    }

    // Write

    /// Relative write; grows storage on demand and advances the write cursor.
    pub fn put_u8(&mut self, value: u8) {
        self.append(value);
    }

    /// Absolute in-place overwrite at `index`. Silently ignored unless
    /// `index + 1 <= len()`; on success the write cursor moves past `index`.
    pub fn put_u8_at(&mut self, value: u8, index: usize) {
        self.overwrite(value, index);
    }

    pub fn put_i8(&mut self, value: i8) {
        self.append(value);
    }

    pub fn put_i8_at(&mut self, value: i8, index: usize) {
        self.overwrite(value, index);
    }

    pub fn put_u16(&mut self, value: u16) {
        self.append(value);
    }

    pub fn put_u16_at(&mut self, value: u16, index: usize) {
        self.overwrite(value, index);
    }

    pub fn put_u32(&mut self, value: u32) {
        self.append(value);
    }

    pub fn put_u32_at(&mut self, value: u32, index: usize) {
        self.overwrite(value, index);
    }

    pub fn put_u64(&mut self, value: u64) {
        self.append(value);
    }

    pub fn put_u64_at(&mut self, value: u64, index: usize) {
        self.overwrite(value, index);
    }

    pub fn put_f32(&mut self, value: f32) {
        self.append(value);
    }

    pub fn put_f32_at(&mut self, value: f32, index: usize) {
        self.overwrite(value, index);
    }

    pub fn put_f64(&mut self, value: f64) {
        self.append(value);
    }

    pub fn put_f64_at(&mut self, value: f64, index: usize) {
        self.overwrite(value, index);
    }

    /// Relative write of a byte slice.
    pub fn put_bytes(&mut self, data: &[u8]) {
        let end = self.wpos + data.len();
        if self.buf.len() < end {
            self.buf.resize(end, 0);
        }
        self.buf[self.wpos..end].copy_from_slice(data);
        self.wpos = end;
    }

    /// Absolute write starting at `index`. The write cursor moves to `index`
    /// first, so storage between the old end and `index` is zero-filled and
    /// the write may grow the buffer.
    pub fn put_bytes_at(&mut self, data: &[u8], index: usize) {
        self.wpos = index;
        self.put_bytes(data);
    }

    /// Relative write of the entire storage of another buffer.
    pub fn put_buffer(&mut self, src: &ByteBuffer) {
        self.put_bytes(&src.buf);
    }

    // Searching

    /// Linear scan for the first typed value equal to `key`, starting at
    /// byte offset `start`.
    ///
    /// A zero value encountered while scanning for a non-zero key is treated
    /// as the end-of-data sentinel and halts the scan, so a search cannot
    /// run past zero-padded regions.
    pub fn find<T: WireScalar>(&self, key: T, start: usize) -> Option<usize> {
        for i in start..self.buf.len() {
            let data: T = self.read_at(i);
            if key != T::ZERO && data == T::ZERO {
                return None;
            }
            if data == key {
                return Some(i);
            }
        }
        None
    }

    /// Replace occurrences of `key` with `rep`, starting at `start`.
    /// Honors the same zero-sentinel early exit as [`find`](Self::find).
    pub fn replace(&mut self, key: u8, rep: u8, start: usize, first_only: bool) {
        for i in start..self.buf.len() {
            let data = self.buf[i];
            if key != 0 && data == 0 {
                break;
            }
            if data == key {
                self.buf[i] = rep;
                if first_only {
                    return;
                }
            }
        }
    }

    // Layout

    /// Reset both cursors and empty storage. Capacity is retained.
    pub fn clear(&mut self) {
        self.rpos = 0;
        self.wpos = 0;
        self.buf.clear();
    }

    /// Resize storage to `new_len` bytes (zero-filling growth) and reset
    /// both cursors.
    pub fn resize(&mut self, new_len: usize) {
        self.buf.resize(new_len, 0);
        self.rpos = 0;
        self.wpos = 0;
    }

    /// Slide the unread span `[rpos, wpos)` to the front of storage, shrink
    /// storage to exactly that length, and renormalize the cursors to
    /// `rpos = 0`, `wpos = len`. Returns the span.
    ///
    /// Absolute indices held across this call are invalidated.
    pub fn compact(&mut self) -> &[u8] {
        let rpos = self.rpos.min(self.wpos);
        let len = self.wpos - rpos;
        if rpos != 0 {
            self.buf.copy_within(rpos..self.wpos, 0);
        }
        self.buf.truncate(len);
        self.rpos = 0;
        self.wpos = len;
        &self.buf
    }

    /// Duplicate the full storage into a new buffer with both cursors reset.
    pub fn duplicate(&self) -> ByteBuffer {
        ByteBuffer {
            buf: self.buf.clone(),
            rpos: 0,
            wpos: 0,
        }
    }

    /// Copy only the unread remainder `[rpos, wpos)` into a new buffer whose
    /// cursors span exactly that data.
    pub fn copy_remaining(&self) -> ByteBuffer {
        ByteBuffer::from_slice(self.unread())
    }

    /// Total storage length, not the number of unread bytes.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Number of bytes from the read cursor to the end of storage.
    pub fn bytes_remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.rpos)
    }

    // Cursor accessors and mutators

    pub fn read_pos(&self) -> usize {
        self.rpos
    }

    pub fn set_read_pos(&mut self, rpos: usize) {
        self.rpos = rpos;
    }

    pub fn write_pos(&self) -> usize {
        self.wpos
    }

    pub fn set_write_pos(&mut self, wpos: usize) {
        self.wpos = wpos;
    }

    /// Full storage as a slice.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// The unread span `[rpos, wpos)`.
    pub fn unread(&self) -> &[u8] {
        &self.buf[self.rpos.min(self.wpos)..self.wpos]
    }

    /// Hex dump of the full storage, one `"XX "` group per byte.
    pub fn to_hex(&self) -> String {
        use std::fmt::Write as _;

        let mut hex = String::with_capacity(self.buf.len() * 3);
        for b in &self.buf {
            let _ = write!(hex, "{b:02X} ");
        }
        hex
    }

    /// Consume the buffer, returning its storage.
    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }

    /// Consume the buffer, freezing its storage into [`Bytes`].
    pub fn into_bytes(self) -> Bytes {
        Bytes::from(self.buf)
    }
}

impl Default for ByteBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vec<u8>> for ByteBuffer {
    fn from(buf: Vec<u8>) -> Self {
        let wpos = buf.len();
        Self { buf, rpos: 0, wpos }
    }
}

impl From<&[u8]> for ByteBuffer {
    fn from(data: &[u8]) -> Self {
        Self::from_slice(data)
    }
}

impl From<Bytes> for ByteBuffer {
    fn from(data: Bytes) -> Self {
        Self::from(Vec::from(data))
    }
}

/// Full byte-for-byte storage comparison, independent of cursor positions.
/// False-fast on length mismatch.
impl PartialEq for ByteBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.buf == other.buf
    }
}

impl Eq for ByteBuffer {}

// Cursors only; storage contents stay out of logs.
impl fmt::Debug for ByteBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteBuffer")
            .field("len", &self.buf.len())
            .field("rpos", &self.rpos)
            .field("wpos", &self.wpos)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u32_round_trip_is_big_endian_on_the_wire() {
        let mut buf = ByteBuffer::new();
        buf.put_u32(0x0102_0304);

        assert_eq!(buf.as_slice(), &[0x01, 0x02, 0x03, 0x04]);
        assert_eq!(buf.get_u32(), 0x0102_0304);
        assert_eq!(buf.read_pos(), 4);
    }

    #[test]
    fn u16_and_u64_round_trip() {
        let mut buf = ByteBuffer::new();
        buf.put_u16(0xCAFE);
        buf.put_u64(0x0102_0304_0506_0708);

        assert_eq!(buf.as_slice()[..2], [0xCA, 0xFE]);
        assert_eq!(buf.get_u16(), 0xCAFE);
        assert_eq!(buf.get_u64(), 0x0102_0304_0506_0708);
    }

    #[test]
    fn float_round_trip() {
        let mut buf = ByteBuffer::new();
        buf.put_f32(1.5);
        buf.put_f64(-2.25);

        assert_eq!(buf.as_slice()[..4], 1.5f32.to_be_bytes());
        assert_eq!(buf.get_f32(), 1.5);
        assert_eq!(buf.get_f64(), -2.25);
    }

    #[test]
    fn signed_byte_round_trip() {
        let mut buf = ByteBuffer::new();
        buf.put_i8(-5);
        assert_eq!(buf.get_i8(), -5);
    }

    #[test]
    fn peek_does_not_advance() {
        let mut buf = ByteBuffer::from_slice(&[7, 8]);
        assert_eq!(buf.peek(), 7);
        assert_eq!(buf.peek(), 7);
        assert_eq!(buf.get_u8(), 7);
        assert_eq!(buf.peek(), 8);
    }

    #[test]
    fn absolute_reads_leave_cursors_alone() {
        let buf = ByteBuffer::from_slice(&[0x01, 0x02, 0x03, 0x04]);
        assert_eq!(buf.get_u16_at(1), 0x0203);
        assert_eq!(buf.get_u32_at(0), 0x0102_0304);
        assert_eq!(buf.read_pos(), 0);
        assert_eq!(buf.write_pos(), 4);
    }

    #[test]
    fn read_past_end_returns_zero_and_advances() {
        let mut buf = ByteBuffer::from_slice(&[0xAA]);
        assert_eq!(buf.get_u32(), 0); // only one byte available
        assert_eq!(buf.read_pos(), 4);
        assert_eq!(buf.get_u8(), 0);
    }

    #[test]
    fn get_bytes_zero_fills_past_end() {
        let mut buf = ByteBuffer::from_slice(&[1, 2]);
        assert_eq!(buf.get_bytes(4), vec![1, 2, 0, 0]);
    }

    #[test]
    fn relative_put_grows_storage() {
        let mut buf = ByteBuffer::with_capacity(2);
        buf.put_bytes(&[1, 2, 3, 4, 5]);
        assert_eq!(buf.len(), 5);
        assert_eq!(buf.write_pos(), 5);
    }

    #[test]
    fn absolute_put_out_of_bounds_is_ignored() {
        let mut buf = ByteBuffer::from_slice(&[1, 2, 3]);
        buf.put_u32_at(0xFFFF_FFFF, 1); // 1 + 4 > 3
        buf.put_u8_at(9, 3);
        assert_eq!(buf.as_slice(), &[1, 2, 3]);
        assert_eq!(buf.write_pos(), 3);
    }

    #[test]
    fn absolute_put_in_bounds_overwrites_and_moves_write_pos() {
        let mut buf = ByteBuffer::from_slice(&[0, 0, 0, 0, 9]);
        buf.put_u16_at(0xBEEF, 1);
        assert_eq!(buf.as_slice(), &[0, 0xBE, 0xEF, 0, 9]);
        assert_eq!(buf.write_pos(), 3);
    }

    #[test]
    fn put_bytes_at_zero_fills_gap() {
        let mut buf = ByteBuffer::with_capacity(0);
        buf.put_bytes_at(&[7, 7], 3);
        assert_eq!(buf.as_slice(), &[0, 0, 0, 7, 7]);
    }

    #[test]
    fn put_buffer_appends_entire_storage() {
        let mut src = ByteBuffer::from_slice(&[3, 4]);
        src.get_u8(); // read cursor position must not matter
        let mut dst = ByteBuffer::from_slice(&[1, 2]);
        dst.put_buffer(&src);
        assert_eq!(dst.as_slice(), &[1, 2, 3, 4]);
    }

    #[test]
    fn clear_resets_cursors_and_empties_storage() {
        let mut buf = ByteBuffer::from_slice(&[1, 2, 3]);
        buf.get_u8();
        buf.clear();
        assert_eq!(buf.len(), 0);
        assert_eq!(buf.read_pos(), 0);
        assert_eq!(buf.write_pos(), 0);
    }

    #[test]
    fn find_locates_typed_values() {
        let mut buf = ByteBuffer::new();
        buf.put_u8(1);
        buf.put_u16(0x0203);
        assert_eq!(buf.find(2u8, 0), Some(1));
        assert_eq!(buf.find(0x0203u16, 0), Some(1));
        assert_eq!(buf.find(9u8, 0), None);
    }

    #[test]
    fn find_halts_at_zero_sentinel() {
        // 0xAB sits past a zero byte, so a scan for it must not reach it.
        let buf = ByteBuffer::from_slice(&[1, 2, 0, 0xAB]);
        assert_eq!(buf.find(0xABu8, 0), None);
        assert_eq!(buf.find(0xABu8, 3), Some(3)); // starting past the zero
    }

    #[test]
    fn find_zero_key_is_not_halted() {
        let buf = ByteBuffer::from_slice(&[5, 0, 7]);
        assert_eq!(buf.find(0u8, 0), Some(1));
    }

    #[test]
    fn find_honors_start_offset() {
        let buf = ByteBuffer::from_slice(&[4, 4, 4]);
        assert_eq!(buf.find(4u8, 2), Some(2));
    }

    #[test]
    fn replace_first_only_and_all() {
        let mut buf = ByteBuffer::from_slice(&[7, 1, 7, 7]);
        buf.replace(7, 9, 0, true);
        assert_eq!(buf.as_slice(), &[9, 1, 7, 7]);
        buf.replace(7, 9, 0, false);
        assert_eq!(buf.as_slice(), &[9, 1, 9, 9]);
    }

    #[test]
    fn replace_halts_at_zero_sentinel() {
        let mut buf = ByteBuffer::from_slice(&[7, 0, 7]);
        buf.replace(7, 9, 0, false);
        assert_eq!(buf.as_slice(), &[9, 0, 7]);
    }

    #[test]
    fn compact_slides_unread_span_to_front() {
        let mut buf = ByteBuffer::from_slice(&[1, 2, 3, 4, 5]);
        buf.get_u8();
        buf.get_u8();

        assert_eq!(buf.compact(), &[3, 4, 5]);
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.read_pos(), 0);
        assert_eq!(buf.write_pos(), 3);
    }

    #[test]
    fn compact_truncates_even_when_read_pos_is_zero() {
        let mut buf = ByteBuffer::from_slice(&[1, 2, 3, 4]);
        buf.set_write_pos(2);
        assert_eq!(buf.compact(), &[1, 2]);
        assert_eq!(buf.len(), 2);
    }

    #[test]
    fn compact_of_drained_buffer_is_empty() {
        let mut buf = ByteBuffer::from_slice(&[1, 2]);
        buf.get_u16();
        assert!(buf.compact().is_empty());
        assert_eq!(buf.len(), 0);
    }

    #[test]
    fn duplicate_matches_original_and_is_independent() {
        let mut original = ByteBuffer::from_slice(&[1, 2, 3]);
        original.get_u8();

        let mut dup = original.duplicate();
        assert_eq!(dup, original);
        assert_eq!(dup.read_pos(), 0);
        assert_eq!(dup.write_pos(), 0);

        dup.put_u8_at(9, 0);
        assert_ne!(dup, original);
        assert_eq!(original.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn equality_ignores_cursor_positions() {
        let mut a = ByteBuffer::from_slice(&[1, 2, 3]);
        let b = ByteBuffer::from_slice(&[1, 2, 3]);
        a.get_u8();
        assert_eq!(a, b);
    }

    #[test]
    fn equality_is_false_fast_on_length_mismatch() {
        let a = ByteBuffer::from_slice(&[1, 2]);
        let b = ByteBuffer::from_slice(&[1, 2, 0]);
        assert_ne!(a, b);
    }

    #[test]
    fn copy_remaining_spans_exactly_the_unread_bytes() {
        let mut buf = ByteBuffer::from_slice(&[1, 2, 3, 4]);
        buf.get_u8();
        buf.set_write_pos(3);

        let rest = buf.copy_remaining();
        assert_eq!(rest.as_slice(), &[2, 3]);
        assert_eq!(rest.read_pos(), 0);
        assert_eq!(rest.write_pos(), 2);
    }

    #[test]
    fn bytes_remaining_counts_to_end_of_storage() {
        let mut buf = ByteBuffer::from_slice(&[1, 2, 3]);
        assert_eq!(buf.bytes_remaining(), 3);
        buf.get_u8();
        assert_eq!(buf.bytes_remaining(), 2);
    }

    #[test]
    fn resize_resets_cursors() {
        let mut buf = ByteBuffer::from_slice(&[1, 2]);
        buf.get_u8();
        buf.resize(4);
        assert_eq!(buf.len(), 4);
        assert_eq!(buf.as_slice(), &[1, 2, 0, 0]);
        assert_eq!(buf.read_pos(), 0);
        assert_eq!(buf.write_pos(), 0);
    }

    #[test]
    fn to_hex_formats_every_byte() {
        let buf = ByteBuffer::from_slice(&[0x0F, 0xA0]);
        assert_eq!(buf.to_hex(), "0F A0 ");
    }

    #[test]
    fn bytes_interop() {
        let buf = ByteBuffer::from(Bytes::from_static(b"abc"));
        assert_eq!(buf.as_slice(), b"abc");
        assert_eq!(buf.write_pos(), 3);
        assert_eq!(buf.into_bytes(), Bytes::from_static(b"abc"));
    }
}
