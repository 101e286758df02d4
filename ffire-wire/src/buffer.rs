//! Bounds-checked read/write cursors, plus a cache-aligned output buffer
//! and pool for reuse across repeated encode calls.
//!
//! Unlike a compile-time-fixed-offset format, every field in this format
//! can shift the position of everything after it (strings and arrays are
//! variable-length), so reads and writes go through a position-tracking
//! cursor rather than direct indexing. Every access checks
//! `pos + needed <= len` and returns a [`WireError`] instead of panicking.

use crate::error::WireError;
use crossbeam_queue::ArrayQueue;
use std::sync::Arc;

/// A bounds-checked read cursor over a byte slice.
///
/// Every `read_*` method either advances `pos` by the bytes consumed and
/// returns the value, or leaves `pos` unchanged and returns a
/// [`WireError`]. No method ever panics or reads out of bounds.
#[derive(Debug)]
pub struct ReadCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ReadCursor<'a> {
    /// Creates a cursor positioned at the start of `buf`.
    #[must_use]
    pub const fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current read position.
    #[must_use]
    pub const fn pos(&self) -> usize {
        self.pos
    }

    /// Bytes remaining after the current position.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn check(&self, needed: usize) -> Result<(), WireError> {
        if self.pos.checked_add(needed).is_none_or(|end| end > self.buf.len()) {
            return Err(WireError::Truncated {
                needed,
                remaining: self.remaining(),
            });
        }
        Ok(())
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], WireError> {
        self.check(n)?;
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Reads a `bool` (one byte, must be 0x00 or 0x01).
    pub fn read_bool(&mut self) -> Result<bool, WireError> {
        let byte = self.take(1)?[0];
        match byte {
            0x00 => Ok(false),
            0x01 => Ok(true),
            other => Err(WireError::InvalidBool { byte: other }),
        }
    }

    /// Reads an `i8`.
    pub fn read_i8(&mut self) -> Result<i8, WireError> {
        Ok(self.take(1)?[0] as i8)
    }

    /// Reads an `i16`, little-endian.
    pub fn read_i16(&mut self) -> Result<i16, WireError> {
        let bytes = self.take(2)?;
        Ok(i16::from_le_bytes([bytes[0], bytes[1]]))
    }

    /// Reads an `i32`, little-endian.
    pub fn read_i32(&mut self) -> Result<i32, WireError> {
        let bytes = self.take(4)?;
        Ok(i32::from_le_bytes(bytes.try_into().expect("checked length")))
    }

    /// Reads an `i64`, little-endian.
    pub fn read_i64(&mut self) -> Result<i64, WireError> {
        let bytes = self.take(8)?;
        Ok(i64::from_le_bytes(bytes.try_into().expect("checked length")))
    }

    /// Reads an `f32`, little-endian IEEE-754 bit pattern.
    pub fn read_f32(&mut self) -> Result<f32, WireError> {
        Ok(f32::from_bits(self.read_u32_raw()?))
    }

    /// Reads an `f64`, little-endian IEEE-754 bit pattern.
    pub fn read_f64(&mut self) -> Result<f64, WireError> {
        Ok(f64::from_bits(self.read_u64_raw()?))
    }

    /// Reads the uint16 LE length prefix shared by strings and arrays.
    pub fn read_len_prefix(&mut self) -> Result<u16, WireError> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn read_u32_raw(&mut self) -> Result<u32, WireError> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes(bytes.try_into().expect("checked length")))
    }

    fn read_u64_raw(&mut self) -> Result<u64, WireError> {
        let bytes = self.take(8)?;
        Ok(u64::from_le_bytes(bytes.try_into().expect("checked length")))
    }

    /// Reads a length-prefixed, strictly UTF-8-validated string.
    pub fn read_string(&mut self) -> Result<String, WireError> {
        let len = self.read_len_prefix()? as usize;
        let bytes = self.take(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| WireError::InvalidUtf8)
    }

    /// Reads `n` raw bytes.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], WireError> {
        self.take(n)
    }

    /// Returns an error if any bytes remain unconsumed.
    ///
    /// Used by the strict decode entry points; the lenient entry points
    /// never call this.
    pub fn expect_exhausted(&self) -> Result<(), WireError> {
        if self.remaining() > 0 {
            return Err(WireError::TrailingBytes {
                remaining: self.remaining(),
            });
        }
        Ok(())
    }
}

/// A write cursor over a growable byte buffer.
///
/// Writes always succeed against the underlying `Vec<u8>` (it grows as
/// needed); the only failure mode is [`WireError::TooLarge`] when a
/// string or array length would overflow its uint16 cap, checked by the
/// caller before calling `write_len_prefix`.
#[derive(Debug, Default)]
pub struct WriteCursor {
    buf: Vec<u8>,
}

impl WriteCursor {
    /// Creates an empty write cursor.
    #[must_use]
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Creates a write cursor with a pre-reserved capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Current written length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if nothing has been written yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Consumes the cursor, returning the written bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Writes a `bool` as a single 0x00/0x01 byte.
    pub fn write_bool(&mut self, value: bool) {
        self.buf.push(u8::from(value));
    }

    /// Writes an `i8`.
    pub fn write_i8(&mut self, value: i8) {
        self.buf.push(value as u8);
    }

    /// Writes an `i16`, little-endian.
    pub fn write_i16(&mut self, value: i16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes an `i32`, little-endian.
    pub fn write_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes an `i64`, little-endian.
    pub fn write_i64(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes an `f32`, little-endian IEEE-754 bit pattern.
    pub fn write_f32(&mut self, value: f32) {
        self.buf.extend_from_slice(&value.to_bits().to_le_bytes());
    }

    /// Writes an `f64`, little-endian IEEE-754 bit pattern.
    pub fn write_f64(&mut self, value: f64) {
        self.buf.extend_from_slice(&value.to_bits().to_le_bytes());
    }

    /// Writes a uint16 LE length prefix, checking the 65535 cap.
    ///
    /// # Errors
    /// Returns [`WireError::TooLarge`] if `len` exceeds `u16::MAX`.
    pub fn write_len_prefix(&mut self, len: usize) -> Result<(), WireError> {
        let len_u16 = u16::try_from(len).map_err(|_| WireError::TooLarge { len })?;
        self.buf.extend_from_slice(&len_u16.to_le_bytes());
        Ok(())
    }

    /// Writes a length-prefixed UTF-8 string.
    ///
    /// # Errors
    /// Returns [`WireError::TooLarge`] if the encoded byte length exceeds
    /// `u16::MAX`.
    pub fn write_string(&mut self, value: &str) -> Result<(), WireError> {
        self.write_len_prefix(value.len())?;
        self.buf.extend_from_slice(value.as_bytes());
        Ok(())
    }

    /// Appends raw bytes without any length prefix.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }
}

/// Cache-line aligned fixed-capacity buffer, for callers that want a
/// pre-sized allocation target instead of a growable `Vec<u8>`.
///
/// Sized at the call site via the codegen engine's reservation estimate;
/// see `ffire_codegen::analyzer`.
#[repr(C, align(64))]
#[derive(Clone)]
pub struct AlignedBuffer<const N: usize> {
    data: [u8; N],
}

impl<const N: usize> AlignedBuffer<N> {
    /// Creates a new zeroed aligned buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self { data: [0u8; N] }
    }

    /// Returns the capacity of the buffer in bytes.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Borrows the buffer as a byte slice.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Borrows the buffer as a mutable byte slice.
    #[must_use]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl<const N: usize> Default for AlignedBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> std::fmt::Debug for AlignedBuffer<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlignedBuffer").field("capacity", &N).finish()
    }
}

/// Default buffer size for the pool (64KB).
pub const DEFAULT_BUFFER_SIZE: usize = 65536;

/// Pool of reusable aligned buffers, avoiding allocation churn for
/// callers that encode repeatedly (e.g. a server emitting many messages
/// of the same schema).
pub struct BufferPool {
    buffers: Arc<ArrayQueue<Box<AlignedBuffer<DEFAULT_BUFFER_SIZE>>>>,
    capacity: usize,
}

impl BufferPool {
    /// Creates a new buffer pool pre-filled to `capacity`.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let buffers = ArrayQueue::new(capacity);
        for _ in 0..capacity {
            let _ = buffers.push(Box::new(AlignedBuffer::new()));
        }
        Self {
            buffers: Arc::new(buffers),
            capacity,
        }
    }

    /// Acquires a buffer from the pool, or `None` if it's empty.
    #[must_use]
    pub fn acquire(&self) -> Option<Box<AlignedBuffer<DEFAULT_BUFFER_SIZE>>> {
        self.buffers.pop()
    }

    /// Releases a buffer back to the pool, zeroing it first.
    pub fn release(&self, mut buffer: Box<AlignedBuffer<DEFAULT_BUFFER_SIZE>>) {
        buffer.as_mut_slice().fill(0);
        let _ = self.buffers.push(buffer);
    }

    /// Total capacity of the pool.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of buffers currently available.
    #[must_use]
    pub fn available(&self) -> usize {
        self.buffers.len()
    }
}

impl Clone for BufferPool {
    fn clone(&self) -> Self {
        Self {
            buffers: Arc::clone(&self.buffers),
            capacity: self.capacity,
        }
    }
}

impl std::fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferPool")
            .field("capacity", &self.capacity)
            .field("available", &self.buffers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_cursor_primitives() {
        let mut w = WriteCursor::new();
        w.write_bool(true);
        w.write_i8(-5);
        w.write_i16(-1000);
        w.write_i32(123456);
        w.write_i64(-987654321);
        w.write_f32(1.5);
        w.write_f64(2.25);
        let bytes = w.into_bytes();

        let mut r = ReadCursor::new(&bytes);
        assert_eq!(r.read_bool().unwrap(), true);
        assert_eq!(r.read_i8().unwrap(), -5);
        assert_eq!(r.read_i16().unwrap(), -1000);
        assert_eq!(r.read_i32().unwrap(), 123456);
        assert_eq!(r.read_i64().unwrap(), -987654321);
        assert_eq!(r.read_f32().unwrap(), 1.5);
        assert_eq!(r.read_f64().unwrap(), 2.25);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn test_read_cursor_truncated() {
        let bytes = [0x01, 0x02];
        let mut r = ReadCursor::new(&bytes);
        assert!(matches!(r.read_i32(), Err(WireError::Truncated { .. })));
    }

    #[test]
    fn test_read_cursor_invalid_bool() {
        let bytes = [0x02];
        let mut r = ReadCursor::new(&bytes);
        assert!(matches!(r.read_bool(), Err(WireError::InvalidBool { byte: 2 })));
    }

    #[test]
    fn test_read_cursor_invalid_utf8() {
        let mut w = WriteCursor::new();
        w.write_len_prefix(2).unwrap();
        w.write_bytes(&[0xFF, 0xFE]);
        let bytes = w.into_bytes();
        let mut r = ReadCursor::new(&bytes);
        assert!(matches!(r.read_string(), Err(WireError::InvalidUtf8)));
    }

    #[test]
    fn test_round_trip_string() {
        let mut w = WriteCursor::new();
        w.write_string("Speaker").unwrap();
        let bytes = w.into_bytes();
        assert_eq!(bytes.len(), 2 + 7);
        let mut r = ReadCursor::new(&bytes);
        assert_eq!(r.read_string().unwrap(), "Speaker");
    }

    #[test]
    fn test_expect_exhausted() {
        let bytes = [0x01, 0x02];
        let mut r = ReadCursor::new(&bytes);
        assert!(r.expect_exhausted().is_err());
        r.read_bool().unwrap();
        r.read_bool().unwrap();
        assert!(r.expect_exhausted().is_ok());
    }

    #[test]
    fn test_write_len_prefix_too_large() {
        let mut w = WriteCursor::new();
        assert!(matches!(
            w.write_len_prefix(usize::from(u16::MAX) + 1),
            Err(WireError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_aligned_buffer_alignment() {
        let buf: AlignedBuffer<64> = AlignedBuffer::new();
        let ptr = buf.as_slice().as_ptr() as usize;
        assert_eq!(ptr % 64, 0);
    }

    #[test]
    fn test_buffer_pool_acquire_release() {
        let pool = BufferPool::new(2);
        assert_eq!(pool.available(), 2);
        let buf = pool.acquire().unwrap();
        assert_eq!(pool.available(), 1);
        pool.release(buf);
        assert_eq!(pool.available(), 2);
    }

    #[test]
    fn test_buffer_pool_empty() {
        let pool = BufferPool::new(1);
        let _buf = pool.acquire().unwrap();
        assert!(pool.acquire().is_none());
    }
}
