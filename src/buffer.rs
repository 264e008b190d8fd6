//! Growable byte buffer with independent read and write cursors.
//!
//! [`Buffer`] is the workhorse of the logger: every record is rendered into
//! one, and the same type carries the binary codec used by anything that
//! wants a compact wire form. Text helpers (`append_*`, `write_str`) and
//! binary helpers (`write_u32`, `write_varint`, ...) can be freely mixed.
//!
//! # Offsets
//!
//! Offsets accepted by [`Buffer::write_at`], [`Buffer::shift_forward`] and
//! [`Buffer::shift_backward`] are absolute positions in the underlying
//! storage, the same coordinate system as [`Buffer::read_pos`] and
//! [`Buffer::write_pos`]. A plain append may compact the storage when the
//! read cursor is non-zero, which moves every unread byte down by
//! `read_pos`; re-derive offsets after consuming data.
//!
//! # Views
//!
//! [`Buffer::as_bytes`] and [`Buffer::as_str`] return slices that alias the
//! internal storage; nothing is copied. A view lives only until the next
//! mutating call, which the borrow checker enforces:
//!
//! ```compile_fail
//! use cascade_logger::Buffer;
//!
//! let mut buf = Buffer::new();
//! buf.write_str("hello");
//! let view = buf.as_bytes();
//! buf.write_str(" world"); // mutation while the view is alive
//! assert_eq!(view, b"hello");
//! ```

use std::borrow::Cow;
use std::fmt;
use std::io::{self, Read, Write};

use crate::codec::{self, FixedWidth};
use crate::error::BufferError;

/// Minimum allocation made by an empty buffer.
pub const SMALL_BUFFER_SIZE: usize = 64;

/// Bytes reserved ahead of each `read` call in [`Buffer::read_from`].
pub const MIN_READ: usize = 512;

const TOO_LARGE: &str = "cascade_logger::Buffer: too large";

/// A variable-sized byte buffer.
///
/// The written extent is `data.len()`; the unread region is
/// `data[read_pos..]`. Capacity never shrinks, so a buffer recycled through
/// the [`BufferPool`](crate::pool::BufferPool) keeps its allocation.
///
/// # Examples
///
/// ```
/// use cascade_logger::Buffer;
///
/// let mut buf = Buffer::new();
/// buf.write_i32(-12345);
/// buf.append_int(12345);
/// assert_eq!(buf.as_bytes(), &[0xc7, 0xcf, 0xff, 0xff, b'1', b'2', b'3', b'4', b'5']);
///
/// assert_eq!(buf.read_i32().unwrap(), -12345);
/// assert_eq!(buf.as_str().unwrap(), "12345");
/// ```
#[derive(Debug, Default, Clone)]
pub struct Buffer {
    data: Vec<u8>,
    read_pos: usize,
}

impl Buffer {
    /// Creates an empty buffer without allocating.
    pub const fn new() -> Self {
        Self {
            data: Vec::new(),
            read_pos: 0,
        }
    }

    /// An empty buffer with room for `capacity` bytes before the first growth.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            read_pos: 0,
        }
    }

    /// Takes ownership of `data` as the buffer's initial, unread contents.
    pub fn from_vec(data: Vec<u8>) -> Self {
        Self { data, read_pos: 0 }
    }

    /// Number of unread bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len() - self.read_pos
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.len() <= self.read_pos
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    #[inline]
    pub fn read_pos(&self) -> usize {
        self.read_pos
    }

    /// Absolute write position, i.e. the written extent of the storage.
    #[inline]
    pub fn write_pos(&self) -> usize {
        self.data.len()
    }

    /// The unread bytes, aliasing internal storage.
    ///
    /// Valid until the next call that takes `&mut self`. Named `as_bytes` so
    /// it is never confused with `io::Read::bytes`, which consumes the reader.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[self.read_pos..]
    }

    /// The unread bytes as `&str`, aliasing internal storage.
    pub fn as_str(&self) -> Result<&str, BufferError> {
        Ok(std::str::from_utf8(self.as_bytes())?)
    }

    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.as_bytes())
    }

    /// Consumes the buffer, returning the unread bytes.
    pub fn into_vec(mut self) -> Vec<u8> {
        if self.read_pos > 0 {
            self.data.drain(..self.read_pos);
        }
        self.data
    }

    /// Empties the buffer, keeping its allocation.
    #[inline]
    pub fn reset(&mut self) {
        self.data.clear();
        self.read_pos = 0;
    }

    /// Keeps only the first `n` unread bytes.
    ///
    /// # Panics
    ///
    /// Panics if `n` exceeds [`Buffer::len`].
    pub fn truncate(&mut self, n: usize) {
        if n == 0 {
            self.reset();
            return;
        }
        assert!(n <= self.len(), "cascade_logger::Buffer: truncation out of range");
        self.data.truncate(self.read_pos + n);
    }

    /// Drops a single trailing `\n`, if present.
    pub fn trim_newline(&mut self) {
        if self.len() > 0 && self.data.last() == Some(&b'\n') {
            self.data.pop();
        }
    }

    /// Guarantees room for `n` more bytes without further allocation.
    pub fn grow(&mut self, n: usize) {
        self.reserve_for(n);
    }

    /// Makes room for `n` more bytes.
    ///
    /// Order of preference: spare capacity, a first small allocation,
    /// sliding the unread bytes to the front, and finally a fresh
    /// allocation of `2 * capacity + n`.
    fn reserve_for(&mut self, n: usize) {
        if self.is_empty() && self.read_pos != 0 {
            self.reset();
        }
        let len = self.data.len();
        let cap = self.data.capacity();
        if n <= cap - len {
            return;
        }
        if cap == 0 && n <= SMALL_BUFFER_SIZE {
            self.data.reserve_exact(SMALL_BUFFER_SIZE);
            return;
        }
        let unread = self.len();
        if unread + n <= cap / 2 {
            // Slide instead of allocating. Only `unread + n <= cap` is needed,
            // but leaving headroom keeps us from copying on every append.
            self.data.copy_within(self.read_pos.., 0);
            self.data.truncate(unread);
            self.read_pos = 0;
            return;
        }
        let mut grown = Vec::with_capacity(doubled_capacity(cap, n));
        grown.extend_from_slice(&self.data[self.read_pos..]);
        self.data = grown;
        self.read_pos = 0;
    }

    /// Like `reserve_for` but keeps every byte at its current offset.
    fn reserve_in_place(&mut self, n: usize) {
        let len = self.data.len();
        let cap = self.data.capacity();
        if n <= cap - len {
            return;
        }
        let new_cap = if cap == 0 && n <= SMALL_BUFFER_SIZE {
            SMALL_BUFFER_SIZE
        } else {
            doubled_capacity(cap, n)
        };
        self.data.reserve_exact(new_cap - len);
    }

    /// Appends `n` zeroed bytes and returns them for the caller to fill.
    pub fn alloc(&mut self, n: usize) -> &mut [u8] {
        self.reserve_for(n);
        let start = self.data.len();
        self.data.resize(start + n, 0);
        &mut self.data[start..]
    }

    /// Reserves room for one `T` and returns its absolute offset, to be
    /// filled in later with [`Buffer::write_at`].
    pub fn reserve_fixed<T: FixedWidth>(&mut self) -> usize {
        self.reserve_for(T::SIZE);
        let start = self.data.len();
        self.data.resize(start + T::SIZE, 0);
        start
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.reserve_for(bytes.len());
        self.data.extend_from_slice(bytes);
    }

    #[inline]
    pub fn write_str(&mut self, s: &str) {
        self.write_bytes(s.as_bytes());
    }

    #[inline]
    pub fn write_byte(&mut self, b: u8) {
        self.reserve_for(1);
        self.data.push(b);
    }

    pub fn write_char(&mut self, c: char) {
        let mut utf8 = [0u8; 4];
        self.write_str(c.encode_utf8(&mut utf8));
    }

    /// Appends a fixed-width little-endian value.
    #[inline]
    pub fn put<T: FixedWidth>(&mut self, value: T) {
        value.put_le(self.alloc(T::SIZE));
    }

    /// Reads a fixed-width little-endian value from the read cursor.
    ///
    /// Fails without consuming anything when fewer than `T::SIZE` bytes
    /// remain.
    pub fn get<T: FixedWidth>(&mut self) -> Result<T, BufferError> {
        let remaining = self.len();
        if remaining < T::SIZE {
            if remaining == 0 {
                self.reset();
            }
            return Err(BufferError::UnexpectedEof {
                needed: T::SIZE,
                remaining,
            });
        }
        let value = T::get_le(&self.data[self.read_pos..]);
        self.read_pos += T::SIZE;
        Ok(value)
    }

    /// Appends `v` as a varint.
    pub fn write_varint(&mut self, v: u64) {
        let out = self.alloc(codec::encoded_len(v));
        codec::encode_varint(v, out);
    }

    /// Reads a varint; on error the read cursor does not move.
    pub fn read_varint(&mut self) -> Result<u64, BufferError> {
        if self.is_empty() {
            self.reset();
            return Err(BufferError::UnexpectedEof {
                needed: 1,
                remaining: 0,
            });
        }
        let (v, n) = codec::decode_varint(&self.data[self.read_pos..])?;
        self.read_pos += n;
        Ok(v)
    }

    /// Overwrites a previously written fixed-width field at `offset`.
    ///
    /// The field must lie within `[read_pos, write_pos]`; otherwise
    /// [`BufferError::OutOfRange`] is returned and nothing is written.
    ///
    /// ```
    /// use cascade_logger::Buffer;
    ///
    /// let mut buf = Buffer::new();
    /// buf.write_i32(-12345);
    /// let slot = buf.reserve_fixed::<i32>();
    /// buf.write_str("Hello!");
    /// buf.write_at(slot, 256i32).unwrap();
    /// assert_eq!(&buf.as_bytes()[4..8], &[0x00, 0x01, 0x00, 0x00]);
    /// ```
    pub fn write_at<T: FixedWidth>(&mut self, offset: usize, value: T) -> Result<(), BufferError> {
        let len = self.data.len();
        let fits = offset
            .checked_add(T::SIZE)
            .map_or(false, |end| end <= len);
        if offset < self.read_pos || !fits {
            return Err(BufferError::OutOfRange {
                offset,
                size: T::SIZE,
                read_pos: self.read_pos,
                len,
            });
        }
        value.put_le(&mut self.data[offset..]);
        Ok(())
    }

    /// Opens a gap of `dst - src` bytes at `src` by moving `[src, write_pos)`
    /// to start at `dst`. The bytes in `[src, dst)` are left as they were,
    /// ready to be patched with [`Buffer::write_at`].
    ///
    /// Requires `read_pos <= src < dst` and `src <= write_pos`. Offsets are
    /// preserved: this call never compacts the storage.
    pub fn shift_forward(&mut self, dst: usize, src: usize) -> Result<(), BufferError> {
        let len = self.data.len();
        if src >= dst || src < self.read_pos || src > len {
            return Err(self.invalid_shift(dst, src));
        }
        let step = dst - src;
        self.reserve_in_place(step);
        self.data.resize(len + step, 0);
        self.data.copy_within(src..len, dst);
        Ok(())
    }

    /// Closes a gap by copying `[src, write_pos)` down to `dst`.
    ///
    /// The written extent is unchanged; follow up with [`Buffer::truncate`]
    /// to drop the stale tail. Requires `read_pos <= dst < src <= write_pos`.
    pub fn shift_backward(&mut self, dst: usize, src: usize) -> Result<(), BufferError> {
        let len = self.data.len();
        if dst >= src || dst < self.read_pos || src > len {
            return Err(self.invalid_shift(dst, src));
        }
        self.data.copy_within(src..len, dst);
        Ok(())
    }

    fn invalid_shift(&self, dst: usize, src: usize) -> BufferError {
        BufferError::InvalidShift {
            dst,
            src,
            read_pos: self.read_pos,
            len: self.data.len(),
        }
    }

    /// Returns up to `n` unread bytes and advances past them.
    pub fn next(&mut self, n: usize) -> &[u8] {
        let start = self.read_pos;
        let n = n.min(self.len());
        self.read_pos += n;
        &self.data[start..start + n]
    }

    /// Consumes through the first `delim`, returning the consumed slice
    /// including the delimiter. Without a delimiter everything unread is
    /// returned.
    pub fn read_until(&mut self, delim: u8) -> &[u8] {
        let start = self.read_pos;
        let end = self.data[start..]
            .iter()
            .position(|&b| b == delim)
            .map_or(self.data.len(), |i| start + i + 1);
        self.read_pos = end;
        &self.data[start..end]
    }

    pub fn append_int(&mut self, v: i64) {
        let _ = fmt::Write::write_fmt(self, format_args!("{}", v));
    }

    pub fn append_uint(&mut self, v: u64) {
        let _ = fmt::Write::write_fmt(self, format_args!("{}", v));
    }

    pub fn append_bool(&mut self, v: bool) {
        self.write_str(if v { "true" } else { "false" });
    }

    /// Shortest decimal form that round-trips as `f32`, never exponent form.
    pub fn append_f32(&mut self, v: f32) {
        let _ = fmt::Write::write_fmt(self, format_args!("{}", v));
    }

    /// Shortest decimal form that round-trips as `f64`, never exponent form.
    pub fn append_f64(&mut self, v: f64) {
        let _ = fmt::Write::write_fmt(self, format_args!("{}", v));
    }

    /// Reads from `reader` until EOF, appending everything read.
    pub fn read_from<R: Read>(&mut self, reader: &mut R) -> io::Result<usize> {
        let mut total = 0;
        loop {
            self.reserve_for(MIN_READ);
            let start = self.data.len();
            let end = self.data.capacity();
            self.data.resize(end, 0);
            match reader.read(&mut self.data[start..end]) {
                Ok(0) => {
                    self.data.truncate(start);
                    return Ok(total);
                }
                Ok(m) => {
                    self.data.truncate(start + m);
                    total += m;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                    self.data.truncate(start);
                }
                Err(e) => {
                    self.data.truncate(start);
                    return Err(e);
                }
            }
        }
    }

    /// Drains every unread byte into `writer`, then resets.
    pub fn write_to<W: Write>(&mut self, writer: &mut W) -> io::Result<usize> {
        let n = self.len();
        if n > 0 {
            writer.write_all(self.as_bytes())?;
        }
        self.reset();
        Ok(n)
    }
}

fn doubled_capacity(cap: usize, n: usize) -> usize {
    match cap.checked_mul(2).and_then(|c| c.checked_add(n)) {
        Some(c) if c <= isize::MAX as usize => c,
        _ => panic!("{}", TOO_LARGE),
    }
}

macro_rules! fixed_accessors {
    ($($write:ident, $read:ident => $ty:ty;)*) => {
        impl Buffer {
            $(
                #[inline]
                pub fn $write(&mut self, v: $ty) {
                    self.put(v);
                }

                #[inline]
                pub fn $read(&mut self) -> Result<$ty, BufferError> {
                    self.get()
                }
            )*
        }
    };
}

fixed_accessors! {
    write_u8, read_u8 => u8;
    write_i8, read_i8 => i8;
    write_bool, read_bool => bool;
    write_u16, read_u16 => u16;
    write_i16, read_i16 => i16;
    write_u32, read_u32 => u32;
    write_i32, read_i32 => i32;
    write_u64, read_u64 => u64;
    write_i64, read_i64 => i64;
    write_f32, read_f32 => f32;
    write_f64, read_f64 => f64;
}

impl From<Vec<u8>> for Buffer {
    fn from(data: Vec<u8>) -> Self {
        Self::from_vec(data)
    }
}

impl From<&str> for Buffer {
    fn from(s: &str) -> Self {
        Self::from_vec(s.as_bytes().to_vec())
    }
}

impl fmt::Display for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

impl fmt::Write for Buffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        Buffer::write_str(self, s);
        Ok(())
    }

    fn write_char(&mut self, c: char) -> fmt::Result {
        Buffer::write_char(self, c);
        Ok(())
    }
}

impl Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_bytes(buf);
        Ok(buf.len())
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.write_bytes(buf);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Read for Buffer {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if self.is_empty() {
            self.reset();
            return Ok(0);
        }
        let chunk = self.next(out.len());
        let n = chunk.len();
        out[..n].copy_from_slice(chunk);
        Ok(n)
    }
}
