//! Byte-exact binary codecs shared by [`Buffer`](crate::buffer::Buffer).
//!
//! All fixed-width values are little-endian. Unsigned integers may also be
//! written as LEB128-style varints: 7 value bits per byte, least significant
//! group first, high bit set on every byte except the last. A `u64` needs at
//! most [`MAX_VARINT_LEN`] bytes and the tenth byte can only carry the single
//! remaining bit, so any tenth byte `>= 2` is rejected.

use crate::error::BufferError;

/// Longest varint encoding of a `u64`.
pub const MAX_VARINT_LEN: usize = 10;

/// A value with a fixed little-endian wire size.
///
/// Implemented for the 8/16/32/64-bit integers, `bool` and IEEE floats.
/// `put_le` and `get_le` expect slices of at least `SIZE` bytes; the buffer
/// checks lengths before calling them.
pub trait FixedWidth: Copy {
    const SIZE: usize;

    fn put_le(self, out: &mut [u8]);

    fn get_le(src: &[u8]) -> Self;
}

macro_rules! impl_fixed_width {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FixedWidth for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();

                #[inline]
                fn put_le(self, out: &mut [u8]) {
                    out[..Self::SIZE].copy_from_slice(&self.to_le_bytes());
                }

                #[inline]
                fn get_le(src: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(&src[..Self::SIZE]);
                    <$ty>::from_le_bytes(raw)
                }
            }
        )*
    };
}

impl_fixed_width!(u8, i8, u16, i16, u32, i32, u64, i64);

impl FixedWidth for bool {
    const SIZE: usize = 1;

    #[inline]
    fn put_le(self, out: &mut [u8]) {
        out[0] = u8::from(self);
    }

    #[inline]
    fn get_le(src: &[u8]) -> Self {
        src[0] > 0
    }
}

// Floats travel as their raw IEEE-754 bit pattern. `to_bits`/`from_bits` is
// the only reinterpretation in the crate and it never leaves this module.
impl FixedWidth for f32 {
    const SIZE: usize = 4;

    #[inline]
    fn put_le(self, out: &mut [u8]) {
        self.to_bits().put_le(out);
    }

    #[inline]
    fn get_le(src: &[u8]) -> Self {
        f32::from_bits(u32::get_le(src))
    }
}

impl FixedWidth for f64 {
    const SIZE: usize = 8;

    #[inline]
    fn put_le(self, out: &mut [u8]) {
        self.to_bits().put_le(out);
    }

    #[inline]
    fn get_le(src: &[u8]) -> Self {
        f64::from_bits(u64::get_le(src))
    }
}

/// Number of bytes [`encode_varint`] produces for `v`, always in `1..=10`.
#[inline]
pub fn encoded_len(v: u64) -> usize {
    // 1 + (bit_len - 1) / 7, with 9/64 standing in for 1/7.
    let bits = 64 - v.leading_zeros();
    ((9 * bits + 64) / 64) as usize
}

/// Writes the minimal varint encoding of `v` into `out` and returns its length.
///
/// # Panics
///
/// Panics if `out` is shorter than `encoded_len(v)`.
pub fn encode_varint(mut v: u64, out: &mut [u8]) -> usize {
    let mut i = 0;
    while v >= 0x80 {
        out[i] = (v as u8 & 0x7f) | 0x80;
        v >>= 7;
        i += 1;
    }
    out[i] = v as u8;
    i + 1
}

/// Decodes a varint from the front of `src`, returning the value and the
/// number of bytes consumed.
///
/// Fails with [`BufferError::TruncatedVarint`] when no terminating byte
/// appears within the available (at most ten) bytes, and with
/// [`BufferError::MalformedVarint`] when the tenth byte is `>= 2`.
pub fn decode_varint(src: &[u8]) -> Result<(u64, usize), BufferError> {
    let mut v = 0u64;
    for (i, &byte) in src.iter().take(MAX_VARINT_LEN).enumerate() {
        if i == MAX_VARINT_LEN - 1 {
            if byte >= 2 {
                return Err(BufferError::MalformedVarint(byte));
            }
            v |= u64::from(byte) << 63;
            return Ok((v, MAX_VARINT_LEN));
        }
        v |= u64::from(byte & 0x7f) << (7 * i);
        if byte < 0x80 {
            return Ok((v, i + 1));
        }
    }
    Err(BufferError::TruncatedVarint(src.len().min(MAX_VARINT_LEN)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoded_len_matches_encoder() {
        let mut out = [0u8; MAX_VARINT_LEN];
        for shift in 0..64 {
            for v in [(1u64 << shift) - 1, 1u64 << shift, (1u64 << shift) + 1] {
                assert_eq!(encode_varint(v, &mut out), encoded_len(v), "value {}", v);
            }
        }
        assert_eq!(encode_varint(u64::MAX, &mut out), encoded_len(u64::MAX));
    }

    #[test]
    fn test_max_value_layout() {
        let mut out = [0u8; MAX_VARINT_LEN];
        let n = encode_varint(u64::MAX, &mut out);
        assert_eq!(n, 10);
        assert_eq!(&out[..9], &[0xff; 9]);
        assert_eq!(out[9], 0x01);
    }

    #[test]
    fn test_decode_rejects_bad_tenth_byte() {
        let mut data = [0xffu8; 10];
        data[9] = 0x02;
        assert_eq!(decode_varint(&data), Err(BufferError::MalformedVarint(0x02)));
    }

    #[test]
    fn test_decode_truncated() {
        assert_eq!(decode_varint(&[0x80, 0x80]), Err(BufferError::TruncatedVarint(2)));
        assert_eq!(decode_varint(&[]), Err(BufferError::TruncatedVarint(0)));
    }

    #[test]
    fn test_float_bits() {
        let mut out = [0u8; 8];
        1.5f64.put_le(&mut out);
        assert_eq!(out, 1.5f64.to_bits().to_le_bytes());
        assert_eq!(f64::get_le(&out), 1.5);
    }
}
