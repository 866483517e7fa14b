//! A forward-only cursor over a borrowed payload buffer.
//!
//! Every decode operation either succeeds and advances the cursor by exactly
//! the number of bytes it consumed, or fails and leaves the cursor where it
//! was. This holds for arrays and strings too: an array is only decoded once
//! it is known that all of its elements are available, and a string without a
//! terminator does not move the cursor.
//!
//! Scalars are read in host byte order. Trace payloads are produced and
//! consumed on the same machine, so no byte swapping takes place.

use crate::error::{DecodeError, Result};
use etwvalue::{ArrayValue, Value};
use memchr::memchr;

/// Width in bytes of the host's wide character type.
#[cfg(windows)]
pub const WCHAR_SIZE: usize = 2;
#[cfg(not(windows))]
pub const WCHAR_SIZE: usize = 4;

const W16_SIZE: usize = 2;

/// Fixed-width scalar types that can be read out of a payload.
pub trait Scalar: Copy + Into<Value> {
    const SIZE: usize;

    /// `bytes` is exactly `SIZE` bytes long.
    fn from_ne_slice(bytes: &[u8]) -> Self;
}

macro_rules! impl_scalar {
    ($($ty:ty),*) => {
        $(
            impl Scalar for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();

                #[inline]
                fn from_ne_slice(bytes: &[u8]) -> $ty {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(bytes);
                    <$ty>::from_ne_bytes(raw)
                }
            }
        )*
    };
}

impl_scalar!(i8, u8, i16, u16, i32, u32, i64, u64, f32, f64);

impl Scalar for bool {
    const SIZE: usize = 1;

    #[inline]
    fn from_ne_slice(bytes: &[u8]) -> bool {
        bytes[0] != 0
    }
}

#[derive(Clone, Debug)]
pub struct Decoder<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(buffer: &'a [u8]) -> Decoder<'a> {
        Decoder {
            buffer,
            position: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining_bytes(&self) -> usize {
        self.buffer.len() - self.position
    }

    pub fn is_empty(&self) -> bool {
        self.remaining_bytes() == 0
    }

    fn rest(&self) -> &'a [u8] {
        &self.buffer[self.position..]
    }

    fn exhausted(&self, needed: usize) -> DecodeError {
        DecodeError::Exhausted {
            needed,
            remaining: self.remaining_bytes(),
        }
    }

    fn take(&mut self, num_bytes: usize) -> Result<&'a [u8]> {
        if num_bytes > self.remaining_bytes() {
            return Err(self.exhausted(num_bytes));
        }

        let start = self.position;
        self.position += num_bytes;
        Ok(&self.buffer[start..self.position])
    }

    /// Reads one scalar without wrapping it into a `Value`.
    pub fn decode_raw<T: Scalar>(&mut self) -> Result<T> {
        self.take(T::SIZE).map(T::from_ne_slice)
    }

    pub fn decode<T: Scalar>(&mut self) -> Result<Value> {
        self.decode_raw::<T>().map(Into::into)
    }

    pub fn decode_array<T: Scalar>(&mut self, count: usize) -> Result<ArrayValue> {
        let num_bytes = count
            .checked_mul(T::SIZE)
            .ok_or_else(|| self.exhausted(usize::MAX))?;
        let bytes = self.take(num_bytes)?;

        let mut array = ArrayValue::with_capacity(count);
        for chunk in bytes.chunks_exact(T::SIZE) {
            array.append(T::from_ne_slice(chunk));
        }
        Ok(array)
    }

    /// Decodes a NUL-terminated narrow string. Invalid UTF-8 sequences are
    /// replaced with U+FFFD.
    pub fn decode_string(&mut self) -> Result<Value> {
        let rest = self.rest();
        let end = memchr(0, rest).ok_or(DecodeError::MissingTerminator {
            offset: self.position,
        })?;

        let s = String::from_utf8_lossy(&rest[..end]).into_owned();
        self.position += end + 1;
        Ok(Value::String(s))
    }

    /// Decodes a NUL-terminated string of host wide characters
    /// (`WCHAR_SIZE` bytes per code unit).
    pub fn decode_wstring(&mut self) -> Result<Value> {
        let rest = self.rest();
        let units = rest.chunks_exact(WCHAR_SIZE).map(read_wchar);

        let mut code_units = Vec::new();
        for unit in units {
            if unit == 0 {
                self.position += (code_units.len() + 1) * WCHAR_SIZE;
                return Ok(Value::WString(wchars_to_string(&code_units)));
            }
            code_units.push(unit);
        }

        Err(DecodeError::MissingTerminator {
            offset: self.position,
        })
    }

    /// Decodes a string of 2-byte code units, independent of the host's wide
    /// character width.
    ///
    /// Decoding stops after a zero code unit, or when less than one code unit
    /// is left in the buffer. In the latter case the string is unterminated
    /// and any odd trailing byte stays in the buffer.
    pub fn decode_w16_string(&mut self) -> Result<Value> {
        let rest = self.rest();

        let mut code_units = Vec::new();
        let mut terminated = false;
        for chunk in rest.chunks_exact(W16_SIZE) {
            let unit = u16::from_ne_slice(chunk);
            if unit == 0 {
                terminated = true;
                break;
            }
            code_units.push(unit);
        }

        let consumed = code_units.len() + terminated as usize;
        self.position += consumed * W16_SIZE;
        Ok(Value::WString(String::from_utf16_lossy(&code_units)))
    }

    /// Decodes a string stored in a field of exactly `length` 2-byte code
    /// units. The string ends at the first zero code unit, but the whole field
    /// is consumed.
    pub fn decode_fixed_w16_string(&mut self, length: usize) -> Result<Value> {
        let num_bytes = length
            .checked_mul(W16_SIZE)
            .ok_or_else(|| self.exhausted(usize::MAX))?;
        let bytes = self.take(num_bytes)?;

        let code_units: Vec<u16> = bytes
            .chunks_exact(W16_SIZE)
            .map(u16::from_ne_slice)
            .take_while(|&unit| unit != 0)
            .collect();
        Ok(Value::WString(String::from_utf16_lossy(&code_units)))
    }

    pub fn skip(&mut self, num_bytes: usize) -> Result<()> {
        self.take(num_bytes).map(|_| ())
    }

    /// Peeks at the byte `offset` bytes past the cursor without consuming it.
    /// Out-of-bounds positions read as 0.
    pub fn lookup(&self, offset: usize) -> u8 {
        self.position
            .checked_add(offset)
            .and_then(|pos| self.buffer.get(pos))
            .copied()
            .unwrap_or(0)
    }
}

fn read_wchar(bytes: &[u8]) -> u32 {
    match bytes.len() {
        2 => u16::from_ne_slice(bytes).into(),
        _ => u32::from_ne_slice(bytes),
    }
}

fn wchars_to_string(code_units: &[u32]) -> String {
    if WCHAR_SIZE == 2 {
        let utf16: Vec<u16> = code_units.iter().map(|&unit| unit as u16).collect();
        String::from_utf16_lossy(&utf16)
    } else {
        code_units
            .iter()
            .map(|&unit| char::from_u32(unit).unwrap_or('\u{FFFD}'))
            .collect()
    }
}
