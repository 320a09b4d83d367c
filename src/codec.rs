//! Binary codec primitives.
//!
//! Every wire object implements [`BinaryCodec`]. Encoding appends to a
//! `Vec<u8>` with `byteorder`; decoding walks a [`Reader`] that checks bounds
//! before every read, so running out of input is always reported as
//! [`MkError::Truncated`] with the failing offset.
//!
//! The length law holds for every implementor: `encoded_len()` equals the
//! number of bytes `encode_into` appends.

use std::io::Cursor;

use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{MkError, Result};

pub trait BinaryCodec: Sized {
    /// Exact size of the encoding.
    fn encoded_len(&self) -> usize;

    /// Appends the encoding to `buf`.
    fn encode_into(&self, buf: &mut Vec<u8>) -> Result<()>;

    /// Decodes one value starting at the reader's position.
    fn decode_from(reader: &mut Reader<'_>) -> Result<Self>;

    fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.encode_into(&mut buf)?;
        debug_assert_eq!(buf.len(), self.encoded_len());
        Ok(buf)
    }

    /// Decodes a value that must span the whole buffer.
    fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(data);
        let value = Self::decode_from(&mut reader)?;
        reader.finish()?;
        Ok(value)
    }
}

/// Bounds-checked cursor over an input buffer.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(data),
        }
    }

    /// Offset of the next unread byte.
    pub fn position(&self) -> usize {
        self.cursor.position() as usize
    }

    pub fn remaining(&self) -> usize {
        self.cursor.get_ref().len() - self.position()
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        let remaining = self.remaining();
        if remaining < needed {
            return Err(MkError::Truncated {
                offset: self.position(),
                needed,
                remaining,
            });
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        Ok(self.cursor.read_u8()?)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.ensure(4)?;
        Ok(self.cursor.read_u32::<BigEndian>()?)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.ensure(4)?;
        Ok(self.cursor.read_i32::<BigEndian>()?)
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.ensure(8)?;
        Ok(self.cursor.read_u64::<BigEndian>()?)
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        self.ensure(8)?;
        Ok(self.cursor.read_i64::<BigEndian>()?)
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        self.ensure(8)?;
        Ok(self.cursor.read_f64::<BigEndian>()?)
    }

    /// Little-endian f64; only the ciphertext scale uses this byte order.
    pub fn read_f64_le(&mut self) -> Result<f64> {
        self.ensure(8)?;
        Ok(self.cursor.read_f64::<LittleEndian>()?)
    }

    /// Borrows the next `len` bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        self.ensure(len)?;
        let data: &'a [u8] = *self.cursor.get_ref();
        let start = self.position();
        self.cursor.set_position((start + len) as u64);
        Ok(&data[start..start + len])
    }

    /// Borrows everything left in the buffer.
    pub fn read_rest(&mut self) -> &'a [u8] {
        let data: &'a [u8] = *self.cursor.get_ref();
        let start = self.position();
        self.cursor.set_position(data.len() as u64);
        &data[start..]
    }

    /// Fails with `TrailingData` unless the whole buffer was consumed.
    pub fn finish(self) -> Result<()> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(MkError::TrailingData(n)),
        }
    }
}

/// Writes `len` as a one-byte length prefix.
pub(crate) fn write_u8_len(buf: &mut Vec<u8>, len: usize, what: &str) -> Result<()> {
    let byte = u8::try_from(len)
        .map_err(|_| MkError::EncodingOverflow(format!("{what} {len} exceeds 255")))?;
    buf.write_u8(byte)?;
    Ok(())
}

/// Writes `len` as a four-byte big-endian length prefix.
pub(crate) fn write_u32_len(buf: &mut Vec<u8>, len: usize, what: &str) -> Result<()> {
    let word = u32::try_from(len)
        .map_err(|_| MkError::EncodingOverflow(format!("{what} {len} exceeds u32")))?;
    buf.write_u32::<BigEndian>(word)?;
    Ok(())
}
