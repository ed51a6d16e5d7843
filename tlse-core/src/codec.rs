//! Length-prefixed field helpers shared by the handshake messages.
//!
//! TLS encodes variable-length vectors as a big-endian length of 1, 2 or 3
//! bytes followed by the data ("compact strings" below).

use bytes::BufMut;

use crate::error::{Error, Result};

/// Read a big-endian unsigned integer of `size` bytes (1..=4).
fn read_uint(buf: &[u8], offset: usize, size: usize) -> u32 {
    buf[offset..offset + size]
        .iter()
        .fold(0u32, |acc, b| (acc << 8) | u32::from(*b))
}

/// Read a compact string starting at `*offset`.
///
/// `available` bounds the bytes that may be consumed from `*offset` on. On
/// success the offset is advanced past the length and the data; on failure
/// it is left untouched.
pub fn read_compact_string<'a>(
    buf: &'a [u8],
    offset: &mut usize,
    size_bytes: usize,
    available: usize,
) -> Result<&'a [u8]> {
    if !(1..=3).contains(&size_bytes) {
        return Err(Error::InternalError(format!(
            "compact string length width {} not supported",
            size_bytes
        )));
    }
    let end = offset
        .checked_add(available)
        .filter(|end| *end <= buf.len())
        .ok_or_else(|| Error::DecodeError("compact string window exceeds buffer".into()))?;

    if available < size_bytes {
        return Err(Error::DecodeError("truncated compact string length".into()));
    }
    let len = read_uint(buf, *offset, size_bytes) as usize;
    let start = *offset + size_bytes;
    if start + len > end {
        return Err(Error::DecodeError(format!(
            "compact string of {} bytes exceeds {} available",
            len,
            end - start
        )));
    }

    *offset = start + len;
    Ok(&buf[start..start + len])
}

/// Encode `data` as a compact string with a `size_bytes` length prefix.
pub fn write_compact_string(data: &[u8], size_bytes: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(size_bytes + data.len());
    put_compact_string(&mut out, data, size_bytes)?;
    Ok(out)
}

/// Append a compact string to `out`.
pub fn put_compact_string<B: BufMut>(out: &mut B, data: &[u8], size_bytes: usize) -> Result<()> {
    if !(1..=3).contains(&size_bytes) {
        return Err(Error::InternalError(format!(
            "compact string length width {} not supported",
            size_bytes
        )));
    }
    let max = (1usize << (8 * size_bytes)) - 1;
    if data.len() > max {
        return Err(Error::InternalError(format!(
            "{} bytes do not fit a {}-byte length",
            data.len(),
            size_bytes
        )));
    }
    out.put_uint(data.len() as u64, size_bytes);
    out.put_slice(data);
    Ok(())
}

/// Cursor over a message body.
///
/// Every read is bounds checked and reports a decode error rather than
/// panicking. Messages decode into fresh values, so a failed read never
/// leaves a half-filled message behind.
#[derive(Debug)]
pub struct Reader<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    /// Start reading at the beginning of `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.offset
    }

    /// Whether everything has been consumed.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Take the next `len` bytes.
    pub fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(Error::DecodeError(format!(
                "truncated {}: need {} bytes, have {}",
                what,
                len,
                self.remaining()
            )));
        }
        let out = &self.buf[self.offset..self.offset + len];
        self.offset += len;
        Ok(out)
    }

    /// Read a u8.
    pub fn read_u8(&mut self, what: &str) -> Result<u8> {
        Ok(self.take(1, what)?[0])
    }

    /// Read a big-endian u16.
    pub fn read_u16(&mut self, what: &str) -> Result<u16> {
        let b = self.take(2, what)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    /// Read a big-endian u32.
    pub fn read_u32(&mut self, what: &str) -> Result<u32> {
        let b = self.take(4, what)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read a compact string with a `size_bytes` length prefix.
    pub fn read_compact(&mut self, size_bytes: usize) -> Result<&'a [u8]> {
        let mut offset = self.offset;
        let data = read_compact_string(self.buf, &mut offset, size_bytes, self.remaining())?;
        self.offset = offset;
        Ok(data)
    }

    /// Fail unless the body has been fully consumed.
    pub fn expect_end(&self, what: &str) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::DecodeError(format!(
                "{} trailing bytes after {}",
                self.remaining(),
                what
            )))
        }
    }
}
