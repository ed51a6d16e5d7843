//! TLS record framing.
//!
//! ```text
//! struct {
//!     ContentType type;
//!     ProtocolVersion version;
//!     uint16 length;
//!     opaque fragment[TLSPlaintext.length];
//! } TLSPlaintext;
//! ```
//!
//! [`RecordReader`] reassembles records from a byte stream delivered in
//! arbitrary chunks. Protection (MAC, padding, encryption) lives in
//! [`crate::record_protection`].

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{Error, Result};

/// TLS record header size (5 bytes).
pub const RECORD_HEADER_SIZE: usize = 5;

/// Maximum plaintext fragment size.
pub const MAX_FRAGMENT_SIZE: usize = 16384;

/// Maximum record body accepted from the wire (2^14 + 2048).
pub const MAX_CIPHERTEXT_SIZE: usize = MAX_FRAGMENT_SIZE + 2048;

/// One record as seen on the wire.
///
/// The content type is kept raw; dispatch decides what an unknown type means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Content type byte
    pub content_type: u8,

    /// Record version
    pub version: u16,

    /// Record body
    pub fragment: Vec<u8>,
}

impl Record {
    /// Create a new record.
    pub fn new(content_type: u8, version: u16, fragment: Vec<u8>) -> Self {
        Self {
            content_type,
            version,
            fragment,
        }
    }

    /// Append the encoded record to `out`.
    pub fn encode_into<B: BufMut>(&self, out: &mut B) -> Result<()> {
        if self.fragment.len() > u16::MAX as usize {
            return Err(Error::InternalError(format!(
                "record body of {} bytes",
                self.fragment.len()
            )));
        }
        out.put_u8(self.content_type);
        out.put_u16(self.version);
        out.put_u16(self.fragment.len() as u16);
        out.put_slice(&self.fragment);
        Ok(())
    }

    /// Encode the record to bytes.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(RECORD_HEADER_SIZE + self.fragment.len());
        self.encode_into(&mut buf)?;
        Ok(buf)
    }
}

/// Split `payload` into chunks of at most `max_fragment` bytes.
///
/// An empty payload still produces one (empty) fragment.
pub fn fragment(payload: &[u8], max_fragment: usize) -> impl Iterator<Item = &[u8]> {
    let max = max_fragment.max(1);
    let empty: Option<&[u8]> = if payload.is_empty() { Some(payload) } else { None };
    payload.chunks(max).chain(empty)
}

/// Receive-side reassembly buffer.
#[derive(Debug, Default)]
pub struct RecordReader {
    buffer: BytesMut,
}

impl RecordReader {
    /// Create an empty reader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes from the transport.
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Bytes held that do not yet form a complete record.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Drop anything buffered.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Take the next complete record, if there is one.
    ///
    /// A declared length above [`MAX_CIPHERTEXT_SIZE`] is a record overflow;
    /// nothing is consumed in that case.
    pub fn next_record(&mut self) -> Result<Option<Record>> {
        if self.buffer.len() < RECORD_HEADER_SIZE {
            return Ok(None);
        }

        let length = usize::from(u16::from_be_bytes([self.buffer[3], self.buffer[4]]));
        if length > MAX_CIPHERTEXT_SIZE {
            return Err(Error::RecordOverflow(length));
        }
        if self.buffer.len() < RECORD_HEADER_SIZE + length {
            return Ok(None);
        }

        let content_type = self.buffer.get_u8();
        let version = self.buffer.get_u16();
        self.buffer.advance(2);
        let fragment = self.buffer.split_to(length).to_vec();

        Ok(Some(Record {
            content_type,
            version,
            fragment,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream() -> (Vec<u8>, Vec<Record>) {
        let records = vec![
            Record::new(0x16, 0x0301, vec![1, 2, 3, 4, 5, 6, 7]),
            Record::new(0x15, 0x0303, vec![2, 40]),
            Record::new(0x17, 0x0303, Vec::new()),
            Record::new(0x14, 0x0303, vec![1]),
            Record::new(0x16, 0x0303, (0..=255).collect()),
        ];
        let mut bytes = Vec::new();
        for r in &records {
            r.encode_into(&mut bytes).unwrap();
        }
        (bytes, records)
    }

    fn drain(reader: &mut RecordReader, out: &mut Vec<Record>) {
        while let Some(record) = reader.next_record().unwrap() {
            out.push(record);
        }
    }

    #[test]
    fn test_record_header_layout() {
        let encoded = Record::new(0x16, 0x0303, vec![0xAA, 0xBB]).encode().unwrap();
        assert_eq!(encoded, vec![0x16, 0x03, 0x03, 0x00, 0x02, 0xAA, 0xBB]);
    }

    #[test]
    fn test_reassembly_is_chunk_boundary_independent() {
        let (bytes, expected) = stream();

        for chunk in 1..=bytes.len() {
            let mut reader = RecordReader::new();
            let mut got = Vec::new();
            for piece in bytes.chunks(chunk) {
                reader.push(piece);
                drain(&mut reader, &mut got);
            }
            assert_eq!(got, expected, "chunk size {}", chunk);
            assert_eq!(reader.buffered(), 0);
        }
    }

    #[test]
    fn test_reassembly_with_uneven_splits() {
        let (bytes, expected) = stream();
        let splits = [0usize, 3, 4, 5, 11, 12, 20, 21, 22, 28, bytes.len()];

        let mut reader = RecordReader::new();
        let mut got = Vec::new();
        for pair in splits.windows(2) {
            reader.push(&bytes[pair[0]..pair[1]]);
            drain(&mut reader, &mut got);
        }
        assert_eq!(got, expected);
    }

    #[test]
    fn test_partial_record_is_retained() {
        let mut reader = RecordReader::new();
        reader.push(&[0x16, 0x03, 0x03, 0x00, 0x03, 0x01]);
        assert!(reader.next_record().unwrap().is_none());
        assert_eq!(reader.buffered(), 6);
        reader.push(&[0x02, 0x03]);
        let record = reader.next_record().unwrap().unwrap();
        assert_eq!(record.fragment, vec![1, 2, 3]);
    }

    #[test]
    fn test_oversized_record_is_overflow() {
        let mut reader = RecordReader::new();
        reader.push(&[0x17, 0x03, 0x03, 0x48, 0x01]);
        assert_eq!(
            reader.next_record(),
            Err(Error::RecordOverflow(0x4801))
        );
    }

    #[test]
    fn test_fragmentation() {
        let data = vec![0u8; 10];
        let sizes: Vec<usize> = fragment(&data, 4).map(<[u8]>::len).collect();
        assert_eq!(sizes, vec![4, 4, 2]);

        let sizes: Vec<usize> = fragment(&[], 4).map(<[u8]>::len).collect();
        assert_eq!(sizes, vec![0]);

        let sizes: Vec<usize> = fragment(&data, 10).map(<[u8]>::len).collect();
        assert_eq!(sizes, vec![10]);
    }
}
