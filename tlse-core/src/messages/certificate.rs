//! Certificate message (RFC 5246 Section 7.4.2).

use crate::codec::{put_compact_string, Reader};
use crate::error::{Error, Result};

/// Certificate message.
///
/// ```text
/// opaque ASN.1Cert<1..2^24-1>;
///
/// struct {
///     ASN.1Cert certificate_list<0..2^24-1>;
/// } Certificate;
/// ```
///
/// Certificates are opaque DER blobs; the engine never parses them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    /// Certificate chain, leaf first
    pub certificate_list: Vec<Vec<u8>>,
}

impl Certificate {
    /// Create a Certificate message.
    pub fn new(certificate_list: Vec<Vec<u8>>) -> Self {
        Self { certificate_list }
    }

    /// The leaf certificate, if any.
    pub fn leaf(&self) -> Option<&[u8]> {
        self.certificate_list.first().map(Vec::as_slice)
    }

    /// Encode the message body.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut list = Vec::new();
        for cert in &self.certificate_list {
            if cert.is_empty() {
                return Err(Error::InternalError("empty certificate in chain".into()));
            }
            put_compact_string(&mut list, cert, 3)?;
        }

        let mut buf = Vec::with_capacity(3 + list.len());
        put_compact_string(&mut buf, &list, 3)?;
        Ok(buf)
    }

    /// Decode a Certificate body.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut r = Reader::new(data);
        let list = r.read_compact(3)?;
        r.expect_end("Certificate")?;

        let mut inner = Reader::new(list);
        let mut certificate_list = Vec::new();
        while !inner.is_empty() {
            let cert = inner.read_compact(3)?;
            if cert.is_empty() {
                return Err(Error::DecodeError("zero-length certificate".into()));
            }
            certificate_list.push(cert.to_vec());
        }

        Ok(Self { certificate_list })
    }
}
