//! ClientHello message (RFC 5246 Section 7.4.1.2).

use bytes::BufMut;

use super::HelloRandom;
use crate::codec::{put_compact_string, Reader};
use crate::error::{Error, Result};
use crate::extensions::Extensions;
use crate::protocol::COMPRESSION_NULL;

/// Longest session id a hello may carry.
pub const MAX_SESSION_ID_LENGTH: usize = 32;

/// ClientHello message.
///
/// ```text
/// struct {
///     ProtocolVersion client_version;
///     Random random;
///     SessionID session_id;
///     CipherSuite cipher_suites<2..2^16-2>;
///     CompressionMethod compression_methods<1..2^8-1>;
///     select (extensions_present) {
///         case false: struct {};
///         case true:  Extension extensions<0..2^16-1>;
///     };
/// } ClientHello;
/// ```
///
/// Cipher suites are kept as raw identifiers so that unknown offers survive
/// decoding; negotiation simply ignores them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientHello {
    /// Highest version the client supports
    pub client_version: u16,
    /// Client random
    pub random: HelloRandom,
    /// Session id (resumption is not supported, but the field is carried)
    pub session_id: Vec<u8>,
    /// Offered cipher suites in client preference order
    pub cipher_suites: Vec<u16>,
    /// Offered compression methods
    pub compression_methods: Vec<u8>,
    /// Hello extensions
    pub extensions: Extensions,
}

impl ClientHello {
    /// Create a ClientHello offering `cipher_suites` and null compression.
    pub fn new(client_version: u16, random: HelloRandom, cipher_suites: Vec<u16>) -> Self {
        Self {
            client_version,
            random,
            session_id: Vec::new(),
            cipher_suites,
            compression_methods: vec![COMPRESSION_NULL],
            extensions: Extensions::new(),
        }
    }

    /// Set the session id.
    pub fn with_session_id(mut self, session_id: Vec<u8>) -> Self {
        self.session_id = session_id;
        self
    }

    /// Replace the compression methods.
    pub fn with_compression_methods(mut self, methods: Vec<u8>) -> Self {
        self.compression_methods = methods;
        self
    }

    /// Add an extension.
    pub fn with_extension(mut self, extension_type: u16, data: Vec<u8>) -> Result<Self> {
        self.extensions.insert(extension_type, data)?;
        Ok(self)
    }

    /// Encode the message body.
    pub fn encode(&self) -> Result<Vec<u8>> {
        if self.session_id.len() > MAX_SESSION_ID_LENGTH {
            return Err(Error::InternalError("session id longer than 32 bytes".into()));
        }

        let mut buf = Vec::with_capacity(64 + 2 * self.cipher_suites.len());
        buf.put_u16(self.client_version);
        self.random.encode_into(&mut buf);
        put_compact_string(&mut buf, &self.session_id, 1)?;

        let mut suites = Vec::with_capacity(2 * self.cipher_suites.len());
        for suite in &self.cipher_suites {
            suites.put_u16(*suite);
        }
        put_compact_string(&mut buf, &suites, 2)?;
        put_compact_string(&mut buf, &self.compression_methods, 1)?;
        self.extensions.encode_into(&mut buf)?;
        Ok(buf)
    }

    /// Decode a ClientHello body.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut r = Reader::new(data);

        let client_version = r.read_u16("client version")?;
        let random = HelloRandom::decode(&mut r)?;

        let session_id = r.read_compact(1)?;
        if session_id.len() > MAX_SESSION_ID_LENGTH {
            return Err(Error::DecodeError(format!(
                "session id of {} bytes",
                session_id.len()
            )));
        }

        let suites = r.read_compact(2)?;
        if suites.len() % 2 != 0 {
            return Err(Error::DecodeError("odd-length cipher suite list".into()));
        }
        let cipher_suites = suites
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();

        let compression_methods = r.read_compact(1)?.to_vec();
        let extensions = Extensions::decode_optional(&mut r)?;
        r.expect_end("ClientHello")?;

        Ok(Self {
            client_version,
            random,
            session_id: session_id.to_vec(),
            cipher_suites,
            compression_methods,
            extensions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_random() -> HelloRandom {
        HelloRandom::from_bytes([0x5Au8; 32])
    }

    #[test]
    fn test_client_hello_encode_decode() {
        let hello = ClientHello::new(0x0303, sample_random(), vec![0x003D, 0x0035, 0xC02F])
            .with_session_id(vec![1, 2, 3])
            .with_extension(0xff01, vec![0x00])
            .unwrap();

        let encoded = hello.encode().unwrap();
        let decoded = ClientHello::decode(&encoded).unwrap();
        assert_eq!(decoded, hello);
        assert_eq!(decoded.random.to_bytes(), [0x5Au8; 32]);
    }

    #[test]
    fn test_client_hello_wire_layout() {
        let hello = ClientHello::new(0x0303, sample_random(), vec![0x003D]);
        let encoded = hello.encode().unwrap();

        assert_eq!(&encoded[0..2], &[0x03, 0x03]);
        assert_eq!(&encoded[2..34], &[0x5A; 32]);
        assert_eq!(encoded[34], 0); // empty session id
        assert_eq!(&encoded[35..39], &[0x00, 0x02, 0x00, 0x3D]);
        assert_eq!(&encoded[39..41], &[0x01, 0x00]);
        assert_eq!(encoded.len(), 41); // no extensions block
    }

    #[test]
    fn test_client_hello_without_extensions_decodes() {
        let mut body = vec![0x03, 0x03];
        body.extend_from_slice(&[0u8; 32]);
        body.extend_from_slice(&[0x00, 0x00, 0x04, 0x00, 0x2F, 0x00, 0x3D, 0x01, 0x00]);

        let hello = ClientHello::decode(&body).unwrap();
        assert_eq!(hello.cipher_suites, vec![0x002F, 0x003D]);
        assert_eq!(hello.compression_methods, vec![0]);
        assert!(hello.extensions.is_empty());
    }

    #[test]
    fn test_client_hello_rejects_malformed() {
        let hello = ClientHello::new(0x0303, sample_random(), vec![0x003D]);
        let encoded = hello.encode().unwrap();

        // Truncated at every position must fail, never panic.
        for len in 0..encoded.len() {
            assert!(ClientHello::decode(&encoded[..len]).is_err(), "len {}", len);
        }

        // Odd suite list length.
        let mut odd = encoded.clone();
        odd[35..37].copy_from_slice(&[0x00, 0x01]);
        assert!(ClientHello::decode(&odd).is_err());

        // Trailing garbage that is not a valid extension block.
        let mut trailing = encoded;
        trailing.push(0x01);
        assert!(ClientHello::decode(&trailing).is_err());
    }
}
