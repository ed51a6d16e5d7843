//! ServerHello message (RFC 5246 Section 7.4.1.3).

use bytes::BufMut;

use super::HelloRandom;
use crate::codec::{put_compact_string, Reader};
use crate::error::{Error, Result};
use crate::extensions::Extensions;

use super::client_hello::MAX_SESSION_ID_LENGTH;

/// ServerHello message.
///
/// ```text
/// struct {
///     ProtocolVersion server_version;
///     Random random;
///     SessionID session_id;
///     CipherSuite cipher_suite;
///     CompressionMethod compression_method;
///     select (extensions_present) {
///         case false: struct {};
///         case true:  Extension extensions<0..2^16-1>;
///     };
/// } ServerHello;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerHello {
    /// Negotiated version
    pub server_version: u16,
    /// Server random
    pub random: HelloRandom,
    /// Session id (always empty from this server)
    pub session_id: Vec<u8>,
    /// Selected cipher suite
    pub cipher_suite: u16,
    /// Selected compression method
    pub compression_method: u8,
    /// Hello extensions
    pub extensions: Extensions,
}

impl ServerHello {
    /// Create a ServerHello with an empty session id and no extensions.
    pub fn new(
        server_version: u16,
        random: HelloRandom,
        cipher_suite: u16,
        compression_method: u8,
    ) -> Self {
        Self {
            server_version,
            random,
            session_id: Vec::new(),
            cipher_suite,
            compression_method,
            extensions: Extensions::new(),
        }
    }

    /// Encode the message body.
    pub fn encode(&self) -> Result<Vec<u8>> {
        if self.session_id.len() > MAX_SESSION_ID_LENGTH {
            return Err(Error::InternalError("session id longer than 32 bytes".into()));
        }
        let mut buf = Vec::with_capacity(40);
        buf.put_u16(self.server_version);
        self.random.encode_into(&mut buf);
        put_compact_string(&mut buf, &self.session_id, 1)?;
        buf.put_u16(self.cipher_suite);
        buf.put_u8(self.compression_method);
        self.extensions.encode_into(&mut buf)?;
        Ok(buf)
    }

    /// Decode a ServerHello body.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut r = Reader::new(data);

        let server_version = r.read_u16("server version")?;
        let random = HelloRandom::decode(&mut r)?;
        let session_id = r.read_compact(1)?;
        if session_id.len() > MAX_SESSION_ID_LENGTH {
            return Err(Error::DecodeError(format!(
                "session id of {} bytes",
                session_id.len()
            )));
        }
        let cipher_suite = r.read_u16("cipher suite")?;
        let compression_method = r.read_u8("compression method")?;
        let extensions = Extensions::decode_optional(&mut r)?;
        r.expect_end("ServerHello")?;

        Ok(Self {
            server_version,
            random,
            session_id: session_id.to_vec(),
            cipher_suite,
            compression_method,
            extensions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_hello_encode_decode() {
        let hello = ServerHello::new(0x0303, HelloRandom::from_bytes([7u8; 32]), 0x003D, 0);
        let encoded = hello.encode().unwrap();
        // version + random + empty session id + suite + compression
        assert_eq!(encoded.len(), 2 + 32 + 1 + 2 + 1);
        assert_eq!(&encoded[35..38], &[0x00, 0x3D, 0x00]);

        let decoded = ServerHello::decode(&encoded).unwrap();
        assert_eq!(decoded, hello);
    }

    #[test]
    fn test_server_hello_truncated() {
        let hello = ServerHello::new(0x0303, HelloRandom::from_bytes([7u8; 32]), 0x0035, 0);
        let encoded = hello.encode().unwrap();
        for len in 0..encoded.len() {
            assert!(ServerHello::decode(&encoded[..len]).is_err());
        }
    }
}
