//! Handshake messages and the handshake envelope codec.
//!
//! ```text
//! struct {
//!     HandshakeType msg_type;    /* handshake type */
//!     uint24 length;             /* bytes in message */
//!     select (HandshakeType) { ... } body;
//! } Handshake;
//! ```
//!
//! Decoding dispatches on the type byte through [`MESSAGE_REGISTRY`], a
//! static table from type tag to body parser.

use bytes::BufMut;
use tlse_crypto::{CryptoProvider, PrivateKey, Random};

use crate::cipher_suites::KeyExchangeKind;
use crate::codec::Reader;
use crate::error::{Error, Result};
use crate::protocol::HandshakeType;

pub mod certificate;
pub mod client_hello;
pub mod client_key_exchange;
pub mod empty;
pub mod finished;
pub mod server_hello;
pub mod unsupported;

pub use certificate::Certificate;
pub use client_hello::ClientHello;
pub use client_key_exchange::ClientKeyExchange;
pub use empty::{HelloRequest, ServerHelloDone};
pub use finished::Finished;
pub use server_hello::ServerHello;
pub use unsupported::{CertificateRequest, CertificateVerify, ServerKeyExchange};

/// Size of the envelope header (type + 24-bit length).
pub const HANDSHAKE_HEADER_SIZE: usize = 4;

/// Largest handshake body accepted from the wire.
pub const MAX_HANDSHAKE_MESSAGE_SIZE: usize = 1 << 18;

/// Hello random.
///
/// ```text
/// struct {
///     uint32 gmt_unix_time;
///     opaque random_bytes[28];
/// } Random;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HelloRandom {
    /// Sender's clock, seconds since the epoch (may wrap)
    pub gmt_unix_time: u32,
    /// Random bytes
    pub random_bytes: [u8; 28],
}

impl HelloRandom {
    /// Current time followed by 28 bytes from `rng`.
    pub fn generate(rng: &dyn Random) -> Result<Self> {
        let gmt_unix_time = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or(0);
        let mut random_bytes = [0u8; 28];
        rng.fill(&mut random_bytes)?;
        Ok(Self {
            gmt_unix_time,
            random_bytes,
        })
    }

    /// Split a 32-byte random.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        let mut random_bytes = [0u8; 28];
        random_bytes.copy_from_slice(&bytes[4..]);
        Self {
            gmt_unix_time: u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            random_bytes,
        }
    }

    /// The 32 bytes as they appear on the wire and in the PRF seeds.
    pub fn to_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        out[..4].copy_from_slice(&self.gmt_unix_time.to_be_bytes());
        out[4..].copy_from_slice(&self.random_bytes);
        out
    }

    pub(crate) fn decode(reader: &mut Reader<'_>) -> Result<Self> {
        let gmt_unix_time = reader.read_u32("gmt_unix_time")?;
        let mut random_bytes = [0u8; 28];
        random_bytes.copy_from_slice(reader.take(28, "random bytes")?);
        Ok(Self {
            gmt_unix_time,
            random_bytes,
        })
    }

    pub(crate) fn encode_into<B: BufMut>(&self, out: &mut B) {
        out.put_u32(self.gmt_unix_time);
        out.put_slice(&self.random_bytes);
    }
}

/// Every handshake message the engine can name.
#[derive(Debug, Clone)]
pub enum HandshakeMessage {
    /// HelloRequest (0x00)
    HelloRequest(HelloRequest),
    /// ClientHello (0x01)
    ClientHello(ClientHello),
    /// ServerHello (0x02)
    ServerHello(ServerHello),
    /// Certificate (0x0B)
    Certificate(Certificate),
    /// ServerKeyExchange (0x0C), never decoded successfully
    ServerKeyExchange(ServerKeyExchange),
    /// CertificateRequest (0x0D), never decoded successfully
    CertificateRequest(CertificateRequest),
    /// ServerHelloDone (0x0E)
    ServerHelloDone(ServerHelloDone),
    /// CertificateVerify (0x0F), never decoded successfully
    CertificateVerify(CertificateVerify),
    /// ClientKeyExchange (0x10)
    ClientKeyExchange(ClientKeyExchange),
    /// Finished (0x14)
    Finished(Finished),
}

impl HandshakeMessage {
    /// Type tag of this message.
    pub fn handshake_type(&self) -> HandshakeType {
        match self {
            HandshakeMessage::HelloRequest(_) => HandshakeType::HelloRequest,
            HandshakeMessage::ClientHello(_) => HandshakeType::ClientHello,
            HandshakeMessage::ServerHello(_) => HandshakeType::ServerHello,
            HandshakeMessage::Certificate(_) => HandshakeType::Certificate,
            HandshakeMessage::ServerKeyExchange(_) => HandshakeType::ServerKeyExchange,
            HandshakeMessage::CertificateRequest(_) => HandshakeType::CertificateRequest,
            HandshakeMessage::ServerHelloDone(_) => HandshakeType::ServerHelloDone,
            HandshakeMessage::CertificateVerify(_) => HandshakeType::CertificateVerify,
            HandshakeMessage::ClientKeyExchange(_) => HandshakeType::ClientKeyExchange,
            HandshakeMessage::Finished(_) => HandshakeType::Finished,
        }
    }

    /// Encode the body (without the envelope header).
    pub fn encode_body(&self) -> Result<Vec<u8>> {
        match self {
            HandshakeMessage::HelloRequest(_) | HandshakeMessage::ServerHelloDone(_) => {
                Ok(Vec::new())
            },
            HandshakeMessage::ClientHello(m) => m.encode(),
            HandshakeMessage::ServerHello(m) => m.encode(),
            HandshakeMessage::Certificate(m) => m.encode(),
            HandshakeMessage::ClientKeyExchange(m) => m.encode(),
            HandshakeMessage::Finished(m) => Ok(m.encode()),
            HandshakeMessage::ServerKeyExchange(_)
            | HandshakeMessage::CertificateRequest(_)
            | HandshakeMessage::CertificateVerify(_) => Err(Error::UnsupportedFeature(format!(
                "{:?} cannot be encoded",
                self.handshake_type()
            ))),
        }
    }
}

/// What a body parser may need beyond the bytes themselves.
pub struct DecodeContext<'a> {
    /// Provider for the RSA private-key operation
    pub provider: &'a dyn CryptoProvider,
    /// Key exchange of the pending cipher suite, if one was negotiated
    pub key_exchange: Option<KeyExchangeKind>,
    /// Server private key, if configured
    pub private_key: Option<&'a PrivateKey>,
}

impl core::fmt::Debug for DecodeContext<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DecodeContext")
            .field("key_exchange", &self.key_exchange)
            .field("has_private_key", &self.private_key.is_some())
            .finish_non_exhaustive()
    }
}

/// Body parser signature used by the registry.
pub type ParseFn = fn(&[u8], &DecodeContext<'_>) -> Result<HandshakeMessage>;

fn parse_hello_request(body: &[u8], _: &DecodeContext<'_>) -> Result<HandshakeMessage> {
    HelloRequest::decode(body).map(HandshakeMessage::HelloRequest)
}

fn parse_client_hello(body: &[u8], _: &DecodeContext<'_>) -> Result<HandshakeMessage> {
    ClientHello::decode(body).map(HandshakeMessage::ClientHello)
}

fn parse_server_hello(body: &[u8], _: &DecodeContext<'_>) -> Result<HandshakeMessage> {
    ServerHello::decode(body).map(HandshakeMessage::ServerHello)
}

fn parse_certificate(body: &[u8], _: &DecodeContext<'_>) -> Result<HandshakeMessage> {
    Certificate::decode(body).map(HandshakeMessage::Certificate)
}

fn parse_server_key_exchange(body: &[u8], _: &DecodeContext<'_>) -> Result<HandshakeMessage> {
    ServerKeyExchange::decode(body).map(HandshakeMessage::ServerKeyExchange)
}

fn parse_certificate_request(body: &[u8], _: &DecodeContext<'_>) -> Result<HandshakeMessage> {
    CertificateRequest::decode(body).map(HandshakeMessage::CertificateRequest)
}

fn parse_server_hello_done(body: &[u8], _: &DecodeContext<'_>) -> Result<HandshakeMessage> {
    ServerHelloDone::decode(body).map(HandshakeMessage::ServerHelloDone)
}

fn parse_certificate_verify(body: &[u8], _: &DecodeContext<'_>) -> Result<HandshakeMessage> {
    CertificateVerify::decode(body).map(HandshakeMessage::CertificateVerify)
}

fn parse_client_key_exchange(body: &[u8], ctx: &DecodeContext<'_>) -> Result<HandshakeMessage> {
    let key_exchange = ctx.key_exchange.ok_or_else(|| {
        Error::UnexpectedMessage("ClientKeyExchange before a cipher suite was negotiated".into())
    })?;
    ClientKeyExchange::decode(body, key_exchange, ctx.provider, ctx.private_key)
        .map(HandshakeMessage::ClientKeyExchange)
}

fn parse_finished(body: &[u8], _: &DecodeContext<'_>) -> Result<HandshakeMessage> {
    Finished::decode(body).map(HandshakeMessage::Finished)
}

/// Type tag to body parser.
pub static MESSAGE_REGISTRY: [(HandshakeType, ParseFn); 10] = [
    (HandshakeType::HelloRequest, parse_hello_request),
    (HandshakeType::ClientHello, parse_client_hello),
    (HandshakeType::ServerHello, parse_server_hello),
    (HandshakeType::Certificate, parse_certificate),
    (HandshakeType::ServerKeyExchange, parse_server_key_exchange),
    (HandshakeType::CertificateRequest, parse_certificate_request),
    (HandshakeType::ServerHelloDone, parse_server_hello_done),
    (HandshakeType::CertificateVerify, parse_certificate_verify),
    (HandshakeType::ClientKeyExchange, parse_client_key_exchange),
    (HandshakeType::Finished, parse_finished),
];

fn parser_for(tag: u8) -> Option<ParseFn> {
    MESSAGE_REGISTRY
        .iter()
        .find(|(t, _)| t.to_u8() == tag)
        .map(|(_, parse)| *parse)
}

/// A decoded message together with its exact envelope bytes.
#[derive(Debug)]
pub struct ParsedEnvelope<'a> {
    /// The message
    pub message: HandshakeMessage,
    /// Header and body as received, for the transcript
    pub raw: &'a [u8],
}

/// Parse one envelope from `buf[*offset..*offset + available]`.
///
/// Returns `Ok(None)` when the envelope is not complete yet. An unknown type
/// or a body that fails to parse is an error; in every non-success case
/// `*offset` is left untouched.
pub fn parse_envelope<'a>(
    buf: &'a [u8],
    offset: &mut usize,
    available: usize,
    ctx: &DecodeContext<'_>,
) -> Result<Option<ParsedEnvelope<'a>>> {
    let start = *offset;
    let available = available.min(buf.len().saturating_sub(start));
    if available < HANDSHAKE_HEADER_SIZE {
        return Ok(None);
    }

    let tag = buf[start];
    let parse = parser_for(tag)
        .ok_or_else(|| Error::DecodeError(format!("unknown handshake type 0x{:02x}", tag)))?;

    let length = (usize::from(buf[start + 1]) << 16)
        | (usize::from(buf[start + 2]) << 8)
        | usize::from(buf[start + 3]);
    if length > MAX_HANDSHAKE_MESSAGE_SIZE {
        return Err(Error::DecodeError(format!(
            "handshake message of {} bytes exceeds limit",
            length
        )));
    }
    if available < HANDSHAKE_HEADER_SIZE + length {
        return Ok(None);
    }

    let end = start + HANDSHAKE_HEADER_SIZE + length;
    let message = parse(&buf[start + HANDSHAKE_HEADER_SIZE..end], ctx)?;
    *offset = end;
    Ok(Some(ParsedEnvelope {
        message,
        raw: &buf[start..end],
    }))
}

/// Encode a message with its envelope header.
pub fn encode_envelope(message: &HandshakeMessage) -> Result<Vec<u8>> {
    let body = message.encode_body()?;
    if body.len() > 0xFF_FFFF {
        return Err(Error::InternalError("handshake body exceeds 2^24-1 bytes".into()));
    }
    let mut out = Vec::with_capacity(HANDSHAKE_HEADER_SIZE + body.len());
    out.put_u8(message.handshake_type().to_u8());
    out.put_uint(body.len() as u64, 3);
    out.put_slice(&body);
    Ok(out)
}
