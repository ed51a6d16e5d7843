//! TLS protocol constants and types.

/// TLS protocol version.
///
/// Wire versions are carried as raw `u16` throughout the engine so that
/// unknown or future versions can still be compared; this enum names the
/// ones the engine reasons about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u16)]
pub enum ProtocolVersion {
    /// SSL 3.0 - never negotiated
    Ssl30 = 0x0300,

    /// TLS 1.0 (RFC 2246) - used on the record layer before negotiation
    Tls10 = 0x0301,

    /// TLS 1.1 (RFC 4346) - rejected
    Tls11 = 0x0302,

    /// TLS 1.2 (RFC 5246)
    Tls12 = 0x0303,
}

impl ProtocolVersion {
    /// Create from wire format (u16 big-endian).
    pub const fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x0300 => Some(ProtocolVersion::Ssl30),
            0x0301 => Some(ProtocolVersion::Tls10),
            0x0302 => Some(ProtocolVersion::Tls11),
            0x0303 => Some(ProtocolVersion::Tls12),
            _ => None,
        }
    }

    /// Convert to wire format (u16 big-endian).
    pub const fn to_u16(self) -> u16 {
        self as u16
    }

    /// Get the protocol name.
    pub const fn name(self) -> &'static str {
        match self {
            ProtocolVersion::Ssl30 => "SSL 3.0",
            ProtocolVersion::Tls10 => "TLS 1.0",
            ProtocolVersion::Tls11 => "TLS 1.1",
            ProtocolVersion::Tls12 => "TLS 1.2",
        }
    }
}

/// Record version used for every record written before a version is negotiated.
pub const INITIAL_RECORD_VERSION: u16 = ProtocolVersion::Tls10.to_u16();

/// Record content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ContentType {
    /// ChangeCipherSpec (20)
    ChangeCipherSpec = 0x14,

    /// Alert (21)
    Alert = 0x15,

    /// Handshake (22)
    Handshake = 0x16,

    /// Application data (23)
    ApplicationData = 0x17,
}

impl ContentType {
    /// Create from wire format (u8).
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x14 => Some(ContentType::ChangeCipherSpec),
            0x15 => Some(ContentType::Alert),
            0x16 => Some(ContentType::Handshake),
            0x17 => Some(ContentType::ApplicationData),
            _ => None,
        }
    }

    /// Convert to wire format (u8).
    pub const fn to_u8(self) -> u8 {
        self as u8
    }
}

/// Handshake message type (RFC 5246 Section 7.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum HandshakeType {
    /// HelloRequest (0)
    HelloRequest = 0,
    /// ClientHello (1)
    ClientHello = 1,
    /// ServerHello (2)
    ServerHello = 2,
    /// Certificate (11)
    Certificate = 11,
    /// ServerKeyExchange (12)
    ServerKeyExchange = 12,
    /// CertificateRequest (13)
    CertificateRequest = 13,
    /// ServerHelloDone (14)
    ServerHelloDone = 14,
    /// CertificateVerify (15)
    CertificateVerify = 15,
    /// ClientKeyExchange (16)
    ClientKeyExchange = 16,
    /// Finished (20)
    Finished = 20,
}

impl HandshakeType {
    /// Create from wire format (u8).
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(HandshakeType::HelloRequest),
            1 => Some(HandshakeType::ClientHello),
            2 => Some(HandshakeType::ServerHello),
            11 => Some(HandshakeType::Certificate),
            12 => Some(HandshakeType::ServerKeyExchange),
            13 => Some(HandshakeType::CertificateRequest),
            14 => Some(HandshakeType::ServerHelloDone),
            15 => Some(HandshakeType::CertificateVerify),
            16 => Some(HandshakeType::ClientKeyExchange),
            20 => Some(HandshakeType::Finished),
            _ => None,
        }
    }

    /// Convert to wire format (u8).
    pub const fn to_u8(self) -> u8 {
        self as u8
    }
}

/// Which end of the connection we are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Role {
    /// Ask the transport once at attach time.
    #[default]
    AutoDetect,
    /// Accepting side.
    Server,
    /// Initiating side.
    Client,
}

/// The only compression method the engine negotiates.
pub const COMPRESSION_NULL: u8 = 0;
