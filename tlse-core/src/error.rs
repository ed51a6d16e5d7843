//! Error types for the TLS 1.2 engine.

use core::fmt;

/// Result type for tlse operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors that can occur in the engine.
///
/// Every protocol failure maps to exactly one fatal alert through
/// [`Error::alert_description`]. Variants that return `None` there describe
/// conditions where no alert can or should be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Invalid configuration
    InvalidConfig(String),

    /// Malformed message or record body
    DecodeError(String),

    /// Message or record that is not valid in the current state
    UnexpectedMessage(String),

    /// Record failed MAC or padding verification
    BadRecordMac,

    /// Unsupported or mismatched protocol version
    ProtocolVersion(u16),

    /// Negotiation or Finished verification failed
    HandshakeFailure(String),

    /// Record longer than the protocol allows
    RecordOverflow(usize),

    /// Cryptographic provider error
    CryptoError(String),

    /// Transport write failed
    IoError(String),

    /// Fatal alert received from the peer
    AlertReceived(AlertDescription),

    /// A fatal alert was sent and the connection torn down
    AlertSent(AlertDescription),

    /// The connection is closed and accepts no further input
    ConnectionClosed,

    /// Unsupported feature
    UnsupportedFeature(String),

    /// Internal error
    InternalError(String),
}

impl Error {
    /// The fatal alert this error raises, if any.
    pub const fn alert_description(&self) -> Option<AlertDescription> {
        match self {
            Error::DecodeError(_) => Some(AlertDescription::DecodeError),
            Error::UnexpectedMessage(_) => Some(AlertDescription::UnexpectedMessage),
            Error::BadRecordMac => Some(AlertDescription::BadRecordMac),
            Error::ProtocolVersion(_) => Some(AlertDescription::ProtocolVersion),
            Error::HandshakeFailure(_) | Error::UnsupportedFeature(_) => {
                Some(AlertDescription::HandshakeFailure)
            },
            Error::RecordOverflow(_) => Some(AlertDescription::RecordOverflow),
            Error::CryptoError(_) | Error::InternalError(_) | Error::InvalidConfig(_) => {
                Some(AlertDescription::InternalError)
            },
            Error::IoError(_)
            | Error::AlertReceived(_)
            | Error::AlertSent(_)
            | Error::ConnectionClosed => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            Error::DecodeError(msg) => write!(f, "Decode error: {}", msg),
            Error::UnexpectedMessage(msg) => write!(f, "Unexpected message: {}", msg),
            Error::BadRecordMac => write!(f, "Bad record MAC"),
            Error::ProtocolVersion(v) => write!(f, "Unsupported protocol version: 0x{:04x}", v),
            Error::HandshakeFailure(msg) => write!(f, "Handshake failure: {}", msg),
            Error::RecordOverflow(len) => write!(f, "Record overflow: {} bytes", len),
            Error::CryptoError(msg) => write!(f, "Cryptographic error: {}", msg),
            Error::IoError(msg) => write!(f, "I/O error: {}", msg),
            Error::AlertReceived(desc) => write!(f, "Alert received: {}", desc.name()),
            Error::AlertSent(desc) => write!(f, "Alert sent: {}", desc.name()),
            Error::ConnectionClosed => write!(f, "Connection closed"),
            Error::UnsupportedFeature(msg) => write!(f, "Unsupported feature: {}", msg),
            Error::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<tlse_crypto::Error> for Error {
    fn from(e: tlse_crypto::Error) -> Self {
        Error::CryptoError(e.to_string())
    }
}

/// TLS 1.2 alert descriptions (RFC 5246 Section 7.2).
///
/// Peers send codes from later RFCs too (`unrecognized_name`,
/// `inappropriate_fallback`, ...); those decode to [`AlertDescription::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertDescription {
    /// Close notify
    CloseNotify,

    /// Unexpected message
    UnexpectedMessage,

    /// Bad record MAC
    BadRecordMac,

    /// Decryption failed (reserved)
    DecryptionFailed,

    /// Record overflow
    RecordOverflow,

    /// Decompression failure
    DecompressionFailure,

    /// Handshake failure
    HandshakeFailure,

    /// No certificate (reserved, SSLv3 only)
    NoCertificate,

    /// Bad certificate
    BadCertificate,

    /// Unsupported certificate
    UnsupportedCertificate,

    /// Certificate revoked
    CertificateRevoked,

    /// Certificate expired
    CertificateExpired,

    /// Certificate unknown
    CertificateUnknown,

    /// Illegal parameter
    IllegalParameter,

    /// Unknown CA
    UnknownCa,

    /// Access denied
    AccessDenied,

    /// Decode error
    DecodeError,

    /// Decrypt error
    DecryptError,

    /// Export restriction (reserved)
    ExportRestriction,

    /// Protocol version
    ProtocolVersion,

    /// Insufficient security
    InsufficientSecurity,

    /// Internal error
    InternalError,

    /// User canceled
    UserCanceled,

    /// No renegotiation
    NoRenegotiation,

    /// Unsupported extension
    UnsupportedExtension,

    /// Any description outside the table above, kept as received
    Unknown(u8),
}

impl AlertDescription {
    /// Convert from wire format (u8).
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(AlertDescription::CloseNotify),
            10 => Some(AlertDescription::UnexpectedMessage),
            20 => Some(AlertDescription::BadRecordMac),
            21 => Some(AlertDescription::DecryptionFailed),
            22 => Some(AlertDescription::RecordOverflow),
            30 => Some(AlertDescription::DecompressionFailure),
            40 => Some(AlertDescription::HandshakeFailure),
            41 => Some(AlertDescription::NoCertificate),
            42 => Some(AlertDescription::BadCertificate),
            43 => Some(AlertDescription::UnsupportedCertificate),
            44 => Some(AlertDescription::CertificateRevoked),
            45 => Some(AlertDescription::CertificateExpired),
            46 => Some(AlertDescription::CertificateUnknown),
            47 => Some(AlertDescription::IllegalParameter),
            48 => Some(AlertDescription::UnknownCa),
            49 => Some(AlertDescription::AccessDenied),
            50 => Some(AlertDescription::DecodeError),
            51 => Some(AlertDescription::DecryptError),
            60 => Some(AlertDescription::ExportRestriction),
            70 => Some(AlertDescription::ProtocolVersion),
            71 => Some(AlertDescription::InsufficientSecurity),
            80 => Some(AlertDescription::InternalError),
            90 => Some(AlertDescription::UserCanceled),
            100 => Some(AlertDescription::NoRenegotiation),
            110 => Some(AlertDescription::UnsupportedExtension),
            _ => None,
        }
    }

    /// Convert any wire value, keeping unknown codes as [`AlertDescription::Unknown`].
    pub const fn from_wire(value: u8) -> Self {
        match Self::from_u8(value) {
            Some(description) => description,
            None => AlertDescription::Unknown(value),
        }
    }

    /// Convert to wire format (u8).
    pub const fn to_u8(self) -> u8 {
        match self {
            AlertDescription::CloseNotify => 0,
            AlertDescription::UnexpectedMessage => 10,
            AlertDescription::BadRecordMac => 20,
            AlertDescription::DecryptionFailed => 21,
            AlertDescription::RecordOverflow => 22,
            AlertDescription::DecompressionFailure => 30,
            AlertDescription::HandshakeFailure => 40,
            AlertDescription::NoCertificate => 41,
            AlertDescription::BadCertificate => 42,
            AlertDescription::UnsupportedCertificate => 43,
            AlertDescription::CertificateRevoked => 44,
            AlertDescription::CertificateExpired => 45,
            AlertDescription::CertificateUnknown => 46,
            AlertDescription::IllegalParameter => 47,
            AlertDescription::UnknownCa => 48,
            AlertDescription::AccessDenied => 49,
            AlertDescription::DecodeError => 50,
            AlertDescription::DecryptError => 51,
            AlertDescription::ExportRestriction => 60,
            AlertDescription::ProtocolVersion => 70,
            AlertDescription::InsufficientSecurity => 71,
            AlertDescription::InternalError => 80,
            AlertDescription::UserCanceled => 90,
            AlertDescription::NoRenegotiation => 100,
            AlertDescription::UnsupportedExtension => 110,
            AlertDescription::Unknown(value) => value,
        }
    }

    /// Get the RFC name of this alert.
    pub const fn name(self) -> &'static str {
        match self {
            AlertDescription::CloseNotify => "close_notify",
            AlertDescription::UnexpectedMessage => "unexpected_message",
            AlertDescription::BadRecordMac => "bad_record_mac",
            AlertDescription::DecryptionFailed => "decryption_failed",
            AlertDescription::RecordOverflow => "record_overflow",
            AlertDescription::DecompressionFailure => "decompression_failure",
            AlertDescription::HandshakeFailure => "handshake_failure",
            AlertDescription::NoCertificate => "no_certificate",
            AlertDescription::BadCertificate => "bad_certificate",
            AlertDescription::UnsupportedCertificate => "unsupported_certificate",
            AlertDescription::CertificateRevoked => "certificate_revoked",
            AlertDescription::CertificateExpired => "certificate_expired",
            AlertDescription::CertificateUnknown => "certificate_unknown",
            AlertDescription::IllegalParameter => "illegal_parameter",
            AlertDescription::UnknownCa => "unknown_ca",
            AlertDescription::AccessDenied => "access_denied",
            AlertDescription::DecodeError => "decode_error",
            AlertDescription::DecryptError => "decrypt_error",
            AlertDescription::ExportRestriction => "export_restriction",
            AlertDescription::ProtocolVersion => "protocol_version",
            AlertDescription::InsufficientSecurity => "insufficient_security",
            AlertDescription::InternalError => "internal_error",
            AlertDescription::UserCanceled => "user_canceled",
            AlertDescription::NoRenegotiation => "no_renegotiation",
            AlertDescription::UnsupportedExtension => "unsupported_extension",
            AlertDescription::Unknown(_) => "unknown",
        }
    }
}
