//! # TLSE Core
//!
//! TLS 1.2 record layer and handshake engine.
//!
//! The engine turns a raw, arbitrarily chunked byte stream into authenticated
//! application data and drives the server side of a full RSA key-transport
//! handshake to get there:
//! - Record framing, fragmentation and CBC MAC-then-encrypt protection
//! - Handshake message codec with a static type-to-parser registry
//! - Handshake state machine and connection state
//! - TLS 1.2 PRF key schedule
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │     Integrator (event loop, sockets)    │
//! └──────────────┬──────────────▲───────────┘
//!      consume() │              │ Transport::write()
//! ┌──────────────▼──────────────┴───────────┐
//! │        tlse-core (this crate)           │
//! │  ┌──────────────────────────────────┐   │
//! │  │   Connection                     │   │
//! │  ├──────────────────────────────────┤   │
//! │  │   Handshake State Machine        │   │
//! │  ├──────────────────────────────────┤   │
//! │  │   Message Codec / Registry       │   │
//! │  ├──────────────────────────────────┤   │
//! │  │   Record Layer / Protection      │   │
//! │  └──────────────────────────────────┘   │
//! └─────────────────┬───────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────┐
//! │      tlse-crypto (trait interface)      │
//! └─────────────────────────────────────────┘
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    unused_qualifications
)]
#![forbid(unsafe_code)]

// Re-export crypto interface
pub use tlse_crypto;

pub mod alert;
pub mod cipher_suites;
pub mod codec;
pub mod connection;
pub mod error;
pub mod extensions;
pub mod handshake;
pub mod messages;
pub mod prf;
pub mod protocol;
pub mod record;
pub mod record_protection;
pub mod state;
pub mod transcript;

// Re-exports
pub use alert::{Alert, AlertLevel};
pub use cipher_suites::{CipherSuite, CipherSuiteDescriptor};
pub use connection::{Connection, Transport};
pub use error::{AlertDescription, Error, Result};
pub use protocol::{ContentType, HandshakeType, ProtocolVersion, Role};
pub use state::HandshakeState;

use tlse_crypto::PrivateKey;

use crate::cipher_suites::DEFAULT_PREFERENCE;
use crate::protocol::COMPRESSION_NULL;
use crate::record::MAX_FRAGMENT_SIZE;

/// Server key and certificate chain.
///
/// Certificates are DER encoded, leaf first. The key must match the leaf's
/// public key; nothing here checks that.
#[derive(Debug, Clone)]
pub struct ServerIdentity {
    /// Private key for RSA key transport
    pub private_key: PrivateKey,

    /// Certificate chain (leaf first)
    pub certificates: Vec<Vec<u8>>,
}

/// Engine configuration.
///
/// # Example
///
/// ```rust
/// use tlse_core::{CipherSuite, Config, Role};
///
/// let config = Config::builder()
///     .with_role(Role::Server)
///     .with_cipher_suites(&[CipherSuite::RsaWithAes128CbcSha256])
///     .build()
///     .unwrap();
/// assert_eq!(config.max_fragment_length, 16384);
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Role to take; `AutoDetect` asks the transport
    pub role: Role,

    /// Cipher suites in server preference order
    pub cipher_suites: Vec<CipherSuite>,

    /// Compression methods in preference order (only `null`)
    pub compression_methods: Vec<u8>,

    /// Lowest version accepted from a ClientHello
    pub min_version: ProtocolVersion,

    /// Version the server negotiates
    pub max_version: ProtocolVersion,

    /// Largest plaintext carried in one outgoing record (default: 16384)
    pub max_fragment_length: u16,

    /// Server key and certificates
    pub identity: Option<ServerIdentity>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            role: Role::AutoDetect,
            cipher_suites: DEFAULT_PREFERENCE.to_vec(),
            compression_methods: vec![COMPRESSION_NULL],
            min_version: ProtocolVersion::Tls12,
            max_version: ProtocolVersion::Tls12,
            max_fragment_length: MAX_FRAGMENT_SIZE as u16,
            identity: None,
        }
    }
}

impl Config {
    /// Create a new configuration builder.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Configuration builder.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the connection role.
    pub fn with_role(mut self, role: Role) -> Self {
        self.config.role = role;
        self
    }

    /// Set the cipher suite preference order.
    pub fn with_cipher_suites(mut self, suites: &[CipherSuite]) -> Self {
        self.config.cipher_suites = suites.to_vec();
        self
    }

    /// Set the compression method preference order.
    pub fn with_compression_methods(mut self, methods: &[u8]) -> Self {
        self.config.compression_methods = methods.to_vec();
        self
    }

    /// Set the accepted protocol version range.
    pub fn with_protocol_versions(mut self, min: ProtocolVersion, max: ProtocolVersion) -> Self {
        self.config.min_version = min;
        self.config.max_version = max;
        self
    }

    /// Set maximum fragment length.
    pub fn with_max_fragment_length(mut self, length: u16) -> Self {
        self.config.max_fragment_length = length;
        self
    }

    /// Set the server key and certificate chain.
    pub fn with_identity(mut self, private_key: PrivateKey, certificates: Vec<Vec<u8>>) -> Self {
        self.config.identity = Some(ServerIdentity {
            private_key,
            certificates,
        });
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<Config> {
        let config = self.config;

        if config.cipher_suites.is_empty() {
            return Err(Error::InvalidConfig("No cipher suites specified".into()));
        }

        if config.compression_methods.is_empty()
            || config.compression_methods.iter().any(|&m| m != COMPRESSION_NULL)
        {
            return Err(Error::InvalidConfig(
                "Only null compression is supported".into(),
            ));
        }

        if config.min_version != ProtocolVersion::Tls12
            || config.max_version != ProtocolVersion::Tls12
        {
            return Err(Error::InvalidConfig("Only TLS 1.2 is supported".into()));
        }

        if config.max_fragment_length == 0
            || usize::from(config.max_fragment_length) > MAX_FRAGMENT_SIZE
        {
            return Err(Error::InvalidConfig(format!(
                "Max fragment length must be between 1 and {}",
                MAX_FRAGMENT_SIZE
            )));
        }

        if let Some(identity) = &config.identity {
            if identity.certificates.is_empty() {
                return Err(Error::InvalidConfig("Identity has no certificates".into()));
            }
            if identity.certificates.iter().any(Vec::is_empty) {
                return Err(Error::InvalidConfig("Empty certificate in chain".into()));
            }
        }

        Ok(config)
    }
}
