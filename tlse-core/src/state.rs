//! Connection state management.
//!
//! [`ConnectionState`] is the one aggregate that holds everything negotiated
//! or derived for a connection. The record layer and the handshake state
//! machine both borrow it; nothing else mutates it.

use core::fmt;

use tlse_crypto::CryptoProvider;
use zeroize::Zeroizing;

use crate::cipher_suites::CipherSuiteDescriptor;
use crate::error::{Error, Result};
use crate::prf::{compute_key_block, KeyBlock, MASTER_SECRET_LENGTH};
use crate::protocol::{Role, INITIAL_RECORD_VERSION};
use crate::record_protection::CipherState;
use crate::transcript::HandshakeTranscript;

/// Handshake progress.
///
/// ```text
/// Idle ─► AwaitingClientHello ─► NegotiatedPending ─► AwaitingClientKeyExchange
///                                                          │
///   Established ◄── AwaitingFinished ◄── AwaitingChangeCipherSpec
///
/// Closed is reachable from every state.
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// No handshake role (client side, or role not yet known)
    Idle,
    /// Server waiting for the first ClientHello
    AwaitingClientHello,
    /// Parameters negotiated, server flight not yet written
    NegotiatedPending,
    /// Waiting for ClientKeyExchange
    AwaitingClientKeyExchange,
    /// Master secret derived, waiting for the peer's ChangeCipherSpec
    AwaitingChangeCipherSpec,
    /// Ciphers active, waiting for the peer's Finished
    AwaitingFinished,
    /// Handshake complete
    Established,
    /// Torn down; no further input is processed
    Closed,
}

impl HandshakeState {
    /// Initial state for a role.
    pub const fn initial(role: Role) -> Self {
        match role {
            Role::Server => HandshakeState::AwaitingClientHello,
            Role::Client | Role::AutoDetect => HandshakeState::Idle,
        }
    }
}

/// Negotiated and derived state for one connection.
pub struct ConnectionState {
    /// Our role, fixed at attach time
    pub role: Role,
    /// Handshake progress
    pub handshake: HandshakeState,
    /// Version fixed by the ClientHello exchange
    pub negotiated_version: Option<u16>,
    /// Version the client advertised in its ClientHello
    pub client_max_version: Option<u16>,
    /// Active cipher suite
    pub cipher_suite: Option<&'static CipherSuiteDescriptor>,
    /// Negotiated suite awaiting ChangeCipherSpec
    pub cipher_suite_next: Option<&'static CipherSuiteDescriptor>,
    /// Active compression method
    pub compression_method: Option<u8>,
    /// Negotiated compression awaiting ChangeCipherSpec
    pub compression_method_next: Option<u8>,
    /// Protection for records we receive
    pub read_cipher: Option<CipherState>,
    /// Protection for records we send
    pub write_cipher: Option<CipherState>,
    /// Client hello random
    pub client_random: Option<[u8; 32]>,
    /// Server hello random
    pub server_random: Option<[u8; 32]>,
    /// Running transcript of handshake envelopes
    pub transcript: HandshakeTranscript,
    master_secret: Option<Zeroizing<Vec<u8>>>,
}

impl ConnectionState {
    /// Fresh state for a role.
    pub fn new(role: Role, transcript: HandshakeTranscript) -> Self {
        Self {
            role,
            handshake: HandshakeState::initial(role),
            negotiated_version: None,
            client_max_version: None,
            cipher_suite: None,
            cipher_suite_next: None,
            compression_method: None,
            compression_method_next: None,
            read_cipher: None,
            write_cipher: None,
            client_random: None,
            server_random: None,
            transcript,
            master_secret: None,
        }
    }

    /// Version stamped on outgoing records and required on incoming ones.
    pub fn record_version(&self) -> u16 {
        self.negotiated_version.unwrap_or(INITIAL_RECORD_VERSION)
    }

    /// Check if the handshake has completed.
    pub fn is_established(&self) -> bool {
        self.handshake == HandshakeState::Established
    }

    /// Check if the connection has been torn down.
    pub fn is_closed(&self) -> bool {
        self.handshake == HandshakeState::Closed
    }

    /// Sequence number of the next record read under the active cipher.
    pub fn read_sequence(&self) -> Option<u64> {
        self.read_cipher.as_ref().map(CipherState::sequence_number)
    }

    /// Sequence number of the next record written under the active cipher.
    pub fn write_sequence(&self) -> Option<u64> {
        self.write_cipher.as_ref().map(CipherState::sequence_number)
    }

    /// The master secret, once derived.
    pub fn master_secret(&self) -> Option<&[u8]> {
        self.master_secret.as_deref().map(Vec::as_slice)
    }

    /// Store the master secret. It can only be set once.
    pub fn set_master_secret(&mut self, secret: Zeroizing<Vec<u8>>) -> Result<()> {
        if self.master_secret.is_some() {
            return Err(Error::InternalError("master secret already derived".into()));
        }
        if secret.len() != MASTER_SECRET_LENGTH {
            return Err(Error::InternalError(format!(
                "master secret must be {} bytes",
                MASTER_SECRET_LENGTH
            )));
        }
        self.master_secret = Some(secret);
        Ok(())
    }

    /// Promote the pending suite and compression to active.
    ///
    /// Derives the key block from the master secret and both randoms, splits
    /// it by role, and installs both cipher states together. Nothing is
    /// changed if any step fails.
    pub fn promote_pending(&mut self, provider: &dyn CryptoProvider) -> Result<()> {
        let suite = self
            .cipher_suite_next
            .ok_or_else(|| Error::UnexpectedMessage("no pending cipher suite".into()))?;
        let compression = self
            .compression_method_next
            .ok_or_else(|| Error::UnexpectedMessage("no pending compression method".into()))?;
        let master_secret = self
            .master_secret
            .as_ref()
            .ok_or_else(|| Error::UnexpectedMessage("master secret not derived".into()))?;
        let (client_random, server_random) = match (&self.client_random, &self.server_random) {
            (Some(c), Some(s)) => (c, s),
            _ => return Err(Error::InternalError("hello randoms missing".into())),
        };

        let block = compute_key_block(
            provider,
            suite.prf_hash(),
            master_secret,
            client_random,
            server_random,
            suite.key_block_length(),
        )?;
        let (local, remote) =
            KeyBlock::split(&block, suite.mac_length(), suite.key_size, suite.iv_length())?
                .into_local_remote(self.role)?;

        let read = CipherState::new(suite, remote)?;
        let write = CipherState::new(suite, local)?;

        self.read_cipher = Some(read);
        self.write_cipher = Some(write);
        self.cipher_suite = self.cipher_suite_next.take();
        self.compression_method = self.compression_method_next.take();
        tracing::debug!(suite = suite.name, compression, "pending state promoted");
        Ok(())
    }
}

impl fmt::Debug for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionState")
            .field("role", &self.role)
            .field("handshake", &self.handshake)
            .field("negotiated_version", &self.negotiated_version)
            .field("cipher_suite", &self.cipher_suite.map(|s| s.name))
            .field("cipher_suite_next", &self.cipher_suite_next.map(|s| s.name))
            .field("read_cipher", &self.read_cipher)
            .field("write_cipher", &self.write_cipher)
            .field("has_master_secret", &self.master_secret.is_some())
            .finish_non_exhaustive()
    }
}
