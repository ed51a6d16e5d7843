//! ClientKeyExchange message (RFC 5246 Section 7.4.7).
//!
//! The body depends on the negotiated key exchange. Only RSA key transport
//! is implemented:
//!
//! ```text
//! struct {
//!     ProtocolVersion client_version;
//!     opaque random[46];
//! } PreMasterSecret;
//!
//! struct {
//!     public-key-encrypted PreMasterSecret pre_master_secret;
//! } EncryptedPreMasterSecret;
//! ```
//!
//! Every Diffie-Hellman flavour fails closed.

use core::fmt;

use tlse_crypto::{AsymmetricAlgorithm, CryptoProvider, PrivateKey};
use zeroize::Zeroizing;

use crate::cipher_suites::KeyExchangeKind;
use crate::codec::{write_compact_string, Reader};
use crate::error::{Error, Result};

/// Length of an RSA pre-master secret.
pub const PRE_MASTER_SECRET_LENGTH: usize = 48;

/// ClientKeyExchange for RSA key transport.
#[derive(Clone)]
pub struct ClientKeyExchange {
    encrypted_pre_master_secret: Vec<u8>,
    client_version: u16,
    pre_master_secret: Zeroizing<Vec<u8>>,
}

impl ClientKeyExchange {
    /// Build a ClientKeyExchange on the client side.
    ///
    /// A fresh pre-master secret (`client_version` followed by 46 random
    /// bytes) is encrypted to the server's `SubjectPublicKeyInfo`.
    pub fn rsa_encrypt(
        provider: &dyn CryptoProvider,
        server_public_key: &[u8],
        client_version: u16,
    ) -> Result<Self> {
        let mut pre_master_secret = Zeroizing::new(vec![0u8; PRE_MASTER_SECRET_LENGTH]);
        pre_master_secret[..2].copy_from_slice(&client_version.to_be_bytes());
        provider.random().fill(&mut pre_master_secret[2..])?;

        let encrypted_pre_master_secret = provider
            .asymmetric(AsymmetricAlgorithm::RsaPkcs1v15)?
            .encrypt(server_public_key, &pre_master_secret)?;

        Ok(Self {
            encrypted_pre_master_secret,
            client_version,
            pre_master_secret,
        })
    }

    /// Decode a body for the given key exchange, decrypting the pre-master
    /// secret with the server's private key.
    pub fn decode(
        data: &[u8],
        key_exchange: KeyExchangeKind,
        provider: &dyn CryptoProvider,
        private_key: Option<&PrivateKey>,
    ) -> Result<Self> {
        if key_exchange != KeyExchangeKind::Rsa {
            tracing::warn!(?key_exchange, "ClientKeyExchange for unimplemented key exchange");
            return Err(Error::DecodeError(format!(
                "{:?} ClientKeyExchange is not implemented",
                key_exchange
            )));
        }

        let mut r = Reader::new(data);
        let encrypted = r.read_compact(2)?;
        r.expect_end("ClientKeyExchange")?;

        let private_key = private_key.ok_or_else(|| {
            Error::HandshakeFailure("no private key to decrypt the pre-master secret".into())
        })?;

        let pre_master_secret = provider
            .asymmetric(AsymmetricAlgorithm::RsaPkcs1v15)?
            .decrypt(private_key, encrypted)
            .map_err(|e| Error::DecodeError(format!("pre-master secret: {}", e)))?;

        if pre_master_secret.len() != PRE_MASTER_SECRET_LENGTH {
            return Err(Error::DecodeError(format!(
                "pre-master secret must be {} bytes, got {}",
                PRE_MASTER_SECRET_LENGTH,
                pre_master_secret.len()
            )));
        }
        let client_version = u16::from_be_bytes([pre_master_secret[0], pre_master_secret[1]]);

        Ok(Self {
            encrypted_pre_master_secret: encrypted.to_vec(),
            client_version,
            pre_master_secret,
        })
    }

    /// Encode the message body (the encrypted pre-master secret).
    pub fn encode(&self) -> Result<Vec<u8>> {
        write_compact_string(&self.encrypted_pre_master_secret, 2)
    }

    /// Version embedded in the pre-master secret.
    pub fn client_version(&self) -> u16 {
        self.client_version
    }

    /// The 46 random bytes of the pre-master secret.
    pub fn random(&self) -> &[u8] {
        &self.pre_master_secret[2..]
    }

    /// The full 48-byte pre-master secret.
    pub fn pre_master_secret(&self) -> &[u8] {
        &self.pre_master_secret
    }

    /// The ciphertext as carried on the wire.
    pub fn encrypted_pre_master_secret(&self) -> &[u8] {
        &self.encrypted_pre_master_secret
    }
}

impl fmt::Debug for ClientKeyExchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientKeyExchange")
            .field("client_version", &format_args!("0x{:04x}", self.client_version))
            .field("encrypted_len", &self.encrypted_pre_master_secret.len())
            .finish_non_exhaustive()
    }
}
