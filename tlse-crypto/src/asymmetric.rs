//! Asymmetric encryption interface (RSA key transport).

use std::fmt;

use zeroize::Zeroizing;

use crate::Result;

/// Asymmetric encryption schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AsymmetricAlgorithm {
    /// RSAES-PKCS1-v1_5 as used by the TLS RSA key exchange
    RsaPkcs1v15,
}

/// Opaque handle to a DER-encoded private key.
///
/// Providers accept PKCS#8 `PrivateKeyInfo` and, for RSA, PKCS#1
/// `RSAPrivateKey`. The bytes are wiped when the handle is dropped.
#[derive(Clone)]
pub struct PrivateKey {
    der: Zeroizing<Vec<u8>>,
}

impl PrivateKey {
    /// Wrap DER-encoded private key bytes.
    pub fn from_der(der: impl Into<Vec<u8>>) -> Self {
        Self {
            der: Zeroizing::new(der.into()),
        }
    }

    /// The DER encoding.
    pub fn as_der(&self) -> &[u8] {
        &self.der
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("len", &self.der.len())
            .finish_non_exhaustive()
    }
}

/// Public-key encryption with private-key decryption.
pub trait AsymmetricCipher: Send {
    /// Encrypt `plaintext` to a DER `SubjectPublicKeyInfo` public key.
    fn encrypt(&self, public_key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>>;

    /// Decrypt `ciphertext` with `private_key`.
    fn decrypt(&self, private_key: &PrivateKey, ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>>;

    /// Get the algorithm this scheme implements.
    fn algorithm(&self) -> AsymmetricAlgorithm;
}
