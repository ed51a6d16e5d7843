//! RSAES-PKCS1-v1_5 using the RustCrypto `rsa` crate.

use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};
use tlse_crypto::{AsymmetricAlgorithm, AsymmetricCipher, Error, PrivateKey, Result};
use zeroize::Zeroizing;

/// RSA key transport as used by `TLS_RSA_WITH_*` cipher suites.
#[derive(Debug, Clone, Copy)]
pub struct RsaPkcs1v15;

fn parse_private_key(key: &PrivateKey) -> Result<RsaPrivateKey> {
    RsaPrivateKey::from_pkcs8_der(key.as_der())
        .or_else(|_| RsaPrivateKey::from_pkcs1_der(key.as_der()))
        .map_err(|_| Error::InvalidPrivateKey)
}

impl AsymmetricCipher for RsaPkcs1v15 {
    fn encrypt(&self, public_key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        let key = RsaPublicKey::from_public_key_der(public_key).map_err(|_| Error::InvalidPublicKey)?;
        key.encrypt(&mut rand::rngs::OsRng, Pkcs1v15Encrypt, plaintext)
            .map_err(|_| Error::EncryptionFailed)
    }

    fn decrypt(&self, private_key: &PrivateKey, ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        let key = parse_private_key(private_key)?;
        key.decrypt(Pkcs1v15Encrypt, ciphertext)
            .map(Zeroizing::new)
            .map_err(|_| Error::DecryptionFailed)
    }

    fn algorithm(&self) -> AsymmetricAlgorithm {
        AsymmetricAlgorithm::RsaPkcs1v15
    }
}
