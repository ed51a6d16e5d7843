//! # RustCrypto-based Cryptography Provider for tlse
//!
//! This crate implements [`tlse_crypto::CryptoProvider`] on top of the
//! [RustCrypto](https://github.com/RustCrypto) crates.
//!
//! ## Supported Algorithms
//!
//! - **Hash**: MD5, SHA-1, SHA-256, SHA-384, SHA-512 (`md-5`, `sha1`, `sha2`)
//! - **HMAC**: over every hash above (`hmac`)
//! - **Block cipher**: AES-128-CBC, AES-256-CBC without padding (`aes`, `cbc`)
//! - **Asymmetric**: RSAES-PKCS1-v1_5 (`rsa`)
//! - **RNG**: operating system CSPRNG (`rand::rngs::OsRng`)
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use tlse_crypto::{CryptoProvider, HashAlgorithm};
//! use tlse_crypto_rustcrypto::RustCryptoProvider;
//!
//! let provider = RustCryptoProvider::new();
//! let mut hash = provider.hash(HashAlgorithm::Sha256).unwrap();
//! hash.update(b"abc");
//! let digest = hash.finalize();
//! assert_eq!(digest.len(), 32);
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    unused_qualifications,
    missing_debug_implementations
)]

use tlse_crypto::{
    AsymmetricAlgorithm, AsymmetricCipher, BlockCipher, BlockCipherAlgorithm, CryptoProvider,
    Hash, HashAlgorithm, Hmac, Random, Result,
};

pub mod cipher;
pub mod hash;
pub mod hmac;
pub mod random;
pub mod rsa;

/// Cryptography provider backed by RustCrypto implementations.
///
/// The provider is stateless apart from its random number generator handle
/// and can be shared freely between connections.
#[derive(Debug, Clone, Copy)]
pub struct RustCryptoProvider {
    random: random::OsRandom,
}

impl Default for RustCryptoProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl CryptoProvider for RustCryptoProvider {
    fn new() -> Self {
        Self {
            random: random::OsRandom,
        }
    }

    fn hash(&self, algorithm: HashAlgorithm) -> Result<Box<dyn Hash>> {
        Ok(hash::create_hash(algorithm))
    }

    fn hmac(&self, algorithm: HashAlgorithm, key: &[u8]) -> Result<Box<dyn Hmac>> {
        hmac::create_hmac(algorithm, key)
    }

    fn block_cipher(&self, algorithm: BlockCipherAlgorithm) -> Result<Box<dyn BlockCipher>> {
        Ok(Box::new(cipher::AesCbc::new(algorithm)))
    }

    fn random(&self) -> &dyn Random {
        &self.random
    }

    fn asymmetric(&self, algorithm: AsymmetricAlgorithm) -> Result<Box<dyn AsymmetricCipher>> {
        match algorithm {
            AsymmetricAlgorithm::RsaPkcs1v15 => Ok(Box::new(rsa::RsaPkcs1v15)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_creation() {
        let provider = RustCryptoProvider::new();
        assert!(provider.hash(HashAlgorithm::Sha256).is_ok());
        assert!(provider.hmac(HashAlgorithm::Sha1, b"key").is_ok());
        assert!(provider.block_cipher(BlockCipherAlgorithm::Aes256Cbc).is_ok());
        assert!(provider.asymmetric(AsymmetricAlgorithm::RsaPkcs1v15).is_ok());
    }

    #[test]
    fn test_provider_is_object_safe() {
        let provider: std::sync::Arc<dyn CryptoProvider> =
            std::sync::Arc::new(RustCryptoProvider::new());
        let bytes = provider.random().generate(8).unwrap();
        assert_eq!(bytes.len(), 8);
    }
}
