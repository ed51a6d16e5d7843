//! # tlse cryptographic provider interface
//!
//! This crate defines the cryptographic abstraction layer used by the tlse
//! TLS 1.2 engine. The engine never touches a primitive directly; every
//! hash, MAC, cipher and RSA operation goes through a [`CryptoProvider`].
//!
//! ## Architecture
//!
//! ```text
//! CryptoProvider (main trait)
//! ├── Hash (MD5, SHA-1, SHA-256, SHA-384, SHA-512, with non-destructive snapshot)
//! ├── Hmac (HMAC over any of the hashes above)
//! ├── BlockCipher (AES-128/256 in raw CBC mode, caller handles padding)
//! ├── Random (CSPRNG)
//! └── AsymmetricCipher (RSA PKCS#1 v1.5 encrypt / private decrypt)
//! ```
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use tlse_crypto::{CryptoProvider, HashAlgorithm, Error};
//!
//! fn example(provider: &dyn CryptoProvider) -> Result<Vec<u8>, Error> {
//!     let mut mac = provider.hmac(HashAlgorithm::Sha256, b"key")?;
//!     mac.update(b"message");
//!     Ok(mac.finalize())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    unused_qualifications,
    missing_debug_implementations
)]

pub mod asymmetric;
pub mod cipher;
pub mod error;
pub mod hash;
pub mod hmac;
pub mod random;

pub use asymmetric::{AsymmetricAlgorithm, AsymmetricCipher, PrivateKey};
pub use cipher::{BlockCipher, BlockCipherAlgorithm};
pub use error::{Error, Result};
pub use hash::{Hash, HashAlgorithm};
pub use hmac::Hmac;
pub use random::Random;

/// The main cryptographic provider trait.
///
/// Implementations supply every primitive the TLS 1.2 engine needs. The trait
/// is object-safe so a connection can hold an `Arc<dyn CryptoProvider>`.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`.
pub trait CryptoProvider: Send + Sync + 'static {
    /// Create a new instance of the crypto provider.
    fn new() -> Self
    where
        Self: Sized;

    /// Get a hash function instance.
    ///
    /// # Returns
    ///
    /// A hash function instance, or an error if the algorithm is not supported.
    fn hash(&self, algorithm: HashAlgorithm) -> Result<Box<dyn Hash>>;

    /// Get an HMAC instance keyed with `key`.
    ///
    /// # Returns
    ///
    /// An HMAC instance, or an error if the algorithm is not supported.
    fn hmac(&self, algorithm: HashAlgorithm, key: &[u8]) -> Result<Box<dyn Hmac>>;

    /// Get a raw CBC block cipher.
    fn block_cipher(&self, algorithm: BlockCipherAlgorithm) -> Result<Box<dyn BlockCipher>>;

    /// Get the random number generator.
    fn random(&self) -> &dyn Random;

    /// Get an asymmetric encryption scheme.
    fn asymmetric(&self, algorithm: AsymmetricAlgorithm) -> Result<Box<dyn AsymmetricCipher>>;
}
