//! Block cipher interface.
//!
//! TLS 1.2 CBC suites pad and authenticate records themselves, so the
//! provider only exposes raw chaining: input must already be a whole number
//! of blocks and no padding is added or removed.

use crate::Result;

/// Block cipher and chaining mode combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockCipherAlgorithm {
    /// AES with a 128-bit key in CBC mode
    Aes128Cbc,
    /// AES with a 256-bit key in CBC mode
    Aes256Cbc,
}

impl BlockCipherAlgorithm {
    /// Key size in bytes.
    pub const fn key_size(self) -> usize {
        match self {
            BlockCipherAlgorithm::Aes128Cbc => 16,
            BlockCipherAlgorithm::Aes256Cbc => 32,
        }
    }

    /// Block (and IV) size in bytes.
    pub const fn block_size(self) -> usize {
        16
    }

    /// Get the name of this algorithm.
    pub const fn name(self) -> &'static str {
        match self {
            BlockCipherAlgorithm::Aes128Cbc => "AES-128-CBC",
            BlockCipherAlgorithm::Aes256Cbc => "AES-256-CBC",
        }
    }
}

/// Raw CBC block cipher.
pub trait BlockCipher: Send {
    /// Encrypt `data` in CBC mode.
    ///
    /// # Errors
    ///
    /// Fails when the key or IV has the wrong size or `data` is not a
    /// multiple of the block size.
    fn encrypt(&self, key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>>;

    /// Decrypt `data` in CBC mode. Same size rules as [`BlockCipher::encrypt`].
    fn decrypt(&self, key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>>;

    /// Get the algorithm this cipher implements.
    fn algorithm(&self) -> BlockCipherAlgorithm;
}
