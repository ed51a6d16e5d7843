//! AES-CBC using the RustCrypto `aes` and `cbc` crates.

use aes::{Aes128, Aes256};
use cbc::cipher::block_padding::NoPadding;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use tlse_crypto::{BlockCipher, BlockCipherAlgorithm, Error, Result};

/// Raw AES-CBC. Padding is the record layer's job.
#[derive(Debug, Clone, Copy)]
pub struct AesCbc {
    algorithm: BlockCipherAlgorithm,
}

impl AesCbc {
    /// Create a cipher for `algorithm`.
    pub fn new(algorithm: BlockCipherAlgorithm) -> Self {
        Self { algorithm }
    }

    fn check_sizes(&self, key: &[u8], iv: &[u8], data: &[u8]) -> Result<()> {
        if key.len() != self.algorithm.key_size() {
            return Err(Error::InvalidKeySize {
                expected: self.algorithm.key_size(),
                actual: key.len(),
            });
        }
        if iv.len() != self.algorithm.block_size() {
            return Err(Error::InvalidIvSize {
                expected: self.algorithm.block_size(),
                actual: iv.len(),
            });
        }
        if data.len() % self.algorithm.block_size() != 0 {
            return Err(Error::InvalidLength);
        }
        Ok(())
    }
}

impl BlockCipher for AesCbc {
    fn encrypt(&self, key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>> {
        self.check_sizes(key, iv, data)?;
        let out = match self.algorithm {
            BlockCipherAlgorithm::Aes128Cbc => cbc::Encryptor::<Aes128>::new_from_slices(key, iv)
                .map_err(|_| Error::EncryptionFailed)?
                .encrypt_padded_vec_mut::<NoPadding>(data),
            BlockCipherAlgorithm::Aes256Cbc => cbc::Encryptor::<Aes256>::new_from_slices(key, iv)
                .map_err(|_| Error::EncryptionFailed)?
                .encrypt_padded_vec_mut::<NoPadding>(data),
        };
        Ok(out)
    }

    fn decrypt(&self, key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>> {
        self.check_sizes(key, iv, data)?;
        match self.algorithm {
            BlockCipherAlgorithm::Aes128Cbc => cbc::Decryptor::<Aes128>::new_from_slices(key, iv)
                .map_err(|_| Error::DecryptionFailed)?
                .decrypt_padded_vec_mut::<NoPadding>(data)
                .map_err(|_| Error::DecryptionFailed),
            BlockCipherAlgorithm::Aes256Cbc => cbc::Decryptor::<Aes256>::new_from_slices(key, iv)
                .map_err(|_| Error::DecryptionFailed)?
                .decrypt_padded_vec_mut::<NoPadding>(data)
                .map_err(|_| Error::DecryptionFailed),
        }
    }

    fn algorithm(&self) -> BlockCipherAlgorithm {
        self.algorithm
    }
}
