//! TLS 1.2 CBC record protection (RFC 5246 Section 6.2.3.2).
//!
//! ```text
//! struct {
//!     opaque IV[SecurityParameters.record_iv_length];
//!     block-ciphered struct {
//!         opaque content[TLSCompressed.length];
//!         opaque MAC[SecurityParameters.mac_length];
//!         uint8 padding[GenericBlockCipher.padding_length];
//!         uint8 padding_length;
//!     };
//! } GenericBlockCipher;
//!
//! MAC = HMAC(MAC_write_key, seq_num + type + version + length + content)
//! ```
//!
//! The whole `IV + content + MAC + padding` run is CBC-encrypted under the
//! key-block IV. Because the first plaintext block is random, the first
//! ciphertext block acts as the explicit per-record IV and is simply
//! discarded after decryption.

use core::fmt;

use bytes::BufMut;
use subtle::{Choice, ConditionallySelectable, ConstantTimeEq};
use tlse_crypto::{BlockCipherAlgorithm, CryptoProvider};
use zeroize::Zeroizing;

use crate::cipher_suites::CipherSuiteDescriptor;
use crate::error::{Error, Result};
use crate::prf::DirectionalKeys;

/// Protection state for one direction of an active cipher suite.
///
/// Holds the MAC key, cipher key, key-block IV and the sequence number for
/// that direction. The sequence number increments exactly once per record
/// processed and never wraps.
pub struct CipherState {
    suite: &'static CipherSuiteDescriptor,
    algorithm: BlockCipherAlgorithm,
    mac_key: Zeroizing<Vec<u8>>,
    key: Zeroizing<Vec<u8>>,
    iv: Zeroizing<Vec<u8>>,
    sequence_number: u64,
}

impl CipherState {
    /// Create protection state from one direction's keys.
    ///
    /// Fails if the suite is not an activatable block cipher suite or the
    /// key sizes do not match it.
    pub fn new(suite: &'static CipherSuiteDescriptor, keys: DirectionalKeys) -> Result<Self> {
        let algorithm = suite.block_cipher().ok_or_else(|| {
            Error::HandshakeFailure(format!("{} cannot be activated", suite.name))
        })?;

        if keys.mac_key.len() != suite.mac_length()
            || keys.key.len() != algorithm.key_size()
            || keys.iv.len() != algorithm.block_size()
        {
            return Err(Error::InternalError(format!(
                "key material does not match {}",
                suite.name
            )));
        }

        Ok(Self {
            suite,
            algorithm,
            mac_key: keys.mac_key,
            key: keys.key,
            iv: keys.iv,
            sequence_number: 0,
        })
    }

    /// The suite this state protects.
    pub fn suite(&self) -> &'static CipherSuiteDescriptor {
        self.suite
    }

    /// Sequence number of the next record.
    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    fn next_sequence(&mut self) -> Result<u64> {
        let seq = self.sequence_number;
        self.sequence_number = seq
            .checked_add(1)
            .ok_or_else(|| Error::InternalError("record sequence number exhausted".into()))?;
        Ok(seq)
    }

    fn compute_mac(
        &self,
        provider: &dyn CryptoProvider,
        seq: u64,
        content_type: u8,
        version: u16,
        content: &[u8],
    ) -> Result<Vec<u8>> {
        let mut header = [0u8; 13];
        {
            let mut h = &mut header[..];
            h.put_u64(seq);
            h.put_u8(content_type);
            h.put_u16(version);
            h.put_u16(content.len() as u16);
        }

        let mut mac = provider.hmac(self.suite.mac.hash_algorithm(), &self.mac_key)?;
        mac.update(&header);
        mac.update(content);
        Ok(mac.finalize())
    }

    /// Protect one record body.
    ///
    /// A random block is prepended, the MAC appended, and the result padded
    /// to the block size (a full block of padding when already aligned)
    /// before encryption.
    pub fn seal(
        &mut self,
        provider: &dyn CryptoProvider,
        content_type: u8,
        version: u16,
        plaintext: &[u8],
    ) -> Result<Vec<u8>> {
        if plaintext.len() > u16::MAX as usize {
            return Err(Error::InternalError("plaintext does not fit a record".into()));
        }
        let block_size = self.algorithm.block_size();
        let seq = self.next_sequence()?;
        let mac = self.compute_mac(provider, seq, content_type, version, plaintext)?;

        let unpadded = block_size + plaintext.len() + mac.len();
        let pad = block_size - unpadded % block_size;

        let mut data = Zeroizing::new(Vec::with_capacity(unpadded + pad));
        data.resize(block_size, 0);
        provider.random().fill(&mut data[..block_size])?;
        data.extend_from_slice(plaintext);
        data.extend_from_slice(&mac);
        data.resize(unpadded + pad, (pad - 1) as u8);

        let cipher = provider.block_cipher(self.algorithm)?;
        Ok(cipher.encrypt(&self.key, &self.iv, &data)?)
    }

    /// Verify and strip protection from one record body.
    ///
    /// Every failure (length, padding, MAC) is reported as
    /// [`Error::BadRecordMac`]. The sequence number advances whether or not
    /// the record verifies.
    pub fn open(
        &mut self,
        provider: &dyn CryptoProvider,
        content_type: u8,
        version: u16,
        ciphertext: &[u8],
    ) -> Result<Vec<u8>> {
        let seq = self.next_sequence()?;
        let block_size = self.algorithm.block_size();
        let mac_len = self.suite.mac_length();

        let min_len = block_size + (mac_len + block_size) / block_size * block_size;
        if ciphertext.len() < min_len || ciphertext.len() % block_size != 0 {
            tracing::debug!(len = ciphertext.len(), "ciphertext length invalid");
            return Err(Error::BadRecordMac);
        }

        let cipher = provider.block_cipher(self.algorithm)?;
        let decrypted = Zeroizing::new(
            cipher
                .decrypt(&self.key, &self.iv, ciphertext)
                .map_err(|_| Error::BadRecordMac)?,
        );
        let body = &decrypted[block_size..];

        // An impossible padding length falls back to no padding, so the MAC
        // below is still computed over the rest of the body.
        let claimed = body[body.len() - 1];
        let length_ok = Choice::from(u8::from(usize::from(claimed) + 1 + mac_len <= body.len()));
        let pad_len = u64::conditional_select(&0, &u64::from(claimed), length_ok) as usize;

        let padding = &body[body.len() - 1 - pad_len..];
        let padding_ok = padding
            .iter()
            .fold(length_ok, |ok, b| ok & b.ct_eq(&claimed));

        let content_end = body.len() - 1 - pad_len - mac_len;
        let content = &body[..content_end];
        let received_mac = &body[content_end..content_end + mac_len];

        let expected_mac = self.compute_mac(provider, seq, content_type, version, content)?;
        let mac_ok = expected_mac.ct_eq(received_mac);

        if bool::from(padding_ok & mac_ok) {
            Ok(content.to_vec())
        } else {
            Err(Error::BadRecordMac)
        }
    }
}

impl fmt::Debug for CipherState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CipherState")
            .field("suite", &self.suite.name)
            .field("sequence_number", &self.sequence_number)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher_suites::lookup;
    use crate::prf::KeyBlock;
    use crate::protocol::Role;
    use tlse_crypto_rustcrypto::RustCryptoProvider;

    /// Fixed key block split for `role`, as (local, remote).
    fn keys(suite_id: u16, role: Role) -> (DirectionalKeys, DirectionalKeys) {
        let suite = lookup(suite_id).unwrap();
        let block: Vec<u8> = (0..suite.key_block_length()).map(|i| (i * 7) as u8).collect();
        KeyBlock::split(&block, suite.mac_length(), suite.key_size, suite.iv_length())
            .unwrap()
            .into_local_remote(role)
            .unwrap()
    }

    /// Server write state and the matching client read state.
    fn pair(suite_id: u16) -> (CipherState, CipherState) {
        let suite = lookup(suite_id).unwrap();
        let (server_local, _) = keys(suite_id, Role::Server);
        let (_, client_remote) = keys(suite_id, Role::Client);
        (
            CipherState::new(suite, server_local).unwrap(),
            CipherState::new(suite, client_remote).unwrap(),
        )
    }

    #[test]
    fn test_seal_open_all_suites() {
        let provider = RustCryptoProvider::new();
        for id in [0x002F, 0x0035, 0x003C, 0x003D] {
            let (mut writer, mut reader) = pair(id);
            for len in [0usize, 1, 15, 16, 17, 100, 1000] {
                let plaintext = vec![0x61u8; len];
                let sealed = writer.seal(&provider, 0x17, 0x0303, &plaintext).unwrap();
                assert_eq!(sealed.len() % 16, 0);
                let opened = reader.open(&provider, 0x17, 0x0303, &sealed).unwrap();
                assert_eq!(opened, plaintext, "suite {:#06x} len {}", id, len);
            }
            assert_eq!(writer.sequence_number(), 7);
            assert_eq!(reader.sequence_number(), 7);
        }
    }

    #[test]
    fn test_padding_layout() {
        let provider = RustCryptoProvider::new();
        let (mut writer, _) = pair(0x003D);
        // IV(16) + 0 + MAC(32) = 48, already aligned: a full block of padding.
        let sealed = writer.seal(&provider, 0x17, 0x0303, &[]).unwrap();
        assert_eq!(sealed.len(), 64);
        // IV(16) + 1 + MAC(32) = 49 -> 15 bytes of padding.
        let sealed = writer.seal(&provider, 0x17, 0x0303, &[0]).unwrap();
        assert_eq!(sealed.len(), 64);
    }

    #[test]
    fn test_same_plaintext_encrypts_differently() {
        let provider = RustCryptoProvider::new();
        let (mut a, _) = pair(0x0035);
        let (mut b, _) = pair(0x0035);
        let x = a.seal(&provider, 0x17, 0x0303, b"hello").unwrap();
        let y = b.seal(&provider, 0x17, 0x0303, b"hello").unwrap();
        assert_ne!(x, y);
    }

    #[test]
    fn test_any_bit_flip_is_bad_record_mac() {
        let provider = RustCryptoProvider::new();
        let (mut writer, _) = pair(0x002F);
        let sealed = writer.seal(&provider, 0x16, 0x0303, b"finished!!!!").unwrap();

        for bit in 0..sealed.len() * 8 {
            let mut tampered = sealed.clone();
            tampered[bit / 8] ^= 1 << (bit % 8);
            let (_, mut reader) = pair(0x002F);
            assert_eq!(
                reader.open(&provider, 0x16, 0x0303, &tampered),
                Err(Error::BadRecordMac),
                "bit {}",
                bit
            );
            assert_eq!(reader.sequence_number(), 1);
        }
    }

    #[test]
    fn test_header_fields_are_authenticated() {
        let provider = RustCryptoProvider::new();
        let (mut writer, _) = pair(0x003C);
        let sealed = writer.seal(&provider, 0x17, 0x0303, b"data").unwrap();

        let (_, mut reader) = pair(0x003C);
        assert_eq!(
            reader.open(&provider, 0x16, 0x0303, &sealed),
            Err(Error::BadRecordMac)
        );
        let (_, mut reader) = pair(0x003C);
        assert_eq!(
            reader.open(&provider, 0x17, 0x0301, &sealed),
            Err(Error::BadRecordMac)
        );
    }

    #[test]
    fn test_sequence_mismatch_fails() {
        let provider = RustCryptoProvider::new();
        let (mut writer, mut reader) = pair(0x003D);
        let first = writer.seal(&provider, 0x17, 0x0303, b"one").unwrap();
        let second = writer.seal(&provider, 0x17, 0x0303, b"two").unwrap();

        // Replaying the second record as the first must fail.
        assert_eq!(
            reader.open(&provider, 0x17, 0x0303, &second),
            Err(Error::BadRecordMac)
        );
        // The failed record still consumed sequence 0.
        assert_eq!(
            reader.open(&provider, 0x17, 0x0303, &first),
            Err(Error::BadRecordMac)
        );
    }

    #[test]
    fn test_padding_length_past_body_is_bad_record_mac() {
        let provider = RustCryptoProvider::new();
        let (server_write, _) = keys(0x002F, Role::Server);
        let cipher = provider
            .block_cipher(BlockCipherAlgorithm::Aes128Cbc)
            .unwrap();

        // Random block, then a 32-byte body ending in the padding length.
        // 255 and 12 overrun the body next to a 20-byte MAC; 11 fits but the
        // padding bytes do not match it.
        for claimed in [0xFFu8, 12, 11] {
            let mut data = vec![0x33u8; 48];
            data[47] = claimed;
            let ciphertext = cipher
                .encrypt(&server_write.key, &server_write.iv, &data)
                .unwrap();

            let (_, mut reader) = pair(0x002F);
            assert_eq!(
                reader.open(&provider, 0x17, 0x0303, &ciphertext),
                Err(Error::BadRecordMac),
                "claimed {}",
                claimed
            );
            assert_eq!(reader.sequence_number(), 1);
        }
    }

    #[test]
    fn test_short_or_unaligned_ciphertext() {
        let provider = RustCryptoProvider::new();
        let (_, mut reader) = pair(0x0035);
        assert_eq!(reader.open(&provider, 0x17, 0x0303, &[]), Err(Error::BadRecordMac));
        assert_eq!(
            reader.open(&provider, 0x17, 0x0303, &[0u8; 33]),
            Err(Error::BadRecordMac)
        );
        // IV block plus one block cannot hold a 20-byte MAC and padding.
        assert_eq!(
            reader.open(&provider, 0x17, 0x0303, &[0u8; 32]),
            Err(Error::BadRecordMac)
        );
    }
}
