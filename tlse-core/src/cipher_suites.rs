//! TLS 1.2 cipher suite registry.
//!
//! Every suite the engine can activate is described by a static
//! [`CipherSuiteDescriptor`]: key exchange, bulk cipher, key size, block
//! mode and record MAC. All of them are RSA key transport with AES-CBC and
//! HMAC, and all of them use the SHA-256 PRF.
//!
//! Format: TLS_{KeyExchange}_WITH_{Encryption}_{Mac}

use tlse_crypto::{BlockCipherAlgorithm, HashAlgorithm};

/// TLS 1.2 cipher suite identifiers known to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum CipherSuite {
    /// TLS_RSA_WITH_AES_128_CBC_SHA (0x002F) - RFC 5246
    RsaWithAes128CbcSha = 0x002F,

    /// TLS_RSA_WITH_AES_256_CBC_SHA (0x0035) - RFC 5246
    RsaWithAes256CbcSha = 0x0035,

    /// TLS_RSA_WITH_AES_128_CBC_SHA256 (0x003C) - RFC 5246
    RsaWithAes128CbcSha256 = 0x003C,

    /// TLS_RSA_WITH_AES_256_CBC_SHA256 (0x003D) - RFC 5246
    RsaWithAes256CbcSha256 = 0x003D,
}

impl CipherSuite {
    /// Create from wire format (u16 big-endian).
    pub const fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x002F => Some(CipherSuite::RsaWithAes128CbcSha),
            0x0035 => Some(CipherSuite::RsaWithAes256CbcSha),
            0x003C => Some(CipherSuite::RsaWithAes128CbcSha256),
            0x003D => Some(CipherSuite::RsaWithAes256CbcSha256),
            _ => None,
        }
    }

    /// Convert to wire format (u16 big-endian).
    pub const fn to_u16(self) -> u16 {
        self as u16
    }

    /// Static description of this suite.
    pub fn descriptor(self) -> &'static CipherSuiteDescriptor {
        match self {
            CipherSuite::RsaWithAes128CbcSha => &CIPHER_SUITES[0],
            CipherSuite::RsaWithAes256CbcSha => &CIPHER_SUITES[1],
            CipherSuite::RsaWithAes128CbcSha256 => &CIPHER_SUITES[2],
            CipherSuite::RsaWithAes256CbcSha256 => &CIPHER_SUITES[3],
        }
    }

    /// Get cipher suite name as a string.
    pub fn name(self) -> &'static str {
        self.descriptor().name
    }
}

/// Key exchange families.
///
/// Only [`KeyExchangeKind::Rsa`] is implemented; the others exist so that a
/// ClientKeyExchange for them can be recognised and refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyExchangeKind {
    /// RSA key transport
    Rsa,
    /// Anonymous Diffie-Hellman
    DhAnon,
    /// Static DH with an RSA certificate
    DhRsa,
    /// Static DH with a DSS certificate
    DhDss,
    /// Ephemeral DH signed with RSA
    DheRsa,
    /// Ephemeral DH signed with DSS
    DheDss,
    /// Anonymous ECDH
    EcdhAnon,
    /// Static ECDH with an RSA certificate
    EcdhRsa,
    /// Static ECDH with an ECDSA certificate
    EcdhEcdsa,
    /// Ephemeral ECDH signed with RSA
    EcdheRsa,
    /// Ephemeral ECDH signed with ECDSA
    EcdheEcdsa,
}

/// Bulk cipher families.
///
/// Each family is its own variant; none but AES is referenced by a
/// descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BulkCipher {
    /// AES
    Aes,
    /// RC4 (stream)
    Rc4,
    /// Triple DES
    TripleDes,
    /// ChaCha20 (stream)
    ChaCha20,
}

impl BulkCipher {
    /// Block size in bytes, `None` for stream ciphers.
    pub const fn block_size(self) -> Option<usize> {
        match self {
            BulkCipher::Aes => Some(16),
            BulkCipher::TripleDes => Some(8),
            BulkCipher::Rc4 | BulkCipher::ChaCha20 => None,
        }
    }
}

/// Block chaining mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockMode {
    /// Cipher block chaining
    Cbc,
    /// Galois/counter mode (never activated)
    Gcm,
}

/// Record MAC algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MacAlgorithm {
    /// HMAC-MD5
    Md5,
    /// HMAC-SHA1
    Sha1,
    /// HMAC-SHA256
    Sha256,
    /// HMAC-SHA384
    Sha384,
    /// HMAC-SHA512
    Sha512,
}

impl MacAlgorithm {
    /// Underlying hash for the HMAC.
    pub const fn hash_algorithm(self) -> HashAlgorithm {
        match self {
            MacAlgorithm::Md5 => HashAlgorithm::Md5,
            MacAlgorithm::Sha1 => HashAlgorithm::Sha1,
            MacAlgorithm::Sha256 => HashAlgorithm::Sha256,
            MacAlgorithm::Sha384 => HashAlgorithm::Sha384,
            MacAlgorithm::Sha512 => HashAlgorithm::Sha512,
        }
    }

    /// MAC length in bytes (also the MAC key length).
    pub const fn mac_length(self) -> usize {
        self.hash_algorithm().output_size()
    }
}

/// Immutable description of a cipher suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CipherSuiteDescriptor {
    /// The suite identifier
    pub suite: CipherSuite,
    /// RFC name
    pub name: &'static str,
    /// Key exchange family
    pub key_exchange: KeyExchangeKind,
    /// Bulk cipher family
    pub cipher: BulkCipher,
    /// Encryption key size in bytes
    pub key_size: usize,
    /// Chaining mode
    pub block_mode: BlockMode,
    /// Record MAC
    pub mac: MacAlgorithm,
}

impl CipherSuiteDescriptor {
    /// Record MAC length in bytes.
    pub const fn mac_length(&self) -> usize {
        self.mac.mac_length()
    }

    /// IV length in bytes (the cipher block size, zero for stream ciphers).
    pub const fn iv_length(&self) -> usize {
        match self.cipher.block_size() {
            Some(size) => size,
            None => 0,
        }
    }

    /// Length of the key block: MAC key, encryption key and IV for both
    /// directions.
    pub const fn key_block_length(&self) -> usize {
        2 * (self.mac_length() + self.key_size + self.iv_length())
    }

    /// Hash used by the TLS 1.2 PRF for this suite.
    pub const fn prf_hash(&self) -> HashAlgorithm {
        HashAlgorithm::Sha256
    }

    /// Provider cipher for this suite, `None` if the combination cannot be
    /// activated.
    pub const fn block_cipher(&self) -> Option<BlockCipherAlgorithm> {
        match (self.cipher, self.block_mode, self.key_size) {
            (BulkCipher::Aes, BlockMode::Cbc, 16) => Some(BlockCipherAlgorithm::Aes128Cbc),
            (BulkCipher::Aes, BlockMode::Cbc, 32) => Some(BlockCipherAlgorithm::Aes256Cbc),
            _ => None,
        }
    }
}

/// Every suite the engine knows how to run.
pub static CIPHER_SUITES: [CipherSuiteDescriptor; 4] = [
    CipherSuiteDescriptor {
        suite: CipherSuite::RsaWithAes128CbcSha,
        name: "TLS_RSA_WITH_AES_128_CBC_SHA",
        key_exchange: KeyExchangeKind::Rsa,
        cipher: BulkCipher::Aes,
        key_size: 16,
        block_mode: BlockMode::Cbc,
        mac: MacAlgorithm::Sha1,
    },
    CipherSuiteDescriptor {
        suite: CipherSuite::RsaWithAes256CbcSha,
        name: "TLS_RSA_WITH_AES_256_CBC_SHA",
        key_exchange: KeyExchangeKind::Rsa,
        cipher: BulkCipher::Aes,
        key_size: 32,
        block_mode: BlockMode::Cbc,
        mac: MacAlgorithm::Sha1,
    },
    CipherSuiteDescriptor {
        suite: CipherSuite::RsaWithAes128CbcSha256,
        name: "TLS_RSA_WITH_AES_128_CBC_SHA256",
        key_exchange: KeyExchangeKind::Rsa,
        cipher: BulkCipher::Aes,
        key_size: 16,
        block_mode: BlockMode::Cbc,
        mac: MacAlgorithm::Sha256,
    },
    CipherSuiteDescriptor {
        suite: CipherSuite::RsaWithAes256CbcSha256,
        name: "TLS_RSA_WITH_AES_256_CBC_SHA256",
        key_exchange: KeyExchangeKind::Rsa,
        cipher: BulkCipher::Aes,
        key_size: 32,
        block_mode: BlockMode::Cbc,
        mac: MacAlgorithm::Sha256,
    },
];

/// Server preference used when the configuration does not override it.
///
/// The 128-bit suites are supported but not offered by default.
pub const DEFAULT_PREFERENCE: [CipherSuite; 2] = [
    CipherSuite::RsaWithAes256CbcSha256,
    CipherSuite::RsaWithAes256CbcSha,
];

/// Look up the descriptor for a wire suite identifier.
pub fn lookup(suite_id: u16) -> Option<&'static CipherSuiteDescriptor> {
    CIPHER_SUITES.iter().find(|d| d.suite.to_u16() == suite_id)
}

/// Pick the first suite in `preference` that the peer offered.
///
/// Server order wins; `None` means there is no overlap.
pub fn negotiate(preference: &[CipherSuite], offered: &[u16]) -> Option<CipherSuite> {
    preference
        .iter()
        .copied()
        .find(|suite| offered.contains(&suite.to_u16()))
}
