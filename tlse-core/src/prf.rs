//! TLS 1.2 PRF and key schedule - RFC 5246 Sections 5, 6.3, 8.1
//!
//! PRF(secret, label, seed) = P_<hash>(secret, label + seed)
//!
//! P_hash(secret, seed) = HMAC_hash(secret, A(1) + seed) +
//!                        HMAC_hash(secret, A(2) + seed) + ...
//!
//! A(0) = seed
//! A(i) = HMAC_hash(secret, A(i-1))
//!
//! On top of the PRF this module derives the master secret, the key block
//! and Finished verify data, and splits the key block between the two
//! directions of a connection.

use tlse_crypto::{CryptoProvider, HashAlgorithm};
use zeroize::Zeroizing;

use crate::error::{Error, Result};
use crate::protocol::Role;

/// Length of the master secret in bytes.
pub const MASTER_SECRET_LENGTH: usize = 48;

/// Length of Finished verify data in bytes.
pub const VERIFY_DATA_LENGTH: usize = 12;

/// Label for the master secret derivation.
pub const LABEL_MASTER_SECRET: &[u8] = b"master secret";
/// Label for the key block derivation.
pub const LABEL_KEY_EXPANSION: &[u8] = b"key expansion";
/// Label for the client's Finished verify data.
pub const LABEL_CLIENT_FINISHED: &[u8] = b"client finished";
/// Label for the server's Finished verify data.
pub const LABEL_SERVER_FINISHED: &[u8] = b"server finished";

/// TLS 1.2 PRF over a provider HMAC.
pub struct Tls12Prf<'a> {
    provider: &'a dyn CryptoProvider,
    hash_algorithm: HashAlgorithm,
}

impl<'a> Tls12Prf<'a> {
    /// Create a new TLS 1.2 PRF with the specified hash algorithm.
    pub fn new(provider: &'a dyn CryptoProvider, hash_algorithm: HashAlgorithm) -> Self {
        Self {
            provider,
            hash_algorithm,
        }
    }

    /// Expand `secret` into `output_len` bytes.
    ///
    /// # Arguments
    /// * `secret` - The secret key material
    /// * `label` - ASCII label (e.g. "master secret", "key expansion")
    /// * `seed` - Seed data
    /// * `output_len` - Desired output length in bytes
    pub fn compute(
        &self,
        secret: &[u8],
        label: &[u8],
        seed: &[u8],
        output_len: usize,
    ) -> Result<Zeroizing<Vec<u8>>> {
        let mut label_seed = Vec::with_capacity(label.len() + seed.len());
        label_seed.extend_from_slice(label);
        label_seed.extend_from_slice(seed);

        let mut output = Zeroizing::new(Vec::with_capacity(output_len));

        // A(0) = label + seed
        let mut a = Zeroizing::new(label_seed.clone());

        while output.len() < output_len {
            // A(i) = HMAC_hash(secret, A(i-1))
            a = Zeroizing::new(self.hmac(secret, &[&a])?);

            // HMAC_hash(secret, A(i) + label_seed)
            let block = Zeroizing::new(self.hmac(secret, &[&a, &label_seed])?);

            let take = (output_len - output.len()).min(block.len());
            output.extend_from_slice(&block[..take]);
        }

        Ok(output)
    }

    fn hmac(&self, key: &[u8], parts: &[&[u8]]) -> Result<Vec<u8>> {
        let mut hmac = self.provider.hmac(self.hash_algorithm, key)?;
        for part in parts {
            hmac.update(part);
        }
        Ok(hmac.finalize())
    }
}

/// PRF shorthand used by the handshake.
pub fn derive_key(
    provider: &dyn CryptoProvider,
    hash_algorithm: HashAlgorithm,
    secret: &[u8],
    label: &[u8],
    seed: &[u8],
    length: usize,
) -> Result<Zeroizing<Vec<u8>>> {
    Tls12Prf::new(provider, hash_algorithm).compute(secret, label, seed, length)
}

/// Compute the master secret from the pre-master secret.
///
/// master_secret = PRF(pre_master_secret, "master secret",
///                     ClientHello.random + ServerHello.random)[0..47]
pub fn compute_master_secret(
    provider: &dyn CryptoProvider,
    hash_algorithm: HashAlgorithm,
    pre_master_secret: &[u8],
    client_random: &[u8; 32],
    server_random: &[u8; 32],
) -> Result<Zeroizing<Vec<u8>>> {
    let mut seed = [0u8; 64];
    seed[..32].copy_from_slice(client_random);
    seed[32..].copy_from_slice(server_random);

    derive_key(
        provider,
        hash_algorithm,
        pre_master_secret,
        LABEL_MASTER_SECRET,
        &seed,
        MASTER_SECRET_LENGTH,
    )
}

/// Compute the key block from the master secret.
///
/// key_block = PRF(master_secret, "key expansion",
///                 server_random + client_random)
///
/// Note the seed order is the reverse of the master secret derivation.
pub fn compute_key_block(
    provider: &dyn CryptoProvider,
    hash_algorithm: HashAlgorithm,
    master_secret: &[u8],
    client_random: &[u8; 32],
    server_random: &[u8; 32],
    length: usize,
) -> Result<Zeroizing<Vec<u8>>> {
    if master_secret.len() != MASTER_SECRET_LENGTH {
        return Err(Error::InternalError(format!(
            "master secret must be {} bytes, got {}",
            MASTER_SECRET_LENGTH,
            master_secret.len()
        )));
    }

    let mut seed = [0u8; 64];
    seed[..32].copy_from_slice(server_random);
    seed[32..].copy_from_slice(client_random);

    derive_key(
        provider,
        hash_algorithm,
        master_secret,
        LABEL_KEY_EXPANSION,
        &seed,
        length,
    )
}

/// Compute Finished verify data.
///
/// verify_data = PRF(master_secret, finished_label, Hash(handshake_messages))[0..11]
pub fn compute_verify_data(
    provider: &dyn CryptoProvider,
    hash_algorithm: HashAlgorithm,
    master_secret: &[u8],
    label: &[u8],
    transcript_hash: &[u8],
) -> Result<[u8; VERIFY_DATA_LENGTH]> {
    let out = derive_key(
        provider,
        hash_algorithm,
        master_secret,
        label,
        transcript_hash,
        VERIFY_DATA_LENGTH,
    )?;
    let mut verify_data = [0u8; VERIFY_DATA_LENGTH];
    verify_data.copy_from_slice(&out);
    Ok(verify_data)
}

/// MAC key, encryption key and IV for one direction of traffic.
#[derive(Clone)]
pub struct DirectionalKeys {
    /// HMAC key
    pub mac_key: Zeroizing<Vec<u8>>,
    /// Cipher key
    pub key: Zeroizing<Vec<u8>>,
    /// CBC IV
    pub iv: Zeroizing<Vec<u8>>,
}

impl core::fmt::Debug for DirectionalKeys {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DirectionalKeys")
            .field("mac_key_len", &self.mac_key.len())
            .field("key_len", &self.key.len())
            .field("iv_len", &self.iv.len())
            .finish()
    }
}

/// The key block split into its six parts.
///
/// ```text
/// client_write_MAC_key[mac_len]
/// server_write_MAC_key[mac_len]
/// client_write_key[key_len]
/// server_write_key[key_len]
/// client_write_IV[iv_len]
/// server_write_IV[iv_len]
/// ```
#[derive(Debug, Clone)]
pub struct KeyBlock {
    /// Keys protecting client-to-server traffic
    pub client_write: DirectionalKeys,
    /// Keys protecting server-to-client traffic
    pub server_write: DirectionalKeys,
}

impl KeyBlock {
    /// Split raw key block bytes.
    pub fn split(block: &[u8], mac_len: usize, key_len: usize, iv_len: usize) -> Result<Self> {
        let expected = 2 * (mac_len + key_len + iv_len);
        if block.len() != expected {
            return Err(Error::InternalError(format!(
                "key block must be {} bytes, got {}",
                expected,
                block.len()
            )));
        }

        let mut offset = 0;
        let mut take = |len: usize| {
            let part = Zeroizing::new(block[offset..offset + len].to_vec());
            offset += len;
            part
        };

        let client_mac = take(mac_len);
        let server_mac = take(mac_len);
        let client_key = take(key_len);
        let server_key = take(key_len);
        let client_iv = take(iv_len);
        let server_iv = take(iv_len);

        Ok(Self {
            client_write: DirectionalKeys {
                mac_key: client_mac,
                key: client_key,
                iv: client_iv,
            },
            server_write: DirectionalKeys {
                mac_key: server_mac,
                key: server_key,
                iv: server_iv,
            },
        })
    }

    /// Assign the halves to `(local, remote)` for the given role.
    ///
    /// A server writes with the server keys and reads with the client keys;
    /// a client does the opposite.
    pub fn into_local_remote(self, role: Role) -> Result<(DirectionalKeys, DirectionalKeys)> {
        match role {
            Role::Server => Ok((self.server_write, self.client_write)),
            Role::Client => Ok((self.client_write, self.server_write)),
            Role::AutoDetect => Err(Error::InternalError(
                "cannot assign keys before the role is known".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hmac::{Hmac, Mac};
    use tlse_crypto_rustcrypto::RustCryptoProvider;

    fn provider() -> RustCryptoProvider {
        <RustCryptoProvider as CryptoProvider>::new()
    }

    /// P_SHA256 written directly against the `hmac` crate.
    fn reference_p_sha256(secret: &[u8], label_seed: &[u8], len: usize) -> Vec<u8> {
        let mac = |parts: &[&[u8]]| {
            let mut m = <Hmac<sha2::Sha256> as Mac>::new_from_slice(secret).unwrap();
            for p in parts {
                m.update(p);
            }
            m.finalize().into_bytes().to_vec()
        };
        let mut out = Vec::new();
        let mut a = label_seed.to_vec();
        while out.len() < len {
            a = mac(&[&a]);
            out.extend(mac(&[&a, label_seed]));
        }
        out.truncate(len);
        out
    }

    #[test]
    fn test_prf_sha256_published_vector() {
        let secret = hex::decode("9bbe436ba940f017b17652849a71db35").unwrap();
        let seed = hex::decode("a0ba9f936cda311827a6f796ffd5198c").unwrap();
        let expected = "e3f229ba727be17b8d122620557cd453c2aab21d07c3d495329b52d4e61edb5a\
                        6b301791e90d35c9c9a46b4e14baf9af0fa022f7077def17abfd3797c0564bab\
                        4fbc91666e9def9b97fce34f796789baa48082d122ee42c5a72e5a5110fff701\
                        87347b66";

        let p = provider();
        let out = derive_key(&p, HashAlgorithm::Sha256, &secret, b"test label", &seed, 100).unwrap();
        assert_eq!(hex::encode(&out[..]), expected);
    }

    #[test]
    fn test_prf_matches_reference_chain() {
        let p = provider();
        let secret = [0x0bu8; 48];
        let seed = [0x5au8; 64];
        for len in [1usize, 12, 31, 32, 33, 48, 104, 160] {
            let ours = derive_key(&p, HashAlgorithm::Sha256, &secret, b"key expansion", &seed, len)
                .unwrap();
            let mut label_seed = b"key expansion".to_vec();
            label_seed.extend_from_slice(&seed);
            assert_eq!(&ours[..], &reference_p_sha256(&secret, &label_seed, len)[..]);
        }
    }

    #[test]
    fn test_prf_is_deterministic_and_prefix_stable() {
        let p = provider();
        let a = derive_key(&p, HashAlgorithm::Sha256, b"s", b"l", b"seed", 40).unwrap();
        let b = derive_key(&p, HashAlgorithm::Sha256, b"s", b"l", b"seed", 40).unwrap();
        let c = derive_key(&p, HashAlgorithm::Sha256, b"s", b"l", b"seed", 70).unwrap();
        assert_eq!(a, b);
        assert_eq!(&a[..], &c[..40]);
    }

    #[test]
    fn test_master_secret_and_key_block_seed_order() {
        let p = provider();
        let pms = [0x03u8; 48];
        let cr = [0x11u8; 32];
        let sr = [0x22u8; 32];

        let ms = compute_master_secret(&p, HashAlgorithm::Sha256, &pms, &cr, &sr).unwrap();
        assert_eq!(ms.len(), MASTER_SECRET_LENGTH);

        let mut seed = cr.to_vec();
        seed.extend_from_slice(&sr);
        let manual = derive_key(&p, HashAlgorithm::Sha256, &pms, b"master secret", &seed, 48)
            .unwrap();
        assert_eq!(ms, manual);

        let kb = compute_key_block(&p, HashAlgorithm::Sha256, &ms, &cr, &sr, 160).unwrap();
        let mut seed = sr.to_vec();
        seed.extend_from_slice(&cr);
        let manual = derive_key(&p, HashAlgorithm::Sha256, &ms, b"key expansion", &seed, 160)
            .unwrap();
        assert_eq!(kb, manual);
    }

    #[test]
    fn test_key_block_rejects_short_master_secret() {
        let p = provider();
        let result = compute_key_block(&p, HashAlgorithm::Sha256, &[0u8; 47], &[0; 32], &[0; 32], 10);
        assert!(matches!(result, Err(Error::InternalError(_))));
    }

    #[test]
    fn test_key_block_split_layout() {
        let block: Vec<u8> = (0u8..104).collect();
        let kb = KeyBlock::split(&block, 20, 16, 16).unwrap();

        assert_eq!(&kb.client_write.mac_key[..], &block[0..20]);
        assert_eq!(&kb.server_write.mac_key[..], &block[20..40]);
        assert_eq!(&kb.client_write.key[..], &block[40..56]);
        assert_eq!(&kb.server_write.key[..], &block[56..72]);
        assert_eq!(&kb.client_write.iv[..], &block[72..88]);
        assert_eq!(&kb.server_write.iv[..], &block[88..104]);

        assert!(KeyBlock::split(&block[..100], 20, 16, 16).is_err());
    }

    #[test]
    fn test_role_assignment_is_mirrored() {
        let block: Vec<u8> = (0u8..160).collect();

        let (s_local, s_remote) = KeyBlock::split(&block, 32, 32, 16)
            .unwrap()
            .into_local_remote(Role::Server)
            .unwrap();
        let (c_local, c_remote) = KeyBlock::split(&block, 32, 32, 16)
            .unwrap()
            .into_local_remote(Role::Client)
            .unwrap();

        assert_eq!(s_local.mac_key, c_remote.mac_key);
        assert_eq!(s_local.key, c_remote.key);
        assert_eq!(s_local.iv, c_remote.iv);
        assert_eq!(s_remote.key, c_local.key);

        let kb = KeyBlock::split(&block, 32, 32, 16).unwrap();
        assert!(kb.into_local_remote(Role::AutoDetect).is_err());
    }

    #[test]
    fn test_verify_data_labels_differ() {
        let p = provider();
        let ms = [0x44u8; 48];
        let hash = [0x99u8; 32];
        let client =
            compute_verify_data(&p, HashAlgorithm::Sha256, &ms, LABEL_CLIENT_FINISHED, &hash)
                .unwrap();
        let server =
            compute_verify_data(&p, HashAlgorithm::Sha256, &ms, LABEL_SERVER_FINISHED, &hash)
                .unwrap();
        assert_ne!(client, server);
    }
}
