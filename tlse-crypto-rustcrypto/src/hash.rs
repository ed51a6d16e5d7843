//! Hash function implementations using the RustCrypto `sha1`, `sha2` and
//! `md-5` crates.

use sha2::Digest;
use tlse_crypto::{Hash, HashAlgorithm};

/// Create a hash instance for the specified algorithm.
pub fn create_hash(algorithm: HashAlgorithm) -> Box<dyn Hash> {
    match algorithm {
        HashAlgorithm::Md5 => Box::new(DigestHash::<md5::Md5>::new(algorithm)),
        HashAlgorithm::Sha1 => Box::new(DigestHash::<sha1::Sha1>::new(algorithm)),
        HashAlgorithm::Sha256 => Box::new(DigestHash::<sha2::Sha256>::new(algorithm)),
        HashAlgorithm::Sha384 => Box::new(DigestHash::<sha2::Sha384>::new(algorithm)),
        HashAlgorithm::Sha512 => Box::new(DigestHash::<sha2::Sha512>::new(algorithm)),
    }
}

/// Any RustCrypto digest behind the provider [`Hash`] trait.
///
/// Snapshots finalize a clone of the running state, so the original keeps
/// absorbing data.
struct DigestHash<D> {
    hasher: D,
    algorithm: HashAlgorithm,
}

impl<D: Digest> DigestHash<D> {
    fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            hasher: D::new(),
            algorithm,
        }
    }
}

impl<D> Hash for DigestHash<D>
where
    D: Digest + Clone + Send + 'static,
{
    fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.hasher, data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.hasher.finalize().to_vec()
    }

    fn snapshot(&self) -> Vec<u8> {
        self.hasher.clone().finalize().to_vec()
    }

    fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }
}
