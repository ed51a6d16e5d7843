//! Hash function interface.

/// Hash algorithms used by TLS 1.2 record MACs and the PRF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    /// MD5 (16 bytes output), only reachable through legacy MAC selection
    Md5,
    /// SHA-1 (20 bytes output)
    Sha1,
    /// SHA-256 (32 bytes output)
    Sha256,
    /// SHA-384 (48 bytes output)
    Sha384,
    /// SHA-512 (64 bytes output)
    Sha512,
}

impl HashAlgorithm {
    /// Get the output size in bytes for this hash algorithm.
    pub const fn output_size(self) -> usize {
        match self {
            HashAlgorithm::Md5 => 16,
            HashAlgorithm::Sha1 => 20,
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 => 64,
        }
    }

    /// Get the name of this algorithm.
    pub const fn name(self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "MD5",
            HashAlgorithm::Sha1 => "SHA-1",
            HashAlgorithm::Sha256 => "SHA-256",
            HashAlgorithm::Sha384 => "SHA-384",
            HashAlgorithm::Sha512 => "SHA-512",
        }
    }
}

/// Hash function trait.
///
/// Besides the usual streaming interface, a hash can report the digest of
/// everything absorbed so far without being consumed. The handshake
/// transcript relies on this to verify a peer's Finished message and keep
/// hashing afterwards.
///
/// # Example
///
/// ```rust,ignore
/// use tlse_crypto::Hash;
///
/// fn hash_example(mut hash: Box<dyn Hash>) -> (Vec<u8>, Vec<u8>) {
///     hash.update(b"Hello, ");
///     let partial = hash.snapshot();
///     hash.update(b"world!");
///     (partial, hash.finalize())
/// }
/// ```
pub trait Hash: Send {
    /// Update the hash state with more data.
    fn update(&mut self, data: &[u8]);

    /// Finalize the hash and return the digest.
    ///
    /// This consumes the hash state.
    fn finalize(self: Box<Self>) -> Vec<u8>;

    /// Digest of the data absorbed so far, leaving the state untouched.
    fn snapshot(&self) -> Vec<u8>;

    /// Get the output size in bytes for this hash function.
    fn output_size(&self) -> usize {
        self.algorithm().output_size()
    }

    /// Get the algorithm this hash implements.
    fn algorithm(&self) -> HashAlgorithm;
}
