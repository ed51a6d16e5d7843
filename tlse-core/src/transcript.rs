//! Handshake transcript hash for TLS 1.2.
//!
//! A running digest over every handshake envelope sent or received, used to
//! compute Finished verify data. Two operations matter:
//! - `snapshot()` reads the digest so far and keeps hashing (used to check
//!   the peer's Finished before it is itself added);
//! - `update()` absorbs another envelope.

use core::fmt;

use tlse_crypto::{CryptoProvider, Hash, HashAlgorithm};

use crate::error::Result;

/// Running handshake transcript.
///
/// The hash object is created lazily on first use and dropped by
/// [`HandshakeTranscript::finish`] / [`HandshakeTranscript::reset`].
///
/// # Example
/// ```rust,ignore
/// let mut transcript = HandshakeTranscript::new(HashAlgorithm::Sha256);
/// transcript.update(&provider, &client_hello_envelope)?;
/// let so_far = transcript.snapshot(&provider)?;
/// transcript.update(&provider, &finished_envelope)?;
/// let final_hash = transcript.finish(&provider)?;
/// ```
pub struct HandshakeTranscript {
    algorithm: HashAlgorithm,
    hasher: Option<Box<dyn Hash>>,
    messages: usize,
}

impl HandshakeTranscript {
    /// Create an empty transcript.
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm,
            hasher: None,
            messages: 0,
        }
    }

    /// Get the hash algorithm being used.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Number of envelopes absorbed since the last reset.
    pub fn message_count(&self) -> usize {
        self.messages
    }

    /// Absorb an encoded handshake envelope (4-byte header included).
    pub fn update(&mut self, provider: &dyn CryptoProvider, envelope: &[u8]) -> Result<()> {
        if self.hasher.is_none() {
            self.hasher = Some(provider.hash(self.algorithm)?);
        }
        if let Some(hasher) = self.hasher.as_mut() {
            hasher.update(envelope);
        }
        self.messages += 1;
        Ok(())
    }

    /// Digest of everything absorbed so far. The transcript is unchanged.
    pub fn snapshot(&self, provider: &dyn CryptoProvider) -> Result<Vec<u8>> {
        match &self.hasher {
            Some(hasher) => Ok(hasher.snapshot()),
            None => Ok(provider.hash(self.algorithm)?.finalize()),
        }
    }

    /// Final digest; the transcript is cleared afterwards.
    pub fn finish(&mut self, provider: &dyn CryptoProvider) -> Result<Vec<u8>> {
        self.messages = 0;
        match self.hasher.take() {
            Some(hasher) => Ok(hasher.finalize()),
            None => Ok(provider.hash(self.algorithm)?.finalize()),
        }
    }

    /// Drop all state.
    pub fn reset(&mut self) {
        self.hasher = None;
        self.messages = 0;
    }
}

impl fmt::Debug for HandshakeTranscript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandshakeTranscript")
            .field("algorithm", &self.algorithm)
            .field("messages", &self.messages)
            .finish()
    }
}
