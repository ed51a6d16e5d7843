//! Cryptographically Secure Random Number Generator (CSPRNG) interface.

use crate::Result;

/// Random number generator trait.
///
/// # Security Requirements
///
/// - MUST be cryptographically secure
/// - MUST be seeded from an OS entropy source
///
/// # Example
///
/// ```rust,ignore
/// use tlse_crypto::Random;
///
/// fn generate_iv(rng: &dyn Random) -> Vec<u8> {
///     rng.generate(16).unwrap()
/// }
/// ```
pub trait Random: Send + Sync {
    /// Fill a buffer with random bytes.
    ///
    /// # Errors
    ///
    /// Returns error if random generation fails (e.g., OS RNG unavailable).
    fn fill(&self, dest: &mut [u8]) -> Result<()>;

    /// Generate a random byte vector of specified length.
    fn generate(&self, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.fill(&mut buf)?;
        Ok(buf)
    }

    /// Generate a random u32.
    fn next_u32(&self) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.fill(&mut buf)?;
        Ok(u32::from_be_bytes(buf))
    }
}
