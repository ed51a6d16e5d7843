//! HMAC (Hash-based Message Authentication Code) interface.

use crate::HashAlgorithm;

/// HMAC trait.
///
/// Provides HMAC computation for record authentication and the TLS PRF.
///
/// # Example
///
/// ```rust,ignore
/// use tlse_crypto::Hmac;
///
/// fn hmac_example(mut hmac: Box<dyn Hmac>) -> Vec<u8> {
///     hmac.update(b"message");
///     hmac.finalize()
/// }
/// ```
pub trait Hmac: Send {
    /// Update the HMAC state with more data.
    fn update(&mut self, data: &[u8]);

    /// Finalize the HMAC and return the authentication tag.
    ///
    /// This consumes the HMAC state.
    fn finalize(self: Box<Self>) -> Vec<u8>;

    /// Verify an HMAC tag in constant time.
    ///
    /// # Security
    ///
    /// This function MUST use constant-time comparison to prevent
    /// timing attacks.
    fn verify(self: Box<Self>, tag: &[u8]) -> bool {
        use subtle::ConstantTimeEq;
        let computed = self.finalize();
        computed.ct_eq(tag).into()
    }

    /// Get the output size in bytes for this HMAC.
    fn output_size(&self) -> usize {
        self.algorithm().output_size()
    }

    /// Get the hash algorithm used by this HMAC.
    fn algorithm(&self) -> HashAlgorithm;
}
