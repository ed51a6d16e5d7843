//! Cryptographically secure random number generation using the OS RNG.

use rand::RngCore;
use tlse_crypto::{Error, Random, Result};

/// Random number generator backed by `rand::rngs::OsRng`.
#[derive(Debug, Clone, Copy)]
pub struct OsRandom;

impl Random for OsRandom {
    fn fill(&self, dest: &mut [u8]) -> Result<()> {
        rand::rngs::OsRng
            .try_fill_bytes(dest)
            .map_err(|_| Error::RandomGenerationFailed)
    }
}
