//! Finished message (RFC 5246 Section 7.4.9).

use crate::error::{Error, Result};
use crate::prf::VERIFY_DATA_LENGTH;

/// Finished message.
///
/// ```text
/// struct {
///     opaque verify_data[verify_data_length];
/// } Finished;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Finished {
    /// PRF output over the handshake transcript
    pub verify_data: [u8; VERIFY_DATA_LENGTH],
}

impl Finished {
    /// Wrap verify data.
    pub fn new(verify_data: [u8; VERIFY_DATA_LENGTH]) -> Self {
        Self { verify_data }
    }

    /// Encode the message body.
    pub fn encode(&self) -> Vec<u8> {
        self.verify_data.to_vec()
    }

    /// Decode a Finished body, which must be exactly 12 bytes.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let verify_data: [u8; VERIFY_DATA_LENGTH] = data.try_into().map_err(|_| {
            Error::DecodeError(format!(
                "Finished must be {} bytes, got {}",
                VERIFY_DATA_LENGTH,
                data.len()
            ))
        })?;
        Ok(Self { verify_data })
    }
}
