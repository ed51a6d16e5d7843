//! Messages with an empty body: HelloRequest and ServerHelloDone.

use crate::error::{Error, Result};

fn expect_empty(data: &[u8], what: &str) -> Result<()> {
    if data.is_empty() {
        Ok(())
    } else {
        Err(Error::DecodeError(format!(
            "{} must be empty, got {} bytes",
            what,
            data.len()
        )))
    }
}

/// HelloRequest (RFC 5246 Section 7.4.1.1). `struct { } HelloRequest;`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HelloRequest;

impl HelloRequest {
    /// Decode the (empty) body.
    pub fn decode(data: &[u8]) -> Result<Self> {
        expect_empty(data, "HelloRequest")?;
        Ok(Self)
    }
}

/// ServerHelloDone (RFC 5246 Section 7.4.5). `struct { } ServerHelloDone;`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServerHelloDone;

impl ServerHelloDone {
    /// Decode the (empty) body.
    pub fn decode(data: &[u8]) -> Result<Self> {
        expect_empty(data, "ServerHelloDone")?;
        Ok(Self)
    }
}
