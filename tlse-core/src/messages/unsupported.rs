//! Handshake messages that are registered but not implemented.
//!
//! ServerKeyExchange, CertificateRequest and CertificateVerify belong to
//! (EC)DHE key exchange and client authentication. They decode to an error
//! and cannot be encoded, so a peer that sends one gets a fatal alert.

use crate::error::{Error, Result};

/// ServerKeyExchange placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerKeyExchange;

/// CertificateRequest placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CertificateRequest;

/// CertificateVerify placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CertificateVerify;

fn not_implemented<T>(name: &str) -> Result<T> {
    tracing::warn!(kind = name, "refusing unimplemented handshake message");
    Err(Error::DecodeError(format!("{} is not implemented", name)))
}

impl ServerKeyExchange {
    /// Always fails.
    pub fn decode(_data: &[u8]) -> Result<Self> {
        not_implemented("ServerKeyExchange")
    }
}

impl CertificateRequest {
    /// Always fails.
    pub fn decode(_data: &[u8]) -> Result<Self> {
        not_implemented("CertificateRequest")
    }
}

impl CertificateVerify {
    /// Always fails.
    pub fn decode(_data: &[u8]) -> Result<Self> {
        not_implemented("CertificateVerify")
    }
}
