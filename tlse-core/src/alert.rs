//! TLS alert protocol.

use crate::error::{AlertDescription, Error, Result};

/// Alert level (RFC 5246 Section 7.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AlertLevel {
    /// Warning (1) - logged, connection continues
    Warning = 1,

    /// Fatal (2) - connection is torn down
    Fatal = 2,
}

impl AlertLevel {
    /// Create from wire format (u8).
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(AlertLevel::Warning),
            2 => Some(AlertLevel::Fatal),
            _ => None,
        }
    }

    /// Convert to wire format (u8).
    pub const fn to_u8(self) -> u8 {
        self as u8
    }
}

/// TLS alert message.
///
/// ```text
/// struct {
///     AlertLevel level;
///     AlertDescription description;
/// } Alert;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alert {
    /// Alert level
    pub level: AlertLevel,

    /// Alert description
    pub description: AlertDescription,
}

impl Alert {
    /// Create a new alert.
    pub fn new(level: AlertLevel, description: AlertDescription) -> Self {
        Self { level, description }
    }

    /// Create a fatal alert.
    pub fn fatal(description: AlertDescription) -> Self {
        Self::new(AlertLevel::Fatal, description)
    }

    /// Create a warning alert.
    pub fn warning(description: AlertDescription) -> Self {
        Self::new(AlertLevel::Warning, description)
    }

    /// Create a close_notify alert.
    pub fn close_notify() -> Self {
        Self::warning(AlertDescription::CloseNotify)
    }

    /// Encode the alert to bytes.
    pub fn encode(&self) -> [u8; 2] {
        [self.level.to_u8(), self.description.to_u8()]
    }

    /// Decode an alert record body. The body must be exactly two bytes.
    ///
    /// Any description code is accepted; only the level is checked.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() != 2 {
            return Err(Error::DecodeError(format!(
                "alert body must be 2 bytes, got {}",
                data.len()
            )));
        }

        let level = AlertLevel::from_u8(data[0])
            .ok_or_else(|| Error::DecodeError(format!("invalid alert level {}", data[0])))?;

        Ok(Self {
            level,
            description: AlertDescription::from_wire(data[1]),
        })
    }

    /// Check if this alert is fatal.
    pub fn is_fatal(&self) -> bool {
        self.level == AlertLevel::Fatal
    }
}
