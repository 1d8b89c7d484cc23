//! Protocol error types.

use thiserror::Error;

/// Protocol-level errors that can occur while encoding or decoding messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("message too short: {len} bytes (min {min})")]
    TooShort { len: usize, min: usize },

    #[error("CRC mismatch: expected {expected:#x}, got {actual:#x}")]
    CrcMismatch { expected: u32, actual: u32 },

    #[error("malformed message: {0}")]
    Malformed(&'static str),

    #[error("unexpected message type: {0:#04x}")]
    UnexpectedMessageType(u8),

    #[error("element count {count} exceeds transport limit of {max}")]
    SizeExceeded { count: u64, max: u64 },

    #[error("invalid profile: {0}")]
    InvalidProfile(String),

    #[error("max message size {size} is below the protocol minimum of {min}")]
    MessageSizeTooSmall { size: usize, min: usize },
}

impl ProtocolError {
    /// Returns whether the error means the received bytes are not a valid
    /// message (short, corrupted, or structurally inconsistent).
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            ProtocolError::TooShort { .. }
                | ProtocolError::CrcMismatch { .. }
                | ProtocolError::Malformed(_)
        )
    }
}
