//! Client error types.

use rap_core::TargetError;
use rap_protocol::{Data, ProtocolError};
use rap_transport::TransportError;
use thiserror::Error;

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("register error: {0}")]
    Target(#[from] TargetError),

    #[error("transaction id mismatch: sent {expected}, received {actual}")]
    TransactionMismatch { expected: u8, actual: u8 },

    #[error("operation rejected by server with status {status:#x}")]
    Rejected { status: Data },

    #[error("unexpected response {actual:#04x} (expected {expected:#04x})")]
    UnexpectedResponse { expected: u8, actual: u8 },

    #[error("response carries {actual} words, requested {expected}")]
    CountMismatch { expected: usize, actual: usize },
}

impl ClientError {
    /// Returns whether repeating the operation may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Transport(TransportError::Timeout) => true,
            ClientError::Protocol(e) => e.is_malformed(),
            ClientError::TransactionMismatch { .. } => true,
            _ => false,
        }
    }

    /// Status code returned by the server, if it rejected the operation.
    pub fn status(&self) -> Option<Data> {
        match self {
            ClientError::Rejected { status } => Some(*status),
            _ => None,
        }
    }
}
