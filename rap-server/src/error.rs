//! Server error types.

use thiserror::Error;

/// Server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] rap_protocol::ProtocolError),

    #[error("transport error: {0}")]
    Transport(#[from] rap_transport::TransportError),

    #[error("server worker panicked")]
    WorkerPanicked,
}
