//! Transport error types.

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("receive timed out")]
    Timeout,

    #[error("transport closed")]
    Closed,

    #[error("message of {size} bytes exceeds maximum of {max}")]
    Oversized { size: usize, max: usize },

    #[error("no peer to reply to")]
    NoPeer,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl TransportError {
    /// Maps socket read errors, turning read-timeout kinds into
    /// [`TransportError::Timeout`].
    pub(crate) fn from_read(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => TransportError::Timeout,
            _ => TransportError::Io(err),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_error_mapping() {
        let err = TransportError::from_read(io::Error::from(io::ErrorKind::WouldBlock));
        assert!(err.is_timeout());
        let err = TransportError::from_read(io::Error::from(io::ErrorKind::TimedOut));
        assert!(err.is_timeout());
        let err = TransportError::from_read(io::Error::from(io::ErrorKind::ConnectionRefused));
        assert!(matches!(err, TransportError::Io(_)));
    }

    #[test]
    fn test_display() {
        let err = TransportError::Oversized { size: 2000, max: 1452 };
        assert_eq!(err.to_string(), "message of 2000 bytes exceeds maximum of 1452");
    }
}
