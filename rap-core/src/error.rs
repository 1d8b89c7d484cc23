//! Register backend error types.

use crate::Address;
use thiserror::Error;

/// Errors raised by register backends.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetError {
    #[error("address {0:#x} is outside the register window")]
    OutOfRange(Address),

    #[error("register {0:#x} is read-only")]
    ReadOnly(Address),

    #[error("{addresses} addresses but room for {data} data words")]
    LengthMismatch { addresses: usize, data: usize },

    #[error("backend fault: {0}")]
    Fault(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_error_display() {
        assert_eq!(
            TargetError::OutOfRange(0x1000).to_string(),
            "address 0x1000 is outside the register window"
        );
        let err = TargetError::LengthMismatch {
            addresses: 3,
            data: 2,
        };
        assert!(err.to_string().contains("3 addresses"));
    }
}
