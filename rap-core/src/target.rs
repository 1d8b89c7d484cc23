//! The register backend contract.

use crate::error::TargetError;
use crate::generic;
use crate::{Address, Data};

/// A device or model exposing addressable registers.
///
/// Only [`read`](RegisterTarget::read) and [`write`](RegisterTarget::write)
/// are required. Every compound operation defaults to its decomposition into
/// those two primitives (see [`crate::generic`]); backends that can do better
/// override them.
pub trait RegisterTarget: Send + Sync {
    type Error: std::error::Error + From<TargetError> + Send + Sync + 'static;

    fn read(&self, address: Address) -> Result<Data, Self::Error>;

    fn write(&self, address: Address, data: Data) -> Result<(), Self::Error>;

    /// Replaces the bits selected by `mask` with the matching bits of `data`.
    fn read_modify_write(&self, address: Address, data: Data, mask: Data) -> Result<(), Self::Error> {
        generic::read_modify_write(self, address, data, mask)
    }

    /// Reads `out.len()` words starting at `start`, stepping the address by
    /// `increment` between elements.
    fn seq_read(&self, start: Address, out: &mut [Data], increment: u64) -> Result<(), Self::Error> {
        generic::seq_read(self, start, out, increment)
    }

    fn seq_write(&self, start: Address, data: &[Data], increment: u64) -> Result<(), Self::Error> {
        generic::seq_write(self, start, data, increment)
    }

    /// Reads `out.len()` words from a single address.
    fn fifo_read(&self, address: Address, out: &mut [Data]) -> Result<(), Self::Error> {
        generic::fifo_read(self, address, out)
    }

    fn fifo_write(&self, address: Address, data: &[Data]) -> Result<(), Self::Error> {
        generic::fifo_write(self, address, data)
    }

    /// Reads one word per address. `out` must be as long as `addresses`.
    fn comp_read(&self, addresses: &[Address], out: &mut [Data]) -> Result<(), Self::Error> {
        generic::comp_read(self, addresses, out)
    }

    fn comp_write(&self, pairs: &[(Address, Data)]) -> Result<(), Self::Error> {
        generic::comp_write(self, pairs)
    }
}
