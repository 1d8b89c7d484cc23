//! In-memory register file.

use crate::error::TargetError;
use crate::generic::merge;
use crate::target::RegisterTarget;
use crate::{Address, Data};
use parking_lot::RwLock;
use rap_protocol::Profile;
use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

/// A sparse register file covering `[base, base + size)`.
///
/// Registers that were never written read as zero. Written values are masked
/// to the configured data width.
pub struct MemoryTarget {
    base: Address,
    size: u64,
    data_mask: Data,
    read_only: Vec<Range<Address>>,
    registers: RwLock<BTreeMap<Address, Data>>,
    reads: AtomicU64,
    writes: AtomicU64,
}

impl MemoryTarget {
    pub fn new(base: Address, size: u64) -> Self {
        Self {
            base,
            size,
            data_mask: Data::MAX,
            read_only: Vec::new(),
            registers: RwLock::new(BTreeMap::new()),
            reads: AtomicU64::new(0),
            writes: AtomicU64::new(0),
        }
    }

    /// A register file whose words are as wide as the profile's data field.
    pub fn for_profile(profile: &Profile, base: Address, size: u64) -> Self {
        Self::new(base, size).with_data_bits(profile.data.bits)
    }

    pub fn with_data_bits(mut self, bits: u8) -> Self {
        self.data_mask = if bits >= 64 {
            Data::MAX
        } else {
            (1 << bits) - 1
        };
        self
    }

    pub fn with_read_only(mut self, range: Range<Address>) -> Self {
        self.read_only.push(range);
        self
    }

    /// Sets a register without window or read-only checks.
    pub fn preload(&self, address: Address, data: Data) {
        self.registers.write().insert(address, data & self.data_mask);
    }

    /// Current value of a register without counting an access.
    pub fn peek(&self, address: Address) -> Data {
        self.registers.read().get(&address).copied().unwrap_or(0)
    }

    /// Number of primitive reads served.
    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Number of primitive writes accepted.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    fn check_window(&self, address: Address) -> Result<(), TargetError> {
        let offset = address.wrapping_sub(self.base);
        if address < self.base || offset >= self.size {
            return Err(TargetError::OutOfRange(address));
        }
        Ok(())
    }

    fn check_writable(&self, address: Address) -> Result<(), TargetError> {
        self.check_window(address)?;
        if self.read_only.iter().any(|range| range.contains(&address)) {
            return Err(TargetError::ReadOnly(address));
        }
        Ok(())
    }
}

impl RegisterTarget for MemoryTarget {
    type Error = TargetError;

    fn read(&self, address: Address) -> Result<Data, TargetError> {
        self.check_window(address)?;
        self.reads.fetch_add(1, Ordering::Relaxed);
        let value = self.peek(address);
        trace!(address, value, "register read");
        Ok(value)
    }

    fn write(&self, address: Address, data: Data) -> Result<(), TargetError> {
        self.check_writable(address)?;
        self.writes.fetch_add(1, Ordering::Relaxed);
        trace!(address, data, "register write");
        self.registers.write().insert(address, data & self.data_mask);
        Ok(())
    }

    fn read_modify_write(&self, address: Address, data: Data, mask: Data) -> Result<(), TargetError> {
        self.check_writable(address)?;
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.writes.fetch_add(1, Ordering::Relaxed);
        let mut registers = self.registers.write();
        let slot = registers.entry(address).or_insert(0);
        *slot = merge(*slot, data, mask) & self.data_mask;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_unwritten_reads_zero() {
        let target = MemoryTarget::new(0x1000, 0x100);
        assert_eq!(target.read(0x1000).unwrap(), 0);
        assert_eq!(target.read_count(), 1);
    }

    #[test]
    fn test_window_bounds() {
        let target = MemoryTarget::new(0x1000, 0x100);
        assert!(target.write(0x10FF, 1).is_ok());
        assert_eq!(target.read(0x1100), Err(TargetError::OutOfRange(0x1100)));
        assert_eq!(target.write(0xFFF, 1), Err(TargetError::OutOfRange(0xFFF)));
    }

    #[test]
    fn test_read_only_range() {
        let target = MemoryTarget::new(0, 0x100).with_read_only(0x10..0x20);
        target.preload(0x10, 7);
        assert_eq!(target.write(0x10, 1), Err(TargetError::ReadOnly(0x10)));
        assert_eq!(target.read(0x10).unwrap(), 7);
        assert!(target.read_modify_write(0x1F, 1, 1).is_err());
        assert!(target.write(0x20, 1).is_ok());
    }

    #[test]
    fn test_data_width_mask() {
        let target = MemoryTarget::for_profile(&Profile::example(), 0, 16);
        target.write(0, 0x1_2345_6789).unwrap();
        assert_eq!(target.read(0).unwrap(), 0x2345_6789);
    }

    #[test]
    fn test_rmw_in_place() {
        let target = MemoryTarget::new(0, 16);
        target.write(4, 0xFF00).unwrap();
        target.read_modify_write(4, 0x00AB, 0x00FF).unwrap();
        assert_eq!(target.peek(4), 0xFFAB);
        assert_eq!(target.write_count(), 2);
    }

    #[test]
    fn test_compound_defaults() {
        let target = MemoryTarget::new(0, 64);
        target.seq_write(0, &[1, 2, 3], 4).unwrap();
        let mut out = [0; 3];
        target.comp_read(&[8, 4, 0], &mut out).unwrap();
        assert_eq!(out, [3, 2, 1]);

        target.fifo_write(60, &[9; 16]).unwrap();
        assert_eq!(target.write_count(), 3 + 16);
    }

    proptest! {
        #[test]
        fn prop_write_then_read(address in 0u64..256, data in any::<u64>()) {
            let target = MemoryTarget::new(0, 256).with_data_bits(32);
            target.write(address, data).unwrap();
            prop_assert_eq!(target.read(address).unwrap(), data & 0xFFFF_FFFF);
        }
    }
}
