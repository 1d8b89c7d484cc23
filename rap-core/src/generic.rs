//! Compound operations expressed as single reads and writes.
//!
//! These are the default bodies of the [`RegisterTarget`] compound methods.
//! They are public so that an implementation overriding a method can still
//! fall back to the primitive decomposition for some inputs.

use crate::error::TargetError;
use crate::target::RegisterTarget;
use crate::{Address, Data};

/// Address of element `index` in a sequence starting at `start`.
pub fn element_address(start: Address, index: usize, increment: u64) -> Address {
    start.wrapping_add((index as u64).wrapping_mul(increment))
}

/// Merges `data` into `old` under `mask`.
pub fn merge(old: Data, data: Data, mask: Data) -> Data {
    (old & !mask) | (data & mask)
}

pub fn read_modify_write<T: RegisterTarget + ?Sized>(
    target: &T,
    address: Address,
    data: Data,
    mask: Data,
) -> Result<(), T::Error> {
    let old = target.read(address)?;
    target.write(address, merge(old, data, mask))
}

pub fn seq_read<T: RegisterTarget + ?Sized>(
    target: &T,
    start: Address,
    out: &mut [Data],
    increment: u64,
) -> Result<(), T::Error> {
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = target.read(element_address(start, i, increment))?;
    }
    Ok(())
}

pub fn seq_write<T: RegisterTarget + ?Sized>(
    target: &T,
    start: Address,
    data: &[Data],
    increment: u64,
) -> Result<(), T::Error> {
    for (i, word) in data.iter().enumerate() {
        target.write(element_address(start, i, increment), *word)?;
    }
    Ok(())
}

pub fn fifo_read<T: RegisterTarget + ?Sized>(
    target: &T,
    address: Address,
    out: &mut [Data],
) -> Result<(), T::Error> {
    for slot in out.iter_mut() {
        *slot = target.read(address)?;
    }
    Ok(())
}

pub fn fifo_write<T: RegisterTarget + ?Sized>(
    target: &T,
    address: Address,
    data: &[Data],
) -> Result<(), T::Error> {
    for word in data {
        target.write(address, *word)?;
    }
    Ok(())
}

pub fn comp_read<T: RegisterTarget + ?Sized>(
    target: &T,
    addresses: &[Address],
    out: &mut [Data],
) -> Result<(), T::Error> {
    if addresses.len() != out.len() {
        return Err(TargetError::LengthMismatch {
            addresses: addresses.len(),
            data: out.len(),
        }
        .into());
    }
    for (address, slot) in addresses.iter().zip(out.iter_mut()) {
        *slot = target.read(*address)?;
    }
    Ok(())
}

pub fn comp_write<T: RegisterTarget + ?Sized>(
    target: &T,
    pairs: &[(Address, Data)],
) -> Result<(), T::Error> {
    for (address, data) in pairs {
        target.write(*address, *data)?;
    }
    Ok(())
}
