//! # rap-core
//!
//! Register backend contract for RAP.
//!
//! This crate provides:
//! - The [`RegisterTarget`] trait implemented by register backends and by the
//!   RAP client itself
//! - Generic decompositions of every compound operation into single reads
//!   and writes
//! - [`MemoryTarget`], an in-memory register file

pub mod error;
pub mod generic;
pub mod memory;
pub mod target;

pub use error::TargetError;
pub use memory::MemoryTarget;
pub use rap_protocol::{Address, Data};
pub use target::RegisterTarget;
