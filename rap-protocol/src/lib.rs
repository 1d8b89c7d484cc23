//! # rap-protocol
//!
//! Wire protocol implementation for RAP (Register Access Protocol).
//!
//! This crate provides:
//! - The protocol profile (field widths, CRC width, optional feature flags)
//! - Command and response message types and their ack/nak relationship
//! - Binary framing with a trailing CRC selected by the profile
//! - Transport-size-aware capacity limits for variable-length commands

pub mod codec;
pub mod crc;
pub mod error;
pub mod frame;
pub mod message;
pub mod profile;

pub use codec::Codec;
pub use crc::CrcAlgorithm;
pub use error::ProtocolError;
pub use frame::HEADER_SIZE;
pub use message::{Command, CommandKind, MessageType, Outcome, Response};
pub use profile::{Features, FieldWidth, IntWidth, LengthWidth, Profile};

/// Register address as carried by commands. Only the profile's address bytes
/// travel on the wire.
pub type Address = u64;

/// Register data word as carried by commands and responses. Only the
/// profile's data bytes travel on the wire.
pub type Data = u64;

/// Smallest transport message size a codec accepts.
pub const MIN_MAX_MESSAGE_SIZE: usize = 32;

/// Status code carried by naks that a server synthesizes when a backend
/// operation fails.
pub const NAK_STATUS_GENERIC: Data = 0xFD;
