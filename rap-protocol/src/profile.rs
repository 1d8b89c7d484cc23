//! Protocol profile: field widths and optional feature flags.
//!
//! A profile is fixed for the life of a connection and shared read-only by the
//! codec and both protocol engines. Client and server must agree on it out of
//! band; nothing on the wire identifies the profile in use.

use crate::crc::CrcAlgorithm;
use crate::error::ProtocolError;
use serde::{Deserialize, Serialize};

/// Backing integer type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntWidth {
    U8,
    U16,
    U32,
    U64,
}

impl IntWidth {
    /// Native width in bytes.
    pub const fn bytes(self) -> u8 {
        match self {
            IntWidth::U8 => 1,
            IntWidth::U16 => 2,
            IntWidth::U32 => 4,
            IntWidth::U64 => 8,
        }
    }

    /// Largest value the backing integer can hold.
    pub const fn max_value(self) -> u64 {
        max_for_bytes(self.bytes())
    }
}

/// Largest unsigned value representable in `bytes` bytes.
pub(crate) const fn max_for_bytes(bytes: u8) -> u64 {
    if bytes >= 8 {
        u64::MAX
    } else {
        (1u64 << (bytes as u32 * 8)) - 1
    }
}

/// Width of an address or data field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldWidth {
    /// Significant bits.
    pub bits: u8,
    /// Bytes on the wire.
    pub bytes: u8,
    /// Backing integer.
    pub storage: IntWidth,
}

impl FieldWidth {
    pub const fn new(bits: u8, bytes: u8, storage: IntWidth) -> Self {
        Self {
            bits,
            bytes,
            storage,
        }
    }

    fn validate(&self, name: &str) -> Result<(), ProtocolError> {
        if self.bits == 0 || self.bytes == 0 {
            return Err(ProtocolError::InvalidProfile(format!(
                "{name}: width must be non-zero"
            )));
        }
        if (self.bits as usize).div_ceil(8) > self.bytes as usize {
            return Err(ProtocolError::InvalidProfile(format!(
                "{name}: {} bits do not fit in {} bytes",
                self.bits, self.bytes
            )));
        }
        if self.bytes > self.storage.bytes() {
            return Err(ProtocolError::InvalidProfile(format!(
                "{name}: {} bytes exceed {:?} storage",
                self.bytes, self.storage
            )));
        }
        Ok(())
    }
}

/// Width of the length field used for counts and increments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthWidth {
    /// Bytes on the wire.
    pub bytes: u8,
    /// Backing integer.
    pub storage: IntWidth,
}

impl LengthWidth {
    pub const fn new(bytes: u8, storage: IntWidth) -> Self {
        Self { bytes, storage }
    }

    /// Largest value representable both on the wire and in the backing integer.
    pub fn max_value(&self) -> u64 {
        max_for_bytes(self.bytes).min(self.storage.max_value())
    }
}

/// Optional command families.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Features {
    /// Sequential access with an increment equal to the data width.
    pub sequential: bool,
    /// Sequential access with a zero increment.
    pub fifo: bool,
    /// Sequential access with an arbitrary increment.
    pub increment: bool,
    /// Compressed (explicit per-element address) access.
    pub compressed: bool,
    /// Unsolicited interrupt notifications.
    pub interrupt: bool,
    /// Masked read-modify-write.
    pub read_modify_write: bool,
}

impl Features {
    /// No optional families; only single reads and writes.
    pub const fn none() -> Self {
        Self {
            sequential: false,
            fifo: false,
            increment: false,
            compressed: false,
            interrupt: false,
            read_modify_write: false,
        }
    }

    /// Every optional family enabled.
    pub const fn all() -> Self {
        Self {
            sequential: true,
            fifo: true,
            increment: true,
            compressed: true,
            interrupt: true,
            read_modify_write: true,
        }
    }
}

/// Static description of the wire format shared by both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub address: FieldWidth,
    pub data: FieldWidth,
    pub length: LengthWidth,
    /// CRC algorithm, written as its width in bytes (1-4).
    #[serde(rename = "crc_bytes")]
    pub crc: CrcAlgorithm,
    #[serde(default)]
    pub features: Features,
}

impl Profile {
    /// Reference profile: 24-bit addresses in 3 bytes, 32-bit data, 2-byte
    /// lengths, CRC-16, with sequential, FIFO and compressed access.
    pub const fn example() -> Self {
        Self {
            address: FieldWidth::new(24, 3, IntWidth::U32),
            data: FieldWidth::new(32, 4, IntWidth::U32),
            length: LengthWidth::new(2, IntWidth::U16),
            crc: CrcAlgorithm::Crc16Xmodem,
            features: Features {
                sequential: true,
                fifo: true,
                increment: false,
                compressed: true,
                interrupt: false,
                read_modify_write: false,
            },
        }
    }

    pub fn with_features(mut self, features: Features) -> Self {
        self.features = features;
        self
    }

    pub fn with_crc(mut self, crc: CrcAlgorithm) -> Self {
        self.crc = crc;
        self
    }

    /// Checks the width invariants of every field.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        self.address.validate("address")?;
        self.data.validate("data")?;
        if self.length.bytes == 0 {
            return Err(ProtocolError::InvalidProfile(
                "length: width must be non-zero".to_string(),
            ));
        }
        if self.length.bytes > self.length.storage.bytes() {
            return Err(ProtocolError::InvalidProfile(format!(
                "length: {} bytes exceed {:?} storage",
                self.length.bytes, self.length.storage
            )));
        }
        Ok(())
    }

    pub fn address_bytes(&self) -> usize {
        self.address.bytes as usize
    }

    pub fn data_bytes(&self) -> usize {
        self.data.bytes as usize
    }

    pub fn length_bytes(&self) -> usize {
        self.length.bytes as usize
    }

    pub fn crc_bytes(&self) -> usize {
        self.crc.bytes()
    }

    /// Largest count or increment the length field can carry.
    pub fn max_length_value(&self) -> u64 {
        self.length.max_value()
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::example()
    }
}
