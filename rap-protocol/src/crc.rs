//! Trailing checksum selection.
//!
//! The CRC width in bytes picks a fixed algorithm; there are no runtime
//! parameters beyond that choice.
//!
//! | Bytes | Algorithm          | Poly       | Init/XorOut | Reflected |
//! |-------|--------------------|------------|-------------|-----------|
//! | 1     | CRC-8/DVB-S2       | 0xd5       | 0 / 0       | no        |
//! | 2     | CRC-16/XMODEM      | 0x1021     | 0 / 0       | no        |
//! | 3     | CRC-24/INTERLAKEN  | 0x328b63   | ffffff      | no        |
//! | 4     | CRC-32/INTERLAKEN  | 0x1edc6f41 | ffffffff    | yes       |
//!
//! The 4-byte variant has the CRC-32C parameters and is computed with the
//! hardware-accelerated `crc32c` crate.

use crate::error::ProtocolError;
use crc::{Crc, CRC_16_XMODEM, CRC_24_INTERLAKEN, CRC_8_DVB_S2};
use serde::{Deserialize, Serialize};

const CRC8: Crc<u8> = Crc::<u8>::new(&CRC_8_DVB_S2);
const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);
const CRC24: Crc<u32> = Crc::<u32>::new(&CRC_24_INTERLAKEN);

/// CRC algorithm appended to every message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CrcAlgorithm {
    Crc8DvbS2,
    Crc16Xmodem,
    Crc24Interlaken,
    Crc32Interlaken,
}

impl CrcAlgorithm {
    /// Selects the algorithm for a CRC field of `bytes` bytes.
    pub fn from_bytes(bytes: u8) -> Result<Self, ProtocolError> {
        match bytes {
            1 => Ok(CrcAlgorithm::Crc8DvbS2),
            2 => Ok(CrcAlgorithm::Crc16Xmodem),
            3 => Ok(CrcAlgorithm::Crc24Interlaken),
            4 => Ok(CrcAlgorithm::Crc32Interlaken),
            other => Err(ProtocolError::InvalidProfile(format!(
                "crc: unsupported width of {other} bytes"
            ))),
        }
    }

    /// Width of the CRC field on the wire.
    pub const fn bytes(self) -> usize {
        match self {
            CrcAlgorithm::Crc8DvbS2 => 1,
            CrcAlgorithm::Crc16Xmodem => 2,
            CrcAlgorithm::Crc24Interlaken => 3,
            CrcAlgorithm::Crc32Interlaken => 4,
        }
    }

    /// Computes the checksum of `data`, widened to `u32`.
    pub fn checksum(self, data: &[u8]) -> u32 {
        match self {
            CrcAlgorithm::Crc8DvbS2 => CRC8.checksum(data) as u32,
            CrcAlgorithm::Crc16Xmodem => CRC16.checksum(data) as u32,
            CrcAlgorithm::Crc24Interlaken => CRC24.checksum(data),
            CrcAlgorithm::Crc32Interlaken => crc32c::crc32c(data),
        }
    }
}

impl TryFrom<u8> for CrcAlgorithm {
    type Error = ProtocolError;

    fn try_from(bytes: u8) -> Result<Self, Self::Error> {
        Self::from_bytes(bytes)
    }
}

impl From<CrcAlgorithm> for u8 {
    fn from(algorithm: CrcAlgorithm) -> u8 {
        algorithm.bytes() as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHECK_INPUT: &[u8] = b"123456789";

    #[test]
    fn test_check_values() {
        assert_eq!(CrcAlgorithm::Crc8DvbS2.checksum(CHECK_INPUT), 0xBC);
        assert_eq!(CrcAlgorithm::Crc16Xmodem.checksum(CHECK_INPUT), 0x31C3);
        assert_eq!(CrcAlgorithm::Crc24Interlaken.checksum(CHECK_INPUT), 0xB4F3E6);
        assert_eq!(CrcAlgorithm::Crc32Interlaken.checksum(CHECK_INPUT), 0xE3069283);
    }

    #[test]
    fn test_width_selection() {
        for bytes in 1..=4u8 {
            let algorithm = CrcAlgorithm::from_bytes(bytes).unwrap();
            assert_eq!(algorithm.bytes(), bytes as usize);
            assert_eq!(u8::from(algorithm), bytes);
        }
        assert!(CrcAlgorithm::from_bytes(0).is_err());
        assert!(CrcAlgorithm::from_bytes(5).is_err());
    }

    #[test]
    fn test_checksum_fits_width() {
        let data = [0xFFu8; 64];
        for bytes in 1..=3u8 {
            let algorithm = CrcAlgorithm::from_bytes(bytes).unwrap();
            assert!(algorithm.checksum(&data) < 1u32 << (8 * bytes as u32));
        }
    }
}
