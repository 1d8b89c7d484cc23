//! Binary frame format for RAP.
//!
//! Frame layout (one frame per transport datagram):
//!
//! ```text
//! +--------+--------------+-------------------+-----------+
//! | txn    | message type | payload           | crc       |
//! | 1 byte | 1 byte       | variant-specific  | 1-4 bytes |
//! +--------+--------------+-------------------+-----------+
//! ```
//!
//! Integer fields are little-endian and truncated to their configured width.
//! The CRC covers every byte before it and is itself written little-endian.

use crate::crc::CrcAlgorithm;
use crate::error::ProtocolError;
use crate::message::MessageType;
use bytes::{Buf, BufMut, BytesMut};

/// Size of the fixed frame header in bytes (txn + message type).
pub const HEADER_SIZE: usize = 2;

/// Builds a frame field by field.
pub(crate) struct FrameWriter {
    buf: BytesMut,
}

impl FrameWriter {
    /// Starts a frame whose payload is `payload_len` bytes.
    pub fn new(txn: u8, ty: MessageType, payload_len: usize, crc: CrcAlgorithm) -> Self {
        let mut buf = BytesMut::with_capacity(HEADER_SIZE + payload_len + crc.bytes());
        buf.put_u8(txn);
        buf.put_u8(ty.code());
        Self { buf }
    }

    /// Writes the low `bytes` bytes of `value`.
    pub fn put_uint(&mut self, value: u64, bytes: usize) {
        self.buf.put_uint_le(value, bytes);
    }

    /// Appends the CRC and returns the finished frame.
    pub fn finish(mut self, crc: CrcAlgorithm) -> BytesMut {
        let checksum = crc.checksum(&self.buf);
        self.buf.put_uint_le(checksum as u64, crc.bytes());
        self.buf
    }
}

/// A frame whose CRC has been verified.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RawFrame<'a> {
    pub txn: u8,
    pub message_type: u8,
    pub payload: &'a [u8],
}

/// Checks the minimum length and CRC, then splits off the header.
pub(crate) fn split_frame(bytes: &[u8], crc: CrcAlgorithm) -> Result<RawFrame<'_>, ProtocolError> {
    let min = HEADER_SIZE + crc.bytes();
    if bytes.len() < min {
        return Err(ProtocolError::TooShort {
            len: bytes.len(),
            min,
        });
    }

    let (body, mut trailer) = bytes.split_at(bytes.len() - crc.bytes());
    let expected = trailer.get_uint_le(crc.bytes()) as u32;
    let actual = crc.checksum(body);
    if expected != actual {
        return Err(ProtocolError::CrcMismatch { expected, actual });
    }

    Ok(RawFrame {
        txn: body[0],
        message_type: body[1],
        payload: &body[HEADER_SIZE..],
    })
}

/// Reads payload fields, refusing to run past the end.
pub(crate) struct FrameReader<'a> {
    buf: &'a [u8],
}

impl<'a> FrameReader<'a> {
    pub fn new(payload: &'a [u8]) -> Self {
        Self { buf: payload }
    }

    pub fn get_uint(&mut self, bytes: usize) -> Result<u64, ProtocolError> {
        if self.buf.remaining() < bytes {
            return Err(ProtocolError::Malformed("payload truncated"));
        }
        Ok(self.buf.get_uint_le(bytes))
    }

    /// Confirms that exactly `count` elements of `element_size` bytes remain,
    /// before the caller allocates storage for them.
    pub fn expect_elements(&self, count: u64, element_size: usize) -> Result<usize, ProtocolError> {
        let needed = count
            .checked_mul(element_size as u64)
            .ok_or(ProtocolError::Malformed("element count overflows"))?;
        if needed != self.buf.remaining() as u64 {
            return Err(ProtocolError::Malformed(
                "element count does not match payload size",
            ));
        }
        Ok(count as usize)
    }

    /// Fails if any payload bytes were left unread.
    pub fn finish(&self) -> Result<(), ProtocolError> {
        if self.buf.has_remaining() {
            return Err(ProtocolError::Malformed("trailing bytes after payload"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_truncates_little_endian() {
        let mut writer = FrameWriter::new(7, MessageType::WriteSingle, 7, CrcAlgorithm::Crc8DvbS2);
        writer.put_uint(0xAA00_1234, 3);
        writer.put_uint(0xDEADBEEF, 4);
        let frame = writer.finish(CrcAlgorithm::Crc8DvbS2);

        assert_eq!(&frame[..9], &[7, 0x10, 0x34, 0x12, 0x00, 0xEF, 0xBE, 0xAD, 0xDE]);
        assert_eq!(frame.len(), 10);
        assert_eq!(
            frame[9] as u32,
            CrcAlgorithm::Crc8DvbS2.checksum(&frame[..9])
        );
    }

    #[test]
    fn test_split_frame() {
        for bytes in 1..=4u8 {
            let crc = CrcAlgorithm::from_bytes(bytes).unwrap();
            let mut writer = FrameWriter::new(1, MessageType::ReadSingle, 2, crc);
            writer.put_uint(0xBEEF, 2);
            let frame = writer.finish(crc);

            let raw = split_frame(&frame, crc).unwrap();
            assert_eq!(raw.txn, 1);
            assert_eq!(raw.message_type, 0x01);
            assert_eq!(raw.payload, &[0xEF, 0xBE]);
        }
    }

    #[test]
    fn test_split_frame_too_short() {
        let err = split_frame(&[1, 2, 3], CrcAlgorithm::Crc16Xmodem).unwrap_err();
        assert_eq!(err, ProtocolError::TooShort { len: 3, min: 4 });
    }

    #[test]
    fn test_split_frame_bad_crc() {
        let crc = CrcAlgorithm::Crc24Interlaken;
        let mut frame = FrameWriter::new(1, MessageType::WriteSingleAck, 0, crc).finish(crc);
        frame[1] ^= 0x01;
        assert!(matches!(
            split_frame(&frame, crc),
            Err(ProtocolError::CrcMismatch { .. })
        ));
    }

    #[test]
    fn test_reader_bounds() {
        let payload = [0x01, 0x02, 0x03];
        let mut reader = FrameReader::new(&payload);
        assert_eq!(reader.get_uint(2).unwrap(), 0x0201);
        assert!(reader.finish().is_err());
        assert_eq!(reader.expect_elements(1, 1).unwrap(), 1);
        assert!(reader.expect_elements(2, 1).is_err());
        assert!(reader.get_uint(2).is_err());
        assert!(reader.expect_elements(u64::MAX, 8).is_err());
    }
}
