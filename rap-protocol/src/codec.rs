//! Encoder and decoder for RAP messages.
//!
//! A [`Codec`] binds a [`Profile`] to the maximum message size of the
//! transport it will be used with. The message size determines how many
//! elements the variable-length families may carry.

use crate::error::ProtocolError;
use crate::frame::{split_frame, FrameReader, FrameWriter, HEADER_SIZE};
use crate::message::{Command, MessageType, Response};
use crate::profile::Profile;
use crate::{Address, Data, MIN_MAX_MESSAGE_SIZE};
use bytes::BytesMut;

/// Encodes and decodes commands and responses for one profile.
#[derive(Debug, Clone)]
pub struct Codec {
    profile: Profile,
    max_message_size: usize,
}

impl Codec {
    /// Creates a codec for a transport that carries at most
    /// `max_message_size` bytes per message.
    pub fn new(profile: Profile, max_message_size: usize) -> Result<Self, ProtocolError> {
        profile.validate()?;
        if max_message_size < MIN_MAX_MESSAGE_SIZE {
            return Err(ProtocolError::MessageSizeTooSmall {
                size: max_message_size,
                min: MIN_MAX_MESSAGE_SIZE,
            });
        }
        Ok(Self {
            profile,
            max_message_size,
        })
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn max_message_size(&self) -> usize {
        self.max_message_size
    }

    fn a(&self) -> usize {
        self.profile.address_bytes()
    }

    fn d(&self) -> usize {
        self.profile.data_bytes()
    }

    fn l(&self) -> usize {
        self.profile.length_bytes()
    }

    /// Bytes left for elements once `fixed` payload bytes, the header and the
    /// CRC are accounted for.
    fn element_budget(&self, fixed: usize) -> usize {
        self.max_message_size
            .saturating_sub(HEADER_SIZE + fixed + self.profile.crc_bytes())
    }

    fn bounded(&self, count: usize) -> u64 {
        (count as u64).min(self.profile.max_length_value())
    }

    // =========================================================================
    // Capacity limits
    // =========================================================================

    /// Largest count a sequential read may request; limited by the size of
    /// the Ack that returns the data.
    pub fn max_seq_read_count(&self) -> u64 {
        self.bounded(self.element_budget(self.l()) / self.d())
    }

    /// Largest number of words a sequential write may carry.
    pub fn max_seq_write_count(&self) -> u64 {
        self.bounded(self.element_budget(self.a() + 2 * self.l()) / self.d())
    }

    /// Largest number of addresses a compressed read may carry; both the
    /// command and its Ack must fit.
    pub fn max_comp_read_count(&self) -> u64 {
        let budget = self.element_budget(self.l());
        self.bounded((budget / self.a()).min(budget / self.d()))
    }

    /// Largest number of address/data pairs a compressed write may carry.
    pub fn max_comp_write_count(&self) -> u64 {
        self.bounded(self.element_budget(self.l()) / (self.a() + self.d()))
    }

    fn check_count(count: u64, max: u64) -> Result<(), ProtocolError> {
        if count > max {
            return Err(ProtocolError::SizeExceeded { count, max });
        }
        Ok(())
    }

    /// Largest element count a data-array Ack can carry.
    fn max_data_array_count(&self) -> u64 {
        self.max_seq_read_count()
    }

    // =========================================================================
    // Encoding
    // =========================================================================

    /// Encodes a command into a single frame.
    pub fn encode_command(&self, command: &Command) -> Result<BytesMut, ProtocolError> {
        let crc = self.profile.crc;
        let (a, d, l) = (self.a(), self.d(), self.l());
        let ty = command.message_type();

        let frame = match command {
            Command::ReadSingle { txn, address } => {
                let mut w = FrameWriter::new(*txn, ty, a, crc);
                w.put_uint(*address, a);
                w.finish(crc)
            }
            Command::WriteSingle {
                txn, address, data, ..
            } => {
                let mut w = FrameWriter::new(*txn, ty, a + d, crc);
                w.put_uint(*address, a);
                w.put_uint(*data, d);
                w.finish(crc)
            }
            Command::ReadSeq {
                txn,
                address,
                increment,
                count,
            } => {
                Self::check_count(*count, self.max_seq_read_count())?;
                let mut w = FrameWriter::new(*txn, ty, a + 2 * l, crc);
                w.put_uint(*address, a);
                w.put_uint(*increment, l);
                w.put_uint(*count, l);
                w.finish(crc)
            }
            Command::WriteSeq {
                txn,
                address,
                increment,
                data,
                ..
            } => {
                Self::check_count(data.len() as u64, self.max_seq_write_count())?;
                let mut w = FrameWriter::new(*txn, ty, a + 2 * l + data.len() * d, crc);
                w.put_uint(*address, a);
                w.put_uint(*increment, l);
                w.put_uint(data.len() as u64, l);
                for word in data {
                    w.put_uint(*word, d);
                }
                w.finish(crc)
            }
            Command::ReadComp { txn, addresses } => {
                Self::check_count(addresses.len() as u64, self.max_comp_read_count())?;
                let mut w = FrameWriter::new(*txn, ty, l + addresses.len() * a, crc);
                w.put_uint(addresses.len() as u64, l);
                for address in addresses {
                    w.put_uint(*address, a);
                }
                w.finish(crc)
            }
            Command::WriteComp { txn, pairs, .. } => {
                Self::check_count(pairs.len() as u64, self.max_comp_write_count())?;
                let mut w = FrameWriter::new(*txn, ty, l + pairs.len() * (a + d), crc);
                w.put_uint(pairs.len() as u64, l);
                for (address, data) in pairs {
                    w.put_uint(*address, a);
                    w.put_uint(*data, d);
                }
                w.finish(crc)
            }
            Command::ReadModifyWrite {
                txn,
                address,
                data,
                mask,
                ..
            } => {
                let mut w = FrameWriter::new(*txn, ty, a + 2 * d, crc);
                w.put_uint(*address, a);
                w.put_uint(*data, d);
                w.put_uint(*mask, d);
                w.finish(crc)
            }
        };
        Ok(frame)
    }

    /// Encodes a response into a single frame.
    pub fn encode_response(&self, response: &Response) -> Result<BytesMut, ProtocolError> {
        let crc = self.profile.crc;
        let (d, l) = (self.d(), self.l());
        let ty = response.message_type();
        let txn = response.txn();

        let frame = match response {
            Response::ReadSingleAck { data, .. } => {
                let mut w = FrameWriter::new(txn, ty, d, crc);
                w.put_uint(*data, d);
                w.finish(crc)
            }
            Response::ReadSeqAck { data, .. } | Response::ReadCompAck { data, .. } => {
                Self::check_count(data.len() as u64, self.max_data_array_count())?;
                let mut w = FrameWriter::new(txn, ty, l + data.len() * d, crc);
                w.put_uint(data.len() as u64, l);
                for word in data {
                    w.put_uint(*word, d);
                }
                w.finish(crc)
            }
            Response::WriteSingleAck { .. }
            | Response::WriteSeqAck { .. }
            | Response::WriteCompAck { .. }
            | Response::ReadModifyWriteAck { .. } => FrameWriter::new(txn, ty, 0, crc).finish(crc),
            _ => {
                // Every Nak and the interrupt carry a status word.
                let status = response.status().unwrap_or_default();
                let mut w = FrameWriter::new(txn, ty, d, crc);
                w.put_uint(status, d);
                w.finish(crc)
            }
        };
        Ok(frame)
    }

    // =========================================================================
    // Decoding
    // =========================================================================

    /// Decodes a command. Response codes are rejected.
    pub fn decode_command(&self, bytes: &[u8]) -> Result<Command, ProtocolError> {
        let raw = split_frame(bytes, self.profile.crc)?;
        let ty = MessageType::try_from(raw.message_type)?;
        if !ty.is_command() {
            return Err(ProtocolError::UnexpectedMessageType(raw.message_type));
        }

        let (a, d, l) = (self.a(), self.d(), self.l());
        let txn = raw.txn;
        let posted = ty.is_posted();
        let mut r = FrameReader::new(raw.payload);

        let command = match ty {
            MessageType::ReadSingle => Command::ReadSingle {
                txn,
                address: r.get_uint(a)?,
            },
            MessageType::WriteSingle | MessageType::WriteSinglePosted => Command::WriteSingle {
                txn,
                posted,
                address: r.get_uint(a)?,
                data: r.get_uint(d)?,
            },
            MessageType::ReadSeq => Command::ReadSeq {
                txn,
                address: r.get_uint(a)?,
                increment: r.get_uint(l)?,
                count: r.get_uint(l)?,
            },
            MessageType::WriteSeq | MessageType::WriteSeqPosted => {
                let address = r.get_uint(a)?;
                let increment = r.get_uint(l)?;
                let count = r.get_uint(l)?;
                let data = read_words(&mut r, count, d)?;
                Command::WriteSeq {
                    txn,
                    posted,
                    address,
                    increment,
                    data,
                }
            }
            MessageType::ReadComp => {
                let count = r.get_uint(l)?;
                let addresses: Vec<Address> = read_words(&mut r, count, a)?;
                Command::ReadComp { txn, addresses }
            }
            MessageType::WriteComp | MessageType::WriteCompPosted => {
                let count = r.get_uint(l)?;
                let n = r.expect_elements(count, a + d)?;
                let mut pairs = Vec::with_capacity(n);
                for _ in 0..n {
                    pairs.push((r.get_uint(a)?, r.get_uint(d)?));
                }
                Command::WriteComp { txn, posted, pairs }
            }
            MessageType::ReadModifyWrite | MessageType::ReadModifyWritePosted => {
                Command::ReadModifyWrite {
                    txn,
                    posted,
                    address: r.get_uint(a)?,
                    data: r.get_uint(d)?,
                    mask: r.get_uint(d)?,
                }
            }
            _ => return Err(ProtocolError::UnexpectedMessageType(raw.message_type)),
        };
        r.finish()?;
        Ok(command)
    }

    /// Decodes a response or interrupt. Command codes are rejected.
    pub fn decode_response(&self, bytes: &[u8]) -> Result<Response, ProtocolError> {
        let raw = split_frame(bytes, self.profile.crc)?;
        let ty = MessageType::try_from(raw.message_type)?;
        if !ty.is_response() {
            return Err(ProtocolError::UnexpectedMessageType(raw.message_type));
        }

        let (d, l) = (self.d(), self.l());
        let txn = raw.txn;
        let mut r = FrameReader::new(raw.payload);

        let response = match ty {
            MessageType::ReadSingleAck => Response::ReadSingleAck {
                txn,
                data: r.get_uint(d)?,
            },
            MessageType::ReadSeqAck => {
                let count = r.get_uint(l)?;
                Response::ReadSeqAck {
                    txn,
                    data: read_words(&mut r, count, d)?,
                }
            }
            MessageType::ReadCompAck => {
                let count = r.get_uint(l)?;
                Response::ReadCompAck {
                    txn,
                    data: read_words(&mut r, count, d)?,
                }
            }
            MessageType::WriteSingleAck => Response::WriteSingleAck { txn },
            MessageType::WriteSeqAck => Response::WriteSeqAck { txn },
            MessageType::WriteCompAck => Response::WriteCompAck { txn },
            MessageType::ReadModifyWriteAck => Response::ReadModifyWriteAck { txn },
            MessageType::Interrupt => Response::Interrupt {
                txn,
                status: r.get_uint(d)?,
            },
            nak => match nak.kind() {
                Some(kind) if nak.is_nak() => Response::nak(kind, txn, r.get_uint(d)?),
                _ => return Err(ProtocolError::UnexpectedMessageType(raw.message_type)),
            },
        };
        r.finish()?;
        Ok(response)
    }
}

fn read_words(r: &mut FrameReader<'_>, count: u64, width: usize) -> Result<Vec<Data>, ProtocolError> {
    let n = r.expect_elements(count, width)?;
    let mut words = Vec::with_capacity(n);
    for _ in 0..n {
        words.push(r.get_uint(width)?);
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crc::CrcAlgorithm;
    use crate::message::CommandKind;
    use crate::profile::{FieldWidth, Features, IntWidth, LengthWidth};
    use proptest::prelude::*;

    const MTU: usize = 1452;

    fn codec() -> Codec {
        Codec::new(Profile::example(), MTU).unwrap()
    }

    fn wide_profile() -> Profile {
        Profile {
            address: FieldWidth::new(64, 8, IntWidth::U64),
            data: FieldWidth::new(64, 8, IntWidth::U64),
            length: LengthWidth::new(4, IntWidth::U32),
            crc: CrcAlgorithm::Crc32Interlaken,
            features: Features::all(),
        }
    }

    #[test]
    fn test_write_single_wire_layout() {
        let codec = codec();
        let cmd = Command::WriteSingle {
            txn: 7,
            posted: false,
            address: 0x001234,
            data: 0xDEADBEEF,
        };
        let frame = codec.encode_command(&cmd).unwrap();
        assert_eq!(
            &frame[..],
            &[7, 0x10, 0x34, 0x12, 0x00, 0xEF, 0xBE, 0xAD, 0xDE, 0xFB, 0x71]
        );
        assert_eq!(codec.decode_command(&frame).unwrap(), cmd);
    }

    #[test]
    fn test_message_size_floor() {
        assert!(matches!(
            Codec::new(Profile::example(), 31),
            Err(ProtocolError::MessageSizeTooSmall { size: 31, min: 32 })
        ));
        assert!(Codec::new(Profile::example(), 32).is_ok());
    }

    #[test]
    fn test_invalid_profile_rejected() {
        let mut profile = Profile::example();
        profile.address = FieldWidth::new(32, 3, IntWidth::U32);
        assert!(matches!(
            Codec::new(profile, MTU),
            Err(ProtocolError::InvalidProfile(_))
        ));
    }

    #[test]
    fn test_capacity_limits_example_profile() {
        let codec = codec();
        // header 2, crc 2, length 2, address 3, data 4
        assert_eq!(codec.max_seq_read_count(), (1452 - 6) / 4);
        assert_eq!(codec.max_seq_write_count(), (1452 - 11) / 4);
        assert_eq!(codec.max_comp_read_count(), (1452 - 6) / 4);
        assert_eq!(codec.max_comp_write_count(), (1452 - 6) / 7);
    }

    #[test]
    fn test_capacity_limited_by_length_field() {
        let mut profile = Profile::example();
        profile.length = LengthWidth::new(1, IntWidth::U8);
        let codec = Codec::new(profile, 4096).unwrap();
        assert_eq!(codec.max_seq_read_count(), 255);
        assert_eq!(codec.max_seq_write_count(), 255);
        assert_eq!(codec.max_comp_write_count(), 255);
    }

    #[test]
    fn test_comp_read_limited_by_wider_field() {
        let mut profile = Profile::example();
        profile.data = FieldWidth::new(64, 8, IntWidth::U64);
        let codec = Codec::new(profile, 64).unwrap();
        // 64 - (2 + 2 + 2) = 58 bytes: 19 addresses but only 7 data words
        assert_eq!(codec.max_comp_read_count(), 7);
    }

    #[test]
    fn test_seq_write_at_and_over_limit() {
        let codec = codec();
        let max = codec.max_seq_write_count();
        let mut cmd = Command::WriteSeq {
            txn: 1,
            posted: false,
            address: 0x100,
            increment: 4,
            data: vec![0xA5A5_A5A5; max as usize],
        };
        let frame = codec.encode_command(&cmd).unwrap();
        assert!(frame.len() <= MTU);
        assert_eq!(codec.decode_command(&frame).unwrap(), cmd);

        if let Command::WriteSeq { data, .. } = &mut cmd {
            data.push(0);
        }
        assert_eq!(
            codec.encode_command(&cmd),
            Err(ProtocolError::SizeExceeded {
                count: max + 1,
                max
            })
        );
    }

    #[test]
    fn test_seq_read_count_over_limit() {
        let codec = codec();
        let max = codec.max_seq_read_count();
        let cmd = Command::ReadSeq {
            txn: 1,
            address: 0,
            increment: 4,
            count: max + 1,
        };
        assert!(matches!(
            codec.encode_command(&cmd),
            Err(ProtocolError::SizeExceeded { .. })
        ));

        let ack = Response::ReadSeqAck {
            txn: 1,
            data: vec![0; max as usize],
        };
        let frame = codec.encode_response(&ack).unwrap();
        assert!(frame.len() <= MTU);
    }

    #[test]
    fn test_comp_read_64_byte_transport() {
        let codec = Codec::new(wide_profile(), 64).unwrap();
        let max = codec.max_comp_read_count();
        // 64 - (2 + 4 + 4) = 54 bytes of 8-byte addresses
        assert_eq!(max, 6);

        let fits = Command::ReadComp {
            txn: 2,
            addresses: (0..max).collect(),
        };
        let frame = codec.encode_command(&fits).unwrap();
        assert!(frame.len() <= 64);

        let too_many = Command::ReadComp {
            txn: 2,
            addresses: (0..=max).collect(),
        };
        assert!(matches!(
            codec.encode_command(&too_many),
            Err(ProtocolError::SizeExceeded { .. })
        ));

        // Reference profile: 58 bytes of budget, bound by the 4-byte replies.
        let codec = Codec::new(Profile::example(), 64).unwrap();
        assert_eq!(codec.max_comp_read_count(), 14);
        let ack = Response::ReadCompAck {
            txn: 2,
            data: vec![0; 14],
        };
        assert!(codec.encode_response(&ack).unwrap().len() <= 64);
    }

    #[test]
    fn test_comp_write_over_limit() {
        let codec = codec();
        let max = codec.max_comp_write_count();
        let cmd = Command::WriteComp {
            txn: 0,
            posted: true,
            pairs: (0..=max).map(|i| (i, i)).collect(),
        };
        assert!(matches!(
            codec.encode_command(&cmd),
            Err(ProtocolError::SizeExceeded { .. })
        ));
    }

    #[test]
    fn test_fields_truncated_to_width() {
        let codec = codec();
        let cmd = Command::WriteSingle {
            txn: 0,
            posted: false,
            address: 0xFF12_3456,
            data: 0x1_0000_0001,
        };
        let frame = codec.encode_command(&cmd).unwrap();
        assert_eq!(frame.len(), 2 + 3 + 4 + 2);
        assert_eq!(
            codec.decode_command(&frame).unwrap(),
            Command::WriteSingle {
                txn: 0,
                posted: false,
                address: 0x12_3456,
                data: 1,
            }
        );
    }

    #[test]
    fn test_decode_wrong_direction() {
        let codec = codec();
        let ack = codec
            .encode_response(&Response::WriteSingleAck { txn: 4 })
            .unwrap();
        assert_eq!(
            codec.decode_command(&ack),
            Err(ProtocolError::UnexpectedMessageType(0x91))
        );

        let cmd = codec
            .encode_command(&Command::ReadSingle {
                txn: 4,
                address: 1,
            })
            .unwrap();
        assert_eq!(
            codec.decode_response(&cmd),
            Err(ProtocolError::UnexpectedMessageType(0x01))
        );
    }

    #[test]
    fn test_decode_unknown_code() {
        let codec = codec();
        let crc = codec.profile().crc;
        let mut frame = FrameWriter::new(0, MessageType::ReadSingle, 0, crc).finish(crc);
        frame[1] = 0x7F;
        let sum = crc.checksum(&frame[..2]);
        frame[2] = sum as u8;
        frame[3] = (sum >> 8) as u8;
        assert_eq!(
            codec.decode_response(&frame),
            Err(ProtocolError::UnexpectedMessageType(0x7F))
        );
    }

    #[test]
    fn test_decode_trailing_bytes() {
        let codec = codec();
        let crc = codec.profile().crc;
        let mut w = FrameWriter::new(3, MessageType::ReadSingle, 4, crc);
        w.put_uint(0x10, 3);
        w.put_uint(0xEE, 1);
        let frame = w.finish(crc);
        assert_eq!(
            codec.decode_command(&frame),
            Err(ProtocolError::Malformed("trailing bytes after payload"))
        );
    }

    #[test]
    fn test_decode_count_mismatch() {
        let codec = codec();
        let crc = codec.profile().crc;
        // declares three words but carries two
        let mut w = FrameWriter::new(3, MessageType::ReadSeqAck, 2 + 8, crc);
        w.put_uint(3, 2);
        w.put_uint(1, 4);
        w.put_uint(2, 4);
        let frame = w.finish(crc);
        let err = codec.decode_response(&frame).unwrap_err();
        assert!(err.is_malformed());
        assert!(matches!(err, ProtocolError::Malformed(_)));
    }

    #[test]
    fn test_decode_huge_declared_count() {
        let codec = Codec::new(wide_profile(), MTU).unwrap();
        let crc = codec.profile().crc;
        let mut w = FrameWriter::new(0, MessageType::ReadComp, 4, crc);
        w.put_uint(0xFFFF_FFFF, 4);
        let frame = w.finish(crc);
        assert!(matches!(
            codec.decode_command(&frame),
            Err(ProtocolError::Malformed(_))
        ));
    }

    #[test]
    fn test_rmw_nak_carries_status() {
        let codec = codec();
        let nak = Response::nak(CommandKind::ReadModifyWrite, 5, 0xFD);
        let frame = codec.encode_response(&nak).unwrap();
        assert_eq!(frame.len(), 2 + 4 + 2);
        assert_eq!(&frame[2..6], &[0xFD, 0, 0, 0]);
        assert_eq!(codec.decode_response(&frame).unwrap(), nak);
    }

    #[test]
    fn test_every_crc_width_round_trips() {
        for bytes in 1..=4u8 {
            let profile =
                Profile::example().with_crc(CrcAlgorithm::from_bytes(bytes).unwrap());
            let codec = Codec::new(profile, MTU).unwrap();
            let cmd = Command::ReadModifyWrite {
                txn: 200,
                posted: true,
                address: 0xABCDEF,
                data: 0x0F0F_0F0F,
                mask: 0x00FF_FF00,
            };
            let frame = codec.encode_command(&cmd).unwrap();
            assert_eq!(frame.len(), 2 + 3 + 8 + bytes as usize);
            assert_eq!(codec.decode_command(&frame).unwrap(), cmd);
        }
    }

    fn address() -> impl Strategy<Value = Address> {
        0u64..=0xFF_FFFF
    }

    fn word() -> impl Strategy<Value = Data> {
        0u64..=0xFFFF_FFFF
    }

    fn arb_command() -> impl Strategy<Value = Command> {
        prop_oneof![
            (any::<u8>(), address()).prop_map(|(txn, address)| Command::ReadSingle { txn, address }),
            (any::<u8>(), any::<bool>(), address(), word()).prop_map(
                |(txn, posted, address, data)| Command::WriteSingle {
                    txn,
                    posted,
                    address,
                    data
                }
            ),
            (any::<u8>(), address(), 0u64..=0xFFFF, 0u64..=361).prop_map(
                |(txn, address, increment, count)| Command::ReadSeq {
                    txn,
                    address,
                    increment,
                    count
                }
            ),
            (
                any::<u8>(),
                any::<bool>(),
                address(),
                0u64..=0xFFFF,
                prop::collection::vec(word(), 0..64)
            )
                .prop_map(|(txn, posted, address, increment, data)| Command::WriteSeq {
                    txn,
                    posted,
                    address,
                    increment,
                    data
                }),
            (any::<u8>(), prop::collection::vec(address(), 0..64))
                .prop_map(|(txn, addresses)| Command::ReadComp { txn, addresses }),
            (
                any::<u8>(),
                any::<bool>(),
                prop::collection::vec((address(), word()), 0..64)
            )
                .prop_map(|(txn, posted, pairs)| Command::WriteComp { txn, posted, pairs }),
            (any::<u8>(), any::<bool>(), address(), word(), word()).prop_map(
                |(txn, posted, address, data, mask)| Command::ReadModifyWrite {
                    txn,
                    posted,
                    address,
                    data,
                    mask
                }
            ),
        ]
    }

    fn arb_response() -> impl Strategy<Value = Response> {
        let kinds = prop::sample::select(vec![
            CommandKind::ReadSingle,
            CommandKind::WriteSingle,
            CommandKind::ReadSeq,
            CommandKind::WriteSeq,
            CommandKind::ReadComp,
            CommandKind::WriteComp,
            CommandKind::ReadModifyWrite,
        ]);
        prop_oneof![
            (any::<u8>(), word()).prop_map(|(txn, data)| Response::ReadSingleAck { txn, data }),
            (any::<u8>(), prop::collection::vec(word(), 0..64))
                .prop_map(|(txn, data)| Response::ReadSeqAck { txn, data }),
            (any::<u8>(), prop::collection::vec(word(), 0..64))
                .prop_map(|(txn, data)| Response::ReadCompAck { txn, data }),
            any::<u8>().prop_map(|txn| Response::WriteSingleAck { txn }),
            any::<u8>().prop_map(|txn| Response::WriteSeqAck { txn }),
            any::<u8>().prop_map(|txn| Response::WriteCompAck { txn }),
            any::<u8>().prop_map(|txn| Response::ReadModifyWriteAck { txn }),
            (kinds, any::<u8>(), word())
                .prop_map(|(kind, txn, status)| Response::nak(kind, txn, status)),
            (any::<u8>(), word()).prop_map(|(txn, status)| Response::Interrupt { txn, status }),
        ]
    }

    proptest! {
        #[test]
        fn prop_command_round_trip(cmd in arb_command()) {
            let codec = codec();
            let frame = codec.encode_command(&cmd).unwrap();
            prop_assert!(frame.len() <= MTU);
            prop_assert_eq!(codec.decode_command(&frame).unwrap(), cmd);
        }

        #[test]
        fn prop_response_round_trip(resp in arb_response()) {
            let codec = codec();
            let frame = codec.encode_response(&resp).unwrap();
            prop_assert_eq!(codec.decode_response(&frame).unwrap(), resp);
        }

        #[test]
        fn prop_single_bit_flip_detected(
            cmd in arb_command(),
            index in any::<prop::sample::Index>(),
            bit in 0u8..8,
        ) {
            let codec = codec();
            let mut frame = codec.encode_command(&cmd).unwrap();
            let covered = frame.len() - codec.profile().crc_bytes();
            frame[index.index(covered)] ^= 1 << bit;
            let is_crc_mismatch = matches!(
                codec.decode_command(&frame),
                Err(ProtocolError::CrcMismatch { .. })
            );
            prop_assert!(is_crc_mismatch);
        }

        #[test]
        fn prop_single_bit_flip_detected_in_response(
            resp in arb_response(),
            index in any::<prop::sample::Index>(),
            bit in 0u8..8,
        ) {
            let codec = codec();
            let mut frame = codec.encode_response(&resp).unwrap();
            let covered = frame.len() - codec.profile().crc_bytes();
            frame[index.index(covered)] ^= 1 << bit;
            let is_crc_mismatch = matches!(
                codec.decode_response(&frame),
                Err(ProtocolError::CrcMismatch { .. })
            );
            prop_assert!(is_crc_mismatch);
        }

        #[test]
        fn prop_truncation_is_malformed(
            resp in arb_response(),
            cut in any::<prop::sample::Index>(),
        ) {
            let codec = codec();
            let frame = codec.encode_response(&resp).unwrap();
            let len = cut.index(frame.len());
            let err = codec.decode_response(&frame[..len]).unwrap_err();
            prop_assert!(err.is_malformed(), "unexpected error {:?}", err);
        }

        #[test]
        fn prop_command_truncation_is_malformed(
            cmd in arb_command(),
            cut in any::<prop::sample::Index>(),
        ) {
            let codec = codec();
            let frame = codec.encode_command(&cmd).unwrap();
            let len = cut.index(frame.len());
            let err = codec.decode_command(&frame[..len]).unwrap_err();
            prop_assert!(err.is_malformed(), "unexpected error {:?}", err);
        }
    }
}
