//! Command dispatch.

use crate::server::ServerStats;
use bytes::BytesMut;
use rap_core::RegisterTarget;
use rap_protocol::{Codec, Command, ProtocolError, Response, NAK_STATUS_GENERIC};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{debug, warn};

type DispatchError = Box<dyn std::error::Error + Send + Sync>;

/// Executes commands against a register backend.
pub struct CommandHandler<T: RegisterTarget> {
    target: Arc<T>,
    codec: Codec,
    stats: Arc<ServerStats>,
}

impl<T: RegisterTarget> CommandHandler<T> {
    pub fn new(target: Arc<T>, codec: Codec) -> Self {
        Self::with_stats(target, codec, Arc::new(ServerStats::default()))
    }

    pub fn with_stats(target: Arc<T>, codec: Codec, stats: Arc<ServerStats>) -> Self {
        Self {
            target,
            codec,
            stats,
        }
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    pub fn stats(&self) -> &ServerStats {
        &self.stats
    }

    /// Runs `command` and builds its Ack, or its Nak if the backend fails.
    /// The failure itself is only logged.
    pub fn handle(&self, command: &Command) -> Response {
        self.stats.commands_total.fetch_add(1, Ordering::Relaxed);
        match self.dispatch(command) {
            Ok(response) => {
                debug!(txn = command.txn(), command = ?command.message_type(), "command handled");
                response
            }
            Err(e) => {
                warn!(
                    txn = command.txn(),
                    command = ?command.message_type(),
                    error = %e,
                    "command failed, sending nak"
                );
                self.nak(command)
            }
        }
    }

    /// Handles `command` and encodes the reply. An Ack too large for the
    /// transport is replaced by the command's Nak.
    pub fn respond(&self, command: &Command) -> Result<BytesMut, ProtocolError> {
        let response = self.handle(command);
        match self.codec.encode_response(&response) {
            Ok(frame) => Ok(frame),
            Err(e) => {
                warn!(txn = command.txn(), error = %e, "response not encodable, sending nak");
                self.codec.encode_response(&self.nak(command))
            }
        }
    }

    fn nak(&self, command: &Command) -> Response {
        self.stats.naks_total.fetch_add(1, Ordering::Relaxed);
        Response::nak(command.kind(), command.txn(), NAK_STATUS_GENERIC)
    }

    fn dispatch(&self, command: &Command) -> Result<Response, DispatchError> {
        let target = self.target.as_ref();
        let response = match command {
            Command::ReadSingle { txn, address } => Response::ReadSingleAck {
                txn: *txn,
                data: target.read(*address)?,
            },
            Command::WriteSingle {
                txn, address, data, ..
            } => {
                target.write(*address, *data)?;
                Response::WriteSingleAck { txn: *txn }
            }
            Command::ReadSeq {
                txn,
                address,
                increment,
                count,
            } => {
                // The count comes off the wire; bound it before allocating.
                let max = self.codec.max_seq_read_count();
                if *count > max {
                    return Err(ProtocolError::SizeExceeded { count: *count, max }.into());
                }
                let mut data = vec![0; *count as usize];
                target.seq_read(*address, &mut data, *increment)?;
                Response::ReadSeqAck { txn: *txn, data }
            }
            Command::WriteSeq {
                txn,
                address,
                increment,
                data,
                ..
            } => {
                target.seq_write(*address, data, *increment)?;
                Response::WriteSeqAck { txn: *txn }
            }
            Command::ReadComp { txn, addresses } => {
                let mut data = vec![0; addresses.len()];
                target.comp_read(addresses, &mut data)?;
                Response::ReadCompAck { txn: *txn, data }
            }
            Command::WriteComp { txn, pairs, .. } => {
                target.comp_write(pairs)?;
                Response::WriteCompAck { txn: *txn }
            }
            Command::ReadModifyWrite {
                txn,
                address,
                data,
                mask,
                ..
            } => {
                target.read_modify_write(*address, *data, *mask)?;
                Response::ReadModifyWriteAck { txn: *txn }
            }
        };
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rap_core::MemoryTarget;
    use rap_protocol::{CommandKind, FieldWidth, IntWidth, Profile};

    fn handler(target: MemoryTarget) -> (CommandHandler<MemoryTarget>, Arc<MemoryTarget>) {
        let target = Arc::new(target);
        let codec = Codec::new(Profile::example(), 1452).unwrap();
        (CommandHandler::new(target.clone(), codec), target)
    }

    #[test]
    fn test_write_then_read() {
        let (handler, target) = handler(MemoryTarget::new(0, 0x100));
        let ack = handler.handle(&Command::WriteSingle {
            txn: 1,
            posted: true,
            address: 0x10,
            data: 0xCAFE,
        });
        assert_eq!(ack, Response::WriteSingleAck { txn: 1 });
        assert_eq!(target.peek(0x10), 0xCAFE);

        let ack = handler.handle(&Command::ReadSingle {
            txn: 2,
            address: 0x10,
        });
        assert_eq!(ack, Response::ReadSingleAck { txn: 2, data: 0xCAFE });
        assert_eq!(handler.stats().commands_total.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_backend_failure_becomes_nak() {
        let (handler, _) = handler(MemoryTarget::new(0, 0x100).with_read_only(0..4));
        let nak = handler.handle(&Command::ReadModifyWrite {
            txn: 7,
            posted: false,
            address: 2,
            data: 1,
            mask: 1,
        });
        assert_eq!(nak, Response::nak(CommandKind::ReadModifyWrite, 7, NAK_STATUS_GENERIC));
        assert_eq!(handler.stats().naks_total.load(Ordering::Relaxed), 1);

        let nak = handler.handle(&Command::ReadSingle {
            txn: 8,
            address: 0x1000,
        });
        assert_eq!(nak, Response::ReadSingleNak { txn: 8, status: 0xFD });
    }

    #[test]
    fn test_seq_and_fifo_dispatch() {
        let (handler, target) = handler(MemoryTarget::new(0, 0x100));
        handler.handle(&Command::WriteSeq {
            txn: 0,
            posted: false,
            address: 0x20,
            increment: 4,
            data: vec![1, 2, 3],
        });
        assert_eq!(target.peek(0x28), 3);

        let ack = handler.handle(&Command::ReadSeq {
            txn: 1,
            address: 0x20,
            increment: 0,
            count: 3,
        });
        assert_eq!(ack, Response::ReadSeqAck { txn: 1, data: vec![1, 1, 1] });
    }

    #[test]
    fn test_comp_dispatch() {
        let (handler, target) = handler(MemoryTarget::new(0, 0x100));
        handler.handle(&Command::WriteComp {
            txn: 0,
            posted: false,
            pairs: vec![(4, 40), (8, 80)],
        });
        assert_eq!(target.write_count(), 2);
        let ack = handler.handle(&Command::ReadComp {
            txn: 1,
            addresses: vec![8, 4, 12],
        });
        assert_eq!(ack, Response::ReadCompAck { txn: 1, data: vec![80, 40, 0] });
    }

    #[test]
    fn test_oversized_seq_read_is_nak() {
        let (handler, target) = handler(MemoryTarget::new(0, u64::MAX));
        let ack = handler.handle(&Command::ReadSeq {
            txn: 3,
            address: 0,
            increment: 4,
            count: 0xFFFF,
        });
        assert_eq!(ack, Response::ReadSeqNak { txn: 3, status: 0xFD });
        assert_eq!(target.read_count(), 0);
    }

    #[test]
    fn test_unencodable_ack_replaced_by_nak() {
        // Ten 3-byte addresses fit a 64-byte command; ten 8-byte words do not.
        let mut profile = Profile::example();
        profile.data = FieldWidth::new(64, 8, IntWidth::U64);
        let codec = Codec::new(profile, 64).unwrap();
        let handler = CommandHandler::new(Arc::new(MemoryTarget::new(0, 0x100)), codec.clone());

        let command = Command::ReadComp {
            txn: 5,
            addresses: (0..10).collect(),
        };
        let frame = handler.respond(&command).unwrap();
        assert_eq!(
            codec.decode_response(&frame).unwrap(),
            Response::ReadCompNak { txn: 5, status: 0xFD }
        );
    }
}
