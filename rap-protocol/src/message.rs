//! RAP command and response messages.
//!
//! Every command family has a fixed set of message-type codes: the command
//! itself, an optional posted variant for writes, an Ack and a Nak. The
//! interrupt notification is the only response without a command.

use crate::error::ProtocolError;
use crate::{Address, Data};

/// Message-type byte carried in the second header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    ReadSingle = 0x01,
    ReadSingleAck = 0x80,
    ReadSingleNak = 0xC1,

    WriteSingle = 0x10,
    WriteSinglePosted = 0x51,
    WriteSingleAck = 0x91,
    WriteSingleNak = 0xD0,

    ReadSeq = 0x04,
    ReadSeqAck = 0x85,
    ReadSeqNak = 0xC4,

    WriteSeq = 0x15,
    WriteSeqPosted = 0x54,
    WriteSeqAck = 0x94,
    WriteSeqNak = 0xD5,

    ReadComp = 0x08,
    ReadCompAck = 0x89,
    ReadCompNak = 0xC8,

    WriteComp = 0x19,
    WriteCompPosted = 0x58,
    WriteCompAck = 0x98,
    WriteCompNak = 0xD9,

    ReadModifyWrite = 0x20,
    ReadModifyWritePosted = 0x61,
    ReadModifyWriteAck = 0xA1,
    ReadModifyWriteNak = 0xE0,

    Interrupt = 0xB0,
}

impl MessageType {
    pub const ALL: [MessageType; 26] = [
        MessageType::ReadSingle,
        MessageType::ReadSingleAck,
        MessageType::ReadSingleNak,
        MessageType::WriteSingle,
        MessageType::WriteSinglePosted,
        MessageType::WriteSingleAck,
        MessageType::WriteSingleNak,
        MessageType::ReadSeq,
        MessageType::ReadSeqAck,
        MessageType::ReadSeqNak,
        MessageType::WriteSeq,
        MessageType::WriteSeqPosted,
        MessageType::WriteSeqAck,
        MessageType::WriteSeqNak,
        MessageType::ReadComp,
        MessageType::ReadCompAck,
        MessageType::ReadCompNak,
        MessageType::WriteComp,
        MessageType::WriteCompPosted,
        MessageType::WriteCompAck,
        MessageType::WriteCompNak,
        MessageType::ReadModifyWrite,
        MessageType::ReadModifyWritePosted,
        MessageType::ReadModifyWriteAck,
        MessageType::ReadModifyWriteNak,
        MessageType::Interrupt,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    /// Command family this code belongs to, if any.
    pub fn kind(self) -> Option<CommandKind> {
        use MessageType::*;
        match self {
            ReadSingle | ReadSingleAck | ReadSingleNak => Some(CommandKind::ReadSingle),
            WriteSingle | WriteSinglePosted | WriteSingleAck | WriteSingleNak => {
                Some(CommandKind::WriteSingle)
            }
            ReadSeq | ReadSeqAck | ReadSeqNak => Some(CommandKind::ReadSeq),
            WriteSeq | WriteSeqPosted | WriteSeqAck | WriteSeqNak => Some(CommandKind::WriteSeq),
            ReadComp | ReadCompAck | ReadCompNak => Some(CommandKind::ReadComp),
            WriteComp | WriteCompPosted | WriteCompAck | WriteCompNak => {
                Some(CommandKind::WriteComp)
            }
            ReadModifyWrite | ReadModifyWritePosted | ReadModifyWriteAck | ReadModifyWriteNak => {
                Some(CommandKind::ReadModifyWrite)
            }
            Interrupt => None,
        }
    }

    /// Whether a client may send this code.
    pub fn is_command(self) -> bool {
        self.kind()
            .is_some_and(|kind| self == kind.command_type(false) || self == kind.command_type(true))
    }

    /// Whether a server may send this code.
    pub fn is_response(self) -> bool {
        !self.is_command()
    }

    pub fn is_posted(self) -> bool {
        matches!(
            self,
            MessageType::WriteSinglePosted
                | MessageType::WriteSeqPosted
                | MessageType::WriteCompPosted
                | MessageType::ReadModifyWritePosted
        )
    }

    pub fn is_nak(self) -> bool {
        self.kind().is_some_and(|kind| kind.nak_type() == self)
    }
}

impl TryFrom<u8> for MessageType {
    type Error = ProtocolError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        MessageType::ALL
            .iter()
            .copied()
            .find(|ty| ty.code() == code)
            .ok_or(ProtocolError::UnexpectedMessageType(code))
    }
}

impl From<MessageType> for u8 {
    fn from(ty: MessageType) -> u8 {
        ty.code()
    }
}

/// The seven command families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    ReadSingle,
    WriteSingle,
    ReadSeq,
    WriteSeq,
    ReadComp,
    WriteComp,
    ReadModifyWrite,
}

impl CommandKind {
    /// Code of the command itself. Read families have no posted variant and
    /// ignore `posted`.
    pub fn command_type(self, posted: bool) -> MessageType {
        match (self, posted) {
            (CommandKind::ReadSingle, _) => MessageType::ReadSingle,
            (CommandKind::WriteSingle, false) => MessageType::WriteSingle,
            (CommandKind::WriteSingle, true) => MessageType::WriteSinglePosted,
            (CommandKind::ReadSeq, _) => MessageType::ReadSeq,
            (CommandKind::WriteSeq, false) => MessageType::WriteSeq,
            (CommandKind::WriteSeq, true) => MessageType::WriteSeqPosted,
            (CommandKind::ReadComp, _) => MessageType::ReadComp,
            (CommandKind::WriteComp, false) => MessageType::WriteComp,
            (CommandKind::WriteComp, true) => MessageType::WriteCompPosted,
            (CommandKind::ReadModifyWrite, false) => MessageType::ReadModifyWrite,
            (CommandKind::ReadModifyWrite, true) => MessageType::ReadModifyWritePosted,
        }
    }

    pub fn ack_type(self) -> MessageType {
        match self {
            CommandKind::ReadSingle => MessageType::ReadSingleAck,
            CommandKind::WriteSingle => MessageType::WriteSingleAck,
            CommandKind::ReadSeq => MessageType::ReadSeqAck,
            CommandKind::WriteSeq => MessageType::WriteSeqAck,
            CommandKind::ReadComp => MessageType::ReadCompAck,
            CommandKind::WriteComp => MessageType::WriteCompAck,
            CommandKind::ReadModifyWrite => MessageType::ReadModifyWriteAck,
        }
    }

    pub fn nak_type(self) -> MessageType {
        match self {
            CommandKind::ReadSingle => MessageType::ReadSingleNak,
            CommandKind::WriteSingle => MessageType::WriteSingleNak,
            CommandKind::ReadSeq => MessageType::ReadSeqNak,
            CommandKind::WriteSeq => MessageType::WriteSeqNak,
            CommandKind::ReadComp => MessageType::ReadCompNak,
            CommandKind::WriteComp => MessageType::WriteCompNak,
            CommandKind::ReadModifyWrite => MessageType::ReadModifyWriteNak,
        }
    }
}

/// A command sent from client to server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ReadSingle {
        txn: u8,
        address: Address,
    },
    WriteSingle {
        txn: u8,
        posted: bool,
        address: Address,
        data: Data,
    },
    ReadSeq {
        txn: u8,
        address: Address,
        increment: u64,
        count: u64,
    },
    WriteSeq {
        txn: u8,
        posted: bool,
        address: Address,
        increment: u64,
        data: Vec<Data>,
    },
    ReadComp {
        txn: u8,
        addresses: Vec<Address>,
    },
    WriteComp {
        txn: u8,
        posted: bool,
        pairs: Vec<(Address, Data)>,
    },
    ReadModifyWrite {
        txn: u8,
        posted: bool,
        address: Address,
        data: Data,
        mask: Data,
    },
}

impl Command {
    /// Transaction id echoed by the matching response.
    pub fn txn(&self) -> u8 {
        match self {
            Command::ReadSingle { txn, .. }
            | Command::WriteSingle { txn, .. }
            | Command::ReadSeq { txn, .. }
            | Command::WriteSeq { txn, .. }
            | Command::ReadComp { txn, .. }
            | Command::WriteComp { txn, .. }
            | Command::ReadModifyWrite { txn, .. } => *txn,
        }
    }

    pub fn kind(&self) -> CommandKind {
        match self {
            Command::ReadSingle { .. } => CommandKind::ReadSingle,
            Command::WriteSingle { .. } => CommandKind::WriteSingle,
            Command::ReadSeq { .. } => CommandKind::ReadSeq,
            Command::WriteSeq { .. } => CommandKind::WriteSeq,
            Command::ReadComp { .. } => CommandKind::ReadComp,
            Command::WriteComp { .. } => CommandKind::WriteComp,
            Command::ReadModifyWrite { .. } => CommandKind::ReadModifyWrite,
        }
    }

    pub fn is_posted(&self) -> bool {
        match self {
            Command::WriteSingle { posted, .. }
            | Command::WriteSeq { posted, .. }
            | Command::WriteComp { posted, .. }
            | Command::ReadModifyWrite { posted, .. } => *posted,
            _ => false,
        }
    }

    pub fn message_type(&self) -> MessageType {
        self.kind().command_type(self.is_posted())
    }
}

/// A response sent from server to client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    ReadSingleAck { txn: u8, data: Data },
    ReadSingleNak { txn: u8, status: Data },
    WriteSingleAck { txn: u8 },
    WriteSingleNak { txn: u8, status: Data },
    ReadSeqAck { txn: u8, data: Vec<Data> },
    ReadSeqNak { txn: u8, status: Data },
    WriteSeqAck { txn: u8 },
    WriteSeqNak { txn: u8, status: Data },
    ReadCompAck { txn: u8, data: Vec<Data> },
    ReadCompNak { txn: u8, status: Data },
    WriteCompAck { txn: u8 },
    WriteCompNak { txn: u8, status: Data },
    ReadModifyWriteAck { txn: u8 },
    ReadModifyWriteNak { txn: u8, status: Data },
    Interrupt { txn: u8, status: Data },
}

/// How a response relates to an outstanding command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ack,
    Nak(Data),
    /// The response belongs to a different family.
    Unrelated,
}

impl Response {
    /// Builds the Nak that answers a command of `kind`.
    pub fn nak(kind: CommandKind, txn: u8, status: Data) -> Self {
        match kind {
            CommandKind::ReadSingle => Response::ReadSingleNak { txn, status },
            CommandKind::WriteSingle => Response::WriteSingleNak { txn, status },
            CommandKind::ReadSeq => Response::ReadSeqNak { txn, status },
            CommandKind::WriteSeq => Response::WriteSeqNak { txn, status },
            CommandKind::ReadComp => Response::ReadCompNak { txn, status },
            CommandKind::WriteComp => Response::WriteCompNak { txn, status },
            CommandKind::ReadModifyWrite => Response::ReadModifyWriteNak { txn, status },
        }
    }

    pub fn txn(&self) -> u8 {
        use Response::*;
        match self {
            ReadSingleAck { txn, .. }
            | ReadSingleNak { txn, .. }
            | WriteSingleAck { txn }
            | WriteSingleNak { txn, .. }
            | ReadSeqAck { txn, .. }
            | ReadSeqNak { txn, .. }
            | WriteSeqAck { txn }
            | WriteSeqNak { txn, .. }
            | ReadCompAck { txn, .. }
            | ReadCompNak { txn, .. }
            | WriteCompAck { txn }
            | WriteCompNak { txn, .. }
            | ReadModifyWriteAck { txn }
            | ReadModifyWriteNak { txn, .. }
            | Interrupt { txn, .. } => *txn,
        }
    }

    pub fn message_type(&self) -> MessageType {
        use Response::*;
        match self {
            ReadSingleAck { .. } => MessageType::ReadSingleAck,
            ReadSingleNak { .. } => MessageType::ReadSingleNak,
            WriteSingleAck { .. } => MessageType::WriteSingleAck,
            WriteSingleNak { .. } => MessageType::WriteSingleNak,
            ReadSeqAck { .. } => MessageType::ReadSeqAck,
            ReadSeqNak { .. } => MessageType::ReadSeqNak,
            WriteSeqAck { .. } => MessageType::WriteSeqAck,
            WriteSeqNak { .. } => MessageType::WriteSeqNak,
            ReadCompAck { .. } => MessageType::ReadCompAck,
            ReadCompNak { .. } => MessageType::ReadCompNak,
            WriteCompAck { .. } => MessageType::WriteCompAck,
            WriteCompNak { .. } => MessageType::WriteCompNak,
            ReadModifyWriteAck { .. } => MessageType::ReadModifyWriteAck,
            ReadModifyWriteNak { .. } => MessageType::ReadModifyWriteNak,
            Interrupt { .. } => MessageType::Interrupt,
        }
    }

    /// Status carried by a Nak or an interrupt.
    pub fn status(&self) -> Option<Data> {
        use Response::*;
        match self {
            ReadSingleNak { status, .. }
            | WriteSingleNak { status, .. }
            | ReadSeqNak { status, .. }
            | WriteSeqNak { status, .. }
            | ReadCompNak { status, .. }
            | WriteCompNak { status, .. }
            | ReadModifyWriteNak { status, .. }
            | Interrupt { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Classifies this response against a command of `kind`.
    pub fn outcome_for(&self, kind: CommandKind) -> Outcome {
        let ty = self.message_type();
        if ty == kind.ack_type() {
            Outcome::Ack
        } else if ty == kind.nak_type() {
            Outcome::Nak(self.status().unwrap_or_default())
        } else {
            Outcome::Unrelated
        }
    }
}
