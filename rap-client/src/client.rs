//! Register access over RAP.

use crate::connection::Connection;
use crate::error::ClientError;
use rap_core::{generic, RegisterTarget};
use rap_protocol::{Address, Codec, Command, Data, Features, Profile, Response};
use rap_transport::Transport;
use std::time::Duration;

/// A remote register target.
///
/// Each operation uses the dedicated command family when the profile enables
/// it, and otherwise decomposes into single reads and writes.
pub struct Client {
    conn: Connection,
    posted_writes: bool,
}

impl Client {
    pub fn new(transport: Box<dyn Transport>, profile: Profile) -> Result<Self, ClientError> {
        Ok(Self {
            conn: Connection::new(transport, profile)?,
            posted_writes: false,
        })
    }

    /// Sends writes with the posted message-type codes.
    pub fn with_posted_writes(mut self, posted: bool) -> Self {
        self.posted_writes = posted;
        self
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn codec(&self) -> &Codec {
        self.conn.codec()
    }

    pub fn profile(&self) -> &Profile {
        self.conn.profile()
    }

    pub fn set_timeout(&self, timeout: Option<Duration>) -> Result<(), ClientError> {
        self.conn.set_timeout(timeout)
    }

    fn features(&self) -> Features {
        self.profile().features
    }

    fn txn(&self) -> u8 {
        self.conn.next_transaction_id()
    }

    /// Whether a sequential access with `increment` has a command family.
    fn sequential_supported(&self, increment: u64) -> bool {
        let profile = self.profile();
        if increment > profile.max_length_value() {
            return false;
        }
        let features = profile.features;
        features.increment
            || (increment == 0 && features.fifo)
            || (increment == profile.data.storage.bytes() as u64 && features.sequential)
    }

    fn read_seq_command(&self, start: Address, out: &mut [Data], increment: u64) -> Result<(), ClientError> {
        let command = Command::ReadSeq {
            txn: self.txn(),
            address: start,
            increment,
            count: out.len() as u64,
        };
        match self.conn.execute(&command)? {
            Response::ReadSeqAck { data, .. } => copy_words(&data, out),
            other => Err(unexpected(&command, &other)),
        }
    }

    fn write_seq_command(&self, start: Address, data: &[Data], increment: u64) -> Result<(), ClientError> {
        let command = Command::WriteSeq {
            txn: self.txn(),
            posted: self.posted_writes,
            address: start,
            increment,
            data: data.to_vec(),
        };
        self.conn.execute(&command)?;
        Ok(())
    }
}

fn copy_words(data: &[Data], out: &mut [Data]) -> Result<(), ClientError> {
    if data.len() != out.len() {
        return Err(ClientError::CountMismatch {
            expected: out.len(),
            actual: data.len(),
        });
    }
    out.copy_from_slice(data);
    Ok(())
}

fn unexpected(command: &Command, response: &Response) -> ClientError {
    ClientError::UnexpectedResponse {
        expected: command.kind().ack_type().code(),
        actual: response.message_type().code(),
    }
}

impl RegisterTarget for Client {
    type Error = ClientError;

    fn read(&self, address: Address) -> Result<Data, ClientError> {
        let command = Command::ReadSingle {
            txn: self.txn(),
            address,
        };
        match self.conn.execute(&command)? {
            Response::ReadSingleAck { data, .. } => Ok(data),
            other => Err(unexpected(&command, &other)),
        }
    }

    fn write(&self, address: Address, data: Data) -> Result<(), ClientError> {
        let command = Command::WriteSingle {
            txn: self.txn(),
            posted: self.posted_writes,
            address,
            data,
        };
        self.conn.execute(&command)?;
        Ok(())
    }

    fn read_modify_write(&self, address: Address, data: Data, mask: Data) -> Result<(), ClientError> {
        if !self.features().read_modify_write {
            return generic::read_modify_write(self, address, data, mask);
        }
        let command = Command::ReadModifyWrite {
            txn: self.txn(),
            posted: self.posted_writes,
            address,
            data,
            mask,
        };
        self.conn.execute(&command)?;
        Ok(())
    }

    fn seq_read(&self, start: Address, out: &mut [Data], increment: u64) -> Result<(), ClientError> {
        if !self.sequential_supported(increment) {
            return generic::seq_read(self, start, out, increment);
        }
        self.read_seq_command(start, out, increment)
    }

    fn seq_write(&self, start: Address, data: &[Data], increment: u64) -> Result<(), ClientError> {
        if !self.sequential_supported(increment) {
            return generic::seq_write(self, start, data, increment);
        }
        self.write_seq_command(start, data, increment)
    }

    fn fifo_read(&self, address: Address, out: &mut [Data]) -> Result<(), ClientError> {
        if !self.features().fifo {
            return generic::fifo_read(self, address, out);
        }
        self.read_seq_command(address, out, 0)
    }

    fn fifo_write(&self, address: Address, data: &[Data]) -> Result<(), ClientError> {
        if !self.features().fifo {
            return generic::fifo_write(self, address, data);
        }
        self.write_seq_command(address, data, 0)
    }

    fn comp_read(&self, addresses: &[Address], out: &mut [Data]) -> Result<(), ClientError> {
        if !self.features().compressed {
            return generic::comp_read(self, addresses, out);
        }
        if addresses.len() != out.len() {
            return Err(rap_core::TargetError::LengthMismatch {
                addresses: addresses.len(),
                data: out.len(),
            }
            .into());
        }
        let command = Command::ReadComp {
            txn: self.txn(),
            addresses: addresses.to_vec(),
        };
        match self.conn.execute(&command)? {
            Response::ReadCompAck { data, .. } => copy_words(&data, out),
            other => Err(unexpected(&command, &other)),
        }
    }

    fn comp_write(&self, pairs: &[(Address, Data)]) -> Result<(), ClientError> {
        if !self.features().compressed {
            return generic::comp_write(self, pairs);
        }
        let command = Command::WriteComp {
            txn: self.txn(),
            posted: self.posted_writes,
            pairs: pairs.to_vec(),
        };
        self.conn.execute(&command)?;
        Ok(())
    }
}
