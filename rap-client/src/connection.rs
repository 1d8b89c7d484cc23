//! Command/response round trips over a transport.

use crate::error::ClientError;
use parking_lot::Mutex;
use rap_protocol::{Codec, Command, Outcome, Profile, Response};
use rap_transport::Transport;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;
use tracing::debug;

/// A client endpoint.
///
/// The transport is locked for the whole round trip, so concurrent callers
/// are serialized and a response is always read by the caller that sent the
/// matching command.
pub struct Connection {
    transport: Mutex<Box<dyn Transport>>,
    codec: Codec,
    next_txn: AtomicU8,
}

impl Connection {
    /// Creates a connection sized to the transport's maximum message size.
    pub fn new(transport: Box<dyn Transport>, profile: Profile) -> Result<Self, ClientError> {
        let codec = Codec::new(profile, transport.max_message_size())?;
        Ok(Self {
            transport: Mutex::new(transport),
            codec,
            next_txn: AtomicU8::new(0),
        })
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    pub fn profile(&self) -> &Profile {
        self.codec.profile()
    }

    /// Allocates the next transaction id. Ids wrap from 255 to 0.
    pub fn next_transaction_id(&self) -> u8 {
        self.next_txn.fetch_add(1, Ordering::Relaxed)
    }

    /// Sets how long to wait for each response. `None` waits indefinitely.
    pub fn set_timeout(&self, timeout: Option<Duration>) -> Result<(), ClientError> {
        self.transport.lock().set_timeout(timeout)?;
        Ok(())
    }

    /// Sends `command` and returns the response carrying the same
    /// transaction id, whatever its type.
    pub fn round_trip(&self, command: &Command) -> Result<Response, ClientError> {
        let frame = self.codec.encode_command(command)?;

        let reply = {
            let mut transport = self.transport.lock();
            transport.send(&frame)?;
            transport.recv()?
        };

        let response = self.codec.decode_response(&reply)?;
        debug!(
            txn = command.txn(),
            command = ?command.message_type(),
            response = ?response.message_type(),
            "round trip"
        );

        if response.txn() != command.txn() {
            return Err(ClientError::TransactionMismatch {
                expected: command.txn(),
                actual: response.txn(),
            });
        }
        Ok(response)
    }

    /// Like [`Connection::round_trip`], but only an Ack of the command's own
    /// family is a success.
    pub fn execute(&self, command: &Command) -> Result<Response, ClientError> {
        let response = self.round_trip(command)?;
        let kind = command.kind();
        match response.outcome_for(kind) {
            Outcome::Ack => Ok(response),
            Outcome::Nak(status) => Err(ClientError::Rejected { status }),
            Outcome::Unrelated => Err(ClientError::UnexpectedResponse {
                expected: kind.ack_type().code(),
                actual: response.message_type().code(),
            }),
        }
    }
}
