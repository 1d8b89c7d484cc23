//! In-process transport: two endpoints joined by a pair of channels.

use crate::cancel::CancelToken;
use crate::error::TransportError;
use crate::Transport;
use bytes::Bytes;
use crossbeam_channel::{select, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;
use tracing::trace;

/// One end of an in-process transport pair.
pub struct PairedTransport {
    tx: Sender<Bytes>,
    rx: Receiver<Bytes>,
    max_message_size: usize,
    timeout: Option<Duration>,
}

/// Creates two connected endpoints. Messages sent on one are received on the
/// other. The receive timeout starts unbounded.
pub fn paired(max_message_size: usize) -> (PairedTransport, PairedTransport) {
    let (a_tx, b_rx) = crossbeam_channel::unbounded();
    let (b_tx, a_rx) = crossbeam_channel::unbounded();
    let a = PairedTransport {
        tx: a_tx,
        rx: a_rx,
        max_message_size,
        timeout: None,
    };
    let b = PairedTransport {
        tx: b_tx,
        rx: b_rx,
        max_message_size,
        timeout: None,
    };
    (a, b)
}

impl PairedTransport {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl Transport for PairedTransport {
    fn send(&mut self, message: &[u8]) -> Result<(), TransportError> {
        if message.len() > self.max_message_size {
            return Err(TransportError::Oversized {
                size: message.len(),
                max: self.max_message_size,
            });
        }
        trace!(bytes = %hex::encode(message), "paired send");
        self.tx
            .send(Bytes::copy_from_slice(message))
            .map_err(|_| TransportError::Closed)
    }

    fn recv(&mut self) -> Result<Bytes, TransportError> {
        let message = match self.timeout {
            None => self.rx.recv().map_err(|_| TransportError::Closed)?,
            Some(timeout) => self.rx.recv_timeout(timeout).map_err(|e| match e {
                RecvTimeoutError::Timeout => TransportError::Timeout,
                RecvTimeoutError::Disconnected => TransportError::Closed,
            })?,
        };
        trace!(bytes = %hex::encode(&message), "paired recv");
        Ok(message)
    }

    fn recv_cancellable(&mut self, cancel: &CancelToken) -> Result<Option<Bytes>, TransportError> {
        if cancel.is_cancelled() {
            return Ok(None);
        }
        let message = match self.timeout {
            None => select! {
                recv(self.rx) -> msg => msg.map_err(|_| TransportError::Closed)?,
                recv(cancel.wake()) -> _ => return Ok(None),
            },
            Some(timeout) => select! {
                recv(self.rx) -> msg => msg.map_err(|_| TransportError::Closed)?,
                recv(cancel.wake()) -> _ => return Ok(None),
                default(timeout) => return Err(TransportError::Timeout),
            },
        };
        trace!(bytes = %hex::encode(&message), "paired recv");
        Ok(Some(message))
    }

    fn max_message_size(&self) -> usize {
        self.max_message_size
    }

    fn set_timeout(&mut self, timeout: Option<Duration>) -> Result<(), TransportError> {
        self.timeout = timeout;
        Ok(())
    }
}
