//! # rap-transport
//!
//! Message transports for RAP.
//!
//! A transport moves whole messages: one `send` produces exactly one message
//! at the peer, and one `recv` returns exactly one message. Transports never
//! split or coalesce messages.
//!
//! This crate provides:
//! - The [`Transport`] contract used by the client and server engines
//! - [`CancelToken`] for waking a blocked receive
//! - [`paired`], two connected in-process endpoints
//! - [`UdpTransport`], one datagram per message

pub mod cancel;
pub mod error;
pub mod paired;
pub mod udp;

pub use cancel::CancelToken;
pub use error::TransportError;
pub use paired::{paired, PairedTransport};
pub use udp::{UdpConfig, UdpTransport};

use bytes::Bytes;
use std::time::Duration;

/// Bidirectional message channel between a client and a server.
pub trait Transport: Send {
    /// Sends one message. Fails with [`TransportError::Oversized`] if the
    /// message exceeds [`Transport::max_message_size`].
    fn send(&mut self, message: &[u8]) -> Result<(), TransportError>;

    /// Blocks until one message arrives or the timeout elapses.
    fn recv(&mut self) -> Result<Bytes, TransportError>;

    /// Like [`Transport::recv`], but returns `Ok(None)` as soon as `cancel`
    /// is cancelled.
    fn recv_cancellable(&mut self, cancel: &CancelToken) -> Result<Option<Bytes>, TransportError>;

    /// Largest message this transport can carry.
    fn max_message_size(&self) -> usize;

    /// Sets the receive timeout. `None` blocks indefinitely.
    fn set_timeout(&mut self, timeout: Option<Duration>) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, message: &[u8]) -> Result<(), TransportError> {
        (**self).send(message)
    }

    fn recv(&mut self) -> Result<Bytes, TransportError> {
        (**self).recv()
    }

    fn recv_cancellable(&mut self, cancel: &CancelToken) -> Result<Option<Bytes>, TransportError> {
        (**self).recv_cancellable(cancel)
    }

    fn max_message_size(&self) -> usize {
        (**self).max_message_size()
    }

    fn set_timeout(&mut self, timeout: Option<Duration>) -> Result<(), TransportError> {
        (**self).set_timeout(timeout)
    }
}
