//! UDP transport: one datagram per message.
//!
//! A transport with a configured remote is connected to it. Without one, the
//! transport replies to whichever peer it last received from, which is how a
//! server endpoint is used.

use crate::cancel::CancelToken;
use crate::error::TransportError;
use crate::Transport;
use bytes::Bytes;
use std::net::{SocketAddr, UdpSocket};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// IPv6 header plus UDP header.
pub const UDP_OVERHEAD: usize = 40 + 8;

pub const DEFAULT_MTU: usize = 1500;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// How often a cancellable receive re-checks its token.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// UDP endpoint configuration.
#[derive(Debug, Clone)]
pub struct UdpConfig {
    pub bind_addr: SocketAddr,
    pub remote_addr: Option<SocketAddr>,
    pub mtu: usize,
    pub timeout: Option<Duration>,
}

impl UdpConfig {
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            remote_addr: None,
            mtu: DEFAULT_MTU,
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }

    pub fn with_remote(mut self, remote_addr: SocketAddr) -> Self {
        self.remote_addr = Some(remote_addr);
        self
    }

    pub fn with_mtu(mut self, mtu: usize) -> Self {
        self.mtu = mtu;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Largest RAP message that fits one datagram on this MTU.
    pub fn max_message_size(&self) -> usize {
        self.mtu.saturating_sub(UDP_OVERHEAD)
    }
}

pub struct UdpTransport {
    socket: UdpSocket,
    connected: bool,
    last_peer: Option<SocketAddr>,
    max_message_size: usize,
    timeout: Option<Duration>,
    buf: Vec<u8>,
}

impl UdpTransport {
    /// Binds the local socket and, if a remote is configured, connects it.
    pub fn bind(config: &UdpConfig) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(config.bind_addr)?;
        if let Some(remote) = config.remote_addr {
            socket.connect(remote)?;
        }
        socket.set_read_timeout(config.timeout)?;

        let max_message_size = config.max_message_size();
        debug!(
            local = %socket.local_addr()?,
            remote = ?config.remote_addr,
            max_message_size,
            "UDP transport bound"
        );

        Ok(Self {
            socket,
            connected: config.remote_addr.is_some(),
            last_peer: None,
            max_message_size,
            timeout: config.timeout,
            // One spare byte so oversized datagrams are detectable.
            buf: vec![0u8; max_message_size + 1],
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        Ok(self.socket.local_addr()?)
    }

    /// Peer a reply would be sent to.
    pub fn peer(&self) -> Option<SocketAddr> {
        if self.connected {
            self.socket.peer_addr().ok()
        } else {
            self.last_peer
        }
    }

    fn recv_datagram(&mut self) -> Result<Bytes, TransportError> {
        let (len, from) = self
            .socket
            .recv_from(&mut self.buf)
            .map_err(TransportError::from_read)?;
        if len > self.max_message_size {
            return Err(TransportError::Oversized {
                size: len,
                max: self.max_message_size,
            });
        }
        if !self.connected {
            self.last_peer = Some(from);
        }
        let message = Bytes::copy_from_slice(&self.buf[..len]);
        trace!(peer = %from, bytes = %hex::encode(&message), "udp recv");
        Ok(message)
    }

    fn poll_until_cancelled(&mut self, cancel: &CancelToken) -> Result<Option<Bytes>, TransportError> {
        let deadline = self.timeout.map(|t| Instant::now() + t);
        loop {
            if cancel.is_cancelled() {
                return Ok(None);
            }
            let slice = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(TransportError::Timeout);
                    }
                    (deadline - now).min(CANCEL_POLL_INTERVAL)
                }
                None => CANCEL_POLL_INTERVAL,
            };
            self.socket.set_read_timeout(Some(slice))?;
            match self.recv_datagram() {
                Ok(message) => return Ok(Some(message)),
                Err(TransportError::Timeout) => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

impl Transport for UdpTransport {
    fn send(&mut self, message: &[u8]) -> Result<(), TransportError> {
        if message.len() > self.max_message_size {
            return Err(TransportError::Oversized {
                size: message.len(),
                max: self.max_message_size,
            });
        }
        if self.connected {
            self.socket.send(message)?;
        } else {
            let peer = self.last_peer.ok_or(TransportError::NoPeer)?;
            self.socket.send_to(message, peer)?;
        }
        trace!(peer = ?self.peer(), bytes = %hex::encode(message), "udp send");
        Ok(())
    }

    fn recv(&mut self) -> Result<Bytes, TransportError> {
        self.recv_datagram()
    }

    fn recv_cancellable(&mut self, cancel: &CancelToken) -> Result<Option<Bytes>, TransportError> {
        let result = self.poll_until_cancelled(cancel);
        self.socket.set_read_timeout(self.timeout)?;
        result
    }

    fn max_message_size(&self) -> usize {
        self.max_message_size
    }

    fn set_timeout(&mut self, timeout: Option<Duration>) -> Result<(), TransportError> {
        self.socket.set_read_timeout(timeout)?;
        self.timeout = timeout;
        Ok(())
    }
}
