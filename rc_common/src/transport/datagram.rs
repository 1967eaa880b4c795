//! UDP datagram channel.
//!
//! Each poll returns the oldest queued datagram. The receive buffer holds a
//! full-size datagram, so every payload reaches the codec whole.

use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};

use tracing::debug;

use super::{Payload, Transport, TransportError, UdpConfig};
use crate::consts::MAX_DATAGRAM_LEN;

/// Non-blocking UDP channel.
pub struct DatagramChannel {
    socket: UdpSocket,
    peer: Option<SocketAddr>,
    buffer: Box<[u8]>,
}

impl DatagramChannel {
    /// Bind the socket and switch it to non-blocking mode.
    ///
    /// # Errors
    ///
    /// `OpenFailed` if the address cannot be bound or configured.
    pub fn open(config: &UdpConfig) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(config.bind)
            .map_err(|e| TransportError::OpenFailed(format!("bind {}: {e}", config.bind)))?;
        socket
            .set_nonblocking(true)
            .map_err(|e| TransportError::OpenFailed(format!("set_nonblocking: {e}")))?;
        if config.broadcast {
            socket
                .set_broadcast(true)
                .map_err(|e| TransportError::OpenFailed(format!("set_broadcast: {e}")))?;
        }

        debug!(bind = %config.bind, peer = ?config.peer, "UDP channel open");

        Ok(Self {
            socket,
            peer: config.peer,
            buffer: vec![0u8; MAX_DATAGRAM_LEN].into_boxed_slice(),
        })
    }

    /// Address the socket is actually bound to.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.local_addr().ok()
    }

    /// Replace the send destination.
    pub fn set_peer(&mut self, peer: SocketAddr) {
        self.peer = Some(peer);
    }
}

impl Transport for DatagramChannel {
    fn name(&self) -> &'static str {
        "udp"
    }

    fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        let peer = self
            .peer
            .ok_or_else(|| TransportError::SendFailed("no peer address configured".to_string()))?;
        match self.socket.send_to(payload, peer) {
            Ok(sent) if sent == payload.len() => Ok(()),
            Ok(sent) => Err(TransportError::SendFailed(format!(
                "short write: {sent} of {} bytes",
                payload.len()
            ))),
            Err(e) => Err(TransportError::SendFailed(format!("{peer}: {e}"))),
        }
    }

    fn try_receive(&mut self) -> Option<Payload> {
        match self.socket.recv_from(&mut self.buffer) {
            Ok((len, _)) => Some(self.buffer[..len].to_vec()),
            Err(e) if e.kind() == ErrorKind::WouldBlock => None,
            Err(e) => {
                // ICMP port unreachable and similar surface here on Linux.
                debug!("UDP receive error: {e}");
                None
            }
        }
    }
}
