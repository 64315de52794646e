use crate::{DISCOVER_GROUP, DISCOVER_PORT, RECV_TIMEOUT};

use async_trait::async_trait;
use log::{debug, info, warn};
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;
use tokio::{net::UdpSocket, time::timeout};

const RECV_BUFFER_SIZE: usize = 4096;
const MULTICAST_TTL: u32 = 255;

/// Setting up the discovery socket failed. The responder must not start.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("unable to bind discovery port {port}: {source}")]
    Bind { port: u16, source: io::Error },

    #[error("unable to join multicast group {group}: {source}")]
    Join { group: Ipv4Addr, source: io::Error },

    #[error("unable to configure discovery socket: {0}")]
    Configure(#[from] io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ReceiveError {
    /// Nothing arrived within the receive timeout. Expected while idle.
    #[error("no datagram within the receive timeout")]
    Timeout,

    /// This receive failed. A fresh receive may still succeed.
    #[error("receive failed: {0}")]
    Fatal(#[from] io::Error),

    #[error("transport is closed")]
    Closed,
}

/// The datagram side of WS-Discovery. Owned by exactly one task.
///
/// Sends are best effort: failures are logged by the implementation and
/// never reported back, a requester re-probes if a reply goes missing.
#[async_trait]
pub trait Transport: Send + 'static {
    async fn receive(&mut self) -> Result<(Vec<u8>, SocketAddr), ReceiveError>;

    async fn send_unicast(&mut self, addr: SocketAddr, bytes: &[u8]);

    async fn send_multicast(&mut self, bytes: &[u8]);

    /// Leaves the group and releases the socket. Calling it again does nothing.
    fn close(&mut self);
}

/// UDP socket bound to the WS-Discovery port and joined to its group
pub struct MulticastTransport {
    socket: Option<UdpSocket>,
    group: SocketAddrV4,
    recv_timeout: Duration,
    buf: Vec<u8>,
}

impl MulticastTransport {
    /// Opens the standard `239.255.255.250:3702` endpoint.
    /// Must be called from within a tokio runtime.
    pub fn open() -> Result<Self, TransportError> {
        Self::open_with(DISCOVER_GROUP, DISCOVER_PORT, RECV_TIMEOUT)
    }

    pub fn open_with(
        group: Ipv4Addr,
        port: u16,
        recv_timeout: Duration,
    ) -> Result<Self, TransportError> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;

        // Other WS-Discovery listeners may share the port
        socket.set_reuse_address(true)?;
        #[cfg(all(unix, not(any(target_os = "solaris", target_os = "illumos"))))]
        socket.set_reuse_port(true)?;
        socket.set_broadcast(true)?;
        socket.set_ttl(MULTICAST_TTL)?;
        socket.set_multicast_ttl_v4(MULTICAST_TTL)?;
        socket.set_nonblocking(true)?;

        let bind_addr = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port);
        socket
            .bind(&bind_addr.into())
            .map_err(|source| TransportError::Bind { port, source })?;
        socket
            .join_multicast_v4(&group, &Ipv4Addr::UNSPECIFIED)
            .map_err(|source| TransportError::Join { group, source })?;

        let socket = UdpSocket::from_std(socket.into())?;
        let port = socket.local_addr()?.port();

        info!("[Transport][open] Joined {group} on port {port}");

        Ok(MulticastTransport {
            socket: Some(socket),
            group: SocketAddrV4::new(group, port),
            recv_timeout,
            buf: vec![0; RECV_BUFFER_SIZE],
        })
    }

    pub fn is_open(&self) -> bool {
        self.socket.is_some()
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }

    async fn send_to(&self, addr: SocketAddr, bytes: &[u8]) {
        let Some(socket) = self.socket.as_ref() else {
            warn!("[Transport][send] Dropping {} bytes for {addr}, transport closed", bytes.len());
            return;
        };

        match socket.send_to(bytes, addr).await {
            Ok(size) => debug!("[Transport][send] Sent {size} bytes to {addr}"),
            Err(e) => warn!("[Transport][send] Error sending to {addr}: {e}"),
        }
    }
}

#[async_trait]
impl Transport for MulticastTransport {
    async fn receive(&mut self) -> Result<(Vec<u8>, SocketAddr), ReceiveError> {
        let Some(socket) = self.socket.as_ref() else {
            return Err(ReceiveError::Closed);
        };

        match timeout(self.recv_timeout, socket.recv_from(&mut self.buf)).await {
            Ok(Ok((size, addr))) => Ok((self.buf[..size].to_vec(), addr)),
            Ok(Err(e)) => Err(ReceiveError::Fatal(e)),
            Err(_) => Err(ReceiveError::Timeout),
        }
    }

    async fn send_unicast(&mut self, addr: SocketAddr, bytes: &[u8]) {
        self.send_to(addr, bytes).await
    }

    async fn send_multicast(&mut self, bytes: &[u8]) {
        self.send_to(SocketAddr::V4(self.group), bytes).await
    }

    fn close(&mut self) {
        let Some(socket) = self.socket.take() else {
            return;
        };

        if let Err(e) = socket.leave_multicast_v4(*self.group.ip(), Ipv4Addr::UNSPECIFIED) {
            warn!("[Transport][close] Error leaving {}: {e}", self.group.ip());
        }

        info!("[Transport][close] Left {}", self.group.ip());
    }
}

impl Drop for MulticastTransport {
    fn drop(&mut self) {
        self.close();
    }
}
