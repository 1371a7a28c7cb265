//! UDP socket construction
//!
//! Sockets are built with `socket2`, then handed out as plain
//! `std::net::UdpSocket`s. Listening sockets are bound without
//! SO_REUSEADDR, so a port already held by another engine fails to bind.

use crate::constants::{MAX_SOCKET_RETRY_ATTEMPTS, RETRY_BASE_DELAY_MS};
use crate::error::{RelayError, Result};
use socket2::{Domain, Protocol, Socket, Type};
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::time::Duration;

/// How a socket behaves on receive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketMode {
    /// Every call returns immediately (`WouldBlock` when nothing to do)
    NonBlocking,
    /// Receive blocks for at most the given duration
    ReadTimeout(Duration),
}

/// Create a UDP socket bound exclusively to `addr`
///
/// Retries a few times if the port is still held (e.g., by a previous run
/// shutting down), then fails with `RelayError::Bind`.
pub fn bind_socket(addr: SocketAddr, mode: SocketMode) -> Result<UdpSocket> {
    let map_err = |e| RelayError::Bind { addr, source: e };

    for attempt in 0..MAX_SOCKET_RETRY_ATTEMPTS {
        let socket = new_socket(addr).map_err(map_err)?;

        match socket.bind(&addr.into()) {
            Ok(()) => {
                let socket: UdpSocket = socket.into();
                apply_mode(&socket, mode).map_err(map_err)?;
                return Ok(socket);
            }
            Err(_) if attempt < MAX_SOCKET_RETRY_ATTEMPTS - 1 => {
                // Exponential backoff: 200ms, 400ms, 800ms, 1600ms
                std::thread::sleep(Duration::from_millis(RETRY_BASE_DELAY_MS * (1 << attempt)));
            }
            Err(e) => return Err(map_err(e)),
        }
    }

    Err(RelayError::Bind {
        addr,
        source: std::io::Error::new(std::io::ErrorKind::AddrInUse, "failed after retries"),
    })
}

/// Create a send-only UDP socket on an ephemeral port
pub fn unbound_socket(role: &'static str) -> Result<UdpSocket> {
    let map_err = |e| RelayError::Socket { role, source: e };
    let any: SocketAddr = (Ipv4Addr::UNSPECIFIED, 0).into();

    let socket = new_socket(any).map_err(map_err)?;
    socket.bind(&any.into()).map_err(map_err)?;
    let socket: UdpSocket = socket.into();
    apply_mode(&socket, SocketMode::NonBlocking).map_err(map_err)?;
    Ok(socket)
}

fn new_socket(addr: SocketAddr) -> std::io::Result<Socket> {
    Socket::new(Domain::for_address(addr), Type::DGRAM, Some(Protocol::UDP))
}

fn apply_mode(socket: &UdpSocket, mode: SocketMode) -> std::io::Result<()> {
    match mode {
        SocketMode::NonBlocking => socket.set_nonblocking(true),
        SocketMode::ReadTimeout(timeout) => {
            socket.set_nonblocking(false)?;
            // A zero timeout would mean "block forever"
            socket.set_read_timeout(Some(timeout.max(Duration::from_millis(1))))
        }
    }
}
