//! Background datagram listener
//!
//! One named OS thread per engine. The socket must be in
//! `SocketMode::ReadTimeout` so each receive returns at least once per
//! timeout and the shutdown flag is observed promptly.

use crate::constants::MAX_PAYLOAD_LEN;
use crate::error::{RelayError, Result};
use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, trace};

/// Spawn a receive loop that hands every datagram to `on_datagram`
///
/// The loop runs until `running` is cleared. Empty datagrams are treated
/// like a timeout and never reach the handler. Payloads longer than
/// `MAX_PAYLOAD_LEN` are truncated by the receive buffer.
pub fn spawn_listener<F>(
    name: &'static str,
    socket: Arc<UdpSocket>,
    running: Arc<AtomicBool>,
    mut on_datagram: F,
) -> Result<JoinHandle<()>>
where
    F: FnMut(&[u8], SocketAddr) + Send + 'static,
{
    thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            let mut buf = [0u8; MAX_PAYLOAD_LEN];

            while running.load(Ordering::Relaxed) {
                match socket.recv_from(&mut buf) {
                    Ok((0, from)) => {
                        trace!("{}: empty datagram from {} ignored", name, from);
                    }
                    Ok((len, from)) => {
                        trace!("{}: {} bytes from {}", name, len, from);
                        on_datagram(&buf[..len], from);
                    }
                    Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                        // Timeout - check shutdown and continue
                    }
                    Err(ref e) if e.kind() == ErrorKind::TimedOut => {
                        // Timeout - check shutdown and continue
                    }
                    Err(e) => {
                        // ICMP port-unreachable surfaces here on some platforms
                        debug!("{}: recv error: {}", name, e);
                    }
                }
            }

            debug!("{} stopped", name);
        })
        .map_err(|e| RelayError::ThreadSpawn { name, source: e })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::udp::{bind_socket, SocketMode};
    use std::net::Ipv4Addr;
    use std::sync::mpsc;
    use std::time::{Duration, Instant};

    fn listening_socket() -> Arc<UdpSocket> {
        let addr: SocketAddr = (Ipv4Addr::LOCALHOST, 0).into();
        Arc::new(bind_socket(addr, SocketMode::ReadTimeout(Duration::from_millis(20))).unwrap())
    }

    #[test]
    fn test_listener_delivers_datagrams() {
        let socket = listening_socket();
        let target = socket.local_addr().unwrap();
        let running = Arc::new(AtomicBool::new(true));
        let (tx, rx) = mpsc::channel();

        let handle = spawn_listener("test-listener", socket, running.clone(), move |data, _| {
            let _ = tx.send(data.to_vec());
        })
        .unwrap();

        let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
        sender.send_to(b"hello", target).unwrap();

        let got = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(got, b"hello");

        running.store(false, Ordering::SeqCst);
        handle.join().unwrap();
    }

    #[test]
    fn test_listener_skips_empty_datagrams() {
        let socket = listening_socket();
        let target = socket.local_addr().unwrap();
        let running = Arc::new(AtomicBool::new(true));
        let (tx, rx) = mpsc::channel();

        let handle = spawn_listener("empty-listener", socket, running.clone(), move |data, _| {
            let _ = tx.send(data.to_vec());
        })
        .unwrap();

        let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
        sender.send_to(b"", target).unwrap();
        sender.send_to(b"real", target).unwrap();

        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), b"real");
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

        running.store(false, Ordering::SeqCst);
        handle.join().unwrap();
    }

    #[test]
    fn test_listener_stops_within_timeout() {
        let socket = listening_socket();
        let running = Arc::new(AtomicBool::new(true));
        let handle = spawn_listener("idle-listener", socket, running.clone(), |_, _| {}).unwrap();

        let start = Instant::now();
        running.store(false, Ordering::SeqCst);
        handle.join().unwrap();
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
