//! Emitter engine: filtered record shipping with remote level control
//!
//! Owns two sockets:
//! - send socket (ephemeral port): carries records to the collector
//! - control socket (well-known port): announces itself once with a hello,
//!   then receives `Set Log Level=` commands on a background thread
//!
//! The filter and the send socket live behind one mutex, so a record is
//! never checked against one filter value and sent under another.

use crate::config::EmitterConfig;
use crate::error::Result;
use crate::protocol::{ControlMessage, LogRecord, Severity, HELLO_MESSAGE};
use crate::stats::{EmitterSnapshot, EmitterStats};
use crate::transport::{bind_socket, spawn_listener, unbound_socket, SocketMode};
use parking_lot::Mutex;
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, info, trace};

/// Log a formatted message through an [`Emitter`], tagging it with the
/// calling file, module and line.
///
/// ```ignore
/// relay_log!(emitter, Severity::Warning, "queue depth {}", depth);
/// ```
#[macro_export]
macro_rules! relay_log {
    ($emitter:expr, $level:expr, $($arg:tt)+) => {
        $emitter.log(
            $level,
            file!(),
            module_path!(),
            line!(),
            &format!($($arg)+),
        )
    };
}

/// State guarded by the emitter mutex
struct Outbound {
    /// Raw threshold rank; remote commands may push it out of range
    filter: i32,
    socket: UdpSocket,
    collector: SocketAddr,
}

/// Client-side logging engine
pub struct Emitter {
    outbound: Arc<Mutex<Outbound>>,
    control_addr: SocketAddr,
    running: Arc<AtomicBool>,
    listener: Option<JoinHandle<()>>,
    stats: Arc<EmitterStats>,
}

impl Emitter {
    /// Open both sockets, announce the control endpoint and start listening
    ///
    /// Nothing stays open on failure: sockets acquired so far are dropped
    /// before the error is returned.
    pub fn initialize(config: &EmitterConfig) -> Result<Self> {
        let send_socket = unbound_socket("emitter send")?;
        let control_socket = bind_socket(
            config.control_addr(),
            SocketMode::ReadTimeout(config.poll_interval()),
        )?;
        let control_socket = Arc::new(control_socket);
        let control_addr = control_socket
            .local_addr()
            .unwrap_or_else(|_| config.control_addr());

        // Lets the collector learn where to push level updates
        if let Err(e) = control_socket.send_to(HELLO_MESSAGE.as_bytes(), config.collector_addr) {
            debug!("Hello to {} not sent: {}", config.collector_addr, e);
        }

        let outbound = Arc::new(Mutex::new(Outbound {
            filter: config.initial_level.rank(),
            socket: send_socket,
            collector: config.collector_addr,
        }));
        let stats = Arc::new(EmitterStats::new());
        let running = Arc::new(AtomicBool::new(true));

        let listener = {
            let outbound = outbound.clone();
            let stats = stats.clone();
            spawn_listener(
                "log-relay-control",
                control_socket,
                running.clone(),
                move |payload, from| {
                    if let Some(ControlMessage::SetLevel(rank)) = ControlMessage::parse(payload) {
                        outbound.lock().filter = rank;
                        stats.add_command();
                        debug!("Filter set to {} by {}", rank, from);
                    }
                },
            )?
        };

        info!(
            "Emitter ready: collector {}, control port {}",
            config.collector_addr,
            control_addr.port()
        );

        Ok(Self {
            outbound,
            control_addr,
            running,
            listener: Some(listener),
            stats,
        })
    }

    /// Replace the local filter
    pub fn set_level(&self, level: Severity) {
        self.outbound.lock().filter = level.rank();
    }

    /// Current filter rank
    pub fn level(&self) -> i32 {
        self.outbound.lock().filter
    }

    /// Ship one record if `level` passes the filter
    ///
    /// Fire-and-forget: a record the socket refuses is dropped silently.
    pub fn log(&self, level: Severity, file: &str, function: &str, line: u32, message: &str) {
        let outbound = self.outbound.lock();
        if !level.passes(outbound.filter) {
            self.stats.add_filtered();
            return;
        }

        let payload = LogRecord::now(level, file, function, line, message).to_payload();
        match outbound
            .socket
            .send_to(payload.as_bytes(), outbound.collector)
        {
            Ok(_) => self.stats.add_sent(),
            Err(e) => {
                self.stats.add_dropped();
                trace!("Record dropped: {}", e);
            }
        }
    }

    /// Address the control socket is bound to
    pub fn control_addr(&self) -> SocketAddr {
        self.control_addr
    }

    pub fn stats(&self) -> EmitterSnapshot {
        self.stats.snapshot()
    }

    /// Stop the control listener and close both sockets
    pub fn shutdown(mut self) {
        self.stop_listener();
    }

    fn stop_listener(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.listener.take() {
            let _ = handle.join();
            debug!("Emitter stopped");
        }
    }
}

impl Drop for Emitter {
    fn drop(&mut self) {
        self.stop_listener();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RelayError;
    use std::net::Ipv4Addr;
    use std::time::Duration;

    /// Plain socket standing in for the collector
    fn fake_collector() -> UdpSocket {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        socket
            .set_read_timeout(Some(Duration::from_millis(300)))
            .unwrap();
        socket
    }

    fn config_for(collector: &UdpSocket, level: Severity) -> EmitterConfig {
        EmitterConfig {
            collector_addr: collector.local_addr().unwrap(),
            control_port: 0,
            initial_level: level,
            poll_interval_ms: 20,
        }
    }

    fn recv_text(socket: &UdpSocket) -> Option<String> {
        let mut buf = [0u8; 2048];
        socket
            .recv_from(&mut buf)
            .ok()
            .map(|(len, _)| String::from_utf8_lossy(&buf[..len]).into_owned())
    }

    #[test]
    fn test_initialize_sends_hello_from_control_socket() {
        let collector = fake_collector();
        let emitter = Emitter::initialize(&config_for(&collector, Severity::Debug)).unwrap();

        let mut buf = [0u8; 128];
        let (len, from) = collector.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..len], HELLO_MESSAGE.as_bytes());
        assert_eq!(from.port(), emitter.control_addr().port());

        emitter.shutdown();
    }

    #[test]
    fn test_log_boundary_inclusive() {
        let collector = fake_collector();
        let emitter = Emitter::initialize(&config_for(&collector, Severity::Error)).unwrap();
        let _hello = recv_text(&collector);

        emitter.log(Severity::Warning, "a.c", "f", 1, "below");
        emitter.log(Severity::Error, "a.c", "f", 2, "equal");

        let line = recv_text(&collector).unwrap();
        assert!(line.ends_with(" ERROR a.c:f:2 equal"), "got {line}");
        assert!(recv_text(&collector).is_none());

        let stats = emitter.stats();
        assert_eq!(stats.sent, 1);
        assert_eq!(stats.filtered, 1);
    }

    #[test]
    fn test_set_level_applies_immediately() {
        let collector = fake_collector();
        let emitter = Emitter::initialize(&config_for(&collector, Severity::Debug)).unwrap();
        assert_eq!(emitter.level(), 0);

        emitter.set_level(Severity::Critical);
        assert_eq!(emitter.level(), 3);

        emitter.log(Severity::Error, "a.c", "f", 1, "dropped");
        assert_eq!(emitter.stats().sent, 0);
    }

    #[test]
    fn test_relay_log_macro_tags_call_site() {
        let collector = fake_collector();
        let emitter = Emitter::initialize(&config_for(&collector, Severity::Debug)).unwrap();
        let _hello = recv_text(&collector);

        crate::relay_log!(emitter, Severity::Critical, "disk {}% full", 97);

        let line = recv_text(&collector).unwrap();
        assert!(line.contains(" CRITICAL "));
        assert!(line.contains(file!()));
        assert!(line.contains(module_path!()));
        assert!(line.ends_with("disk 97% full"));
    }

    #[test]
    fn test_remote_command_changes_filter() {
        let collector = fake_collector();
        let emitter = Emitter::initialize(&config_for(&collector, Severity::Debug)).unwrap();
        let control = SocketAddr::from((Ipv4Addr::LOCALHOST, emitter.control_addr().port()));

        collector.send_to(b"Set Log Level=2", control).unwrap();

        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while emitter.level() != 2 && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(emitter.level(), 2);
        assert_eq!(emitter.stats().commands, 1);
    }

    #[test]
    fn test_bind_failure_is_reported() {
        let taken = UdpSocket::bind("0.0.0.0:0").unwrap();
        let collector = fake_collector();
        let mut config = config_for(&collector, Severity::Debug);
        config.control_port = taken.local_addr().unwrap().port();

        assert!(matches!(
            Emitter::initialize(&config),
            Err(RelayError::Bind { .. })
        ));
    }

    #[test]
    fn test_second_emitter_on_same_control_port_fails() {
        let collector = fake_collector();
        let first = Emitter::initialize(&config_for(&collector, Severity::Debug)).unwrap();
        let mut config = config_for(&collector, Severity::Debug);
        config.control_port = first.control_addr().port();

        assert!(matches!(
            Emitter::initialize(&config),
            Err(RelayError::Bind { .. })
        ));

        // The running emitter still owns the port and keeps obeying commands
        let control = SocketAddr::from((Ipv4Addr::LOCALHOST, first.control_addr().port()));
        collector.send_to(b"Set Log Level=3", control).unwrap();
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while first.level() != 3 && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(first.level(), 3);

        first.shutdown();
    }

    #[test]
    fn test_failed_initialize_leaves_port_reusable() {
        let holder = UdpSocket::bind("0.0.0.0:0").unwrap();
        let port = holder.local_addr().unwrap().port();
        let collector = fake_collector();
        let mut config = config_for(&collector, Severity::Debug);
        config.control_port = port;

        assert!(Emitter::initialize(&config).is_err());
        drop(holder);

        // Nothing from the failed attempt still holds the port
        let emitter = Emitter::initialize(&config).unwrap();
        assert_eq!(emitter.control_addr().port(), port);
        let hello = recv_text(&collector).unwrap();
        assert_eq!(hello, HELLO_MESSAGE);
        assert!(recv_text(&collector).is_none());

        emitter.shutdown();
    }
}
