//! Collector engine: ingestion, peer registration and level pushes
//!
//! A single socket bound to the collector port serves both directions:
//! - ingestion thread: receives every datagram, learns peers, appends the
//!   raw payload to the record store
//! - `push_level`: sends `Set Log Level=` to the learned control endpoint
//!
//! Peer registration is first-write-wins: one source endpoint and one
//! control endpoint per collector process.

pub mod peers;
pub mod store;

pub use peers::{PeerSlot, Peers};
pub use store::{read_records, RecordStore};

use crate::config::CollectorConfig;
use crate::error::Result;
use crate::protocol::{is_hello, ControlMessage, Severity};
use crate::stats::{CollectorSnapshot, CollectorStats};
use crate::transport::{bind_socket, spawn_listener, SocketMode};
use parking_lot::Mutex;
use std::net::{SocketAddr, UdpSocket};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, error, info, trace, warn};

/// Outcome of [`Collector::push_level`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelPush {
    /// Command handed to the socket for this endpoint
    Sent(SocketAddr),
    /// No hello received yet, nothing was sent
    NotReady,
}

/// State guarded by the collector mutex
struct Ingest {
    peers: Peers,
    store: RecordStore,
}

/// Server-side ingestion engine
pub struct Collector {
    socket: Arc<UdpSocket>,
    local_addr: SocketAddr,
    state: Arc<Mutex<Ingest>>,
    store_path: PathBuf,
    running: Arc<AtomicBool>,
    listener: Option<JoinHandle<()>>,
    stats: Arc<CollectorStats>,
}

impl Collector {
    /// Bind the collector port, open the store and start ingesting
    pub fn start(config: &CollectorConfig) -> Result<Self> {
        let socket = Arc::new(bind_socket(
            config.listen_addr(),
            SocketMode::ReadTimeout(config.poll_interval()),
        )?);
        let local_addr = socket.local_addr().unwrap_or_else(|_| config.listen_addr());

        // Never ingest without somewhere to persist
        let store = RecordStore::open(&config.store_path).map_err(|e| {
            error!("{}", e);
            e
        })?;
        let store_path = store.path().to_path_buf();

        let state = Arc::new(Mutex::new(Ingest {
            peers: Peers::default(),
            store,
        }));
        let stats = Arc::new(CollectorStats::new());
        let running = Arc::new(AtomicBool::new(true));

        let listener = {
            let state = state.clone();
            let stats = stats.clone();
            spawn_listener(
                "log-relay-ingest",
                socket.clone(),
                running.clone(),
                move |payload, from| ingest(&state, &stats, payload, from),
            )?
        };

        info!(
            "Collector listening on {}, store {}",
            local_addr,
            store_path.display()
        );

        Ok(Self {
            socket,
            local_addr,
            state,
            store_path,
            running,
            listener: Some(listener),
            stats,
        })
    }

    /// Ask the registered emitter to change its filter
    ///
    /// Best effort: no acknowledgment is awaited and send failures are
    /// not reported.
    pub fn push_level(&self, level: Severity) -> LevelPush {
        let state = self.state.lock();
        let Some(target) = state.peers.control.get() else {
            return LevelPush::NotReady;
        };

        let command = ControlMessage::SetLevel(level.rank()).encode();
        match self.socket.send_to(command.as_bytes(), target) {
            Ok(_) => {
                self.stats.add_level_pushed();
                debug!("Pushed level {} to {}", level, target);
            }
            Err(e) => trace!("Level push to {} dropped: {}", target, e),
        }
        LevelPush::Sent(target)
    }

    /// All stored records, oldest first
    ///
    /// Reads under the ingestion lock, so a record being appended is either
    /// fully present or absent.
    pub fn dump(&self) -> Result<Vec<String>> {
        let _state = self.state.lock();
        read_records(&self.store_path)
    }

    pub fn source_endpoint(&self) -> Option<SocketAddr> {
        self.state.lock().peers.source.get()
    }

    pub fn control_endpoint(&self) -> Option<SocketAddr> {
        self.state.lock().peers.control.get()
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn store_path(&self) -> &std::path::Path {
        &self.store_path
    }

    pub fn stats(&self) -> CollectorSnapshot {
        self.stats.snapshot()
    }

    /// Stop ingesting and release the socket and store
    pub fn stop(mut self) {
        self.stop_listener();
    }

    fn stop_listener(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.listener.take() {
            let _ = handle.join();
            info!("Collector stopped");
        }
    }
}

impl Drop for Collector {
    fn drop(&mut self) {
        self.stop_listener();
    }
}

fn ingest(state: &Mutex<Ingest>, stats: &CollectorStats, payload: &[u8], from: SocketAddr) {
    stats.add_received();
    let mut state = state.lock();

    if state.peers.source.learn(from) {
        info!("Source endpoint: {}", from);
    }
    if is_hello(payload) && state.peers.control.learn(from) {
        info!("Control endpoint: {}", from);
    }

    match state.store.append(payload) {
        Ok(()) => stats.add_stored(),
        Err(e) => {
            stats.add_store_error();
            warn!("Store write failed: {}", e);
        }
    }
}
