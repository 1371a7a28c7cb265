//! Traffic counters for both engines
//!
//! Thread-safe counters updated from the hot paths with relaxed atomics.
//! Snapshots are plain structs so callers can compare or print them.

use std::sync::atomic::{AtomicU64, Ordering};

/// Emitter-side counters
#[derive(Debug, Default)]
pub struct EmitterStats {
    /// Records handed to the socket
    sent: AtomicU64,
    /// Records below the filter
    filtered: AtomicU64,
    /// Records the socket refused (would-block, unreachable)
    dropped: AtomicU64,
    /// Filter changes applied from the collector
    commands: AtomicU64,
}

/// Point-in-time copy of `EmitterStats`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitterSnapshot {
    pub sent: u64,
    pub filtered: u64,
    pub dropped: u64,
    pub commands: u64,
}

impl EmitterStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn add_sent(&self) {
        self.sent.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn add_filtered(&self) {
        self.filtered.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn add_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn add_command(&self) {
        self.commands.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> EmitterSnapshot {
        EmitterSnapshot {
            sent: self.sent.load(Ordering::Relaxed),
            filtered: self.filtered.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            commands: self.commands.load(Ordering::Relaxed),
        }
    }
}

/// Collector-side counters
#[derive(Debug, Default)]
pub struct CollectorStats {
    /// Datagrams received, any payload
    received: AtomicU64,
    /// Lines appended to the record store
    stored: AtomicU64,
    /// Appends that failed
    store_errors: AtomicU64,
    /// `Set Log Level=` commands handed to the socket
    levels_pushed: AtomicU64,
}

/// Point-in-time copy of `CollectorStats`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectorSnapshot {
    pub received: u64,
    pub stored: u64,
    pub store_errors: u64,
    pub levels_pushed: u64,
}

impl CollectorStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn add_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn add_stored(&self) {
        self.stored.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn add_store_error(&self) {
        self.store_errors.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn add_level_pushed(&self) {
        self.levels_pushed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CollectorSnapshot {
        CollectorSnapshot {
            received: self.received.load(Ordering::Relaxed),
            stored: self.stored.load(Ordering::Relaxed),
            store_errors: self.store_errors.load(Ordering::Relaxed),
            levels_pushed: self.levels_pushed.load(Ordering::Relaxed),
        }
    }
}
