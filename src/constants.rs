//! Application-wide constants
//!
//! Centralized constants to avoid duplication and ensure consistency.

// =============================================================================
// Network
// =============================================================================

/// Well-known UDP port the collector listens on
pub const DEFAULT_COLLECTOR_PORT: u16 = 54321;

/// Well-known UDP port the emitter receives control commands on
pub const DEFAULT_CONTROL_PORT: u16 = 54322;

/// Address the emitter ships records to
pub const DEFAULT_COLLECTOR_HOST: &str = "127.0.0.1";

/// Record store file, relative to the working directory
pub const DEFAULT_STORE_PATH: &str = "server_log.txt";

// =============================================================================
// Timing
// =============================================================================

/// Receive timeout of the background listeners (milliseconds)
///
/// Bounds both command propagation latency and shutdown latency.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

// =============================================================================
// Retry
// =============================================================================

/// Maximum socket bind retry attempts
pub const MAX_SOCKET_RETRY_ATTEMPTS: u32 = 5;

/// Base delay between retry attempts (milliseconds)
pub const RETRY_BASE_DELAY_MS: u64 = 200;

// =============================================================================
// Buffers
// =============================================================================

/// Largest payload carried in one datagram (bytes)
pub const MAX_PAYLOAD_LEN: usize = 1023;
