//! Centralized error types for the relay
//!
//! All relay errors are represented by the `RelayError` enum.
//! Use `Result<T>` as shorthand for `std::result::Result<T, RelayError>`.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

/// All relay errors
#[derive(Debug)]
pub enum RelayError {
    // === Network ===
    /// Failed to create or configure a UDP socket
    Socket {
        role: &'static str,
        source: std::io::Error,
    },
    /// Failed to bind a UDP socket
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    // === Runtime ===
    /// Background listener thread could not be started
    ThreadSpawn {
        name: &'static str,
        source: std::io::Error,
    },
    /// Tokio runtime creation failed
    Runtime { source: std::io::Error },

    // === Store ===
    /// Record store could not be opened for appending
    StoreOpen {
        path: PathBuf,
        source: std::io::Error,
    },
    /// File system operation failed
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // === Config ===
    /// Config file exists but cannot be read
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Config file is not valid TOML for our schema
    ConfigParse { path: PathBuf, reason: String },
    /// Invalid config value
    ConfigValidation { field: &'static str, reason: String },
}

impl std::error::Error for RelayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Socket { source, .. }
            | Self::Bind { source, .. }
            | Self::ThreadSpawn { source, .. }
            | Self::Runtime { source }
            | Self::StoreOpen { source, .. }
            | Self::Io { source, .. }
            | Self::ConfigRead { source, .. } => Some(source),
            Self::ConfigParse { .. } | Self::ConfigValidation { .. } => None,
        }
    }
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Socket { role, source } => {
                write!(f, "Cannot create {} socket: {}", role, source)
            }
            Self::Bind { addr, source } => write!(f, "Cannot bind {}: {}", addr, source),
            Self::ThreadSpawn { name, source } => {
                write!(f, "Cannot start {} thread: {}", name, source)
            }
            Self::Runtime { .. } => write!(f, "Failed to create runtime"),
            Self::StoreOpen { path, source } => {
                write!(f, "Cannot open record store {}: {}", path.display(), source)
            }
            Self::Io { path, source } => write!(f, "IO error: {}: {}", path.display(), source),
            Self::ConfigRead { path, .. } => write!(f, "Cannot read config: {}", path.display()),
            Self::ConfigParse { path, reason } => {
                write!(f, "Invalid config {}: {}", path.display(), reason)
            }
            Self::ConfigValidation { field, reason } => {
                write!(f, "Invalid {}: {}", field, reason)
            }
        }
    }
}

/// Alias for Result with RelayError
pub type Result<T> = std::result::Result<T, RelayError>;
