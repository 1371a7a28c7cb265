//! Configuration management
//!
//! Both engines read their settings from one optional `config.toml`.
//! Missing files and missing fields fall back to the well-known defaults.

use crate::constants::{
    DEFAULT_COLLECTOR_HOST, DEFAULT_COLLECTOR_PORT, DEFAULT_CONTROL_PORT,
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_STORE_PATH,
};
use crate::error::{RelayError, Result};
use crate::protocol::Severity;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

// =============================================================================
// Application Configuration
// =============================================================================

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub collector: CollectorConfig,
    pub emitter: EmitterConfig,
}

// =============================================================================
// Collector Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Interface to listen on (all interfaces by default)
    pub bind_addr: IpAddr,

    /// Well-known collector port
    pub port: u16,

    /// Append-only record store
    pub store_path: PathBuf,

    /// Receive timeout of the ingestion thread
    pub poll_interval_ms: u64,
}

impl CollectorConfig {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_COLLECTOR_PORT,
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

// =============================================================================
// Emitter Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    /// Where records are shipped
    pub collector_addr: SocketAddr,

    /// Well-known port the control socket listens on
    pub control_port: u16,

    /// Filter in effect right after initialization
    pub initial_level: Severity,

    /// Receive timeout of the control listener
    pub poll_interval_ms: u64,
}

impl EmitterConfig {
    pub fn control_addr(&self) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), self.control_port)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for EmitterConfig {
    fn default() -> Self {
        let host: IpAddr = DEFAULT_COLLECTOR_HOST
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));
        Self {
            collector_addr: SocketAddr::new(host, DEFAULT_COLLECTOR_PORT),
            control_port: DEFAULT_CONTROL_PORT,
            initial_level: Severity::Debug,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl Config {
    /// Reject values the engines cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.collector.poll_interval_ms == 0 {
            return Err(RelayError::ConfigValidation {
                field: "collector.poll_interval_ms",
                reason: "must be greater than 0".into(),
            });
        }
        if self.emitter.poll_interval_ms == 0 {
            return Err(RelayError::ConfigValidation {
                field: "emitter.poll_interval_ms",
                reason: "must be greater than 0".into(),
            });
        }
        if self.emitter.collector_addr.port() == 0 {
            return Err(RelayError::ConfigValidation {
                field: "emitter.collector_addr",
                reason: "port must not be 0".into(),
            });
        }
        Ok(())
    }
}

/// Default config location: `config.toml` in the working directory
pub fn default_path() -> PathBuf {
    PathBuf::from("config.toml")
}

/// Load config from `path`, or defaults if the file does not exist
///
/// A file that exists but cannot be read or parsed is an error.
pub fn load(path: &Path) -> Result<Config> {
    if !path.exists() {
        debug!("No config at {}, using defaults", path.display());
        return Ok(Config::default());
    }

    let content = fs::read_to_string(path).map_err(|e| RelayError::ConfigRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    let config = parse(&content).map_err(|reason| RelayError::ConfigParse {
        path: path.to_path_buf(),
        reason,
    })?;
    config.validate()?;
    Ok(config)
}

fn parse(content: &str) -> std::result::Result<Config, String> {
    toml::from_str(content).map_err(|e| e.to_string())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = Config::default();

        assert_eq!(config.collector.port, 54321);
        assert_eq!(config.collector.store_path, PathBuf::from("server_log.txt"));
        assert_eq!(
            config.collector.listen_addr(),
            "0.0.0.0:54321".parse().unwrap()
        );

        assert_eq!(
            config.emitter.collector_addr,
            "127.0.0.1:54321".parse().unwrap()
        );
        assert_eq!(config.emitter.control_port, 54322);
        assert_eq!(config.emitter.initial_level, Severity::Debug);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_empty_file() {
        let config = parse("").unwrap();
        assert_eq!(config.collector.port, DEFAULT_COLLECTOR_PORT);
        assert_eq!(config.emitter.control_port, DEFAULT_CONTROL_PORT);
    }

    #[test]
    fn test_config_partial_sections() {
        let partial = r#"
[collector]
port = 6000
store_path = "/var/log/relay.txt"

[emitter]
collector_addr = "10.0.0.5:6000"
initial_level = "ERROR"
"#;
        let config = parse(partial).unwrap();

        assert_eq!(config.collector.port, 6000);
        assert_eq!(
            config.collector.store_path,
            PathBuf::from("/var/log/relay.txt")
        );
        assert_eq!(config.collector.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
        assert_eq!(
            config.emitter.collector_addr,
            "10.0.0.5:6000".parse().unwrap()
        );
        assert_eq!(config.emitter.initial_level, Severity::Error);
        assert_eq!(config.emitter.control_port, DEFAULT_CONTROL_PORT);
    }

    #[test]
    fn test_config_rejects_unknown_level() {
        assert!(parse("[emitter]\ninitial_level = \"INFO\"\n").is_err());
    }

    #[test]
    fn test_validate_zero_poll_interval() {
        let mut config = Config::default();
        config.emitter.poll_interval_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(RelayError::ConfigValidation {
                field: "emitter.poll_interval_ms",
                ..
            })
        ));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = load(Path::new("/nonexistent/log-relay/config.toml")).unwrap();
        assert_eq!(config.collector.port, DEFAULT_COLLECTOR_PORT);
    }

    #[test]
    fn test_config_serialize_roundtrip() {
        let mut config = Config::default();
        config.collector.port = 7000;
        config.emitter.initial_level = Severity::Critical;

        let text = toml::to_string_pretty(&config).unwrap();
        let restored = parse(&text).unwrap();

        assert_eq!(restored.collector.port, 7000);
        assert_eq!(restored.emitter.initial_level, Severity::Critical);
    }
}
