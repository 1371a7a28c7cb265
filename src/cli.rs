//! Command-line interface definition using clap
//!
//! Provides structured argument parsing with automatic help generation.

use clap::{Parser, Subcommand};
use log_relay::Severity;
use std::net::SocketAddr;
use std::path::PathBuf;

// =============================================================================
// CLI Definition
// =============================================================================

/// UDP log shipping with remote severity control
#[derive(Parser, Debug)]
#[command(name = "log-relay")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (default: ./config.toml)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a collector with an operator console on stdin
    Collector {
        /// Port to listen on (overrides config)
        #[arg(long, value_name = "PORT")]
        port: Option<u16>,

        /// Record store file (overrides config)
        #[arg(long, value_name = "PATH")]
        store: Option<PathBuf>,
    },

    /// Ship each stdin line to a collector
    Emit {
        /// Collector address (overrides config)
        #[arg(long, value_name = "ADDR")]
        collector: Option<SocketAddr>,

        /// Control port to listen on (overrides config)
        #[arg(long, value_name = "PORT")]
        control_port: Option<u16>,

        /// Initial filter (overrides config)
        #[arg(long, value_name = "LEVEL")]
        level: Option<Severity>,

        /// Severity attached to every line
        #[arg(long, value_name = "LEVEL", default_value = "DEBUG")]
        severity: Severity,
    },

    /// Print the record store
    Dump {
        /// Record store file (overrides config)
        #[arg(long, value_name = "PATH")]
        store: Option<PathBuf>,
    },
}

// =============================================================================
// Tests
// =============================================================================
