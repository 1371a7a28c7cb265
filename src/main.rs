//! log-relay - UDP log shipping with remote severity control
//!
//! Usage:
//!   log-relay collector [--port P] [--store PATH]   Collector + operator console
//!   log-relay emit [--collector ADDR] [--level L]   Ship stdin lines
//!   log-relay dump [--store PATH]                   Print stored records

mod cli;
mod console;

use clap::Parser;
use cli::{Cli, Command};
use log_relay::config::{self, Config};
use log_relay::error::{RelayError, Result};
use log_relay::{collector, logging, Collector, Emitter, Severity};
use std::io::BufRead;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let path = cli.config.unwrap_or_else(config::default_path);
    let mut cfg = config::load(&path)?;

    match cli.command {
        Command::Collector { port, store } => {
            if let Some(port) = port {
                cfg.collector.port = port;
            }
            if let Some(store) = store {
                cfg.collector.store_path = store;
            }
            run_collector(&cfg)
        }
        Command::Emit {
            collector,
            control_port,
            level,
            severity,
        } => {
            if let Some(addr) = collector {
                cfg.emitter.collector_addr = addr;
            }
            if let Some(port) = control_port {
                cfg.emitter.control_port = port;
            }
            if let Some(level) = level {
                cfg.emitter.initial_level = level;
            }
            cfg.validate()?;
            run_emitter(&cfg, severity)
        }
        Command::Dump { store } => {
            let store = store.unwrap_or(cfg.collector.store_path);
            for record in collector::read_records(&store)? {
                println!("{record}");
            }
            Ok(())
        }
    }
}

fn run_collector(cfg: &Config) -> Result<()> {
    let collector = Collector::start(&cfg.collector)?;
    eprintln!(
        "Collector on {} -> {}",
        collector.local_addr(),
        collector.store_path().display()
    );

    let rt = tokio::runtime::Runtime::new().map_err(|e| RelayError::Runtime { source: e })?;
    rt.block_on(console::run(collector));
    // The stdin reader may still be parked on a blocking read
    rt.shutdown_background();
    Ok(())
}

fn run_emitter(cfg: &Config, severity: Severity) -> Result<()> {
    let emitter = Emitter::initialize(&cfg.emitter)?;
    eprintln!(
        "Shipping stdin to {} at {} (control port {})",
        cfg.emitter.collector_addr,
        severity,
        emitter.control_addr().port()
    );

    for (index, line) in std::io::stdin().lock().lines().enumerate() {
        let Ok(line) = line else { break };
        emitter.log(severity, "stdin", "emit", line_number(index), &line);
    }

    emitter.shutdown();
    Ok(())
}

/// 1-based line number for a record, pinned at `u32::MAX` on overflow
fn line_number(index: usize) -> u32 {
    u32::try_from(index.saturating_add(1)).unwrap_or(u32::MAX)
}
