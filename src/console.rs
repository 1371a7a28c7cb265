//! Operator console for a running collector
//!
//! Reads one command per stdin line:
//! - `level <0-3>` (or `1 <0-3>`): push a filter change to the emitter
//! - `dump` (or `2`): print the record store
//! - `quit` (or `0`): shut down
//!
//! Ctrl-C also shuts down.

use log_relay::{Collector, LevelPush, Severity};
use tokio::io::{AsyncBufReadExt, BufReader};

const MENU: &str = "\nCommands:\n  level <0=DEBUG 1=WARNING 2=ERROR 3=CRITICAL>\n  dump\n  quit";

#[derive(Debug, PartialEq, Eq)]
pub enum ConsoleCommand {
    SetLevel(Severity),
    Dump,
    Quit,
    Invalid(String),
}

pub fn parse_command(line: &str) -> ConsoleCommand {
    let mut words = line.split_whitespace();
    match words.next() {
        Some("level" | "1") => match words.next().map(str::parse::<i32>) {
            Some(Ok(rank)) => match Severity::from_rank(rank) {
                Some(level) => ConsoleCommand::SetLevel(level),
                None => ConsoleCommand::Invalid("Invalid level".into()),
            },
            _ => ConsoleCommand::Invalid("Usage: level <0-3>".into()),
        },
        Some("dump" | "2") => ConsoleCommand::Dump,
        Some("quit" | "exit" | "shutdown" | "0") => ConsoleCommand::Quit,
        Some(other) => ConsoleCommand::Invalid(format!("Invalid choice: {other}")),
        None => ConsoleCommand::Invalid("Invalid choice".into()),
    }
}

/// Run the console until quit, EOF or Ctrl-C, then stop the collector
pub async fn run(collector: Collector) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{MENU}");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => {
                let Ok(Some(line)) = line else { break };
                if line.trim().is_empty() {
                    continue;
                }
                if !execute(&collector, parse_command(&line)) {
                    break;
                }
            }
        }
    }

    // Joining the ingestion thread blocks for up to one poll interval
    let _ = tokio::task::spawn_blocking(move || collector.stop()).await;
    println!("Collector shut down");
}

/// Returns false once the console should exit
fn execute(collector: &Collector, command: ConsoleCommand) -> bool {
    match command {
        ConsoleCommand::SetLevel(level) => match collector.push_level(level) {
            LevelPush::Sent(addr) => println!("Sent log level {} to {}", level.rank(), addr),
            LevelPush::NotReady => {
                println!("No client receive port known yet. Waiting for hello message.")
            }
        },
        ConsoleCommand::Dump => match collector.dump() {
            Ok(records) => {
                for record in records {
                    println!("{record}");
                }
            }
            Err(e) => println!("Failed to read record store: {e}"),
        },
        ConsoleCommand::Quit => return false,
        ConsoleCommand::Invalid(message) => println!("{message}"),
    }
    true
}
