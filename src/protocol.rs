//! Wire protocol shared by emitter and collector
//!
//! Every payload is plain text, one message per datagram, no framing:
//! - Discovery: `Client Hello...` (emitter control socket -> collector)
//! - Data: `<ctime> <LEVEL> <file>:<function>:<line> <message>`
//! - Control: `Set Log Level=<integer>` (collector -> emitter)

use crate::constants::MAX_PAYLOAD_LEN;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prefix the collector matches to learn the control endpoint
pub const HELLO_PREFIX: &str = "Client Hello";

/// Full discovery payload sent by the emitter
pub const HELLO_MESSAGE: &str = "Client Hello from recv_socket";

/// Prefix of a filter change command
pub const SET_LEVEL_PREFIX: &str = "Set Log Level=";

/// ctime(3) layout, without the trailing newline
const CTIME_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

// =============================================================================
// Severity
// =============================================================================

/// Record severity, ordered by rank
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Debug = 0,
    Warning = 1,
    Error = 2,
    Critical = 3,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Debug,
        Severity::Warning,
        Severity::Error,
        Severity::Critical,
    ];

    /// Integer rank carried by `Set Log Level=`
    #[inline]
    pub fn rank(self) -> i32 {
        self as i32
    }

    pub fn from_rank(rank: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.rank() == rank)
    }

    pub fn name(self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
        }
    }

    /// Filter check against a raw threshold rank (equality passes)
    #[inline]
    pub fn passes(self, threshold: i32) -> bool {
        self.rank() >= threshold
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Severity {
    type Err = String;

    /// Accepts a level name (any case) or its rank
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(rank) = s.parse::<i32>() {
            return Self::from_rank(rank).ok_or_else(|| format!("level out of range: {rank}"));
        }
        Self::ALL
            .into_iter()
            .find(|sev| sev.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown level: {s}"))
    }
}

// =============================================================================
// Records
// =============================================================================

/// One emitted event, rendered as a single wire line
#[derive(Debug, Clone)]
pub struct LogRecord<'a> {
    pub timestamp: String,
    pub severity: Severity,
    pub file: &'a str,
    pub function: &'a str,
    pub line: u32,
    pub message: &'a str,
}

impl<'a> LogRecord<'a> {
    /// Create a record stamped with the current local time
    pub fn now(
        severity: Severity,
        file: &'a str,
        function: &'a str,
        line: u32,
        message: &'a str,
    ) -> Self {
        Self {
            timestamp: ctime_now(),
            severity,
            file,
            function,
            line,
            message,
        }
    }

    /// Wire payload, clipped to the datagram limit
    pub fn to_payload(&self) -> String {
        let mut text = self.to_string();
        truncate_at_char_boundary(&mut text, MAX_PAYLOAD_LEN);
        text
    }
}

impl fmt::Display for LogRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}:{}:{} {}",
            self.timestamp, self.severity, self.file, self.function, self.line, self.message
        )
    }
}

/// Current local time as ctime(3) renders it
pub fn ctime_now() -> String {
    chrono::Local::now().format(CTIME_FORMAT).to_string()
}

fn truncate_at_char_boundary(text: &mut String, max: usize) {
    if text.len() <= max {
        return;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text.truncate(end);
}

// =============================================================================
// Control
// =============================================================================

/// Collector -> emitter command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMessage {
    /// New filter rank, unvalidated
    SetLevel(i32),
}

impl ControlMessage {
    /// Parse a control datagram; anything unrecognized yields `None`
    ///
    /// The integer may carry a sign and trailing bytes after the digits are
    /// ignored, so `Set Log Level=2\n` is accepted.
    pub fn parse(payload: &[u8]) -> Option<Self> {
        let rest = payload.strip_prefix(SET_LEVEL_PREFIX.as_bytes())?;
        parse_leading_int(rest).map(ControlMessage::SetLevel)
    }

    pub fn encode(&self) -> String {
        match self {
            ControlMessage::SetLevel(rank) => format!("{SET_LEVEL_PREFIX}{rank}"),
        }
    }
}

/// Does this payload announce an emitter control endpoint?
#[inline]
pub fn is_hello(payload: &[u8]) -> bool {
    payload.starts_with(HELLO_PREFIX.as_bytes())
}

fn parse_leading_int(bytes: &[u8]) -> Option<i32> {
    let start = bytes.iter().position(|b| !b.is_ascii_whitespace())?;
    let bytes = &bytes[start..];
    let sign_len = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let digits = bytes[sign_len..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count();
    if digits == 0 {
        return None;
    }
    std::str::from_utf8(&bytes[..sign_len + digits])
        .ok()?
        .parse()
        .ok()
}
