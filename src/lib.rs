//! log-relay - UDP log shipping with remote severity control
//!
//! Two engines share one plaintext datagram protocol:
//! - [`Emitter`]: filters records by severity and ships them to a collector;
//!   listens for `Set Log Level=` commands on a second socket
//! - [`Collector`]: appends every received payload to a flat file and can
//!   push filter changes back to the emitter that said hello first

pub mod collector;
pub mod config;
pub mod constants;
pub mod emitter;
pub mod error;
pub mod logging;
pub mod protocol;
pub mod stats;
pub mod transport;

pub use collector::{Collector, LevelPush};
pub use emitter::Emitter;
pub use error::{RelayError, Result};
pub use protocol::{LogRecord, Severity};
