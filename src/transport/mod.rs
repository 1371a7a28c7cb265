//! UDP transport primitives shared by both engines
//!
//! - `udp`: socket creation (bind retry, address reuse, blocking mode)
//! - `listener`: background receive loop with a cooperative shutdown flag
//!
//! Neither piece knows about the wire protocol; engines pass a datagram
//! handler to the listener and interpret payloads themselves.

pub mod listener;
pub mod udp;

pub use listener::spawn_listener;
pub use udp::{bind_socket, unbound_socket, SocketMode};
