//! First-write-wins peer registration
//!
//! The collector tracks exactly one source endpoint and one control
//! endpoint. Once a slot is known it keeps that address for the life of the
//! process, even if another peer sends later.

use std::net::SocketAddr;

/// A learned endpoint: unset, or set exactly once
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeerSlot(Option<SocketAddr>);

impl PeerSlot {
    /// Record `addr` if the slot is empty; returns true if it was adopted
    pub fn learn(&mut self, addr: SocketAddr) -> bool {
        if self.0.is_some() {
            return false;
        }
        self.0 = Some(addr);
        true
    }

    pub fn get(&self) -> Option<SocketAddr> {
        self.0
    }

    pub fn is_known(&self) -> bool {
        self.0.is_some()
    }
}

/// Both slots the collector maintains
#[derive(Debug, Clone, Copy, Default)]
pub struct Peers {
    /// First sender of any datagram
    pub source: PeerSlot,
    /// First sender of a hello; receives level pushes
    pub control: PeerSlot,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> SocketAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_slot_starts_unknown() {
        let slot = PeerSlot::default();
        assert!(!slot.is_known());
        assert_eq!(slot.get(), None);
    }

    #[test]
    fn test_first_write_wins() {
        let mut slot = PeerSlot::default();
        assert!(slot.learn(addr("10.0.0.5:9000")));
        assert!(!slot.learn(addr("10.0.0.9:9000")));
        assert!(!slot.learn(addr("10.0.0.5:9000")));
        assert_eq!(slot.get(), Some(addr("10.0.0.5:9000")));
    }

    #[test]
    fn test_slots_are_independent() {
        let mut peers = Peers::default();
        peers.source.learn(addr("127.0.0.1:40000"));
        assert!(!peers.control.is_known());

        peers.control.learn(addr("127.0.0.1:54322"));
        assert_eq!(peers.source.get(), Some(addr("127.0.0.1:40000")));
        assert_eq!(peers.control.get(), Some(addr("127.0.0.1:54322")));
    }
}
