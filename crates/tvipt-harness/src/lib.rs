//! Deterministic simulation pieces for tvipt tests.
//!
//! Everything here is single-threaded and explicit: tests step the device's
//! pump tick by tick, script what the "network" delivers (including
//! adversarial chunking and back-pressure), type bytes at a simulated
//! terminal, and speak the remote end of the protocol through [`SimPeer`]
//! with mirrored codecs.
//!
//! No real sockets, clocks, or threads are involved, so every test is
//! reproducible byte for byte.

pub mod peer;
pub mod sim_link;
pub mod sim_terminal;

pub use peer::{PeerError, SimPeer};
pub use sim_link::{End, SimConnect, SimLink, SimSocket};
pub use sim_terminal::SimTerminal;
