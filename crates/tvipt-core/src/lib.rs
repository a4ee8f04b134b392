//! tvipt session layer.
//!
//! Owns the lifecycle of the single encrypted tunnel between the terminal
//! and a remote host: the [`Session`] state machine, the [`IoPump`] bridging
//! terminal bytes and session payloads, and the collaborator seams
//! ([`Transport`], [`Connect`], [`TerminalPort`]) behind which the real
//! socket and terminal drivers live.
//!
//! # Concurrency model
//!
//! Single-threaded, cooperative, tick-driven. One external driver invokes
//! [`IoPump::tick`] repeatedly; no operation waits. Anything lacking data
//! reports "nothing available" and the tick ends promptly so other device
//! duties are never starved. There are no background threads; "waiting" is
//! returning and being re-invoked on the next tick.
//!
//! # Ownership
//!
//! At most one [`Session`] exists device-wide. Its existence models
//! "connected"; its absence models "idle". The session exclusively owns its
//! socket and both cipher directions and destroys them atomically on close.
//! The pump and the command dispatcher interact with it only through
//! `connect`/`service`/`send`/`close`, never touching cipher offsets or
//! staging directly.

pub mod config;
pub mod error;
pub mod pump;
pub mod session;
pub mod terminal;
pub mod transport;

pub use config::{AutoConnect, DeviceConfig, SessionConfig};
pub use error::{ConnectError, EndReason, SessionError, TransportError};
pub use pump::{BREAK_BYTE, IoPump, PumpStatus};
pub use session::{Session, SessionState};
pub use terminal::{TerminalPort, XOFF, XON};
pub use transport::{Connect, Transport};
