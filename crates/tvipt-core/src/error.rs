//! Error taxonomy for the session layer.
//!
//! Strongly-typed errors per failure class: connect failures are local and
//! recoverable, framing and transport failures are fatal to the current
//! session but never to the device. We avoid `std::io::Error` in protocol
//! logic; transport implementations convert at the boundary.

use std::fmt;

use thiserror::Error;
use tvipt_proto::ProtocolError;

/// Failure to establish a connection.
///
/// Local and side-effect free: no session state exists afterwards, and the
/// dispatcher reports it as an ordinary command failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectError {
    /// Hostname/port did not resolve to a usable address.
    #[error("invalid target: {0}")]
    InvalidTarget(String),

    /// The peer was unreachable, refused, or timed out.
    #[error("connect failed: {0}")]
    Failed(String),
}

/// Socket failure surfaced by a [`Transport`](crate::Transport)
/// implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Orderly close by the remote host.
    #[error("connection closed by remote host")]
    Closed,

    /// Read or write failure (reset, network loss).
    #[error("i/o error: {0}")]
    Io(String),
}

/// Boundary conversion for transport implementations built on `std::io`.
impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Mid-session failure. Always fatal to the session: teardown is complete by
/// the time the error reaches the caller, and there is no retry of the
/// failing frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Malformed frame or decode desync; no resynchronization exists.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Socket failure or remote close.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Why a session ended. Rendered as the status line shown to the terminal
/// when control returns to command mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndReason {
    /// Operator-requested break; a clean, successful teardown.
    LocalBreak,

    /// The remote host closed the connection.
    RemoteClosed,

    /// Fatal framing failure.
    Protocol(ProtocolError),

    /// Fatal socket failure.
    Transport(TransportError),
}

impl EndReason {
    /// Map a fatal session error to its end reason.
    #[must_use]
    pub fn from_error(err: SessionError) -> Self {
        match err {
            SessionError::Transport(TransportError::Closed) => Self::RemoteClosed,
            SessionError::Transport(err) => Self::Transport(err),
            SessionError::Protocol(err) => Self::Protocol(err),
        }
    }
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LocalBreak => f.write_str("break"),
            Self::RemoteClosed => f.write_str("connection closed by remote host"),
            Self::Protocol(err) => write!(f, "protocol error: {err}"),
            Self::Transport(err) => write!(f, "connection error: {err}"),
        }
    }
}
