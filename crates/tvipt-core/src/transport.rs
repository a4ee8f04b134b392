//! Non-blocking socket seams.
//!
//! The session layer never touches a real socket type. Production code
//! implements these traits over `std::net` (see the `tvipt-cli` crate); the
//! test harness implements them over in-memory queues with scriptable
//! chunking and back-pressure.

use std::time::Duration;

use crate::error::{ConnectError, TransportError};

/// A connected, non-blocking byte stream.
///
/// Every method returns promptly within one tick. "Nothing available" and
/// "nothing accepted" are expressed as `Ok(0)`, never by blocking.
pub trait Transport {
    /// Read whatever bytes are currently available, up to `buf.len()`.
    ///
    /// Returns `Ok(0)` when no data is pending right now.
    ///
    /// # Errors
    ///
    /// - [`TransportError::Closed`] on orderly remote close
    /// - [`TransportError::Io`] on reset or network loss
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// Write as many bytes as the socket will accept without blocking.
    ///
    /// Returns the accepted count, which may be `0` under back-pressure;
    /// the caller retains and retries unaccepted bytes on a later tick.
    ///
    /// # Errors
    ///
    /// - [`TransportError::Io`] on reset or network loss
    fn write(&mut self, buf: &[u8]) -> Result<usize, TransportError>;

    /// Close the stream. Idempotent; errors during close are ignored.
    fn close(&mut self);
}

/// Opens [`Transport`] sockets.
pub trait Connect {
    /// Socket type produced on success.
    type Socket: Transport;

    /// Open a connection to `host:port`.
    ///
    /// With `timeout: None` the attempt is bounded only by whatever the
    /// implementation's own connect primitive enforces (the interactive
    /// path). The boot auto-connect path passes its configured deadline.
    ///
    /// # Errors
    ///
    /// - [`ConnectError::InvalidTarget`] if the target does not resolve
    /// - [`ConnectError::Failed`] if the peer is unreachable, refuses, or
    ///   the deadline passes
    fn connect(
        &mut self,
        host: &str,
        port: u16,
        timeout: Option<Duration>,
    ) -> Result<Self::Socket, ConnectError>;
}
