//! Non-blocking TCP transport over `std::net`.
//!
//! Connect resolves and tries each address in turn; the established stream
//! is switched to non-blocking before the session ever sees it, so every
//! read and write afterwards returns within the tick. No background
//! threads are involved.

use std::{
    io::{self, Read, Write},
    net::{Shutdown, TcpStream, ToSocketAddrs},
    time::Duration,
};

use tvipt_core::{Connect, ConnectError, Transport, TransportError};

/// TCP connector for the dispatcher.
#[derive(Debug, Default)]
pub struct TcpConnector;

impl TcpConnector {
    /// New connector.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Connect for TcpConnector {
    type Socket = TcpSocket;

    fn connect(
        &mut self,
        host: &str,
        port: u16,
        timeout: Option<Duration>,
    ) -> Result<Self::Socket, ConnectError> {
        let addrs = (host, port)
            .to_socket_addrs()
            .map_err(|err| ConnectError::InvalidTarget(err.to_string()))?;

        let mut last_err = None;
        for addr in addrs {
            let attempt = match timeout {
                Some(bound) => TcpStream::connect_timeout(&addr, bound),
                None => TcpStream::connect(addr),
            };

            match attempt.and_then(|stream| {
                stream.set_nodelay(true)?;
                stream.set_nonblocking(true)?;
                Ok(stream)
            }) {
                Ok(stream) => {
                    tracing::debug!(%addr, "tcp connected");
                    return Ok(TcpSocket { stream });
                },
                Err(err) => last_err = Some(err),
            }
        }

        Err(match last_err {
            Some(err) => ConnectError::Failed(err.to_string()),
            None => ConnectError::InvalidTarget(format!("{host}:{port} resolved to nothing")),
        })
    }
}

/// A connected non-blocking TCP stream.
#[derive(Debug)]
pub struct TcpSocket {
    stream: TcpStream,
}

impl Transport for TcpSocket {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        match self.stream.read(buf) {
            // TCP read of zero on a readable socket is the peer's FIN.
            Ok(0) => Err(TransportError::Closed),
            Ok(n) => Ok(n),
            Err(err) if would_block(&err) => Ok(0),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, TransportError> {
        match self.stream.write(buf) {
            Ok(n) => Ok(n),
            Err(err) if would_block(&err) => Ok(0),
            Err(err) => Err(err.into()),
        }
    }

    fn close(&mut self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}

fn would_block(err: &io::Error) -> bool {
    matches!(err.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted)
}
