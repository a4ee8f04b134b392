//! Session lifecycle state machine.
//!
//! One [`Session`] is the single live encrypted tunnel. It owns the socket
//! and one codec per direction, and is driven by a per-tick [`service`]
//! call that performs bounded non-blocking I/O and never waits.
//!
//! # State machine
//!
//! ```text
//!           connect() ok
//! (no value) ───────────> Established ──┐ protocol / socket error,
//!     ▲                                 │ remote close, local break
//!     │    connect() err                ▼
//!     └──────────────────── Closing ─> Closed
//! ```
//!
//! `Idle` is modeled by the absence of a `Session` value and `Connecting` by
//! the in-progress bounded `connect()` call, so no ambient session state
//! exists anywhere. A failed connect retains nothing. Teardown discards the
//! staging buffers and cipher states and closes the socket in one step;
//! cipher offsets reset only when a brand-new session is created, never on
//! a transient error within the same session.
//!
//! [`service`]: Session::service

use std::time::{Duration, Instant};

use bytes::{Buf, Bytes, BytesMut};
use tvipt_crypto::SecretKey;
use tvipt_proto::{
    FrameDecoder, FrameEncoder, KEEPALIVE_WIRE, NONCE_DEVICE_TO_HOST, NONCE_HOST_TO_DEVICE,
};

use crate::{
    config::SessionConfig,
    error::{ConnectError, SessionError},
    transport::{Connect, Transport},
};

/// Socket read chunk per attempt.
const READ_CHUNK: usize = 512;

/// Read attempts per tick. Bounds time spent in one `service()` call so the
/// driver's other duties are not starved by a fast sender.
const READ_BUDGET: usize = 8;

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Tunnel is up; frames flow in both directions.
    Established,
    /// Teardown in progress.
    Closing,
    /// Terminal state; equivalent to idle for starting a new session.
    Closed,
}

/// The single live encrypted tunnel between device and remote host.
#[derive(Debug)]
pub struct Session<T: Transport> {
    state: SessionState,
    host: String,
    port: u16,
    socket: T,
    encoder: FrameEncoder,
    decoder: FrameDecoder,
    /// Encoded wire bytes the socket has not yet accepted. Flushed before
    /// anything else each tick so a frame is never torn on the wire.
    pending: BytesMut,
    last_send: Instant,
    config: SessionConfig,
}

impl<T: Transport> Session<T> {
    /// Open the transport and establish a session.
    ///
    /// No handshake is performed: encryption begins with the first frame in
    /// either direction, and peer authentication rests entirely on both
    /// sides holding the same pre-shared key.
    ///
    /// `timeout` bounds the attempt on the boot auto-connect path; `None`
    /// (the interactive path) defers to the connect primitive's own bound.
    ///
    /// # Errors
    ///
    /// - [`ConnectError`] if the underlying connect fails or times out. No
    ///   session state is retained.
    pub fn connect<C>(
        connector: &mut C,
        host: &str,
        port: u16,
        timeout: Option<Duration>,
        key: &SecretKey,
        config: SessionConfig,
        now: Instant,
    ) -> Result<Self, ConnectError>
    where
        C: Connect<Socket = T>,
    {
        let socket = connector.connect(host, port, timeout)?;
        tracing::info!(host, port, "session established");

        Ok(Self {
            state: SessionState::Established,
            host: host.to_string(),
            port,
            socket,
            encoder: FrameEncoder::new(key.clone(), NONCE_DEVICE_TO_HOST),
            decoder: FrameDecoder::new(key.clone(), NONCE_HOST_TO_DEVICE),
            pending: BytesMut::new(),
            last_send: now,
            config,
        })
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Remote target this session was opened against.
    #[must_use]
    pub fn peer(&self) -> (&str, u16) {
        (&self.host, self.port)
    }

    /// Whether a fresh plaintext run would be encoded right now.
    ///
    /// False while encoded wire bytes from an earlier tick await socket
    /// acceptance; the pump keeps plaintext queued instead, so the
    /// retained backlog never exceeds one frame.
    #[must_use]
    pub fn can_send(&self) -> bool {
        self.state == SessionState::Established && self.pending.is_empty()
    }

    /// One cooperative tick: flush the wire backlog, read and decode
    /// whatever the socket has, and emit a keepalive if the TX side has
    /// been idle past the configured interval.
    ///
    /// Decoded payloads are appended to `inbound` in receipt order. On any
    /// error the session is fully torn down before this returns, and
    /// `inbound` is left empty: a failing tick delivers nothing. Once the
    /// session is closed, ticks are no-ops.
    ///
    /// # Errors
    ///
    /// - [`SessionError::Protocol`] on a malformed frame; unrecoverable
    /// - [`SessionError::Transport`] on socket failure or remote close
    pub fn service(&mut self, now: Instant, inbound: &mut Vec<Bytes>) -> Result<(), SessionError> {
        if self.state != SessionState::Established {
            return Ok(());
        }

        match self.service_tick(now, inbound) {
            Ok(()) => Ok(()),
            Err(err) => {
                // Cancellation within the same tick: no stale payload may
                // reach the terminal once the session is ending.
                inbound.clear();
                self.teardown();
                Err(err)
            },
        }
    }

    /// Encode one plaintext run as a frame and write it within this tick.
    ///
    /// No batching: a live terminal session tolerates no added input
    /// latency. Bytes the socket does not accept stay in the wire backlog
    /// and are flushed first on later ticks. On error the session is fully
    /// torn down before this returns; once closed, sends are no-ops.
    ///
    /// # Errors
    ///
    /// - [`SessionError::Protocol`] if `plaintext` exceeds one frame
    /// - [`SessionError::Transport`] on socket failure
    pub fn send(&mut self, now: Instant, plaintext: &[u8]) -> Result<(), SessionError> {
        if self.state != SessionState::Established {
            return Ok(());
        }

        match self.send_frame(now, plaintext) {
            Ok(()) => Ok(()),
            Err(err) => {
                self.teardown();
                Err(err)
            },
        }
    }

    /// Tear the session down. Always succeeds; idempotent.
    ///
    /// Unflushed outbound bytes are discarded, cipher states and staging
    /// buffers are dropped, and the socket is closed atomically.
    pub fn close(&mut self) {
        if self.state != SessionState::Closed {
            self.teardown();
        }
    }

    fn service_tick(&mut self, now: Instant, inbound: &mut Vec<Bytes>) -> Result<(), SessionError> {
        self.flush_wire()?;

        let mut buf = [0u8; READ_CHUNK];
        for _ in 0..READ_BUDGET {
            let n = self.socket.read(&mut buf)?;
            if n == 0 {
                break;
            }
            tracing::trace!(bytes = n, "socket read");
            inbound.extend(self.decoder.feed(&buf[..n])?);
        }

        self.maybe_keepalive(now)?;
        Ok(())
    }

    fn send_frame(&mut self, now: Instant, plaintext: &[u8]) -> Result<(), SessionError> {
        let frame = self.encoder.encode(plaintext)?;
        self.last_send = now;

        self.flush_wire()?;
        self.transmit(&frame)?;

        tracing::trace!(payload = plaintext.len(), "frame sent");
        Ok(())
    }

    /// Write backlogged wire bytes until the socket stops accepting.
    fn flush_wire(&mut self) -> Result<(), SessionError> {
        while !self.pending.is_empty() {
            let n = self.socket.write(&self.pending)?;
            if n == 0 {
                return Ok(());
            }
            self.pending.advance(n);
        }
        Ok(())
    }

    /// Write a complete frame, retaining whatever the socket rejects.
    fn transmit(&mut self, frame: &[u8]) -> Result<(), SessionError> {
        // An earlier frame still queued keeps the wire ordered: append
        // instead of interleaving.
        if !self.pending.is_empty() {
            self.pending.extend_from_slice(frame);
            return Ok(());
        }

        let mut written = 0;
        while written < frame.len() {
            let n = self.socket.write(&frame[written..])?;
            if n == 0 {
                break;
            }
            written += n;
        }

        if written < frame.len() {
            self.pending.extend_from_slice(&frame[written..]);
        }
        Ok(())
    }

    fn maybe_keepalive(&mut self, now: Instant) -> Result<(), SessionError> {
        let Some(interval) = self.config.keepalive_interval else {
            return Ok(());
        };
        if !self.pending.is_empty() || now.duration_since(self.last_send) < interval {
            return Ok(());
        }

        self.last_send = now;
        tracing::trace!("keepalive sent");
        self.transmit(&KEEPALIVE_WIRE)
    }

    fn teardown(&mut self) {
        self.state = SessionState::Closing;
        self.pending.clear();
        self.socket.close();
        self.state = SessionState::Closed;
        tracing::info!(host = %self.host, port = self.port, "session closed");
    }
}
