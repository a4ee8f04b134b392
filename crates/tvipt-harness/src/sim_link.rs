//! In-memory duplex link with scriptable delivery and back-pressure.
//!
//! A [`SimLink`] holds two byte queues, one per direction. Each end gets a
//! [`SimSocket`] implementing the non-blocking [`Transport`] contract.
//! Tests script per-end read chunking (how many bytes one `read` returns),
//! per-write acceptance quotas (back-pressure), injected I/O errors, and
//! orderly closes.

use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use tvipt_core::{Connect, ConnectError, Transport, TransportError};

/// Which end of the link a socket or script control refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum End {
    /// The terminal-bridge side under test.
    Device,
    /// The remote-host side, usually driven by [`SimPeer`](crate::SimPeer).
    Host,
}

impl End {
    fn index(self) -> usize {
        match self {
            Self::Device => 0,
            Self::Host => 1,
        }
    }

    fn other(self) -> Self {
        match self {
            Self::Device => Self::Host,
            Self::Host => Self::Device,
        }
    }
}

#[derive(Debug)]
struct Endpoint {
    /// Bytes delivered to this end but not yet read.
    inbox: VecDeque<u8>,
    closed: bool,
    /// Max bytes one `read` call returns.
    read_chunk: usize,
    /// Remaining byte budget for writes; depletes as bytes are accepted.
    write_quota: usize,
    /// Error returned by the next read, once.
    fail_read: Option<TransportError>,
    /// Error returned by the next write, once.
    fail_write: Option<TransportError>,
}

impl Endpoint {
    fn new() -> Self {
        Self {
            inbox: VecDeque::new(),
            closed: false,
            read_chunk: usize::MAX,
            write_quota: usize::MAX,
            fail_read: None,
            fail_write: None,
        }
    }
}

#[derive(Debug)]
struct LinkInner {
    ends: [Endpoint; 2],
}

/// A simulated duplex connection plus its script controls.
///
/// Clone-free: keep the `SimLink` in the test and hand out sockets.
#[derive(Debug)]
pub struct SimLink {
    inner: Rc<RefCell<LinkInner>>,
}

impl Default for SimLink {
    fn default() -> Self {
        Self::new()
    }
}

impl SimLink {
    /// Fresh link, both directions empty and open.
    #[must_use]
    pub fn new() -> Self {
        Self { inner: Rc::new(RefCell::new(LinkInner { ends: [Endpoint::new(), Endpoint::new()] })) }
    }

    /// Socket for one end. May be called more than once per end; handles
    /// share the underlying queues.
    #[must_use]
    pub fn socket(&self, end: End) -> SimSocket {
        SimSocket { inner: Rc::clone(&self.inner), end }
    }

    /// Limit how many bytes one `read` at `end` returns. Models a network
    /// that delivers bytes in arbitrary-sized pieces.
    pub fn set_read_chunk(&self, end: End, chunk: usize) {
        self.inner.borrow_mut().ends[end.index()].read_chunk = chunk;
    }

    /// Set the remaining write budget at `end`. Writes deplete it byte for
    /// byte and report `0` accepted once it is spent, like a full kernel
    /// buffer; call again to model the buffer draining.
    pub fn set_write_quota(&self, end: End, quota: usize) {
        self.inner.borrow_mut().ends[end.index()].write_quota = quota;
    }

    /// Make the next `read` at `end` fail with `err`.
    pub fn fail_next_read(&self, end: End, err: TransportError) {
        self.inner.borrow_mut().ends[end.index()].fail_read = Some(err);
    }

    /// Make the next `write` at `end` fail with `err`.
    pub fn fail_next_write(&self, end: End, err: TransportError) {
        self.inner.borrow_mut().ends[end.index()].fail_write = Some(err);
    }

    /// Bytes queued toward `end` that it has not read yet.
    #[must_use]
    pub fn queued_for(&self, end: End) -> usize {
        self.inner.borrow().ends[end.index()].inbox.len()
    }
}

/// One end of a [`SimLink`].
#[derive(Debug)]
pub struct SimSocket {
    inner: Rc<RefCell<LinkInner>>,
    end: End,
}

impl Transport for SimSocket {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let mut inner = self.inner.borrow_mut();

        if let Some(err) = inner.ends[self.end.index()].fail_read.take() {
            return Err(err);
        }

        let me = self.end.index();
        let take = buf.len().min(inner.ends[me].read_chunk).min(inner.ends[me].inbox.len());
        if take == 0 {
            // Remote close surfaces only after pending data is drained.
            if inner.ends[self.end.other().index()].closed {
                return Err(TransportError::Closed);
            }
            return Ok(0);
        }

        for slot in buf.iter_mut().take(take) {
            // INVARIANT: `take` is bounded by the inbox length above.
            #[allow(clippy::expect_used)]
            let byte = inner.ends[me].inbox.pop_front().expect("invariant: take <= inbox len");
            *slot = byte;
        }
        Ok(take)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, TransportError> {
        let mut inner = self.inner.borrow_mut();

        if let Some(err) = inner.ends[self.end.index()].fail_write.take() {
            return Err(err);
        }
        if inner.ends[self.end.other().index()].closed {
            return Err(TransportError::Io("broken pipe".to_string()));
        }

        let me = self.end.index();
        let accept = buf.len().min(inner.ends[me].write_quota);
        inner.ends[me].write_quota = inner.ends[me].write_quota.saturating_sub(accept);

        let peer = self.end.other().index();
        inner.ends[peer].inbox.extend(&buf[..accept]);
        Ok(accept)
    }

    fn close(&mut self) {
        self.inner.borrow_mut().ends[self.end.index()].closed = true;
    }
}

/// Programmable connector: hands out the device end of a prepared link, or
/// refuses.
#[derive(Debug)]
pub struct SimConnect {
    link: Option<SimLink>,
    refuse: Option<String>,
}

impl SimConnect {
    /// Connector that succeeds with the device end of `link`.
    #[must_use]
    pub fn to(link: &SimLink) -> Self {
        Self { link: Some(SimLink { inner: Rc::clone(&link.inner) }), refuse: None }
    }

    /// Connector whose attempt fails with the given reason.
    #[must_use]
    pub fn refusing(reason: &str) -> Self {
        Self { link: None, refuse: Some(reason.to_string()) }
    }
}

impl Connect for SimConnect {
    type Socket = SimSocket;

    fn connect(
        &mut self,
        _host: &str,
        _port: u16,
        _timeout: Option<std::time::Duration>,
    ) -> Result<Self::Socket, ConnectError> {
        if let Some(reason) = &self.refuse {
            return Err(ConnectError::Failed(reason.clone()));
        }
        match &self.link {
            Some(link) => Ok(link.socket(End::Device)),
            None => Err(ConnectError::Failed("no link prepared".to_string())),
        }
    }
}
