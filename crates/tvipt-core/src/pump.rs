//! Terminal/session I/O pump.
//!
//! Bridges decrypted inbound payloads to the terminal output path and
//! terminal input bytes to the outbound queue, honoring the terminal's
//! software flow control and watching for the local break byte. The pump
//! buffers only what is needed to bridge one tick's batch; flow control
//! over the network link itself is the session's wire backlog, not the
//! pump's concern.

use std::{collections::VecDeque, time::Instant};

use tvipt_proto::MAX_PAYLOAD_LEN;

use crate::{
    error::EndReason, session::Session, terminal::TerminalPort, transport::Transport,
};

/// Distinguished control byte: operator-requested session break.
pub const BREAK_BYTE: u8 = 0x00;

/// Outcome of one pump tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PumpStatus {
    /// Session still live; keep ticking.
    Active,
    /// Session ended this tick; the dispatcher resumes command parsing.
    Ended(EndReason),
}

/// Bridges one terminal and one session, one tick at a time.
#[derive(Debug, Default)]
pub struct IoPump {
    /// Terminal bytes awaiting encryption, in arrival order.
    outbound: VecDeque<u8>,
}

impl IoPump {
    /// New pump with an empty outbound queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Terminal bytes queued but not yet handed to the session.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.outbound.len()
    }

    /// One cooperative tick.
    ///
    /// Order of duties:
    ///
    /// 1. Service the session; write every decoded payload to the terminal
    ///    verbatim. A session failure ends the tick immediately and nothing
    ///    decoded in the failing tick is delivered.
    /// 2. Unless the terminal asserts flow-control halt, drain pending
    ///    terminal input into the outbound queue. Observing [`BREAK_BYTE`]
    ///    discards unflushed outbound, closes the session within this same
    ///    tick, and reports [`EndReason::LocalBreak`] (a break is a clean,
    ///    successful teardown). While halted, consumption is withheld and
    ///    queued bytes keep their original order for the eventual resume.
    /// 3. Hand the session at most one frame's worth of queued bytes, and
    ///    only when it has no wire backlog.
    pub fn tick<T, P>(
        &mut self,
        now: Instant,
        session: &mut Session<T>,
        term: &mut P,
    ) -> PumpStatus
    where
        T: Transport,
        P: TerminalPort,
    {
        let mut inbound = Vec::new();
        if let Err(err) = session.service(now, &mut inbound) {
            return PumpStatus::Ended(EndReason::from_error(err));
        }
        for payload in &inbound {
            term.write(payload);
        }

        if !term.flow_halted() {
            while let Some(byte) = term.read_byte() {
                if byte == BREAK_BYTE {
                    self.outbound.clear();
                    session.close();
                    tracing::debug!("local break");
                    return PumpStatus::Ended(EndReason::LocalBreak);
                }
                self.outbound.push_back(byte);
            }
        }

        if session.can_send() && !self.outbound.is_empty() {
            let take = self.outbound.len().min(MAX_PAYLOAD_LEN);
            let batch: Vec<u8> = self.outbound.drain(..take).collect();
            if let Err(err) = session.send(now, &batch) {
                return PumpStatus::Ended(EndReason::from_error(err));
            }
        }

        PumpStatus::Active
    }
}
