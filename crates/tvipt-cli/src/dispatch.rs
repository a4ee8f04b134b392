//! Command dispatcher and mode multiplexer.
//!
//! Owns the one tick loop's brain: in command mode it edits and runs
//! prompt lines; after a successful connect it stops consuming terminal
//! input and drives the I/O pump every tick until the pump reports session
//! end, then returns to the prompt. Echo mode is the same tick discipline
//! pointed back at the terminal.
//!
//! Nothing here blocks. Each `tick()` consumes what the terminal has,
//! advances whichever mode is active, and returns.

use std::time::Instant;

use tvipt_core::{
    BREAK_BYTE, Connect, DeviceConfig, IoPump, PumpStatus, Session, TerminalPort,
};

use crate::commands::{format_uptime, render_chars, render_help};

/// Command buffer capacity; longer lines are rejected.
pub const MAX_COMMAND_LEN: usize = 60;

const PROMPT: &str = "> ";
const BACKSPACE: u8 = 0x08;

/// What owns the terminal this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Prompt is live; input is edited into command lines.
    Command,
    /// A session owns the terminal; the pump bridges it.
    Session,
    /// Echo test: input is written straight back until break.
    Echo,
}

/// Outcome of one command.
enum CmdStatus {
    /// Completed; prompt for another.
    Ok,
    /// Failed; prompt for another.
    Err,
    /// An I/O-capturing mode took over; no status line, no prompt.
    Io,
}

/// The device's command-line brain.
pub struct Dispatcher<C: Connect> {
    config: DeviceConfig,
    connector: C,
    command: Vec<u8>,
    started: Instant,
    mode: Mode,
    bridge: Option<(Session<C::Socket>, IoPump)>,
    running: bool,
}

impl<C: Connect> Dispatcher<C> {
    /// Dispatcher in command mode with an empty line buffer.
    pub fn new(config: DeviceConfig, connector: C, now: Instant) -> Self {
        Self {
            config,
            connector,
            command: Vec::with_capacity(MAX_COMMAND_LEN),
            started: now,
            mode: Mode::Command,
            bridge: None,
            running: true,
        }
    }

    /// False once the operator has quit.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Which mode owns the terminal.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Whether a session currently owns the terminal.
    #[must_use]
    pub fn in_session(&self) -> bool {
        self.bridge.is_some()
    }

    /// Run the boot sequence: one bounded auto-connect attempt if
    /// configured, otherwise straight to the prompt. Never loops.
    pub fn boot<P: TerminalPort>(&mut self, term: &mut P, now: Instant) {
        writeln_str(term, concat!("tvipt ", env!("CARGO_PKG_VERSION")));

        if let Some(auto) = self.config.auto_connect.clone() {
            writeln_str(
                term,
                &format!(
                    "auto connect host={} port={} timeout={}ms",
                    auto.host,
                    auto.port,
                    self.config.connect_timeout.as_millis()
                ),
            );

            if self.connect_to(term, &auto.host, auto.port, true, now) {
                return;
            }
        }

        self.prompt(term);
    }

    /// One cooperative tick of whichever mode is active.
    pub fn tick<P: TerminalPort>(&mut self, now: Instant, term: &mut P) {
        match self.mode {
            Mode::Session => self.tick_session(now, term),
            Mode::Echo => self.tick_echo(term),
            Mode::Command => self.tick_command(now, term),
        }
    }

    fn tick_session<P: TerminalPort>(&mut self, now: Instant, term: &mut P) {
        let Some((session, pump)) = self.bridge.as_mut() else {
            self.mode = Mode::Command;
            return;
        };

        if let PumpStatus::Ended(reason) = pump.tick(now, session, term) {
            // The session is already closed; reclaim the terminal for
            // command parsing and tell the operator why.
            self.bridge = None;
            self.mode = Mode::Command;
            writeln_str(term, &reason.to_string());
            self.prompt(term);
        }
    }

    fn tick_echo<P: TerminalPort>(&mut self, term: &mut P) {
        while let Some(byte) = term.read_byte() {
            if byte == BREAK_BYTE {
                self.mode = Mode::Command;
                writeln_str(term, "");
                writeln_str(term, "= ok");
                self.prompt(term);
                return;
            }
            term.write(&[byte]);
        }
    }

    fn tick_command<P: TerminalPort>(&mut self, now: Instant, term: &mut P) {
        while let Some(byte) = term.read_byte() {
            // Backspace before echo so it cannot erase past the prompt.
            if byte == BACKSPACE {
                if !self.command.is_empty() {
                    term.write(&[BACKSPACE, b' ', BACKSPACE]);
                    self.command.pop();
                }
                continue;
            }

            if byte == b'\r' || byte == b'\n' {
                writeln_str(term, "");
                let prompt = self.process_command(term, now);
                self.command.clear();
                if prompt {
                    self.prompt(term);
                }
                if self.mode != Mode::Command || !self.running {
                    return;
                }
                continue;
            }

            term.write(&[byte]);

            if self.command.len() < MAX_COMMAND_LEN {
                self.command.push(byte);
            } else {
                writeln_str(term, "");
                writeln_str(term, "command too long");
                writeln_str(term, "= err");
                self.command.clear();
                self.prompt(term);
            }
        }
    }

    /// Parse and run the buffered line. Returns whether to re-prompt.
    fn process_command<P: TerminalPort>(&mut self, term: &mut P, now: Instant) -> bool {
        let line = String::from_utf8_lossy(&self.command).into_owned();
        let mut words = line.split_whitespace();

        let status = match words.next() {
            None => CmdStatus::Ok,
            Some("b") => self.cmd_boot(term, now),
            Some("c") => {
                let host = words.next().map(str::to_string);
                let port = words.next().map(str::to_string);
                self.cmd_connect(term, host, port, now)
            },
            Some("chars") => {
                term.write(render_chars().as_bytes());
                CmdStatus::Ok
            },
            Some("echo") => {
                writeln_str(term, "send break to quit");
                self.mode = Mode::Echo;
                CmdStatus::Io
            },
            Some("h") => {
                term.write(render_help().as_bytes());
                CmdStatus::Ok
            },
            Some("i") => self.cmd_info(term, now),
            Some("q") => {
                writeln_str(term, "bye");
                self.running = false;
                CmdStatus::Io
            },
            Some(_) => {
                writeln_str(term, &format!("invalid command: {line}"));
                CmdStatus::Err
            },
        };

        match status {
            CmdStatus::Ok => {
                writeln_str(term, "= ok");
                true
            },
            CmdStatus::Err => {
                writeln_str(term, "= err");
                true
            },
            CmdStatus::Io => false,
        }
    }

    fn cmd_boot<P: TerminalPort>(&mut self, term: &mut P, now: Instant) -> CmdStatus {
        let Some(auto) = self.config.auto_connect.clone() else {
            writeln_str(term, "no auto connect configured");
            return CmdStatus::Ok;
        };

        if self.connect_to(term, &auto.host, auto.port, true, now) {
            CmdStatus::Io
        } else {
            CmdStatus::Ok
        }
    }

    fn cmd_connect<P: TerminalPort>(
        &mut self,
        term: &mut P,
        host: Option<String>,
        port: Option<String>,
        now: Instant,
    ) -> CmdStatus {
        let Some(host) = host else {
            writeln_str(term, "missing host");
            return CmdStatus::Err;
        };
        let Some(port) = port else {
            writeln_str(term, "missing port");
            return CmdStatus::Err;
        };
        let Ok(port) = port.parse::<u16>() else {
            writeln_str(term, "invalid port");
            return CmdStatus::Err;
        };

        if self.connect_to(term, &host, port, false, now) {
            CmdStatus::Io
        } else {
            CmdStatus::Err
        }
    }

    fn cmd_info<P: TerminalPort>(&mut self, term: &mut P, now: Instant) -> CmdStatus {
        writeln_str(term, &format!("uptime: {}", format_uptime(now.duration_since(self.started))));

        match self.config.session.keepalive_interval {
            Some(interval) => {
                writeln_str(term, &format!("keepalive: {}s", interval.as_secs()));
            },
            None => writeln_str(term, "keepalive: off"),
        }

        match &self.config.auto_connect {
            Some(auto) => {
                writeln_str(term, &format!("auto connect: {}:{}", auto.host, auto.port));
            },
            None => writeln_str(term, "auto connect: none"),
        }

        CmdStatus::Ok
    }

    /// Attempt a connection; on success the session takes the terminal.
    ///
    /// The boot path bounds the attempt with the configured timeout; the
    /// interactive path defers to the connect primitive's own bound.
    fn connect_to<P: TerminalPort>(
        &mut self,
        term: &mut P,
        host: &str,
        port: u16,
        bounded: bool,
        now: Instant,
    ) -> bool {
        let timeout = bounded.then_some(self.config.connect_timeout);

        match Session::connect(
            &mut self.connector,
            host,
            port,
            timeout,
            &self.config.key,
            self.config.session.clone(),
            now,
        ) {
            Ok(session) => {
                self.bridge = Some((session, IoPump::new()));
                self.mode = Mode::Session;
                true
            },
            Err(err) => {
                tracing::debug!(%err, host, port, "connect failed");
                writeln_str(term, "connection failed");
                false
            },
        }
    }

    fn prompt<P: TerminalPort>(&self, term: &mut P) {
        term.write(PROMPT.as_bytes());
    }
}

fn writeln_str<P: TerminalPort>(term: &mut P, line: &str) {
    term.write(line.as_bytes());
    term.write(b"\r\n");
}
