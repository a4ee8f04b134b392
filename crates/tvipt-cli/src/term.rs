//! Raw-mode stdio terminal driver.
//!
//! Implements [`TerminalPort`] over the local terminal: crossterm raw mode
//! with non-blocking keyboard polls mapped to bytes, verbatim output, and
//! XON/XOFF handled here so the session layer only sees the halt state.
//! Raw mode is restored on drop.

use std::{
    io::{self, Stdout, Write, stdout},
    time::Duration,
};

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use thiserror::Error;
use tvipt_core::{BREAK_BYTE, TerminalPort, XOFF, XON};

/// Terminal driver errors.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// I/O error from terminal setup.
    #[error("terminal i/o error: {0}")]
    Io(#[from] io::Error),
}

/// The local terminal as a [`TerminalPort`].
pub struct StdioTerminal {
    stdout: Stdout,
    halted: bool,
}

impl StdioTerminal {
    /// Enter raw mode and take the stdio handles.
    ///
    /// # Errors
    ///
    /// - [`TerminalError::Io`] if raw mode cannot be enabled
    pub fn new() -> Result<Self, TerminalError> {
        enable_raw_mode()?;
        Ok(Self { stdout: stdout(), halted: false })
    }

    /// Map a key press to the byte the serial terminal would have sent.
    ///
    /// Ctrl-Space and Ctrl-@ produce the break byte. Ctrl-S/Ctrl-Q are the
    /// XOFF/XON pair: they toggle the halt state and never enter the input
    /// stream. Other Ctrl-letters map to their control codes; non-ASCII
    /// keys are dropped (the terminal is seven-bit).
    fn map_key(&mut self, key: KeyEvent) -> Option<u8> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            let byte = match key.code {
                KeyCode::Char(' ') | KeyCode::Char('@') => BREAK_BYTE,
                KeyCode::Char(c) if c.is_ascii_alphabetic() => {
                    (c.to_ascii_uppercase() as u8) & 0x1F
                },
                _ => return None,
            };

            // XON/XOFF is flow control, not input: track the halt state
            // here and keep the pair out of the input stream.
            return match byte {
                XOFF => {
                    self.halted = true;
                    None
                },
                XON => {
                    self.halted = false;
                    None
                },
                _ => Some(byte),
            };
        }

        match key.code {
            KeyCode::Char(c) if c.is_ascii() => Some(c as u8),
            KeyCode::Enter => Some(b'\r'),
            KeyCode::Backspace => Some(0x08),
            KeyCode::Tab => Some(b'\t'),
            KeyCode::Esc => Some(0x1B),
            KeyCode::Delete => Some(0x7F),
            _ => None,
        }
    }
}

impl TerminalPort for StdioTerminal {
    fn read_byte(&mut self) -> Option<u8> {
        // Poll with a zero timeout: a tick never waits on the keyboard.
        loop {
            match event::poll(Duration::ZERO) {
                Ok(true) => {},
                Ok(false) => return None,
                Err(err) => {
                    tracing::warn!(%err, "terminal poll failed");
                    return None;
                },
            }

            match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                    if let Some(byte) = self.map_key(key) {
                        return Some(byte);
                    }
                },
                Ok(_) => {},
                Err(err) => {
                    tracing::warn!(%err, "terminal read failed");
                    return None;
                },
            }
        }
    }

    fn write(&mut self, bytes: &[u8]) {
        if let Err(err) = self.stdout.write_all(bytes).and_then(|()| self.stdout.flush()) {
            tracing::warn!(%err, "terminal write failed");
        }
    }

    fn flow_halted(&self) -> bool {
        self.halted
    }
}

impl Drop for StdioTerminal {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}
