//! Simulated terminal.
//!
//! Scripted input queue, captured output, and an explicit flow-control
//! toggle standing in for XON/XOFF interpretation in a real driver.

use std::collections::VecDeque;

use tvipt_core::TerminalPort;

/// A terminal the test types at and reads back from.
#[derive(Debug, Default)]
pub struct SimTerminal {
    input: VecDeque<u8>,
    output: Vec<u8>,
    halted: bool,
}

impl SimTerminal {
    /// Fresh terminal, no input pending, flow open.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue operator keystrokes.
    pub fn type_bytes(&mut self, bytes: &[u8]) {
        self.input.extend(bytes);
    }

    /// Assert flow-control halt (the terminal sent XOFF).
    pub fn halt(&mut self) {
        self.halted = true;
    }

    /// Clear flow-control halt (the terminal sent XON).
    pub fn resume(&mut self) {
        self.halted = false;
    }

    /// Everything written to the terminal so far.
    #[must_use]
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// Take and clear the captured output.
    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.output)
    }

    /// Keystrokes not yet consumed by the pump.
    #[must_use]
    pub fn pending_input(&self) -> usize {
        self.input.len()
    }
}

impl TerminalPort for SimTerminal {
    fn read_byte(&mut self) -> Option<u8> {
        self.input.pop_front()
    }

    fn write(&mut self, bytes: &[u8]) {
        self.output.extend_from_slice(bytes);
    }

    fn flow_halted(&self) -> bool {
        self.halted
    }
}
