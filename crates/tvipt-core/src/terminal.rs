//! Terminal seam.
//!
//! The physical terminal driver (character echo, key mapping, XON/XOFF
//! interpretation) lives outside this crate. The session layer sees only
//! this trait: a non-blocking byte source, a verbatim byte sink, and the
//! current software flow-control state.

/// Software flow control: terminal requests output to resume.
pub const XON: u8 = 0x11;

/// Software flow control: terminal requests a halt.
pub const XOFF: u8 = 0x13;

/// One tick's view of the terminal.
pub trait TerminalPort {
    /// Next input byte, if one is pending. Never blocks.
    fn read_byte(&mut self) -> Option<u8>;

    /// Write bytes to the terminal output path verbatim.
    ///
    /// Session payloads pass through with no interpretation of their
    /// content; the driver may not translate, drop, or reorder them.
    fn write(&mut self, bytes: &[u8]);

    /// Whether the terminal currently asserts flow-control halt.
    ///
    /// While true, input consumption is withheld: buffered terminal bytes
    /// stay queued in the driver, in order, until the terminal asserts
    /// resume.
    fn flow_halted(&self) -> bool;
}
