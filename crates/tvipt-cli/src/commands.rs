//! Command table and pure renderers.
//!
//! Help is printed in table order. Renderers return strings with CRLF line
//! endings since the terminal runs in raw mode.

use std::{fmt::Write, time::Duration};

/// One dispatcher command.
#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    /// Name typed at the prompt.
    pub name: &'static str,
    /// Syntax shown by help.
    pub syntax: &'static str,
    /// One-line description.
    pub help: &'static str,
}

/// Help is printed in this order.
pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec { name: "b", syntax: "b", help: "re-run boot auto connect" },
    CommandSpec { name: "c", syntax: "c host port", help: "connect to tvipt server at host" },
    CommandSpec { name: "chars", syntax: "chars", help: "print the printable characters" },
    CommandSpec { name: "echo", syntax: "echo", help: "echo chars typed to terminal" },
    CommandSpec { name: "h", syntax: "h", help: "print this help" },
    CommandSpec { name: "i", syntax: "i", help: "print system info" },
    CommandSpec { name: "q", syntax: "q", help: "quit the bridge" },
];

const FIRST_PRINTABLE: u8 = 0x20;
const LAST_PRINTABLE: u8 = 0x7E;

/// Render the help table: syntax column padded to the widest entry.
#[must_use]
pub fn render_help() -> String {
    let width = COMMANDS.iter().map(|c| c.syntax.len()).max().unwrap_or(0);

    let mut out = String::new();
    for command in COMMANDS {
        let _ = write!(out, "{:<width$}    {}\r\n", command.syntax, command.help);
    }
    out
}

/// Render the printable characters, eight per line in columns twelve
/// code points apart.
#[must_use]
pub fn render_chars() -> String {
    let mut out = String::new();

    for row in FIRST_PRINTABLE..=FIRST_PRINTABLE + 11 {
        for col in 0..8u8 {
            let ch = row + col * 12;
            // The last row leaves some columns empty.
            if ch > LAST_PRINTABLE {
                break;
            }
            let _ = write!(out, "0x{ch:02X} {}    ", ch as char);
        }
        out.push_str("\r\n");
    }

    out
}

/// Format uptime the way the device's info screen does.
#[must_use]
pub fn format_uptime(elapsed: Duration) -> String {
    let mut ms = elapsed.as_millis();

    const SECOND: u128 = 1000;
    const MINUTE: u128 = 60 * SECOND;
    const HOUR: u128 = 60 * MINUTE;
    const DAY: u128 = 24 * HOUR;

    let days = ms / DAY;
    ms -= days * DAY;
    let hours = ms / HOUR;
    ms -= hours * HOUR;
    let minutes = ms / MINUTE;
    ms -= minutes * MINUTE;
    let seconds = ms / SECOND;
    ms -= seconds * SECOND;

    format!(
        "{days} days, {hours} hours, {minutes} minutes, {seconds} seconds, {ms} milliseconds"
    )
}
