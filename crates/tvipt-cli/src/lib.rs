//! tvipt terminal bridge.
//!
//! The binary side of the system: a command dispatcher with the device's
//! command set, a raw-mode stdio terminal driver, and a
//! non-blocking TCP transport. Everything runs on one cooperative tick
//! loop; when a session is live the dispatcher stops consuming terminal
//! input and drives the I/O pump until it reports session end.

use thiserror::Error;
use tvipt_core::{AutoConnect, config::DEFAULT_PORT};
use tvipt_crypto::{KEY_LEN, SecretKey};

pub mod commands;
pub mod dispatch;
pub mod net;
pub mod term;

pub use dispatch::{Dispatcher, Mode};
pub use net::TcpConnector;
pub use term::StdioTerminal;

/// Configuration parse failures at startup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SetupError {
    /// The pre-shared key was not 64 hex characters.
    #[error("key must be {KEY_LEN} bytes as {} hex characters", KEY_LEN * 2)]
    BadKey,

    /// The auto-connect target was not `host[:port]`.
    #[error("invalid connect target: {0}")]
    BadTarget(String),
}

/// Parse the provisioned key from its hex form.
///
/// # Errors
///
/// - [`SetupError::BadKey`] unless exactly 32 bytes of hex
pub fn parse_key(hex_key: &str) -> Result<SecretKey, SetupError> {
    let bytes = hex::decode(hex_key.trim()).map_err(|_| SetupError::BadKey)?;
    let key: [u8; KEY_LEN] = bytes.try_into().map_err(|_| SetupError::BadKey)?;
    Ok(SecretKey::from_bytes(key))
}

/// Parse a `host[:port]` auto-connect target; the port defaults to the
/// tvipt server port.
///
/// # Errors
///
/// - [`SetupError::BadTarget`] on an empty host or unparsable port
pub fn parse_target(target: &str) -> Result<AutoConnect, SetupError> {
    let (host, port) = match target.rsplit_once(':') {
        Some((host, port)) => {
            let port =
                port.parse::<u16>().map_err(|_| SetupError::BadTarget(target.to_string()))?;
            (host, port)
        },
        None => (target, DEFAULT_PORT),
    };

    if host.is_empty() {
        return Err(SetupError::BadTarget(target.to_string()));
    }

    Ok(AutoConnect { host: host.to_string(), port })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_parses_from_hex() {
        let hex_key = "11001100110011001100110011001100\
                       11001100110011001100110011001100";
        let key = parse_key(hex_key).unwrap();
        assert_eq!(key.as_bytes()[0], 0x11);
        assert_eq!(key.as_bytes()[1], 0x00);
    }

    #[test]
    fn short_or_odd_keys_are_rejected() {
        assert_eq!(parse_key("1100"), Err(SetupError::BadKey));
        assert_eq!(parse_key("xyz"), Err(SetupError::BadKey));
    }

    #[test]
    fn target_defaults_to_protocol_port() {
        let auto = parse_target("example.org").unwrap();
        assert_eq!(auto.host, "example.org");
        assert_eq!(auto.port, DEFAULT_PORT);

        let auto = parse_target("10.0.0.5:4444").unwrap();
        assert_eq!(auto.host, "10.0.0.5");
        assert_eq!(auto.port, 4444);
    }

    #[test]
    fn bad_targets_are_rejected() {
        assert!(matches!(parse_target(""), Err(SetupError::BadTarget(_))));
        assert!(matches!(parse_target("host:notaport"), Err(SetupError::BadTarget(_))));
    }
}
