//! Device configuration.
//!
//! The pre-shared key plus the few knobs the session layer exposes. The key
//! is provisioned out of band, baked into configuration, and fixed for the
//! device's operational lifetime; the operator must provision the identical
//! key on the remote host.

use std::time::Duration;

use tvipt_crypto::SecretKey;

/// Default tvipt server port.
pub const DEFAULT_PORT: u16 = 3333;

/// Default bound on the boot-time auto-connect attempt.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Default TX-idle interval after which a keepalive frame is sent.
pub const DEFAULT_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(20);

/// Per-session tuning.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Send a zero-length keepalive frame after this much TX idle time.
    /// `None` disables keepalives.
    pub keepalive_interval: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { keepalive_interval: Some(DEFAULT_KEEPALIVE_INTERVAL) }
    }
}

/// Boot-time auto-connect target.
///
/// Disabled unless explicitly configured. The boot path performs exactly one
/// bounded attempt and falls back to local command mode on failure; it never
/// loops.
#[derive(Debug, Clone)]
pub struct AutoConnect {
    /// Remote host name or address.
    pub host: String,
    /// Remote port.
    pub port: u16,
}

/// Full device configuration.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// The 32-byte pre-shared key. Read-only, never transmitted.
    pub key: SecretKey,
    /// Connect to this target at boot, if set.
    pub auto_connect: Option<AutoConnect>,
    /// Bound on the boot-time connect attempt.
    pub connect_timeout: Duration,
    /// Session tuning.
    pub session: SessionConfig,
}

impl DeviceConfig {
    /// Configuration with defaults around the provisioned key.
    #[must_use]
    pub fn new(key: SecretKey) -> Self {
        Self {
            key,
            auto_connect: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            session: SessionConfig::default(),
        }
    }
}
