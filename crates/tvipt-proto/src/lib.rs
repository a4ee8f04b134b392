//! tvipt wire protocol: length-prefixed encrypted frames.
//!
//! One frame on the wire, big-endian:
//!
//! ```text
//! [ length: u16 ] [ ciphertext: `length` bytes ]
//! ```
//!
//! where `ciphertext = plaintext XOR keystream(key, direction_nonce,
//! running_offset)`. The keystream offset runs contiguously across frames
//! within one session direction, so framing adds no cipher state of its own.
//!
//! Encryption starts on the first frame in either direction; there is no
//! handshake. Peer authentication rests entirely on both sides holding the
//! same pre-shared key.
//!
//! # Invariants
//!
//! - A payload is exactly as long as its prefix declares; the decoder never
//!   surfaces a partially received frame.
//! - Declared lengths above [`MAX_PAYLOAD_LEN`] are rejected before any
//!   allocation ([`ProtocolError::FrameTooLarge`]) and are fatal to the
//!   session: with no resynchronization primitive, a bad prefix means the
//!   stream position is unrecoverable.
//! - Zero-length frames are legal keepalives. They advance no keystream and
//!   are consumed by the decoder without surfacing a payload.
//!
//! # Security
//!
//! No authentication tag: integrity is not verified at this layer. A
//! modified ciphertext byte decrypts to a modified plaintext byte and is
//! passed through. This matches the device's wire format; stronger
//! guarantees would require an authenticated construction and a new format.

use thiserror::Error;

pub mod codec;

pub use codec::{FrameDecoder, FrameEncoder};

/// Width of the frame length prefix in bytes.
pub const LEN_PREFIX_LEN: usize = 2;

/// Maximum payload bytes per frame.
///
/// Sized to the device's fixed, small memory budget: the decoder stages at
/// most one frame of this size, and the session retains at most one encoded
/// frame awaiting socket acceptance. Adversarial or corrupted prefixes above
/// this bound are rejected rather than buffered.
pub const MAX_PAYLOAD_LEN: usize = 1024;

/// A complete zero-length frame, used as a keepalive.
pub const KEEPALIVE_WIRE: [u8; LEN_PREFIX_LEN] = [0, 0];

/// Keystream nonce for the device-to-host direction.
pub const NONCE_DEVICE_TO_HOST: [u8; tvipt_crypto::NONCE_LEN] =
    [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, b'D'];

/// Keystream nonce for the host-to-device direction.
///
/// Distinct from [`NONCE_DEVICE_TO_HOST`] so the shared key never produces
/// colliding keystreams in the two directions.
pub const NONCE_HOST_TO_DEVICE: [u8; tvipt_crypto::NONCE_LEN] =
    [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, b'H'];

/// Framing-layer errors. Always fatal to the current session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Caller handed the encoder more plaintext than fits one frame.
    #[error("payload too large: {len} bytes exceeds maximum {max}")]
    PayloadTooLarge {
        /// Plaintext length that was offered
        len: usize,
        /// Maximum payload bytes per frame
        max: usize,
    },

    /// Received length prefix exceeds the configured maximum frame size.
    #[error("frame too large: peer declared {len} bytes, maximum is {max}")]
    FrameTooLarge {
        /// Declared payload length
        len: usize,
        /// Maximum payload bytes per frame
        max: usize,
    },
}
