//! tvipt Cryptographic Primitives
//!
//! Keystream generation and application for the tvipt session layer. Pure
//! functions with deterministic outputs: the cipher engine never owns or
//! advances stream position itself. Callers hold a [`CipherState`] per
//! direction and advance it by exactly the number of keystream bytes they
//! consume.
//!
//! # Construction
//!
//! IETF ChaCha20 (RFC 8439): 32-byte key, 96-bit nonce, 32-bit little-endian
//! block counter advanced once per 64-byte block. Positions are expressed as
//! byte offsets into the keystream; the block counter and intra-block skip
//! are derived from the offset.
//!
//! # Security
//!
//! Confidentiality only:
//! - The pre-shared key is provisioned out of band and fixed for the device's
//!   operational lifetime. There is no in-protocol key exchange or rotation.
//! - Distinct per-direction nonces keep the two halves of a session from ever
//!   drawing the same keystream under the shared key.
//! - No byte of keystream may be consumed twice under one (key, nonce). This
//!   is a caller contract, not a runtime check: [`CipherState`] only moves
//!   forward, and a fresh state is created only with a fresh session.
//! - No integrity: the stream carries no authentication tag. Tampering is not
//!   detected at this layer.

pub mod keystream;

pub use keystream::{CipherState, KEY_LEN, NONCE_LEN, SecretKey, apply, keystream};
