//! ChaCha20 keystream generation and XOR application.
//!
//! All functions are pure. Stream position lives in [`CipherState`], owned by
//! the frame codec, one per direction.

use std::fmt;

use chacha20::{
    ChaCha20,
    cipher::{KeyIvInit, StreamCipher, StreamCipherSeek},
};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Pre-shared key length in bytes.
pub const KEY_LEN: usize = 32;

/// Per-direction nonce length in bytes (IETF ChaCha20).
pub const NONCE_LEN: usize = 12;

/// The device's pre-shared secret key.
///
/// Provisioned out of band; the identical key must be configured on the
/// remote host. Read-only for the device's operational lifetime and never
/// transmitted. Zeroed on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey([u8; KEY_LEN]);

impl SecretKey {
    /// Wrap raw key bytes.
    #[must_use]
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw key bytes, for keystream derivation only.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

/// Key material never appears in logs or panics.
impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(..)")
    }
}

/// Generate `len` bytes of keystream at byte `offset` under `(key, nonce)`.
///
/// Deterministic pure function: identical inputs always produce identical
/// output, and caller state is never mutated. The ChaCha20 block counter is
/// `offset / 64`; the first `offset % 64` bytes of that block are skipped.
///
/// # Correctness requirement
///
/// Callers must never request overlapping offsets for different plaintext
/// bytes under the same `(key, nonce)`. Keystream reuse breaks
/// confidentiality silently; it is a contract violation, not a detectable
/// runtime condition.
#[must_use]
pub fn keystream(key: &SecretKey, nonce: &[u8; NONCE_LEN], offset: u64, len: usize) -> Vec<u8> {
    let mut out = vec![0u8; len];

    let mut cipher = ChaCha20::new(key.as_bytes().into(), nonce.into());

    // INVARIANT: offsets are bounded far below the 2^38-byte IETF ChaCha20
    // stream limit; frames are at most a few KiB and a session would need
    // centuries of terminal traffic to approach it.
    #[allow(clippy::expect_used)]
    cipher.try_seek(offset).expect("invariant: keystream offset within ChaCha20 stream bound");

    cipher.apply_keystream(&mut out);
    out
}

/// XOR `keystream` into `data` in place.
///
/// Self-inverse: applying the same keystream slice twice restores the
/// original bytes. Both slices must be the same length.
pub fn apply(data: &mut [u8], keystream: &[u8]) {
    debug_assert_eq!(data.len(), keystream.len());

    for (byte, ks) in data.iter_mut().zip(keystream) {
        *byte ^= ks;
    }
}

/// Per-direction cipher position: nonce plus a strictly monotonic byte
/// offset into the keystream.
///
/// Created with a session, destroyed with it. The offset resets only when a
/// brand-new session (a fresh TCP connection) is created, never on transient
/// I/O errors within the same session.
#[derive(Debug, Clone)]
pub struct CipherState {
    nonce: [u8; NONCE_LEN],
    offset: u64,
}

impl CipherState {
    /// New state at offset zero for one direction of a fresh session.
    #[must_use]
    pub fn new(nonce: [u8; NONCE_LEN]) -> Self {
        Self { nonce, offset: 0 }
    }

    /// Current byte offset into the keystream.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// This direction's nonce.
    #[must_use]
    pub fn nonce(&self) -> &[u8; NONCE_LEN] {
        &self.nonce
    }

    /// XOR the next `data.len()` keystream bytes into `data` and advance.
    ///
    /// Encrypts or decrypts (same operation) and moves the offset forward by
    /// exactly the bytes consumed, preserving the never-reuse contract.
    pub fn apply_next(&mut self, key: &SecretKey, data: &mut [u8]) {
        let ks = keystream(key, &self.nonce, self.offset, data.len());
        apply(data, &ks);
        self.offset += data.len() as u64;
    }
}
