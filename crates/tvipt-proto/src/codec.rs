//! Streaming frame encoder and decoder.
//!
//! The encoder turns plaintext runs into complete wire frames. The decoder
//! reconstructs payloads from a byte stream delivered in arbitrary-sized
//! pieces: each [`FrameDecoder::feed`] call consumes whatever the socket
//! produced this tick (zero bytes, half a prefix, several frames) and yields
//! every payload that completed. Partial state stays in the staging buffer
//! between calls.
//!
//! Each half owns its direction's [`CipherState`]; the codec pair is created
//! with a session and discarded with it.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tvipt_crypto::{CipherState, NONCE_LEN, SecretKey};

use crate::{LEN_PREFIX_LEN, MAX_PAYLOAD_LEN, ProtocolError};

/// Encrypts plaintext runs into length-prefixed wire frames.
#[derive(Debug)]
pub struct FrameEncoder {
    key: SecretKey,
    cipher: CipherState,
}

impl FrameEncoder {
    /// New encoder at keystream offset zero for one direction.
    #[must_use]
    pub fn new(key: SecretKey, nonce: [u8; NONCE_LEN]) -> Self {
        Self { key, cipher: CipherState::new(nonce) }
    }

    /// Encode one frame: `u16` big-endian length prefix followed by the
    /// encrypted payload. Advances the keystream offset by the payload
    /// length; zero-length payloads advance it trivially.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::PayloadTooLarge`] if `plaintext` exceeds
    ///   [`MAX_PAYLOAD_LEN`]. The keystream offset is untouched on error.
    pub fn encode(&mut self, plaintext: &[u8]) -> Result<Bytes, ProtocolError> {
        if plaintext.len() > MAX_PAYLOAD_LEN {
            return Err(ProtocolError::PayloadTooLarge {
                len: plaintext.len(),
                max: MAX_PAYLOAD_LEN,
            });
        }

        let mut frame = BytesMut::with_capacity(LEN_PREFIX_LEN + plaintext.len());
        frame.put_u16(plaintext.len() as u16);

        frame.extend_from_slice(plaintext);
        self.cipher.apply_next(&self.key, &mut frame[LEN_PREFIX_LEN..]);

        Ok(frame.freeze())
    }

    /// Keystream bytes consumed so far in this direction.
    #[must_use]
    pub fn stream_offset(&self) -> u64 {
        self.cipher.offset()
    }
}

/// Reassembles and decrypts frames from an arbitrarily chunked byte stream.
#[derive(Debug)]
pub struct FrameDecoder {
    key: SecretKey,
    cipher: CipherState,
    /// Bytes received toward the current frame. Cleared each time a complete
    /// frame is emitted; discarded with the session.
    staging: BytesMut,
    /// Declared payload length once the prefix has been read.
    pending_len: Option<usize>,
}

impl FrameDecoder {
    /// New decoder at keystream offset zero for one direction.
    #[must_use]
    pub fn new(key: SecretKey, nonce: [u8; NONCE_LEN]) -> Self {
        Self {
            key,
            cipher: CipherState::new(nonce),
            staging: BytesMut::with_capacity(LEN_PREFIX_LEN + MAX_PAYLOAD_LEN),
            pending_len: None,
        }
    }

    /// Append received bytes and decode every frame that completes.
    ///
    /// Resumable: a frame split across any number of `feed` calls decodes
    /// exactly once, when its last byte arrives. One call may also complete
    /// several queued frames. Zero-length keepalive frames are consumed
    /// without being emitted.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::FrameTooLarge`] if a prefix declares more than
    ///   [`MAX_PAYLOAD_LEN`] bytes. The decoder is not usable afterwards;
    ///   the session must close.
    pub fn feed(&mut self, received: &[u8]) -> Result<Vec<Bytes>, ProtocolError> {
        self.staging.extend_from_slice(received);

        let mut decoded = Vec::new();

        loop {
            let len = match self.pending_len {
                Some(len) => len,
                None => {
                    if self.staging.len() < LEN_PREFIX_LEN {
                        break;
                    }

                    let len = usize::from(u16::from_be_bytes([self.staging[0], self.staging[1]]));
                    if len > MAX_PAYLOAD_LEN {
                        return Err(ProtocolError::FrameTooLarge { len, max: MAX_PAYLOAD_LEN });
                    }

                    self.staging.advance(LEN_PREFIX_LEN);
                    self.pending_len = Some(len);
                    len
                },
            };

            if self.staging.len() < len {
                // Wait for the next feed; never surface a partial frame.
                break;
            }

            let mut payload = self.staging.split_to(len);
            self.cipher.apply_next(&self.key, &mut payload);
            self.pending_len = None;

            if !payload.is_empty() {
                decoded.push(payload.freeze());
            }
        }

        Ok(decoded)
    }

    /// Keystream bytes consumed so far in this direction.
    #[must_use]
    pub fn stream_offset(&self) -> u64 {
        self.cipher.offset()
    }

    /// Bytes staged toward an incomplete frame.
    #[must_use]
    pub fn staged_len(&self) -> usize {
        self.staging.len()
    }
}
