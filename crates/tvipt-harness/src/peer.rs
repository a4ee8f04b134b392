//! Scripted remote end of the tvipt protocol.
//!
//! Holds the host side of a [`SimLink`](crate::SimLink) with mirrored
//! codecs: it decodes what the device encrypted and encrypts replies the
//! device can decode. Tests use it to assert on decrypted plaintext and to
//! inject inbound traffic, including hostile wire bytes.

use bytes::Bytes;
use thiserror::Error;
use tvipt_core::{Transport, TransportError};
use tvipt_crypto::SecretKey;
use tvipt_proto::{
    FrameDecoder, FrameEncoder, NONCE_DEVICE_TO_HOST, NONCE_HOST_TO_DEVICE, ProtocolError,
};

use crate::sim_link::SimSocket;

/// Remote-peer failure while stepping the simulation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PeerError {
    /// The device end produced an undecodable stream.
    #[error("peer protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The simulated socket failed.
    #[error("peer transport error: {0}")]
    Transport(#[from] TransportError),

    /// The link stopped accepting the peer's write.
    #[error("peer write stalled")]
    WriteStalled,
}

/// The host side of a simulated session.
#[derive(Debug)]
pub struct SimPeer {
    socket: SimSocket,
    encoder: FrameEncoder,
    decoder: FrameDecoder,
}

impl SimPeer {
    /// Peer speaking with the same pre-shared key over `socket`.
    ///
    /// Directions mirror the device: the peer encodes host-to-device and
    /// decodes device-to-host.
    #[must_use]
    pub fn new(key: &SecretKey, socket: SimSocket) -> Self {
        Self {
            socket,
            encoder: FrameEncoder::new(key.clone(), NONCE_HOST_TO_DEVICE),
            decoder: FrameDecoder::new(key.clone(), NONCE_DEVICE_TO_HOST),
        }
    }

    /// Drain the socket and decode every completed frame.
    ///
    /// # Errors
    ///
    /// - [`PeerError::Protocol`] if the device stream is malformed
    /// - [`PeerError::Transport`] on simulated socket failure
    pub fn recv(&mut self) -> Result<Vec<Bytes>, PeerError> {
        let mut decoded = Vec::new();
        let mut buf = [0u8; 512];

        loop {
            match self.socket.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => decoded.extend(self.decoder.feed(&buf[..n])?),
                Err(TransportError::Closed) => break,
                Err(err) => return Err(err.into()),
            }
        }

        Ok(decoded)
    }

    /// Encrypt `plaintext` as one frame and push it onto the link.
    ///
    /// # Errors
    ///
    /// - [`PeerError::Protocol`] if `plaintext` exceeds one frame
    /// - [`PeerError::WriteStalled`] if the link accepts nothing
    pub fn send(&mut self, plaintext: &[u8]) -> Result<(), PeerError> {
        let frame = self.encoder.encode(plaintext)?;
        self.send_raw(&frame)
    }

    /// Push raw wire bytes, bypassing the codec. For hostile-input tests:
    /// corrupted prefixes, oversized lengths, torn frames.
    ///
    /// # Errors
    ///
    /// - [`PeerError::Transport`] on simulated socket failure
    /// - [`PeerError::WriteStalled`] if the link accepts nothing
    pub fn send_raw(&mut self, wire: &[u8]) -> Result<(), PeerError> {
        let mut written = 0;
        while written < wire.len() {
            let n = self.socket.write(&wire[written..])?;
            if n == 0 {
                return Err(PeerError::WriteStalled);
            }
            written += n;
        }
        Ok(())
    }

    /// Close the peer's end of the link.
    pub fn close(&mut self) {
        self.socket.close();
    }
}
