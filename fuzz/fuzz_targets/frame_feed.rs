//! Fuzz target for the streaming decoder.
//!
//! Feeds arbitrary bytes to `FrameDecoder::feed` to find:
//! - Parser crashes or panics
//! - Integer overflows in length handling
//! - Staging buffer over-reads
//!
//! The decoder should NEVER panic. Oversized prefixes must return an error;
//! everything else either decodes or waits for more input.

#![no_main]

use libfuzzer_sys::fuzz_target;
use tvipt_crypto::SecretKey;
use tvipt_proto::{FrameDecoder, NONCE_HOST_TO_DEVICE};

fuzz_target!(|data: &[u8]| {
    let mut decoder = FrameDecoder::new(SecretKey::from_bytes([7; 32]), NONCE_HOST_TO_DEVICE);

    // Arbitrary bytes either decode, wait, or error. Never panic.
    let _ = decoder.feed(data);
});
