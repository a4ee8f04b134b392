//! Fuzz target for the full encode/feed pipeline.
//!
//! Encodes arbitrary payload batches, then delivers the wire bytes in
//! arbitrary-sized chunks. Whatever the chunking, the decoded payloads must
//! concatenate back to exactly the encoded plaintext.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tvipt_crypto::SecretKey;
use tvipt_proto::{FrameDecoder, FrameEncoder, MAX_PAYLOAD_LEN, NONCE_DEVICE_TO_HOST};

#[derive(Arbitrary, Debug)]
struct Plan {
    payloads: Vec<Vec<u8>>,
    cuts: Vec<u8>,
}

fuzz_target!(|plan: Plan| {
    let key = SecretKey::from_bytes([7; 32]);
    let mut encoder = FrameEncoder::new(key.clone(), NONCE_DEVICE_TO_HOST);
    let mut decoder = FrameDecoder::new(key, NONCE_DEVICE_TO_HOST);

    let mut wire = Vec::new();
    let mut expected = Vec::new();
    for payload in &plan.payloads {
        if payload.len() > MAX_PAYLOAD_LEN {
            continue;
        }
        wire.extend_from_slice(&encoder.encode(payload).expect("payload within bound"));
        expected.extend_from_slice(payload);
    }

    let mut decoded = Vec::new();
    let mut rest = wire.as_slice();
    for cut in &plan.cuts {
        if rest.is_empty() {
            break;
        }
        let take = (usize::from(*cut) % rest.len()).max(1);
        let (head, tail) = rest.split_at(take);
        decoded.extend(decoder.feed(head).expect("valid stream"));
        rest = tail;
    }
    decoded.extend(decoder.feed(rest).expect("valid stream"));

    let flat: Vec<u8> = decoded.iter().flat_map(|payload| payload.to_vec()).collect();
    assert_eq!(flat, expected);
});
