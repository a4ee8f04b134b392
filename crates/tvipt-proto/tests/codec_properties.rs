//! Property-based tests for the streaming frame codec.
//!
//! Verifies the codec's contracts for ALL inputs, not just examples: any
//! plaintext round-trips under any chunking of the wire bytes, byte-at-a-time
//! delivery equals one-shot delivery, and the (nonce, offset) pair never
//! repeats within one direction.

use bytes::Bytes;
use proptest::prelude::*;
use tvipt_crypto::SecretKey;
use tvipt_proto::{FrameDecoder, FrameEncoder, MAX_PAYLOAD_LEN, NONCE_DEVICE_TO_HOST};

fn codec_pair() -> (FrameEncoder, FrameDecoder) {
    let key = SecretKey::from_bytes([0x42; 32]);
    (
        FrameEncoder::new(key.clone(), NONCE_DEVICE_TO_HOST),
        FrameDecoder::new(key, NONCE_DEVICE_TO_HOST),
    )
}

/// Strategy: a batch of payloads, sizes spanning empty through maximum.
fn arbitrary_payloads() -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(
        prop_oneof![
            prop::collection::vec(any::<u8>(), 0..32),
            prop::collection::vec(any::<u8>(), 32..512),
            Just(vec![0u8; MAX_PAYLOAD_LEN]),
        ],
        1..8,
    )
}

/// Split `wire` into `cuts`-determined chunks covering every byte once.
fn chunked(wire: &[u8], cuts: &[usize]) -> Vec<Vec<u8>> {
    let mut chunks = Vec::new();
    let mut rest = wire;

    for cut in cuts {
        if rest.is_empty() {
            break;
        }
        let take = (cut % rest.len()).max(1);
        let (head, tail) = rest.split_at(take);
        chunks.push(head.to_vec());
        rest = tail;
    }
    if !rest.is_empty() {
        chunks.push(rest.to_vec());
    }

    chunks
}

fn concat(payloads: &[Bytes]) -> Vec<u8> {
    payloads.iter().flat_map(|p| p.to_vec()).collect()
}

#[test]
fn prop_round_trip_under_arbitrary_chunking() {
    proptest!(|(
        payloads in arbitrary_payloads(),
        cuts in prop::collection::vec(1usize..4096, 0..32),
    )| {
        let (mut enc, mut dec) = codec_pair();

        let mut wire = Vec::new();
        let mut expected = Vec::new();
        for payload in &payloads {
            wire.extend_from_slice(&enc.encode(payload).expect("payload within bound"));
            expected.extend_from_slice(payload);
        }

        let mut decoded = Vec::new();
        for chunk in chunked(&wire, &cuts) {
            decoded.extend(dec.feed(&chunk).expect("valid stream"));
        }

        // PROPERTY: decoded payloads concatenate back to exactly the
        // original plaintext regardless of chunk boundaries.
        prop_assert_eq!(concat(&decoded), expected);
    });
}

#[test]
fn prop_byte_at_a_time_equals_one_shot() {
    proptest!(|(payloads in arbitrary_payloads())| {
        let (mut enc, mut dec_bytes) = codec_pair();
        let (_, mut dec_oneshot) = codec_pair();

        let mut wire = Vec::new();
        for payload in &payloads {
            wire.extend_from_slice(&enc.encode(payload).expect("payload within bound"));
        }

        let mut trickled = Vec::new();
        for byte in &wire {
            trickled.extend(dec_bytes.feed(std::slice::from_ref(byte)).expect("valid stream"));
        }

        let oneshot = dec_oneshot.feed(&wire).expect("valid stream");

        // PROPERTY: delivery granularity is invisible to the decoder.
        prop_assert_eq!(trickled.len(), oneshot.len());
        prop_assert_eq!(concat(&trickled), concat(&oneshot));
    });
}

#[test]
fn prop_keystream_offsets_never_overlap() {
    proptest!(|(payloads in arbitrary_payloads())| {
        let (mut enc, _) = codec_pair();

        let mut consumed = 0u64;
        for payload in &payloads {
            let before = enc.stream_offset();
            enc.encode(payload).expect("payload within bound");

            // PROPERTY: each frame draws keystream exactly [before,
            // before + len) under a fixed nonce; ranges are disjoint and
            // strictly increasing, so no (nonce, offset) pair repeats.
            prop_assert_eq!(before, consumed);
            consumed += payload.len() as u64;
            prop_assert_eq!(enc.stream_offset(), consumed);
        }
    });
}

#[test]
fn prop_decoder_emits_nothing_until_frame_completes() {
    proptest!(|(payload in prop::collection::vec(any::<u8>(), 1..256usize))| {
        let (mut enc, mut dec) = codec_pair();
        let wire = enc.encode(&payload).expect("payload within bound");

        // PROPERTY: every strict prefix of the frame yields no payload.
        for end in 1..wire.len() {
            let mut fresh = {
                let key = SecretKey::from_bytes([0x42; 32]);
                FrameDecoder::new(key, NONCE_DEVICE_TO_HOST)
            };
            let decoded = fresh.feed(&wire[..end]).expect("valid stream");
            prop_assert!(decoded.is_empty());
        }

        let decoded = dec.feed(&wire).expect("valid stream");
        prop_assert_eq!(&decoded[0][..], &payload[..]);
    });
}
