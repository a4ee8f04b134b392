//! End-to-end scenario tests: device pump against a scripted remote peer.

use std::time::Instant;

use tvipt_core::{
    EndReason, IoPump, PumpStatus, Session, SessionConfig, SessionState, TransportError,
};
use tvipt_crypto::SecretKey;
use tvipt_harness::{End, SimConnect, SimLink, SimPeer, SimTerminal};

fn test_key() -> SecretKey {
    let mut bytes = [0u8; 32];
    for (i, byte) in bytes.iter_mut().enumerate() {
        *byte = i as u8;
    }
    SecretKey::from_bytes(bytes)
}

/// The canonical session scenario: connect, send "hello", peer observes
/// the decrypted text, a reply round-trips to the terminal byte for byte.
#[test]
fn connect_hello_reply_round_trip() {
    let key = test_key();
    let link = SimLink::new();
    let mut connector = SimConnect::to(&link);
    let now = Instant::now();

    let mut session =
        Session::connect(&mut connector, "10.0.0.5", 3333, None, &key, SessionConfig::default(), now)
            .unwrap();
    assert_eq!(session.state(), SessionState::Established);

    let mut peer = SimPeer::new(&key, link.socket(End::Host));
    let mut pump = IoPump::new();
    let mut term = SimTerminal::new();

    // Operator types "hello"; the peer sees it decrypted.
    term.type_bytes(b"hello");
    assert_eq!(pump.tick(now, &mut session, &mut term), PumpStatus::Active);

    let received = peer.recv().unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(&received[0][..], b"hello");

    // The wire carried ciphertext, not the plaintext.
    // (Re-encode through a fresh encoder to get the expected wire bytes.)
    let mut check = tvipt_proto::FrameEncoder::new(key.clone(), tvipt_proto::NONCE_DEVICE_TO_HOST);
    let wire = check.encode(b"hello").unwrap();
    assert_ne!(&wire[2..], b"hello");

    // Peer replies; the terminal output path gets it unchanged.
    peer.send(b"hello yourself\r\n").unwrap();
    pump.tick(now, &mut session, &mut term);
    assert_eq!(term.output(), b"hello yourself\r\n");
}

/// Full-duplex traffic interleaved across ticks with hostile chunking.
#[test]
fn duplex_conversation_survives_network_chunking() {
    let key = test_key();
    let link = SimLink::new();
    let mut connector = SimConnect::to(&link);
    let now = Instant::now();

    let mut session =
        Session::connect(&mut connector, "example.org", 3333, None, &key, SessionConfig::default(), now)
            .unwrap();
    let mut peer = SimPeer::new(&key, link.socket(End::Host));
    let mut pump = IoPump::new();
    let mut term = SimTerminal::new();

    // The network hands the device two bytes per read.
    link.set_read_chunk(End::Device, 2);

    let mut terminal_saw = Vec::new();
    for round in 0..5u8 {
        term.type_bytes(&[b'a' + round]);
        peer.send(&[b'A' + round, b'!']).unwrap();

        // A few ticks to let both directions drain at two bytes per read.
        for _ in 0..4 {
            assert_eq!(pump.tick(now, &mut session, &mut term), PumpStatus::Active);
        }
        terminal_saw.extend(term.take_output());
    }

    let device_sent: Vec<u8> =
        peer.recv().unwrap().iter().flat_map(|p| p.to_vec()).collect();
    assert_eq!(device_sent, b"abcde");
    assert_eq!(terminal_saw, b"A!B!C!D!E!");
}

/// A corrupted stream ends the session; the terminal gets nothing from the
/// poisoned tick and the device returns to command mode.
#[test]
fn poisoned_stream_reports_protocol_end() {
    let key = test_key();
    let link = SimLink::new();
    let mut connector = SimConnect::to(&link);
    let now = Instant::now();

    let mut session =
        Session::connect(&mut connector, "10.0.0.5", 3333, None, &key, SessionConfig::default(), now)
            .unwrap();
    let mut peer = SimPeer::new(&key, link.socket(End::Host));
    let mut pump = IoPump::new();
    let mut term = SimTerminal::new();

    // 0xFFFF length prefix: far beyond the frame bound.
    peer.send_raw(&[0xFF, 0xFF]).unwrap();

    let status = pump.tick(now, &mut session, &mut term);
    assert!(matches!(status, PumpStatus::Ended(EndReason::Protocol(_))));
    assert_eq!(session.state(), SessionState::Closed);
    assert!(term.output().is_empty());
}

/// Network loss mid-session: fatal, reported, device-level recovery is a
/// fresh connect.
#[test]
fn network_loss_then_fresh_session() {
    let key = test_key();
    let link = SimLink::new();
    let mut connector = SimConnect::to(&link);
    let now = Instant::now();

    let mut session =
        Session::connect(&mut connector, "10.0.0.5", 3333, None, &key, SessionConfig::default(), now)
            .unwrap();
    let mut pump = IoPump::new();
    let mut term = SimTerminal::new();

    link.fail_next_read(End::Device, TransportError::Io("connection reset".to_string()));
    let status = pump.tick(now, &mut session, &mut term);
    assert!(matches!(status, PumpStatus::Ended(EndReason::Transport(_))));

    // A new session is a new connection with fresh cipher state: the first
    // frame decrypts correctly at the peer again.
    let fresh_link = SimLink::new();
    let mut fresh_connector = SimConnect::to(&fresh_link);
    let mut fresh =
        Session::connect(&mut fresh_connector, "10.0.0.5", 3333, None, &key, SessionConfig::default(), now)
            .unwrap();
    let mut fresh_peer = SimPeer::new(&key, fresh_link.socket(End::Host));

    fresh.send(now, b"back again").unwrap();
    let received = fresh_peer.recv().unwrap();
    assert_eq!(&received[0][..], b"back again");
}
