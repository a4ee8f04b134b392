//! Session state machine tests against the simulated link.

use std::time::{Duration, Instant};

use tvipt_core::{
    ConnectError, Session, SessionConfig, SessionError, SessionState, TransportError,
};
use tvipt_crypto::SecretKey;
use tvipt_harness::{End, SimConnect, SimLink, SimPeer};
use tvipt_proto::{MAX_PAYLOAD_LEN, ProtocolError};

fn test_key() -> SecretKey {
    SecretKey::from_bytes([0x11; 32])
}

fn established(link: &SimLink) -> (Session<tvipt_harness::SimSocket>, SimPeer, Instant) {
    let key = test_key();
    let mut connector = SimConnect::to(link);
    let now = Instant::now();

    let session =
        Session::connect(&mut connector, "10.0.0.5", 3333, None, &key, SessionConfig::default(), now)
            .unwrap();
    let peer = SimPeer::new(&key, link.socket(End::Host));

    (session, peer, now)
}

#[test]
fn connect_failure_is_local_and_stateless() {
    let mut connector = SimConnect::refusing("connection refused");

    let result = Session::connect(
        &mut connector,
        "10.0.0.5",
        3333,
        None,
        &test_key(),
        SessionConfig::default(),
        Instant::now(),
    );

    assert!(matches!(result, Err(ConnectError::Failed(_))));
}

#[test]
fn sent_plaintext_reaches_peer_decrypted() {
    let link = SimLink::new();
    let (mut session, mut peer, now) = established(&link);

    session.send(now, b"hello").unwrap();

    let received = peer.recv().unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(&received[0][..], b"hello");
}

#[test]
fn peer_reply_surfaces_in_receipt_order() {
    let link = SimLink::new();
    let (mut session, mut peer, now) = established(&link);

    peer.send(b"first").unwrap();
    peer.send(b"second").unwrap();

    let mut inbound = Vec::new();
    session.service(now, &mut inbound).unwrap();

    let flat: Vec<u8> = inbound.iter().flat_map(|p| p.to_vec()).collect();
    assert_eq!(flat, b"firstsecond");
}

#[test]
fn reply_survives_byte_at_a_time_delivery() {
    let link = SimLink::new();
    let (mut session, mut peer, now) = established(&link);

    link.set_read_chunk(End::Device, 1);
    peer.send(b"trickle").unwrap();

    // 9 wire bytes at 1 byte per read, 8 reads per tick: two ticks.
    let mut inbound = Vec::new();
    session.service(now, &mut inbound).unwrap();
    session.service(now, &mut inbound).unwrap();

    assert_eq!(inbound.len(), 1);
    assert_eq!(&inbound[0][..], b"trickle");
}

#[test]
fn back_pressure_retains_wire_bytes_and_flushes_later() {
    let link = SimLink::new();
    let (mut session, mut peer, now) = established(&link);

    // Socket accepts 3 of the 7 wire bytes this tick.
    link.set_write_quota(End::Device, 3);
    session.send(now, b"hello").unwrap();

    assert!(!session.can_send());
    assert!(peer.recv().unwrap().is_empty());

    // Next tick the socket drained; the frame completes, never torn.
    link.set_write_quota(End::Device, usize::MAX);
    let mut inbound = Vec::new();
    session.service(now, &mut inbound).unwrap();

    assert!(session.can_send());
    let received = peer.recv().unwrap();
    assert_eq!(&received[0][..], b"hello");
}

#[test]
fn oversized_length_prefix_tears_down_with_nothing_delivered() {
    let link = SimLink::new();
    let (mut session, mut peer, now) = established(&link);

    let bad_len = (MAX_PAYLOAD_LEN + 1) as u16;
    peer.send_raw(&bad_len.to_be_bytes()).unwrap();

    let mut inbound = Vec::new();
    let err = session.service(now, &mut inbound).unwrap_err();

    assert!(matches!(err, SessionError::Protocol(ProtocolError::FrameTooLarge { .. })));
    assert_eq!(session.state(), SessionState::Closed);
    assert!(inbound.is_empty());
}

#[test]
fn payloads_decoded_in_a_failing_tick_are_discarded() {
    let link = SimLink::new();
    let (mut session, mut peer, now) = established(&link);

    // A good frame immediately followed by a poisoned prefix, delivered in
    // one tick.
    peer.send(b"good").unwrap();
    let bad_len = (MAX_PAYLOAD_LEN + 1) as u16;
    peer.send_raw(&bad_len.to_be_bytes()).unwrap();

    let mut inbound = Vec::new();
    assert!(session.service(now, &mut inbound).is_err());

    assert!(inbound.is_empty());
    assert_eq!(session.state(), SessionState::Closed);
}

#[test]
fn remote_close_ends_the_session() {
    let link = SimLink::new();
    let (mut session, mut peer, now) = established(&link);

    peer.send(b"parting").unwrap();
    peer.close();

    // Pending data then the close, all within one tick.
    let mut inbound = Vec::new();
    let err = session.service(now, &mut inbound).unwrap_err();

    assert_eq!(err, SessionError::Transport(TransportError::Closed));
    assert_eq!(session.state(), SessionState::Closed);
    assert!(inbound.is_empty());
}

#[test]
fn io_error_mid_session_is_fatal() {
    let link = SimLink::new();
    let (mut session, _peer, now) = established(&link);

    link.fail_next_read(End::Device, TransportError::Io("connection reset".to_string()));

    let mut inbound = Vec::new();
    let err = session.service(now, &mut inbound).unwrap_err();

    assert!(matches!(err, SessionError::Transport(TransportError::Io(_))));
    assert_eq!(session.state(), SessionState::Closed);
}

#[test]
fn keepalive_fires_after_tx_idle_interval() {
    let link = SimLink::new();
    let key = test_key();
    let mut connector = SimConnect::to(&link);
    let t0 = Instant::now();
    let config = SessionConfig { keepalive_interval: Some(Duration::from_secs(5)) };

    let mut session = Session::connect(&mut connector, "10.0.0.5", 3333, None, &key, config, t0).unwrap();
    let mut peer = SimPeer::new(&key, link.socket(End::Host));

    let mut inbound = Vec::new();

    // Not yet idle long enough.
    session.service(t0 + Duration::from_secs(4), &mut inbound).unwrap();
    assert_eq!(link.queued_for(End::Host), 0);

    // Past the interval: one zero-length frame, invisible to the decoder.
    session.service(t0 + Duration::from_secs(6), &mut inbound).unwrap();
    assert_eq!(link.queued_for(End::Host), 2);
    assert!(peer.recv().unwrap().is_empty());

    // The keepalive reset the idle clock; nothing new immediately after.
    session.service(t0 + Duration::from_secs(7), &mut inbound).unwrap();
    assert_eq!(link.queued_for(End::Host), 0);
}

#[test]
fn close_is_idempotent_and_discards_backlog() {
    let link = SimLink::new();
    let (mut session, _peer, now) = established(&link);

    link.set_write_quota(End::Device, 0);
    session.send(now, b"stuck").unwrap();
    assert!(!session.can_send());

    session.close();
    assert_eq!(session.state(), SessionState::Closed);
    session.close();
    assert_eq!(session.state(), SessionState::Closed);

    // Nothing leaks out after teardown.
    link.set_write_quota(End::Device, usize::MAX);
    let mut inbound = Vec::new();
    session.service(now, &mut inbound).unwrap();
    assert_eq!(link.queued_for(End::Host), 0);
}

#[test]
fn peer_target_is_recorded() {
    let link = SimLink::new();
    let (session, _peer, _now) = established(&link);

    assert_eq!(session.peer(), ("10.0.0.5", 3333));
    assert_eq!(session.state(), SessionState::Established);
}
