use roomcall_core::{PeerId, SdpType, SignalPayload};
use roomcall_session::{RelayEvent, SessionError, SessionEvent, SessionState, TrackKind};

use crate::integration::{
    TestSession, create_test_session, create_unassigned_test_session, init_tracing,
};
use crate::utils::{expect_no_signal, wait_for_event, wait_for_signal, wait_until};

/// Moves the next signal `from` relays into `to`, stamped the way the relay
/// stamps it.
async fn relay_next_signal(from: &mut TestSession, to: &TestSession) -> SignalPayload {
    let envelope = wait_for_signal(&mut from.emitted)
        .await
        .expect("no signal relayed");
    assert_eq!(envelope.to, to.peer, "signal addressed to the wrong peer");
    assert_eq!(envelope.from, from.peer, "signal not stamped with sender");

    let payload = envelope.payload.clone();
    to.deliver(RelayEvent::Signal(envelope)).await;
    payload
}

#[tokio::test]
async fn test_peer_joined_sends_exactly_one_offer() {
    init_tracing();

    let mut alice = create_test_session("alice").await;
    alice.join("lobby").await;

    let bob = PeerId::from("bob");
    alice.deliver(RelayEvent::UserConnected(bob.clone())).await;

    let offer = wait_for_signal(&mut alice.emitted).await.unwrap();
    assert_eq!(offer.to, bob);
    assert_eq!(offer.from, alice.peer);
    assert!(matches!(offer.payload, SignalPayload::Offer { .. }));
    assert_eq!(alice.handle.state(), SessionState::Negotiating);

    // A repeated arrival notification must not restart negotiation.
    alice.deliver(RelayEvent::UserConnected(bob.clone())).await;
    expect_no_signal(&mut alice.emitted).await.unwrap();
    assert_eq!(alice.agent().with_state(|s| s.offers_created), 1);
}

#[tokio::test]
async fn test_two_sessions_negotiate_to_connected() {
    init_tracing();

    let mut alice = create_test_session("alice").await;
    let mut bob = create_test_session("bob").await;
    alice.join("lobby").await;
    bob.join("lobby").await;

    // The relay tells the earlier participant about the newcomer.
    alice.deliver(RelayEvent::UserConnected(bob.peer.clone())).await;

    let offer = relay_next_signal(&mut alice, &bob).await;
    assert!(matches!(offer, SignalPayload::Offer { .. }));

    let answer = relay_next_signal(&mut bob, &alice).await;
    assert!(matches!(answer, SignalPayload::Answer { .. }));

    let alice_handle = alice.handle.clone();
    wait_until("alice connected", || {
        alice_handle.state() == SessionState::Connected
    })
    .await
    .unwrap();
    assert_eq!(bob.handle.state(), SessionState::Connected);

    let alice_agent = alice.agent();
    let bob_agent = bob.agent();
    assert_eq!(alice_agent.remote_description_count(), 1);
    assert_eq!(bob_agent.remote_description_count(), 1);
    assert_eq!(
        alice_agent.with_state(|s| s.remote_descriptions[0].kind),
        SdpType::Answer
    );
    assert_eq!(
        bob_agent.with_state(|s| s.remote_descriptions[0].kind),
        SdpType::Offer
    );

    // Remote media surfaces once the agent reports it.
    bob_agent.emit_remote_track(TrackKind::Video).await;
    let event = wait_for_event(&mut bob.events, |e| matches!(e, SessionEvent::RemoteTrack(_)))
        .await
        .unwrap();
    assert!(matches!(event, SessionEvent::RemoteTrack(t) if t.kind == TrackKind::Video));
}

#[tokio::test]
async fn test_duplicate_offer_is_applied_once() {
    init_tracing();

    let mut bob = create_test_session("bob").await;
    bob.join("lobby").await;

    let alice = PeerId::from("alice");
    let offer = SignalPayload::Offer {
        sdp: "offer-alice-1".into(),
    };
    bob.deliver_signal(&alice, offer.clone()).await;
    bob.deliver_signal(&alice, offer).await;

    let answer = wait_for_signal(&mut bob.emitted).await.unwrap();
    assert_eq!(answer.to, alice);
    assert!(matches!(answer.payload, SignalPayload::Answer { .. }));
    expect_no_signal(&mut bob.emitted).await.unwrap();

    let agent = bob.agent();
    assert_eq!(agent.remote_description_count(), 1);
    assert_eq!(agent.with_state(|s| s.answers_created), 1);
}

#[tokio::test]
async fn test_answer_without_outstanding_offer_is_discarded() {
    init_tracing();

    let mut bob = create_test_session("bob").await;
    bob.join("lobby").await;

    let alice = PeerId::from("alice");
    bob.deliver_signal(
        &alice,
        SignalPayload::Answer {
            sdp: "answer-alice-1".into(),
        },
    )
    .await;

    // Anything after it is processed after it.
    bob.deliver_signal(
        &alice,
        SignalPayload::Offer {
            sdp: "offer-alice-1".into(),
        },
    )
    .await;
    wait_for_signal(&mut bob.emitted).await.unwrap();

    let agent = bob.agent();
    assert_eq!(agent.remote_description_count(), 1);
    assert_eq!(
        agent.with_state(|s| s.remote_descriptions[0].kind),
        SdpType::Offer
    );

    // A late answer after the exchange completed is discarded as well.
    bob.deliver_signal(
        &alice,
        SignalPayload::Answer {
            sdp: "answer-alice-2".into(),
        },
    )
    .await;
    expect_no_signal(&mut bob.emitted).await.unwrap();
    assert_eq!(agent.remote_description_count(), 1);
    assert_eq!(bob.handle.state(), SessionState::Connected);
}

#[tokio::test]
async fn test_rejected_offer_is_recoverable() {
    init_tracing();

    let mut bob = create_test_session("bob").await;
    bob.join("lobby").await;

    let alice = PeerId::from("alice");
    bob.deliver_signal(
        &alice,
        SignalPayload::Offer {
            sdp: "malformed".into(),
        },
    )
    .await;

    let event = wait_for_event(&mut bob.events, |e| matches!(e, SessionEvent::Recoverable(_)))
        .await
        .unwrap();
    assert!(matches!(
        event,
        SessionEvent::Recoverable(SessionError::Description(_))
    ));
    expect_no_signal(&mut bob.emitted).await.unwrap();

    // The session keeps its agent, media and state; a good offer still completes.
    assert!(!bob.agent().is_closed());
    assert_eq!(bob.handle.state(), SessionState::AwaitingPeer);

    bob.deliver_signal(
        &alice,
        SignalPayload::Offer {
            sdp: "offer-alice-2".into(),
        },
    )
    .await;
    let answer = wait_for_signal(&mut bob.emitted).await.unwrap();
    assert!(matches!(answer.payload, SignalPayload::Answer { .. }));
    assert_eq!(bob.handle.state(), SessionState::Connected);
}

#[tokio::test]
async fn test_rejected_renegotiation_keeps_call_connected() {
    init_tracing();

    let mut bob = create_test_session("bob").await;
    bob.join("lobby").await;

    let alice = PeerId::from("alice");
    bob.deliver_signal(
        &alice,
        SignalPayload::Offer {
            sdp: "offer-alice-1".into(),
        },
    )
    .await;
    wait_for_signal(&mut bob.emitted).await.unwrap();
    assert_eq!(bob.handle.state(), SessionState::Connected);

    bob.deliver_signal(
        &alice,
        SignalPayload::Offer {
            sdp: "malformed-2".into(),
        },
    )
    .await;
    wait_for_event(&mut bob.events, |e| matches!(e, SessionEvent::Recoverable(_)))
        .await
        .unwrap();
    expect_no_signal(&mut bob.emitted).await.unwrap();

    assert_eq!(bob.handle.state(), SessionState::Connected);
    assert_eq!(bob.agent().remote_description_count(), 1);
}

#[tokio::test]
async fn test_glare_lower_peer_keeps_its_offer() {
    init_tracing();

    let mut alice = create_test_session("alice").await;
    alice.join("lobby").await;

    let bob = PeerId::from("bob");
    alice.deliver(RelayEvent::UserConnected(bob.clone())).await;
    wait_for_signal(&mut alice.emitted).await.unwrap();

    alice
        .deliver_signal(
            &bob,
            SignalPayload::Offer {
                sdp: "offer-bob-1".into(),
            },
        )
        .await;
    expect_no_signal(&mut alice.emitted).await.unwrap();
    assert_eq!(alice.agent().remote_description_count(), 0);

    // Its own offer is still answerable.
    alice
        .deliver_signal(
            &bob,
            SignalPayload::Answer {
                sdp: "answer-bob-1".into(),
            },
        )
        .await;
    let handle = alice.handle.clone();
    wait_until("alice connected", || handle.state() == SessionState::Connected)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_glare_higher_peer_answers() {
    init_tracing();

    let mut bob = create_test_session("bob").await;
    bob.join("lobby").await;

    let alice = PeerId::from("alice");
    bob.deliver(RelayEvent::UserConnected(alice.clone())).await;
    let own_offer = wait_for_signal(&mut bob.emitted).await.unwrap();
    assert!(matches!(own_offer.payload, SignalPayload::Offer { .. }));

    bob.deliver_signal(
        &alice,
        SignalPayload::Offer {
            sdp: "offer-alice-1".into(),
        },
    )
    .await;
    let answer = wait_for_signal(&mut bob.emitted).await.unwrap();
    assert_eq!(answer.to, alice);
    assert!(matches!(answer.payload, SignalPayload::Answer { .. }));
    assert_eq!(bob.handle.state(), SessionState::Connected);

    // The abandoned offer's answer no longer applies.
    bob.deliver_signal(
        &alice,
        SignalPayload::Answer {
            sdp: "answer-alice-1".into(),
        },
    )
    .await;
    expect_no_signal(&mut bob.emitted).await.unwrap();
    assert_eq!(bob.agent().remote_description_count(), 1);
}

#[tokio::test]
async fn test_glare_before_id_assignment_answers() {
    init_tracing();

    // The unassigned id sorts below every assigned one.
    let mut anon = create_unassigned_test_session("anon").await;
    anon.join("lobby").await;

    let zed = PeerId::from("zed");
    anon.deliver(RelayEvent::UserConnected(zed.clone())).await;
    let own_offer = wait_for_signal(&mut anon.emitted).await.unwrap();
    assert!(!own_offer.from.is_assigned());

    anon.deliver_signal(
        &zed,
        SignalPayload::Offer {
            sdp: "offer-zed-1".into(),
        },
    )
    .await;
    let answer = wait_for_signal(&mut anon.emitted).await.unwrap();
    assert_eq!(answer.to, zed);
    assert!(matches!(answer.payload, SignalPayload::Answer { .. }));
    assert_eq!(anon.handle.state(), SessionState::Connected);
}

#[tokio::test]
async fn test_signal_from_other_peer_is_ignored() {
    init_tracing();

    let mut bob = create_test_session("bob").await;
    bob.join("lobby").await;

    let alice = PeerId::from("alice");
    bob.deliver_signal(
        &alice,
        SignalPayload::Offer {
            sdp: "offer-alice-1".into(),
        },
    )
    .await;
    wait_for_signal(&mut bob.emitted).await.unwrap();

    let carol = PeerId::from("carol");
    bob.deliver_signal(
        &carol,
        SignalPayload::Offer {
            sdp: "offer-carol-1".into(),
        },
    )
    .await;
    expect_no_signal(&mut bob.emitted).await.unwrap();
    assert_eq!(bob.agent().remote_description_count(), 1);
}

#[tokio::test]
async fn test_remote_peer_leaving_is_reported() {
    init_tracing();

    let mut alice = create_test_session("alice").await;
    alice.join("lobby").await;

    let bob = PeerId::from("bob");
    alice.deliver(RelayEvent::UserConnected(bob.clone())).await;
    wait_for_signal(&mut alice.emitted).await.unwrap();

    // Someone we never talked to leaving is not news.
    alice
        .deliver(RelayEvent::UserDisconnected(PeerId::from("carol")))
        .await;
    alice.deliver(RelayEvent::UserDisconnected(bob.clone())).await;

    let event = wait_for_event(&mut alice.events, |e| {
        matches!(e, SessionEvent::PeerLeft(_))
    })
    .await
    .unwrap();
    assert!(matches!(event, SessionEvent::PeerLeft(peer) if peer == bob));
    assert_ne!(alice.handle.state(), SessionState::Ended);
}
