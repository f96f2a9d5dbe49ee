use roomcall_core::{RelayMessage, RoomId};
use roomcall_relay::RelayHub;

use crate::integration::init_tracing;
use crate::utils::TestPeer;

#[tokio::test]
async fn test_second_joiner_is_announced_to_first() {
    init_tracing();

    let hub = RelayHub::new(2);
    let mut alice = TestPeer::join(&hub, "lobby").await.unwrap();
    let mut bob = TestPeer::join(&hub, "lobby").await.unwrap();

    match alice.next().await.unwrap() {
        RelayMessage::UserConnected { peer } => assert_eq!(peer, bob.id),
        other => panic!("expected user-connected, got {other:?}"),
    }
    // The joiner itself is not told about anyone.
    bob.assert_idle();

    let room = RoomId::parse("lobby").unwrap();
    assert_eq!(hub.room_members(&room), vec![alice.id.clone(), bob.id.clone()]);
}

#[tokio::test]
async fn test_third_participant_gets_room_full() {
    init_tracing();

    let hub = RelayHub::new(2);
    let mut alice = TestPeer::join(&hub, "lobby").await.unwrap();
    let _bob = TestPeer::join(&hub, "lobby").await.unwrap();
    alice.next().await.unwrap();

    let mut carol = TestPeer::join(&hub, "lobby").await.unwrap();
    match carol.next().await.unwrap() {
        RelayMessage::RoomFull { room } => assert_eq!(room.as_str(), "lobby"),
        other => panic!("expected room-full, got {other:?}"),
    }
    alice.assert_idle();
    assert_eq!(hub.room_members(&RoomId::parse("lobby").unwrap()).len(), 2);
}

#[tokio::test]
async fn test_leaving_notifies_remaining_member() {
    init_tracing();

    let hub = RelayHub::new(2);
    let mut alice = TestPeer::join(&hub, "lobby").await.unwrap();
    let bob = TestPeer::join(&hub, "lobby").await.unwrap();
    alice.next().await.unwrap();

    hub.leave(&bob.id);

    match alice.next().await.unwrap() {
        RelayMessage::UserDisconnected { peer } => assert_eq!(peer, bob.id),
        other => panic!("expected user-disconnected, got {other:?}"),
    }
    assert_eq!(hub.peer_count(), 1);

    // The freed seat can be taken again.
    let _carol = TestPeer::join(&hub, "lobby").await.unwrap();
    assert!(matches!(
        alice.next().await.unwrap(),
        RelayMessage::UserConnected { .. }
    ));
}

#[tokio::test]
async fn test_switching_rooms_leaves_the_old_one() {
    init_tracing();

    let hub = RelayHub::new(2);
    let mut alice = TestPeer::join(&hub, "lobby").await.unwrap();
    let bob = TestPeer::join(&hub, "lobby").await.unwrap();
    alice.next().await.unwrap();

    hub.join(&bob.id, RoomId::parse("garden").unwrap());

    match alice.next().await.unwrap() {
        RelayMessage::UserDisconnected { peer } => assert_eq!(peer, bob.id),
        other => panic!("expected user-disconnected, got {other:?}"),
    }
    assert_eq!(
        hub.room_members(&RoomId::parse("garden").unwrap()),
        vec![bob.id.clone()]
    );

    // Re-joining the current room is a no-op.
    hub.join(&alice.id, RoomId::parse("lobby").unwrap());
    alice.assert_idle();
}

#[tokio::test]
async fn test_relay_only_messages_from_clients_are_refused() {
    init_tracing();

    let hub = RelayHub::new(2);
    let mut alice = TestPeer::register(&hub).await.unwrap();

    hub.handle_message(
        &alice.id,
        RelayMessage::UserConnected {
            peer: alice.id.clone(),
        },
    );
    assert!(matches!(
        alice.next().await.unwrap(),
        RelayMessage::Error { .. }
    ));
}
