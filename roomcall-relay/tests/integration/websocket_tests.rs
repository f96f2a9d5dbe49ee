use anyhow::{Context, Result, bail};
use roomcall_core::{PeerId, RelayMessage, RoomId, SignalEnvelope, SignalPayload};
use roomcall_relay::{RelayHub, router};
use roomcall_session::{RelayChannel, RelayEvent, WsRelayChannel};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;

use crate::integration::init_tracing;
use crate::utils::RELAY_TIMEOUT_MS;

async fn spawn_relay(capacity: usize) -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = router(RelayHub::new(capacity));

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok(format!("ws://{addr}/ws"))
}

async fn next_event(rx: &mut mpsc::Receiver<RelayEvent>) -> Result<RelayEvent> {
    timeout(Duration::from_millis(RELAY_TIMEOUT_MS), rx.recv())
        .await
        .context("Timed out waiting for relay event")?
        .context("Relay event stream ended")
}

async fn connect(url: &str) -> Result<(WsRelayChannel, mpsc::Receiver<RelayEvent>, PeerId)> {
    let (channel, mut events) = WsRelayChannel::connect(url).await?;
    match next_event(&mut events).await? {
        RelayEvent::Connected(peer) => Ok((channel, events, peer)),
        other => bail!("expected connected, got {:?}", other),
    }
}

#[tokio::test]
async fn test_two_clients_meet_and_exchange_signals() {
    init_tracing();

    let url = spawn_relay(2).await.unwrap();
    let (alice, mut alice_events, alice_id) = connect(&url).await.unwrap();
    let (bob, mut bob_events, bob_id) = connect(&url).await.unwrap();
    assert_ne!(alice_id, bob_id);

    let lobby = RoomId::parse("lobby").unwrap();
    alice
        .emit(RelayMessage::JoinRoom { room: lobby.clone() })
        .await
        .unwrap();
    // Give the first join a head start so the arrival order is fixed.
    tokio::time::sleep(Duration::from_millis(50)).await;
    bob.emit(RelayMessage::JoinRoom { room: lobby }).await.unwrap();

    assert_eq!(
        next_event(&mut alice_events).await.unwrap(),
        RelayEvent::UserConnected(bob_id.clone())
    );

    alice
        .emit(RelayMessage::Signal(SignalEnvelope::new(
            bob_id.clone(),
            PeerId::default(),
            SignalPayload::Offer {
                sdp: "v=0 offer".into(),
            },
        )))
        .await
        .unwrap();

    match next_event(&mut bob_events).await.unwrap() {
        RelayEvent::Signal(envelope) => {
            assert_eq!(envelope.from, alice_id);
            assert!(matches!(envelope.payload, SignalPayload::Offer { .. }));
        }
        other => panic!("expected signal, got {other:?}"),
    }

    bob.disconnect().await;
    assert_eq!(
        next_event(&mut alice_events).await.unwrap(),
        RelayEvent::UserDisconnected(bob_id)
    );
}

#[tokio::test]
async fn test_connect_to_missing_relay_fails() {
    init_tracing();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = WsRelayChannel::connect(&format!("ws://{addr}/ws")).await;
    assert!(result.is_err());
}
