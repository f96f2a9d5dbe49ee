use anyhow::{Context, Result, bail};
use roomcall_core::{PeerId, RelayMessage, RoomId, SignalEnvelope, SignalPayload};
use roomcall_relay::RelayHub;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

/// Timeout for a relayed message to arrive (ms).
pub const RELAY_TIMEOUT_MS: u64 = 2000;

/// A hub connection without a socket: whatever the hub sends lands in `rx`.
pub struct TestPeer {
    pub id: PeerId,
    rx: mpsc::UnboundedReceiver<RelayMessage>,
}

impl TestPeer {
    /// Registers with the hub and consumes the `connected` greeting.
    pub async fn register(hub: &RelayHub) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = hub.register(tx);
        let mut peer = Self { id, rx };

        match peer.next().await? {
            RelayMessage::Connected { peer: assigned } if assigned == peer.id => Ok(peer),
            other => bail!("expected connected greeting, got {:?}", other),
        }
    }

    pub async fn join(hub: &RelayHub, room: &str) -> Result<Self> {
        let peer = Self::register(hub).await?;
        hub.join(&peer.id, RoomId::parse(room)?);
        Ok(peer)
    }

    pub async fn next(&mut self) -> Result<RelayMessage> {
        timeout(Duration::from_millis(RELAY_TIMEOUT_MS), self.rx.recv())
            .await
            .context("Timed out waiting for relay message")?
            .context("Hub dropped the outbound channel")
    }

    pub async fn next_signal(&mut self) -> Result<SignalEnvelope> {
        match self.next().await? {
            RelayMessage::Signal(envelope) => Ok(envelope),
            other => bail!("expected a signal, got {:?}", other),
        }
    }

    /// Nothing may be queued for this peer.
    pub fn assert_idle(&mut self) {
        if let Ok(msg) = self.rx.try_recv() {
            panic!("peer {} got unexpected {:?}", self.id, msg);
        }
    }

    pub fn offer_to(&self, to: &PeerId, sdp: &str) -> SignalEnvelope {
        SignalEnvelope::new(
            to.clone(),
            self.id.clone(),
            SignalPayload::Offer { sdp: sdp.into() },
        )
    }
}
