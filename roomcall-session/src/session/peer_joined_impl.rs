use crate::session::{RoomSession, SessionState};
use roomcall_core::{PeerId, SignalPayload};
use tracing::{debug, info};

impl RoomSession {
    /// The participant already in the room makes the offer.
    ///
    /// A no-op outside `AwaitingPeer`, so a duplicate `user-connected`
    /// never restarts a negotiation in progress.
    pub(super) async fn on_peer_joined(&mut self, peer: PeerId) {
        let state = self.state();
        if state != SessionState::AwaitingPeer {
            debug!("Ignoring user-connected({}) in state {:?}", peer, state);
            return;
        }

        if self.local_peer.as_ref() == Some(&peer) {
            debug!("Ignoring user-connected for ourselves");
            return;
        }

        info!("Peer {} joined, sending offer", peer);
        self.remote_peer = Some(peer.clone());
        self.set_state(SessionState::Negotiating);
        self.send_offer(peer).await;
    }

    /// Creates an offer, applies it locally and relays it to `to`.
    pub(super) async fn send_offer(&mut self, to: PeerId) {
        let Some(agent) = self.agent.clone() else {
            return;
        };

        let offer = match self.guarded(agent.create_offer()).await {
            None => return,
            Some(Ok(offer)) => offer,
            Some(Err(e)) => {
                self.recoverable("Failed to create offer", e.into());
                return;
            }
        };

        match self
            .guarded(agent.set_local_description(offer.clone()))
            .await
        {
            None => return,
            Some(Ok(())) => {}
            Some(Err(e)) => {
                self.recoverable("Failed to apply local offer", e.into());
                return;
            }
        }

        self.negotiation.local_offer_outstanding = true;
        self.emit_signal(to, SignalPayload::from_description(offer))
            .await;
    }
}
