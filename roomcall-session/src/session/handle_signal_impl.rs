use crate::error::SessionError;
use crate::session::{RoomSession, SessionState};
use roomcall_core::{IceCandidate, PeerId, SessionDescription, SignalEnvelope, SignalPayload};
use tracing::{debug, info, warn};

impl RoomSession {
    pub(super) async fn on_signal(&mut self, envelope: SignalEnvelope) {
        let state = self.state();
        if matches!(
            state,
            SessionState::Idle | SessionState::Joining | SessionState::Ended
        ) {
            debug!(
                "Ignoring {} signal in state {:?}",
                envelope.payload.kind_name(),
                state
            );
            return;
        }

        if let Some(remote) = &self.remote_peer {
            if *remote != envelope.from {
                warn!(
                    "Ignoring stale {} from {} (talking to {})",
                    envelope.payload.kind_name(),
                    envelope.from,
                    remote
                );
                return;
            }
        }

        match envelope.payload {
            SignalPayload::Offer { sdp } => {
                self.on_remote_offer(envelope.from, SessionDescription::offer(sdp))
                    .await
            }
            SignalPayload::Answer { sdp } => {
                self.on_remote_answer(SessionDescription::answer(sdp)).await
            }
            SignalPayload::Candidate(candidate) => self.on_remote_candidate(candidate).await,
        }
    }

    async fn on_remote_offer(&mut self, from: PeerId, offer: SessionDescription) {
        if self.negotiation.last_remote.as_ref() == Some(&offer) {
            debug!("Duplicate offer from {}, already applied", from);
            return;
        }

        if self.negotiation.local_offer_outstanding {
            // Glare: both sides offered. The lower peer id keeps its offer.
            match self.local_peer.as_ref().filter(|local| local.is_assigned()) {
                Some(local) if *local < from => {
                    warn!("Glare with {}: keeping our offer, discarding theirs", from);
                    return;
                }
                Some(_) => {
                    warn!("Glare with {}: abandoning our offer, answering theirs", from);
                }
                None => {
                    // The relay has not assigned us an id, so there is nothing to compare.
                    warn!(
                        "Glare with {} before the relay assigned our id: answering theirs",
                        from
                    );
                }
            }
            self.negotiation.local_offer_outstanding = false;
        }

        let Some(agent) = self.agent.clone() else {
            return;
        };

        if self.remote_peer.is_none() {
            info!("Offer from {}, adopting as remote peer", from);
            self.remote_peer = Some(from.clone());
        }

        // The state only moves once the offer is accepted.
        match self
            .guarded(agent.set_remote_description(offer.clone()))
            .await
        {
            None => return,
            Some(Ok(())) => {}
            Some(Err(e)) => {
                self.recoverable("Failed to apply remote offer", e.into());
                return;
            }
        }

        self.set_state(SessionState::Negotiating);
        self.negotiation.last_remote = Some(offer);
        self.flush_pending_candidates().await;

        let answer = match self.guarded(agent.create_answer()).await {
            None => return,
            Some(Ok(answer)) => answer,
            Some(Err(e)) => {
                self.recoverable("Failed to create answer", e.into());
                return;
            }
        };

        match self
            .guarded(agent.set_local_description(answer.clone()))
            .await
        {
            None => return,
            Some(Ok(())) => {}
            Some(Err(e)) => {
                self.recoverable("Failed to apply local answer", e.into());
                return;
            }
        }

        self.set_state(SessionState::Connected);
        self.emit_signal(from, SignalPayload::from_description(answer))
            .await;
    }

    async fn on_remote_answer(&mut self, answer: SessionDescription) {
        if !self.negotiation.local_offer_outstanding {
            debug!("Discarding answer with no outstanding offer");
            return;
        }

        let Some(agent) = self.agent.clone() else {
            return;
        };

        match self
            .guarded(agent.set_remote_description(answer.clone()))
            .await
        {
            None => return,
            Some(Ok(())) => {}
            Some(Err(e)) => {
                self.recoverable("Failed to apply remote answer", e.into());
                return;
            }
        }

        self.negotiation.local_offer_outstanding = false;
        self.negotiation.last_remote = Some(answer);
        self.flush_pending_candidates().await;
        self.set_state(SessionState::Connected);
    }

    async fn on_remote_candidate(&mut self, candidate: IceCandidate) {
        if self.applied_candidates.contains(&candidate) {
            debug!("Duplicate candidate, already applied");
            return;
        }

        if !self.negotiation.has_remote_description() {
            if self.pending_candidates.push(candidate) {
                debug!(
                    "Queued candidate until a remote description is set ({} pending)",
                    self.pending_candidates.len()
                );
            }
            return;
        }

        self.apply_candidate(candidate).await;
    }

    async fn flush_pending_candidates(&mut self) {
        let pending = self.pending_candidates.drain();
        if pending.is_empty() {
            return;
        }

        debug!("Flushing {} queued candidates", pending.len());
        for candidate in pending {
            if self.applied_candidates.contains(&candidate) {
                continue;
            }
            self.apply_candidate(candidate).await;
        }
    }

    async fn apply_candidate(&mut self, candidate: IceCandidate) {
        let Some(agent) = self.agent.clone() else {
            return;
        };

        match self.guarded(agent.add_ice_candidate(candidate.clone())).await {
            None => {}
            Some(Ok(())) => {
                self.applied_candidates.insert(candidate);
            }
            Some(Err(e)) => {
                self.recoverable("Failed to apply remote candidate", SessionError::from(e));
            }
        }
    }
}
