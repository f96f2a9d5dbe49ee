use crate::agent::NegotiationAgent;
use crate::error::SessionError;
use crate::media::{LocalMediaState, LocalStream};
use crate::session::{RoomSession, SessionEvent, SessionState};
use roomcall_core::{RelayMessage, RoomId};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};

impl RoomSession {
    /// `Idle -> Joining -> AwaitingPeer`. Any failure returns to `Idle` with
    /// nothing left behind.
    pub(super) async fn start(&mut self, room: RoomId) -> Result<(), SessionError> {
        let state = self.state();
        if state != SessionState::Idle {
            return Err(SessionError::InvalidState(state));
        }

        info!("Joining room '{}'", room);
        self.set_state(SessionState::Joining);

        let devices = self.devices.clone();
        let stream = match self.guarded(devices.get_user_media()).await {
            None => return Err(SessionError::Ended),
            Some(Ok(stream)) => stream,
            Some(Err(e)) => {
                error!("Local media acquisition failed: {}", e);
                self.set_state(SessionState::Idle);
                return Err(SessionError::MediaAcquisition(e));
            }
        };

        let (agent_tx, agent_rx) = mpsc::channel(256);
        let agents = self.agents.clone();
        let agent = match self
            .guarded(agents.create(self.config.ice_servers(), agent_tx))
            .await
        {
            None => {
                stream.stop();
                return Err(SessionError::Ended);
            }
            Some(Ok(agent)) => agent,
            Some(Err(e)) => {
                error!("Failed to create negotiation agent: {}", e);
                stream.stop();
                self.set_state(SessionState::Idle);
                return Err(e.into());
            }
        };

        if let Err(err) = self.attach_tracks(&agent, &stream).await {
            stream.stop();
            let _ = agent.close().await;
            if !matches!(err, SessionError::Ended) {
                self.set_state(SessionState::Idle);
            }
            return Err(err);
        }

        self.agent = Some(agent);
        self.agent_rx = Some(agent_rx);
        self.local_stream = Some(stream.clone());
        self.update_media(|media| *media = LocalMediaState::default());
        self.notify(SessionEvent::LocalStream(stream));

        self.room = Some(room.clone());
        self.listening = true;

        if let Err(e) = self.relay.emit(RelayMessage::JoinRoom { room }).await {
            error!("Failed to announce join: {}", e);
            self.release_call_resources().await;
            self.set_state(SessionState::Idle);
            return Err(e.into());
        }

        self.set_state(SessionState::AwaitingPeer);
        Ok(())
    }

    async fn attach_tracks(
        &self,
        agent: &Arc<dyn NegotiationAgent>,
        stream: &LocalStream,
    ) -> Result<(), SessionError> {
        for track in stream.tracks() {
            match self.guarded(agent.add_track(track)).await {
                None => return Err(SessionError::Ended),
                Some(Ok(())) => {}
                Some(Err(e)) => {
                    error!("Failed to add local {} track: {}", track.kind(), e);
                    return Err(e.into());
                }
            }
        }
        Ok(())
    }
}
