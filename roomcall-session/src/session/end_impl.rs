use crate::session::{RoomSession, SessionState};
use tracing::{info, warn};

impl RoomSession {
    /// Terminal teardown. Idempotent.
    pub(super) async fn end(&mut self) {
        if self.state() == SessionState::Ended {
            return;
        }

        match &self.room {
            Some(room) => info!("Ending call in room '{}'", room),
            None => info!("Ending call"),
        }
        self.release_call_resources().await;
        self.relay.disconnect().await;
        self.relay_open = false;
        self.set_state(SessionState::Ended);
    }

    /// Stops capture and closes the agent, dropping all per-call negotiation
    /// state.
    pub(super) async fn release_call_resources(&mut self) {
        self.listening = false;

        if let Some(screen) = self.screen_track.take() {
            screen.stop();
        }

        if let Some(stream) = self.local_stream.take() {
            stream.stop();
        }

        self.agent_rx = None;
        if let Some(agent) = self.agent.take() {
            if let Err(e) = agent.close().await {
                warn!("Failed to close negotiation agent: {}", e);
            }
        }

        self.negotiation = Default::default();
        self.pending_candidates.clear();
        self.applied_candidates.clear();
        self.remote_peer = None;
        self.room = None;
    }
}
