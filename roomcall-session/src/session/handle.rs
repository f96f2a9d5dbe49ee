use crate::error::SessionError;
use crate::media::LocalMediaState;
use crate::session::{Command, Reply, SessionState};
use roomcall_core::RoomId;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};

/// Cloneable front of a running [`crate::RoomSession`].
///
/// Each method maps one presentation-layer command onto the session loop.
/// The loop must be running (`tokio::spawn(session.run())`) for requests to
/// be answered.
#[derive(Clone)]
pub struct SessionHandle {
    command_tx: mpsc::Sender<Command>,
    ended_tx: Arc<watch::Sender<bool>>,
    state_rx: watch::Receiver<SessionState>,
    media_rx: watch::Receiver<LocalMediaState>,
}

impl SessionHandle {
    pub(crate) fn new(
        command_tx: mpsc::Sender<Command>,
        ended_tx: Arc<watch::Sender<bool>>,
        state_rx: watch::Receiver<SessionState>,
        media_rx: watch::Receiver<LocalMediaState>,
    ) -> Self {
        Self {
            command_tx,
            ended_tx,
            state_rx,
            media_rx,
        }
    }

    /// Captures local media, creates the agent and announces the join.
    pub async fn start(&self, room: RoomId) -> Result<(), SessionError> {
        self.request(|reply| Command::Start { room, reply }).await
    }

    /// Returns the new audio-enabled value.
    pub async fn toggle_audio(&self) -> Result<bool, SessionError> {
        self.request(|reply| Command::ToggleAudio { reply }).await
    }

    /// Returns the new video-enabled value.
    pub async fn toggle_video(&self) -> Result<bool, SessionError> {
        self.request(|reply| Command::ToggleVideo { reply }).await
    }

    /// Returns the new sharing value.
    pub async fn toggle_screen_share(&self) -> Result<bool, SessionError> {
        self.request(|reply| Command::ToggleScreenShare { reply })
            .await
    }

    /// Tears the call down and waits for `Ended`. Idempotent.
    ///
    /// Any negotiation step still in flight is abandoned: its result is
    /// discarded and nothing more reaches the relay.
    pub async fn end(&self) {
        let already_ending = self.ended_tx.send_replace(true);
        if !already_ending {
            let _ = self.command_tx.send(Command::End).await;
        }
        self.wait_for_state(SessionState::Ended).await;
    }

    pub fn state(&self) -> SessionState {
        *self.state_rx.borrow()
    }

    pub fn media_state(&self) -> LocalMediaState {
        *self.media_rx.borrow()
    }

    /// Resolves once the session reaches `target`, or the loop is gone.
    pub async fn wait_for_state(&self, target: SessionState) {
        let mut rx = self.state_rx.clone();
        let _ = rx.wait_for(|state| *state == target).await;
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> Command,
    ) -> Result<T, SessionError> {
        if *self.ended_tx.borrow() {
            return Err(SessionError::Ended);
        }

        let (reply, rx) = oneshot::channel();
        self.command_tx
            .send(build(reply))
            .await
            .map_err(|_| SessionError::Ended)?;
        rx.await.map_err(|_| SessionError::Ended)?
    }
}
