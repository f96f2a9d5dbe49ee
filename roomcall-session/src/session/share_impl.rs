use crate::error::SessionError;
use crate::media::{LocalTrack, TrackKind};
use crate::session::{RoomSession, SessionEvent, SessionState};
use tracing::{debug, info, warn};

impl RoomSession {
    /// Swaps the outgoing video between camera and display capture.
    ///
    /// Track replacement keeps the negotiated sender, so no new offer is made.
    pub(super) async fn toggle_screen_share(&mut self) -> Result<bool, SessionError> {
        let state = self.state();
        if self.agent.is_none()
            || matches!(
                state,
                SessionState::Idle | SessionState::Joining | SessionState::Ended
            )
        {
            return Err(SessionError::InvalidState(state));
        }

        if self.media_tx.borrow().sharing {
            self.stop_sharing().await?;
            Ok(false)
        } else {
            self.start_sharing().await?;
            Ok(true)
        }
    }

    async fn start_sharing(&mut self) -> Result<(), SessionError> {
        let Some(agent) = self.agent.clone() else {
            return Err(SessionError::InvalidState(self.state()));
        };

        let devices = self.devices.clone();
        let screen = match self.guarded(devices.get_display_media()).await {
            None => return Err(SessionError::Ended),
            Some(Ok(track)) => track,
            Some(Err(e)) => {
                warn!("Display capture unavailable: {}", e);
                return Err(SessionError::Share(e.to_string()));
            }
        };

        match self.guarded(agent.replace_video_track(&screen)).await {
            None => {
                screen.stop();
                return Err(SessionError::Ended);
            }
            Some(Ok(())) => {}
            Some(Err(e)) => {
                warn!("Failed to switch outgoing video to screen: {}", e);
                screen.stop();
                return Err(SessionError::Share(e.to_string()));
            }
        }

        self.watch_share_end(&screen);
        info!("Screen share started ({})", screen.id());
        self.screen_track = Some(screen);
        self.update_media(|media| media.sharing = true);
        Ok(())
    }

    async fn stop_sharing(&mut self) -> Result<(), SessionError> {
        let Some(agent) = self.agent.clone() else {
            return Err(SessionError::InvalidState(self.state()));
        };
        let Some(stream) = self.local_stream.clone() else {
            return Err(SessionError::NoTrack(TrackKind::Video));
        };

        let camera = stream.track(TrackKind::Video);
        match self.guarded(agent.replace_video_track(camera)).await {
            None => return Err(SessionError::Ended),
            Some(Ok(())) => {}
            Some(Err(e)) => {
                warn!("Failed to switch outgoing video back to camera: {}", e);
                return Err(SessionError::Share(e.to_string()));
            }
        }

        if let Some(screen) = self.screen_track.take() {
            screen.stop();
        }
        info!("Screen share stopped, camera restored");
        self.update_media(|media| media.sharing = false);
        self.notify(SessionEvent::ShareStopped);
        Ok(())
    }

    /// Reports back into the loop when the platform stops the display track.
    fn watch_share_end(&self, screen: &LocalTrack) {
        let screen = screen.clone();
        let tx = self.share_ended_tx.clone();
        tokio::spawn(async move {
            screen.ended().await;
            let _ = tx.send(screen.id().to_owned());
        });
    }

    pub(super) async fn on_share_ended(&mut self, track_id: String) {
        let current = self.screen_track.as_ref().map(|t| t.id().to_owned());
        if current.as_deref() != Some(track_id.as_str()) || self.is_ending() {
            debug!("Share track {} ended, nothing to revert", track_id);
            return;
        }

        info!("Screen share ended externally, reverting to camera");
        if let Err(e) = self.stop_sharing().await {
            self.recoverable("Failed to revert to camera", e);
        }
    }
}
