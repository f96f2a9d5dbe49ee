use crate::error::SessionError;
use crate::media::TrackKind;
use crate::session::RoomSession;
use tracing::info;

impl RoomSession {
    pub(super) fn toggle_audio(&self) -> Result<bool, SessionError> {
        let enabled = self.flip_track(TrackKind::Audio)?;
        self.update_media(|media| media.audio_enabled = enabled);
        Ok(enabled)
    }

    pub(super) fn toggle_video(&self) -> Result<bool, SessionError> {
        let enabled = self.flip_track(TrackKind::Video)?;
        self.update_media(|media| media.video_enabled = enabled);
        Ok(enabled)
    }

    /// Enables or disables the camera/microphone track in place. The sender
    /// keeps the track, so the remote side just sees silence or black.
    fn flip_track(&self, kind: TrackKind) -> Result<bool, SessionError> {
        let Some(stream) = &self.local_stream else {
            return Err(SessionError::NoTrack(kind));
        };

        let track = stream.track(kind);
        if track.is_ended() {
            return Err(SessionError::NoTrack(kind));
        }

        let enabled = !track.is_enabled();
        track.set_enabled(enabled);
        info!("Local {} {}", kind, if enabled { "enabled" } else { "disabled" });
        Ok(enabled)
    }
}
