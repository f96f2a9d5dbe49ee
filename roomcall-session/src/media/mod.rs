mod track;

pub use track::{LocalStream, LocalTrack, TrackKind};

use crate::error::MediaError;
use async_trait::async_trait;

/// Platform capture capability.
#[async_trait]
pub trait MediaDevices: Send + Sync {
    /// Camera and microphone: one audio and one video track.
    async fn get_user_media(&self) -> Result<LocalStream, MediaError>;

    /// A single display-capture video track. The platform stops it (see
    /// [`LocalTrack::ended`]) when the user ends sharing from the OS.
    async fn get_display_media(&self) -> Result<LocalTrack, MediaError>;
}

/// User-controlled media switches. Never sent to the remote side; it only
/// observes the effect (silence, black frames, a replaced track).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalMediaState {
    pub audio_enabled: bool,
    pub video_enabled: bool,
    pub sharing: bool,
}

impl Default for LocalMediaState {
    fn default() -> Self {
        Self {
            audio_enabled: true,
            video_enabled: true,
            sharing: false,
        }
    }
}
