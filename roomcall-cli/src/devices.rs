use async_trait::async_trait;
use roomcall_session::{LocalStream, LocalTrack, MediaDevices, MediaError, TrackKind};

/// Capture devices with no pipeline behind them. The tracks negotiate and
/// toggle like real ones but never produce samples.
pub struct HeadlessDevices;

#[async_trait]
impl MediaDevices for HeadlessDevices {
    async fn get_user_media(&self) -> Result<LocalStream, MediaError> {
        Ok(LocalStream::new(
            LocalTrack::new(TrackKind::Audio, "headless microphone"),
            LocalTrack::new(TrackKind::Video, "headless camera"),
        ))
    }

    async fn get_display_media(&self) -> Result<LocalTrack, MediaError> {
        Ok(LocalTrack::new(TrackKind::Video, "headless display"))
    }
}
