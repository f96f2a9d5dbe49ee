use crate::transport::codec::sample_track;
use crate::transport::convert::{
    agent_error, candidate_error, description_error, from_rtc_description, to_candidate_init,
    to_rtc_description, track_error,
};
use async_trait::async_trait;
use roomcall_core::{IceCandidate, SessionDescription};
use roomcall_session::{LocalTrack, NegotiationAgent, NegotiationError, TrackKind};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use webrtc::media::Sample;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::rtp_transceiver::rtp_sender::RTCRtpSender;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

/// A local capture track and the RTP track its samples are written to.
struct Outgoing {
    source: LocalTrack,
    rtp: Arc<TrackLocalStaticSample>,
    /// Added with `add_track`, as opposed to swapped onto the video sender.
    attached: bool,
}

/// The video sender and the id of the track it currently carries.
struct VideoSender {
    rtp: Arc<RTCRtpSender>,
    current: String,
}

/// One peer connection plus the outgoing tracks attached to it.
pub struct RtcAgent {
    peer_connection: Arc<RTCPeerConnection>,
    outgoing: Mutex<HashMap<String, Outgoing>>,
    video_sender: Mutex<Option<VideoSender>>,
}

impl RtcAgent {
    pub(crate) fn new(peer_connection: Arc<RTCPeerConnection>) -> Self {
        Self {
            peer_connection,
            outgoing: Mutex::new(HashMap::new()),
            video_sender: Mutex::new(None),
        }
    }

    /// Feeds one encoded frame for `track_id`.
    ///
    /// Returns `false` without sending when the local track is disabled, so a
    /// muted microphone or paused camera stays attached but goes silent.
    pub async fn write_sample(
        &self,
        track_id: &str,
        sample: &Sample,
    ) -> Result<bool, NegotiationError> {
        let (source, rtp) = {
            let outgoing = self.outgoing.lock().await;
            let Some(entry) = outgoing.get(track_id) else {
                return Err(NegotiationError::Track(format!(
                    "track {track_id} is not attached"
                )));
            };
            (entry.source.clone(), entry.rtp.clone())
        };

        if !source.is_enabled() || source.is_ended() {
            return Ok(false);
        }

        rtp.write_sample(sample).await.map_err(track_error)?;
        Ok(true)
    }

    async fn rtp_track(
        &self,
        track: &LocalTrack,
        attached: bool,
    ) -> Arc<TrackLocalStaticSample> {
        let mut outgoing = self.outgoing.lock().await;
        let entry = outgoing
            .entry(track.id().to_owned())
            .or_insert_with(|| Outgoing {
                source: track.clone(),
                rtp: sample_track(track.kind(), track.id()),
                attached,
            });
        entry.attached |= attached;
        entry.rtp.clone()
    }

    /// Forgets a track that was only ever swapped onto the video sender.
    async fn release_swapped(&self, track_id: &str) {
        let mut outgoing = self.outgoing.lock().await;
        if outgoing.get(track_id).is_some_and(|entry| !entry.attached) {
            outgoing.remove(track_id);
            debug!("Released swapped-out video track {}", track_id);
        }
    }
}

/// RTCP has to be read for interceptors (NACK, reports) to work.
fn drain_rtcp(sender: Arc<RTCRtpSender>) {
    tokio::spawn(async move {
        let mut buf = vec![0u8; 1500];
        while sender.read(&mut buf).await.is_ok() {}
    });
}

#[async_trait]
impl NegotiationAgent for RtcAgent {
    async fn create_offer(&self) -> Result<SessionDescription, NegotiationError> {
        let offer = self
            .peer_connection
            .create_offer(None)
            .await
            .map_err(description_error)?;
        from_rtc_description(offer)
    }

    async fn create_answer(&self) -> Result<SessionDescription, NegotiationError> {
        let answer = self
            .peer_connection
            .create_answer(None)
            .await
            .map_err(description_error)?;
        from_rtc_description(answer)
    }

    async fn set_local_description(
        &self,
        description: SessionDescription,
    ) -> Result<(), NegotiationError> {
        let desc = to_rtc_description(description)?;
        self.peer_connection
            .set_local_description(desc)
            .await
            .map_err(description_error)
    }

    async fn set_remote_description(
        &self,
        description: SessionDescription,
    ) -> Result<(), NegotiationError> {
        let desc = to_rtc_description(description)?;
        self.peer_connection
            .set_remote_description(desc)
            .await
            .map_err(description_error)
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), NegotiationError> {
        self.peer_connection
            .add_ice_candidate(to_candidate_init(candidate))
            .await
            .map_err(candidate_error)
    }

    async fn add_track(&self, track: &LocalTrack) -> Result<(), NegotiationError> {
        let rtp = self.rtp_track(track, true).await;
        let sender = self
            .peer_connection
            .add_track(rtp as Arc<dyn TrackLocal + Send + Sync>)
            .await
            .map_err(track_error)?;

        if track.kind() == TrackKind::Video {
            *self.video_sender.lock().await = Some(VideoSender {
                rtp: sender.clone(),
                current: track.id().to_owned(),
            });
        }
        drain_rtcp(sender);

        debug!("Attached local {} track {}", track.kind(), track.id());
        Ok(())
    }

    async fn replace_video_track(&self, track: &LocalTrack) -> Result<(), NegotiationError> {
        let Some((sender, previous)) = self
            .video_sender
            .lock()
            .await
            .as_ref()
            .map(|video| (video.rtp.clone(), video.current.clone()))
        else {
            return Err(NegotiationError::Track("no video sender attached".into()));
        };

        let rtp = self.rtp_track(track, false).await;
        if let Err(e) = sender
            .replace_track(Some(rtp as Arc<dyn TrackLocal + Send + Sync>))
            .await
        {
            if previous != track.id() {
                self.release_swapped(track.id()).await;
            }
            return Err(track_error(e));
        }

        if let Some(video) = self.video_sender.lock().await.as_mut() {
            video.current = track.id().to_owned();
        }
        if previous != track.id() {
            self.release_swapped(&previous).await;
        }

        info!("Outgoing video now carries {}", track.id());
        Ok(())
    }

    async fn close(&self) -> Result<(), NegotiationError> {
        self.outgoing.lock().await.clear();
        self.video_sender.lock().await.take();
        self.peer_connection.close().await.map_err(agent_error)
    }
}
