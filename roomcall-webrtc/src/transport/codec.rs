use roomcall_session::TrackKind;
use std::sync::Arc;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

/// Stream id shared by every outgoing track of one participant.
pub(crate) const LOCAL_STREAM_ID: &str = "roomcall";

pub(crate) fn capability(kind: TrackKind) -> RTCRtpCodecCapability {
    let mime_type = match kind {
        TrackKind::Audio => MIME_TYPE_OPUS,
        TrackKind::Video => MIME_TYPE_VP8,
    };
    RTCRtpCodecCapability {
        mime_type: mime_type.to_owned(),
        ..Default::default()
    }
}

/// RTP-side counterpart of a local capture track.
pub(crate) fn sample_track(kind: TrackKind, id: &str) -> Arc<TrackLocalStaticSample> {
    Arc::new(TrackLocalStaticSample::new(
        capability(kind),
        id.to_owned(),
        LOCAL_STREAM_ID.to_owned(),
    ))
}
