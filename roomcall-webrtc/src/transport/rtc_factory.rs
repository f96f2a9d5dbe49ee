use crate::transport::convert::{
    agent_error, connection_state, from_candidate_init, ice_server, track_kind,
};
use crate::transport::rtc_agent::RtcAgent;
use async_trait::async_trait;
use roomcall_core::IceServerConfig;
use roomcall_session::{AgentEvent, AgentFactory, NegotiationAgent, NegotiationError, RemoteTrack};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::RTCIceCandidate;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::track::track_remote::TrackRemote;

/// Creates one [`RtcAgent`] per call with the default codecs and
/// interceptors registered.
#[derive(Debug, Clone, Default)]
pub struct RtcAgentFactory;

impl RtcAgentFactory {
    pub fn new() -> Self {
        Self
    }

    pub(crate) async fn new_peer_connection(
        ice_servers: Vec<IceServerConfig>,
    ) -> Result<RTCPeerConnection, webrtc::Error> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: ice_servers.into_iter().map(ice_server).collect(),
            ..Default::default()
        };

        api.new_peer_connection(rtc_config).await
    }
}

#[async_trait]
impl AgentFactory for RtcAgentFactory {
    async fn create(
        &self,
        ice_servers: Vec<IceServerConfig>,
        events: mpsc::Sender<AgentEvent>,
    ) -> Result<Arc<dyn NegotiationAgent>, NegotiationError> {
        let peer_connection = Arc::new(
            Self::new_peer_connection(ice_servers)
                .await
                .map_err(agent_error)?,
        );

        // Callbacks must be 'static, so each one owns a clone of the sender.
        let state_tx = events.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();
                Box::pin(async move {
                    info!("Peer connection state changed: {}", s);
                    let _ = tx
                        .send(AgentEvent::ConnectionStateChanged(connection_state(s)))
                        .await;
                })
            },
        ));

        let ice_tx = events.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            Box::pin(async move {
                // None marks the end of gathering.
                let Some(candidate) = c else {
                    debug!("ICE gathering complete");
                    return;
                };
                let init = match candidate.to_json() {
                    Ok(init) => init,
                    Err(e) => {
                        warn!("Failed to serialize local candidate: {}", e);
                        return;
                    }
                };
                let _ = tx
                    .send(AgentEvent::LocalCandidate(from_candidate_init(init)))
                    .await;
            })
        }));

        let track_tx = events;
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let tx = track_tx.clone();
                Box::pin(async move {
                    let Some(kind) = track_kind(track.kind()) else {
                        warn!("Remote track {} has no media kind", track.id());
                        return;
                    };
                    let remote = RemoteTrack {
                        id: track.id(),
                        stream_id: track.stream_id(),
                        kind,
                    };
                    let _ = tx.send(AgentEvent::RemoteTrack(remote)).await;
                })
            },
        ));

        info!("Created peer connection");
        Ok(Arc::new(RtcAgent::new(peer_connection)))
    }
}
