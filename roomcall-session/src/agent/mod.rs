use crate::error::NegotiationError;
use crate::media::{LocalTrack, TrackKind};
use async_trait::async_trait;
use roomcall_core::{IceCandidate, IceServerConfig, SessionDescription};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Connectivity of the underlying peer connection as the agent reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTrack {
    pub id: String,
    pub stream_id: String,
    pub kind: TrackKind,
}

/// Notifications the agent pushes into the session loop.
#[derive(Debug, Clone)]
pub enum AgentEvent {
    LocalCandidate(IceCandidate),
    RemoteTrack(RemoteTrack),
    ConnectionStateChanged(ConnectionState),
}

/// The platform peer connection, seen as an opaque primitive.
///
/// Descriptions and candidates pass through untouched; the session never
/// looks inside them.
#[async_trait]
pub trait NegotiationAgent: Send + Sync {
    async fn create_offer(&self) -> Result<SessionDescription, NegotiationError>;

    async fn create_answer(&self) -> Result<SessionDescription, NegotiationError>;

    async fn set_local_description(
        &self,
        description: SessionDescription,
    ) -> Result<(), NegotiationError>;

    /// Fails with [`NegotiationError::Description`] on malformed or
    /// incompatible input.
    async fn set_remote_description(
        &self,
        description: SessionDescription,
    ) -> Result<(), NegotiationError>;

    /// Fails with [`NegotiationError::Candidate`] when no remote description
    /// has been set.
    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), NegotiationError>;

    async fn add_track(&self, track: &LocalTrack) -> Result<(), NegotiationError>;

    /// Swaps what the outgoing video sender carries. No renegotiation.
    async fn replace_video_track(&self, track: &LocalTrack) -> Result<(), NegotiationError>;

    async fn close(&self) -> Result<(), NegotiationError>;
}

/// Builds one agent per call. Events go to `events` for the agent's lifetime.
#[async_trait]
pub trait AgentFactory: Send + Sync {
    async fn create(
        &self,
        ice_servers: Vec<IceServerConfig>,
        events: mpsc::Sender<AgentEvent>,
    ) -> Result<Arc<dyn NegotiationAgent>, NegotiationError>;
}
