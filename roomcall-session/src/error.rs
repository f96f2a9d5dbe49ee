use crate::media::TrackKind;
use crate::session::SessionState;
use thiserror::Error;

/// Capture failures reported by [`crate::MediaDevices`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MediaError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("no capture device: {0}")]
    NoDevice(String),

    #[error("capture failed: {0}")]
    Capture(String),
}

/// Failures reported by a [`crate::NegotiationAgent`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NegotiationError {
    #[error("description rejected: {0}")]
    Description(String),

    #[error("candidate rejected: {0}")]
    Candidate(String),

    #[error("track operation failed: {0}")]
    Track(String),

    #[error("agent failure: {0}")]
    Agent(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RelayError {
    #[error("failed to connect to relay: {0}")]
    Connect(String),

    #[error("relay channel is closed")]
    Closed,

    #[error("failed to encode relay message: {0}")]
    Encode(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("media acquisition failed: {0}")]
    MediaAcquisition(#[source] MediaError),

    #[error("no local {0} track")]
    NoTrack(TrackKind),

    #[error("screen share failed: {0}")]
    Share(String),

    #[error("description error: {0}")]
    Description(String),

    #[error("candidate error: {0}")]
    Candidate(String),

    #[error("negotiation agent error: {0}")]
    Agent(String),

    #[error(transparent)]
    Relay(#[from] RelayError),

    #[error("operation not allowed in state {0:?}")]
    InvalidState(SessionState),

    #[error("session has ended")]
    Ended,
}

impl From<NegotiationError> for SessionError {
    fn from(err: NegotiationError) -> Self {
        match err {
            NegotiationError::Description(msg) => Self::Description(msg),
            NegotiationError::Candidate(msg) => Self::Candidate(msg),
            NegotiationError::Track(msg) | NegotiationError::Agent(msg) => Self::Agent(msg),
        }
    }
}
