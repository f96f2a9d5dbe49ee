use crate::model::description::{IceCandidate, SdpType, SessionDescription};
use crate::model::error::ModelError;
use crate::model::peer::PeerId;
use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

/// What a signal carries. Exactly one kind per envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalPayload {
    Offer { sdp: String },
    Answer { sdp: String },
    Candidate(IceCandidate),
}

impl SignalPayload {
    pub fn from_description(description: SessionDescription) -> Self {
        match description.kind {
            SdpType::Offer => Self::Offer {
                sdp: description.sdp,
            },
            SdpType::Answer => Self::Answer {
                sdp: description.sdp,
            },
        }
    }

    pub fn description(&self) -> Option<SessionDescription> {
        match self {
            Self::Offer { sdp } => Some(SessionDescription::offer(sdp.clone())),
            Self::Answer { sdp } => Some(SessionDescription::answer(sdp.clone())),
            Self::Candidate(_) => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Offer { .. } => "offer",
            Self::Answer { .. } => "answer",
            Self::Candidate(_) => "candidate",
        }
    }
}

/// Wire shape of a signal body: `{ sdp?: {type, body}, candidate?: ... }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdp: Option<SessionDescription>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate: Option<IceCandidate>,
}

impl TryFrom<SignalData> for SignalPayload {
    type Error = ModelError;

    fn try_from(data: SignalData) -> Result<Self, Self::Error> {
        match (data.sdp, data.candidate) {
            (Some(description), None) => Ok(Self::from_description(description)),
            (None, Some(candidate)) => Ok(Self::Candidate(candidate)),
            (None, None) => Err(ModelError::EmptySignal),
            (Some(_), Some(_)) => Err(ModelError::AmbiguousSignal),
        }
    }
}

impl From<SignalPayload> for SignalData {
    fn from(payload: SignalPayload) -> Self {
        match payload {
            SignalPayload::Candidate(candidate) => Self {
                sdp: None,
                candidate: Some(candidate),
            },
            description => Self {
                sdp: description.description(),
                candidate: None,
            },
        }
    }
}

/// A signal addressed through the relay.
///
/// `to` names either a peer or the room the sender is in. The relay
/// overwrites `from` with the sender's actual id before delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireEnvelope", into = "WireEnvelope")]
pub struct SignalEnvelope {
    pub to: PeerId,
    pub from: PeerId,
    pub payload: SignalPayload,
}

impl SignalEnvelope {
    pub fn new(to: PeerId, from: PeerId, payload: SignalPayload) -> Self {
        Self { to, from, payload }
    }
}

#[derive(Serialize, Deserialize)]
struct WireEnvelope {
    to: PeerId,
    #[serde(default)]
    from: PeerId,
    data: SignalData,
}

impl TryFrom<WireEnvelope> for SignalEnvelope {
    type Error = ModelError;

    fn try_from(wire: WireEnvelope) -> Result<Self, Self::Error> {
        Ok(Self {
            to: wire.to,
            from: wire.from,
            payload: wire.data.try_into()?,
        })
    }
}

impl From<SignalEnvelope> for WireEnvelope {
    fn from(envelope: SignalEnvelope) -> Self {
        Self {
            to: envelope.to,
            from: envelope.from,
            data: envelope.payload.into(),
        }
    }
}

/// Every named event exchanged with the relay, in both directions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum RelayMessage {
    /// Relay -> client once the channel is up; carries the assigned id.
    Connected { peer: PeerId },
    /// Client -> relay.
    JoinRoom { room: RoomId },
    /// Relay -> clients already in the room when someone joins.
    UserConnected { peer: PeerId },
    /// Relay -> remaining clients when a member leaves or drops.
    UserDisconnected { peer: PeerId },
    /// Relay -> joiner when the room already holds its capacity.
    RoomFull { room: RoomId },
    /// Both directions.
    Signal(SignalEnvelope),
    Error { message: String },
}
