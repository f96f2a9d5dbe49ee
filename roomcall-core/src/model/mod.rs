mod description;
mod error;
mod peer;
mod room;
mod signaling;

pub use description::{IceCandidate, SdpType, SessionDescription};
pub use error::ModelError;
pub use peer::PeerId;
pub use room::RoomId;
pub use signaling::{
    IceServerConfig, RelayMessage, SignalData, SignalEnvelope, SignalPayload,
};
