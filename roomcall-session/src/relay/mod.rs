mod ws_relay;

pub use ws_relay::WsRelayChannel;

use crate::error::RelayError;
use async_trait::async_trait;
use roomcall_core::{PeerId, RelayMessage, RoomId, SignalEnvelope};
use tracing::debug;

/// Arrivals from the relay, in delivery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayEvent {
    Connected(PeerId),
    UserConnected(PeerId),
    UserDisconnected(PeerId),
    RoomFull(RoomId),
    Signal(SignalEnvelope),
    Closed,
}

impl RelayEvent {
    /// Maps an inbound wire message. Client-to-relay messages have no
    /// inbound meaning and yield `None`.
    pub fn from_message(message: RelayMessage) -> Option<Self> {
        match message {
            RelayMessage::Connected { peer } => Some(Self::Connected(peer)),
            RelayMessage::UserConnected { peer } => Some(Self::UserConnected(peer)),
            RelayMessage::UserDisconnected { peer } => Some(Self::UserDisconnected(peer)),
            RelayMessage::RoomFull { room } => Some(Self::RoomFull(room)),
            RelayMessage::Signal(envelope) => Some(Self::Signal(envelope)),
            RelayMessage::Error { message } => {
                debug!("Relay reported error: {}", message);
                None
            }
            RelayMessage::JoinRoom { .. } => None,
        }
    }
}

/// Outbound half of the signaling channel. Inbound events arrive on the
/// `mpsc::Receiver<RelayEvent>` handed to the session alongside it.
#[async_trait]
pub trait RelayChannel: Send + Sync {
    async fn emit(&self, message: RelayMessage) -> Result<(), RelayError>;

    async fn disconnect(&self);
}
