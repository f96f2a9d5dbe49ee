//! Room session controller: drives one two-party call through
//! join, offer/answer, candidate exchange, screen-share track replacement
//! and teardown.
//!
//! The controller only talks to capabilities: a [`NegotiationAgent`] for the
//! peer connection, a [`RelayChannel`] for signaling and [`MediaDevices`] for
//! capture. Concrete implementations live in sibling crates.

pub mod agent;
pub mod error;
pub mod media;
pub mod relay;
pub mod session;

pub use agent::{AgentEvent, AgentFactory, ConnectionState, NegotiationAgent, RemoteTrack};
pub use error::{MediaError, NegotiationError, RelayError, SessionError};
pub use media::{LocalMediaState, LocalStream, LocalTrack, MediaDevices, TrackKind};
pub use relay::{RelayChannel, RelayEvent, WsRelayChannel};
pub use session::{
    RoomSession, SessionDeps, SessionEvent, SessionEvents, SessionHandle, SessionState,
};
