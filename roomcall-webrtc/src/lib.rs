//! [`NegotiationAgent`](roomcall_session::NegotiationAgent) backed by a
//! webrtc-rs peer connection.

pub mod transport;

pub use transport::{RtcAgent, RtcAgentFactory};
pub use webrtc::media::Sample;
