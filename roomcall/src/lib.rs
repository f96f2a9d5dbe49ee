pub use roomcall_core::{CallConfig, PeerId, RoomId};
pub use roomcall_session::{RoomSession, SessionDeps, SessionEvent, SessionHandle, SessionState};

pub mod model {
    pub use roomcall_core::model::*;
}

pub mod session {
    pub use roomcall_session::*;
}

#[cfg(feature = "webrtc")]
pub mod webrtc {
    pub use roomcall_webrtc::*;
}

#[cfg(feature = "relay")]
pub mod relay {
    pub use roomcall_relay::*;
}
