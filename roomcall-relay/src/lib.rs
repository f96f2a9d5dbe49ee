//! Rendezvous relay: introduces the participants of a room to each other and
//! forwards their signals. Media never passes through it.

pub mod config;
pub mod hub;
pub mod signaling;

pub use config::RelayConfig;
pub use hub::RelayHub;
pub use signaling::{router, ws_handler};
