mod ws_handler;

pub use ws_handler::ws_handler;

use crate::hub::RelayHub;
use axum::Router;
use axum::routing::get;

/// `GET /ws` upgrades to a relay connection.
pub fn router(hub: RelayHub) -> Router {
    Router::new().route("/ws", get(ws_handler)).with_state(hub)
}
