pub mod config;
pub mod model;

pub use config::{CallConfig, ConfigError, TurnConfig};
pub use model::*;
