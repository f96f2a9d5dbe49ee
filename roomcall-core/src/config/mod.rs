use crate::model::IceServerConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";
pub const DEFAULT_SIGNALING_URL: &str = "ws://127.0.0.1:3000/ws";
pub const DEFAULT_CANDIDATE_QUEUE_LIMIT: usize = 64;

pub const ENV_SIGNALING_URL: &str = "ROOMCALL_SIGNALING_URL";
pub const ENV_STUN_URL: &str = "ROOMCALL_STUN_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Authenticated network relay. Optional: without it only direct and
/// STUN-reflexive paths are tried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnConfig {
    pub url: String,
    pub username: String,
    pub credential: String,
}

/// Static configuration handed to a call at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallConfig {
    pub signaling_url: String,
    pub stun_url: String,
    pub turn: Option<TurnConfig>,
    pub candidate_queue_limit: usize,
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            signaling_url: DEFAULT_SIGNALING_URL.to_owned(),
            stun_url: DEFAULT_STUN_ADDR.to_owned(),
            turn: None,
            candidate_queue_limit: DEFAULT_CANDIDATE_QUEUE_LIMIT,
        }
    }
}

impl CallConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: CallConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_toml_str(&content)?;
        info!("loaded call config from {}", path.display());
        Ok(config)
    }

    /// Overrides endpoint addresses from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_SIGNALING_URL) {
            debug!("signaling url overridden by {}", ENV_SIGNALING_URL);
            self.signaling_url = url;
        }
        if let Some(url) = lookup(ENV_STUN_URL) {
            debug!("stun url overridden by {}", ENV_STUN_URL);
            self.stun_url = url;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.signaling_url.trim().is_empty() {
            return Err(ConfigError::Invalid("signaling_url is empty".into()));
        }
        if self.candidate_queue_limit == 0 {
            return Err(ConfigError::Invalid(
                "candidate_queue_limit must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// The discovery server first, then the authenticated relay if any.
    pub fn ice_servers(&self) -> Vec<IceServerConfig> {
        let mut servers = Vec::with_capacity(2);

        if !self.stun_url.is_empty() {
            servers.push(IceServerConfig {
                urls: vec![self.stun_url.clone()],
                username: None,
                credential: None,
            });
        }

        if let Some(turn) = &self.turn {
            servers.push(IceServerConfig {
                urls: vec![turn.url.clone()],
                username: Some(turn.username.clone()),
                credential: Some(turn.credential.clone()),
            });
        }

        servers
    }
}
