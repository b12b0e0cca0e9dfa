//! Server configuration.
//!
//! Defaults match the environment the service has always run in; every
//! field can be overridden by an environment variable, and unparseable
//! values fall back to the default rather than failing startup.

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::storage::{IdAllocator, RandomIds, SequentialIds};
use crate::token::DEFAULT_TOKEN_TTL_SECS;

/// Which id allocation policy the store runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdPolicy {
    /// Collision-resistant generated ids; the default.
    #[default]
    Random,
    /// Count-based ids, kept for deployments that rely on them.
    Sequential,
}

impl FromStr for IdPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(Self::Random),
            "sequential" => Ok(Self::Sequential),
            other => Err(format!("unknown id policy: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address for the HTTP listener.
    pub host: String,

    /// HTTP port.
    pub port: u16,

    /// Directory holding the player list file.
    pub data_dir: PathBuf,

    /// Secret the token signer keys off.
    pub token_secret: String,

    /// Token lifetime in seconds.
    pub token_ttl_secs: i64,

    /// Id allocation policy.
    pub id_policy: IdPolicy,
}

impl Config {
    pub fn new() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 12138,
            data_dir: PathBuf::from("data"),
            token_secret: "dev-only-token-secret".to_string(),
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            id_policy: IdPolicy::default(),
        }
    }

    /// Load configuration from the environment.
    ///
    /// Recognized variables: `HOST`, `PORT`, `DATA_DIR`, `TOKEN_SECRET`,
    /// `TOKEN_TTL_SECS`, `ID_POLICY`.
    pub fn from_env() -> Self {
        let mut config = Self::new();
        if let Ok(host) = env::var("HOST") {
            if !host.is_empty() {
                config.host = host;
            }
        }
        if let Some(port) = env::var("PORT").ok().and_then(|v| v.parse().ok()) {
            config.port = port;
        }
        if let Ok(dir) = env::var("DATA_DIR") {
            if !dir.is_empty() {
                config.data_dir = PathBuf::from(dir);
            }
        }
        if let Ok(secret) = env::var("TOKEN_SECRET") {
            if !secret.is_empty() {
                config.token_secret = secret;
            }
        }
        if let Some(ttl) = env::var("TOKEN_TTL_SECS").ok().and_then(|v| v.parse().ok()) {
            config.token_ttl_secs = ttl;
        }
        if let Some(policy) = env::var("ID_POLICY").ok().and_then(|v| v.parse().ok()) {
            config.id_policy = policy;
        }
        config
    }

    /// Set the port
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the data directory
    pub fn data_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.data_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set the token secret
    pub fn token_secret(mut self, secret: &str) -> Self {
        self.token_secret = secret.to_string();
        self
    }

    /// Set the id allocation policy
    pub fn id_policy(mut self, policy: IdPolicy) -> Self {
        self.id_policy = policy;
        self
    }

    /// Path of the backing file inside the data directory.
    pub fn player_list_path(&self) -> PathBuf {
        self.data_dir.join("PlayerList.txt")
    }

    /// Build the allocator this configuration selects.
    pub fn allocator(&self) -> Box<dyn IdAllocator> {
        match self.id_policy {
            IdPolicy::Random => Box::new(RandomIds),
            IdPolicy::Sequential => Box::new(SequentialIds::new()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
