//! Worker configuration loaded from environment variables
//!
//! Secrets are not part of this; they arrive per invocation in the
//! [`crate::JobContext`].

use std::fmt;
use std::str::FromStr;

use encore_shared_config::{
    get_env_or_default, parse_env, ConfigError, ConfigResult, HistoryStoreConfig, SpotifyConfig,
};

/// Default `tracing` filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "encore_worker=info,encore_spotify_client=info";

/// Default number of play events requested and inserted concurrently
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Which history store implementation to open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    Mongo,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(Self::Mongo),
            "memory" | "in-memory" => Ok(Self::Memory),
            other => Err(format!("unknown store backend '{}'", other)),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mongo => write!(f, "mongo"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

/// Worker configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub spotify: SpotifyConfig,
    pub store: HistoryStoreConfig,
    pub store_backend: StoreBackend,

    /// Recently-played page size and insert concurrency bound
    pub batch_size: usize,

    pub log_filter: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> ConfigResult<Self> {
        let batch_size = parse_env("INGEST_BATCH_SIZE", DEFAULT_BATCH_SIZE)?;
        if batch_size == 0 {
            return Err(ConfigError::InvalidValue(
                "INGEST_BATCH_SIZE".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            spotify: SpotifyConfig::from_env()?,
            store: HistoryStoreConfig::from_env()?,
            store_backend: parse_env("HISTORY_STORE_BACKEND", StoreBackend::default())?,
            batch_size,
            log_filter: get_env_or_default("RUST_LOG", DEFAULT_LOG_FILTER),
        })
    }

    /// Configuration pointing the provider client at `spotify_url`, with the
    /// in-memory store
    pub fn for_testing(spotify_url: &str) -> Self {
        Self {
            spotify: SpotifyConfig::with_url(spotify_url),
            store: HistoryStoreConfig::default(),
            store_backend: StoreBackend::Memory,
            batch_size: DEFAULT_BATCH_SIZE,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }

    /// Page size for the recently-played request
    pub fn history_limit(&self) -> u32 {
        u32::try_from(self.batch_size).unwrap_or(u32::MAX)
    }
}
