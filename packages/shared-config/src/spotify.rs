//! Listening-history provider configuration types

use crate::{get_env_or_default, parse_env, ConfigResult};

/// Spotify Web API configuration
#[derive(Debug, Clone)]
pub struct SpotifyConfig {
    /// Web API base URL
    pub api_url: String,

    /// Accounts service base URL (token refresh)
    pub accounts_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Retry attempts for transient failures
    pub max_retries: u32,
}

impl SpotifyConfig {
    /// Load Spotify configuration from environment variables
    pub fn from_env() -> ConfigResult<Self> {
        Ok(Self {
            api_url: get_env_or_default("SPOTIFY_API_URL", "https://api.spotify.com/v1"),
            accounts_url: get_env_or_default(
                "SPOTIFY_ACCOUNTS_URL",
                "https://accounts.spotify.com/api",
            ),
            timeout_secs: parse_env("SPOTIFY_TIMEOUT", 10)?,
            max_retries: parse_env("SPOTIFY_MAX_RETRIES", 2)?,
        })
    }

    /// Point both the Web API and the accounts service at one base URL
    /// (useful for testing against a mock server)
    pub fn with_url(url: impl Into<String>) -> Self {
        let url = url.into();
        let base = url.trim_end_matches('/');
        Self {
            api_url: format!("{}/v1", base),
            accounts_url: format!("{}/api", base),
            timeout_secs: 10,
            max_retries: 0,
        }
    }

    /// Full URL for the token endpoint
    pub fn token_url(&self) -> String {
        format!("{}/token", self.accounts_url.trim_end_matches('/'))
    }

    /// Full URL for the recently-played endpoint
    pub fn recently_played_url(&self) -> String {
        format!(
            "{}/me/player/recently-played",
            self.api_url.trim_end_matches('/')
        )
    }

    /// Full URL for a track's audio features
    pub fn audio_features_url(&self, track_id: &str) -> String {
        format!(
            "{}/audio-features/{}",
            self.api_url.trim_end_matches('/'),
            track_id
        )
    }
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.spotify.com/v1".to_string(),
            accounts_url: "https://accounts.spotify.com/api".to_string(),
            timeout_secs: 10,
            max_retries: 2,
        }
    }
}
