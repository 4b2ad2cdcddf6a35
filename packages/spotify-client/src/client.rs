//! Spotify Web API client implementation

use std::fmt;
use std::future::Future;
use std::time::Duration;

use encore_shared_config::{SpotifyConfig, SpotifyCredentials};
use reqwest::{Client, RequestBuilder, StatusCode};
use tracing::{debug, instrument, warn};

use crate::error::{SpotifyError, SpotifyResult};
use crate::models::{
    AudioFeatures, ErrorBody, ErrorEnvelope, RecentlyPlayedResponse, TokenResponse,
};

/// Default connection timeout in seconds
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Base delay for exponential backoff (milliseconds)
const RETRY_BASE_DELAY_MS: u64 = 100;

/// Maximum error body size kept in error messages
const MAX_ERROR_BODY_SIZE: usize = 500;

/// Spotify Web API client bound to one set of OAuth2 credentials
#[derive(Clone)]
pub struct SpotifyClient {
    http_client: Client,
    config: SpotifyConfig,
    credentials: SpotifyCredentials,
}

impl fmt::Debug for SpotifyClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpotifyClient")
            .field("api_url", &self.config.api_url)
            .field("credentials", &self.credentials)
            .field("max_retries", &self.config.max_retries)
            .finish()
    }
}

impl SpotifyClient {
    /// Create a new client from credentials and endpoint configuration
    pub fn new(credentials: SpotifyCredentials, config: &SpotifyConfig) -> SpotifyResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
            .user_agent("Encore/1.0")
            .build()?;

        Ok(Self {
            http_client,
            config: config.clone(),
            credentials,
        })
    }

    /// The bearer token currently installed on the client
    pub fn access_token(&self) -> &str {
        &self.credentials.access_token
    }

    /// Install a new bearer token for subsequent calls
    pub fn set_access_token(&mut self, access_token: impl Into<String>) {
        self.credentials.access_token = access_token.into();
    }

    fn validate_track_id(track_id: &str) -> SpotifyResult<&str> {
        let trimmed = track_id.trim();
        if trimmed.is_empty() {
            return Err(SpotifyError::InvalidInput(
                "track id cannot be empty".to_string(),
            ));
        }
        if !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(SpotifyError::InvalidInput(format!(
                "track id must be base62: {}",
                trimmed
            )));
        }
        Ok(trimmed)
    }

    /// Execute an operation with retry logic for transient failures
    async fn with_retry<T, F, Fut>(&self, operation: F) -> SpotifyResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = SpotifyResult<T>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    attempt += 1;
                    let delay_ms = RETRY_BASE_DELAY_MS * 2u64.pow(attempt);
                    warn!(
                        attempt = attempt,
                        max_retries = self.config.max_retries,
                        delay_ms = delay_ms,
                        error = %e,
                        "Spotify request failed, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Send a request and return the body of a successful response
    async fn execute(&self, request: RequestBuilder) -> SpotifyResult<String> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                SpotifyError::Timeout
            } else {
                SpotifyError::Http(e)
            }
        })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("Spotify API rate limited");
            return Err(SpotifyError::RateLimited);
        }

        let text = response.text().await.map_err(SpotifyError::Http)?;
        if !status.is_success() {
            return Err(Self::api_error(status.as_u16(), &text));
        }
        Ok(text)
    }

    fn api_error(status: u16, text: &str) -> SpotifyError {
        let message = match serde_json::from_str::<ErrorEnvelope>(text) {
            Ok(ErrorEnvelope {
                error: ErrorBody::Api { message },
            }) => message,
            Ok(ErrorEnvelope {
                error: ErrorBody::OAuth(code),
            }) => code,
            Err(_) => text.chars().take(MAX_ERROR_BODY_SIZE).collect(),
        };
        SpotifyError::Api { status, message }
    }

    /// Exchange the refresh token for a new access token
    ///
    /// The new token is returned, not installed; see [`crate::TokenSession`].
    ///
    /// # Errors
    /// - `SpotifyError::Api` - If the accounts service rejects the refresh
    /// - `SpotifyError::MissingAccessToken` - If the response carries no token
    #[instrument(skip(self))]
    pub async fn refresh_access_token(&self) -> SpotifyResult<String> {
        let url = self.config.token_url();
        let url = url.as_str();
        debug!("Refreshing Spotify access token");

        let text = self
            .with_retry(|| async {
                let request = self
                    .http_client
                    .post(url)
                    .basic_auth(
                        &self.credentials.client_id,
                        Some(&self.credentials.client_secret),
                    )
                    .form(&[
                        ("grant_type", "refresh_token"),
                        ("refresh_token", self.credentials.refresh_token.as_str()),
                    ]);
                self.execute(request).await
            })
            .await?;

        let token: TokenResponse = serde_json::from_str(&text)?;
        token
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or(SpotifyError::MissingAccessToken)
    }

    /// Get the user's most recent playback events, newest first
    ///
    /// # Errors
    /// - `SpotifyError::Api` - If Spotify returns an error status
    /// - `SpotifyError::Http` - If the HTTP request fails
    #[instrument(skip(self))]
    pub async fn get_recently_played(&self, limit: u32) -> SpotifyResult<RecentlyPlayedResponse> {
        let url = self.config.recently_played_url();
        let url = url.as_str();
        let limit_str = limit.to_string();
        let limit_str = limit_str.as_str();

        let text = self
            .with_retry(|| async {
                let request = self
                    .http_client
                    .get(url)
                    .bearer_auth(&self.credentials.access_token)
                    .query(&[("limit", limit_str)]);
                self.execute(request).await
            })
            .await?;

        let response: RecentlyPlayedResponse = serde_json::from_str(&text)?;

        debug!(
            limit,
            item_count = response.items.as_ref().map_or(0, Vec::len),
            "Fetched recently played tracks"
        );

        Ok(response)
    }

    /// Get tempo and key information for a track
    ///
    /// # Errors
    /// - `SpotifyError::InvalidInput` - If the track id is empty or not base62
    /// - `SpotifyError::Api` - If Spotify returns an error status
    /// - `SpotifyError::Http` - If the HTTP request fails
    #[instrument(skip(self))]
    pub async fn get_audio_features(&self, track_id: &str) -> SpotifyResult<AudioFeatures> {
        let track_id = Self::validate_track_id(track_id)?;
        let url = self.config.audio_features_url(track_id);
        let url = url.as_str();

        let text = self
            .with_retry(|| async {
                let request = self
                    .http_client
                    .get(url)
                    .bearer_auth(&self.credentials.access_token);
                self.execute(request).await
            })
            .await?;

        let features: AudioFeatures = serde_json::from_str(&text)?;
        debug!(track_id, tempo = ?features.tempo, key = ?features.key, "Fetched audio features");

        Ok(features)
    }
}
