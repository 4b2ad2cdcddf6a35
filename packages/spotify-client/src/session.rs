//! Refresh-or-continue token session
//!
//! Every privileged call is preceded by a token refresh. A failed refresh is
//! logged and the call still goes out with whatever token the client holds,
//! which may be the stale one from the secret bundle.

use encore_shared_config::{SpotifyConfig, SpotifyCredentials};
use tracing::{debug, warn};

use crate::client::SpotifyClient;
use crate::error::SpotifyResult;
use crate::models::{AudioFeatures, RecentlyPlayedResponse};

/// Provider client wrapped with the refresh-before-call policy
#[derive(Debug)]
pub struct TokenSession {
    client: SpotifyClient,
    degraded: bool,
}

impl TokenSession {
    pub fn new(client: SpotifyClient) -> Self {
        Self {
            client,
            degraded: false,
        }
    }

    /// Build the client from credentials and wrap it
    pub fn connect(credentials: SpotifyCredentials, config: &SpotifyConfig) -> SpotifyResult<Self> {
        Ok(Self::new(SpotifyClient::new(credentials, config)?))
    }

    /// Try to refresh the access token
    ///
    /// Returns `true` when a new token was installed. On failure the session
    /// is marked degraded and keeps its current token.
    pub async fn refresh(&mut self) -> bool {
        match self.client.refresh_access_token().await {
            Ok(token) => {
                self.client.set_access_token(token);
                self.degraded = false;
                debug!("Spotify access token refreshed");
                true
            }
            Err(e) => {
                self.degraded = true;
                warn!(error = %e, "Could not refresh access token, continuing with current token");
                false
            }
        }
    }

    /// Whether the last refresh attempt failed
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn client(&self) -> &SpotifyClient {
        &self.client
    }

    /// Refresh, then fetch the most recent playback events
    pub async fn recently_played(&mut self, limit: u32) -> SpotifyResult<RecentlyPlayedResponse> {
        self.refresh().await;
        self.client.get_recently_played(limit).await
    }

    /// Refresh, then fetch audio features for a track
    pub async fn audio_features(&mut self, track_id: &str) -> SpotifyResult<AudioFeatures> {
        self.refresh().await;
        self.client.get_audio_features(track_id).await
    }
}
