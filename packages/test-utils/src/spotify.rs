//! Mock Spotify server for testing the provider client and pipelines
//!
//! Provides a [`MockSpotifyServer`] that simulates the accounts token endpoint
//! and the Web API endpoints consumed by the pipelines.

use serde_json::json;
use wiremock::matchers::{header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN_PATH: &str = "/api/token";
const RECENTLY_PLAYED_PATH: &str = "/v1/me/player/recently-played";

/// Mock Spotify server
///
/// Serves both the accounts service (`/api/token`) and the Web API (`/v1/...`)
/// from one address, matching `SpotifyConfig::with_url`.
///
/// # Example
///
/// ```rust,ignore
/// use encore_test_utils::MockSpotifyServer;
///
/// #[tokio::test]
/// async fn test_audio_features() {
///     let server = MockSpotifyServer::start().await;
///     server.mock_audio_features("T1", 100.2, 9).await;
/// }
/// ```
pub struct MockSpotifyServer {
    server: MockServer,
}

impl MockSpotifyServer {
    /// Start a new mock Spotify server
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Get the server URL
    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Number of requests received whose path starts with `prefix`
    pub async fn request_count(&self, prefix: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.url.path().starts_with(prefix))
            .count()
    }

    /// Mount a mock for a successful token refresh
    pub async fn mock_token_refresh(&self, access_token: &str) {
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": access_token,
                "token_type": "Bearer",
                "scope": "user-read-recently-played",
                "expires_in": 3600
            })))
            .mount(&self.server)
            .await;
    }

    /// Mount a mock for a rejected token refresh
    pub async fn mock_token_refresh_failure(&self, status_code: u16, error_code: &str) {
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(status_code).set_body_json(json!({
                "error": error_code,
                "error_description": "Refresh token revoked"
            })))
            .mount(&self.server)
            .await;
    }

    /// Mount a mock for recently played tracks
    pub async fn mock_recently_played(&self, limit: u32, items: Vec<PlayHistoryFixture>) {
        Mock::given(method("GET"))
            .and(path(RECENTLY_PLAYED_PATH))
            .and(query_param("limit", limit.to_string().as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(recently_played_body(&items)))
            .mount(&self.server)
            .await;
    }

    /// Mount a mock for recently played tracks that only answers to `access_token`
    pub async fn mock_recently_played_for_token(
        &self,
        access_token: &str,
        limit: u32,
        items: Vec<PlayHistoryFixture>,
    ) {
        Mock::given(method("GET"))
            .and(path(RECENTLY_PLAYED_PATH))
            .and(query_param("limit", limit.to_string().as_str()))
            .and(header("Authorization", format!("Bearer {}", access_token).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(recently_played_body(&items)))
            .mount(&self.server)
            .await;
    }

    /// Mount a mock returning an arbitrary recently-played body
    pub async fn mock_recently_played_raw(&self, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(RECENTLY_PLAYED_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Mount a mock for a recently-played failure
    pub async fn mock_recently_played_failure(&self, status_code: u16, message: &str) {
        Mock::given(method("GET"))
            .and(path(RECENTLY_PLAYED_PATH))
            .respond_with(ResponseTemplate::new(status_code).set_body_json(api_error(status_code, message)))
            .mount(&self.server)
            .await;
    }

    /// Mount a mock for a track's audio features
    pub async fn mock_audio_features(&self, track_id: &str, tempo: f64, key: i64) {
        Mock::given(method("GET"))
            .and(path(format!("/v1/audio-features/{}", track_id).as_str()))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(audio_features_body(track_id, tempo, key)),
            )
            .mount(&self.server)
            .await;
    }

    /// Mount a mock for audio features that only answers to `access_token`
    pub async fn mock_audio_features_for_token(
        &self,
        access_token: &str,
        track_id: &str,
        tempo: f64,
        key: i64,
    ) {
        Mock::given(method("GET"))
            .and(path(format!("/v1/audio-features/{}", track_id).as_str()))
            .and(header("Authorization", format!("Bearer {}", access_token).as_str()))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(audio_features_body(track_id, tempo, key)),
            )
            .mount(&self.server)
            .await;
    }

    /// Mount a mock for an audio-features failure
    pub async fn mock_audio_features_failure(&self, track_id: &str, status_code: u16, message: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/v1/audio-features/{}", track_id).as_str()))
            .respond_with(ResponseTemplate::new(status_code).set_body_json(api_error(status_code, message)))
            .mount(&self.server)
            .await;
    }

    /// Mount a mock that fails with 503 `failures` times before answering
    pub async fn mock_audio_features_flaky(&self, track_id: &str, failures: u64, tempo: f64, key: i64) {
        let route = format!("/v1/audio-features/{}", track_id);

        Mock::given(method("GET"))
            .and(path(route.as_str()))
            .respond_with(ResponseTemplate::new(503).set_body_json(api_error(503, "Service unavailable")))
            .up_to_n_times(failures)
            .with_priority(1)
            .mount(&self.server)
            .await;

        Mock::given(method("GET"))
            .and(path(route.as_str()))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(audio_features_body(track_id, tempo, key)),
            )
            .with_priority(2)
            .mount(&self.server)
            .await;
    }

    /// Mount a mock for rate limiting on every Web API endpoint
    pub async fn mock_rate_limit(&self) {
        Mock::given(method("GET"))
            .and(path_regex("^/v1/.*"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("Retry-After", "60")
                    .set_body_json(api_error(429, "API rate limit exceeded")),
            )
            .mount(&self.server)
            .await;
    }
}

fn api_error(status_code: u16, message: &str) -> serde_json::Value {
    json!({
        "error": {
            "status": status_code,
            "message": message
        }
    })
}

fn audio_features_body(track_id: &str, tempo: f64, key: i64) -> serde_json::Value {
    json!({
        "id": track_id,
        "tempo": tempo,
        "key": key,
        "mode": 1,
        "time_signature": 4,
        "danceability": 0.61,
        "energy": 0.48,
        "type": "audio_features",
        "uri": format!("spotify:track:{}", track_id)
    })
}

fn recently_played_body(items: &[PlayHistoryFixture]) -> serde_json::Value {
    json!({
        "items": items.iter().map(PlayHistoryFixture::to_json).collect::<Vec<_>>(),
        "limit": items.len(),
        "next": null,
        "href": "https://api.spotify.com/v1/me/player/recently-played"
    })
}

/// Fixture for one recently-played item
#[derive(Debug, Clone)]
pub struct PlayHistoryFixture {
    pub track_id: String,
    pub name: String,
    pub played_at: String,
    pub album: Option<AlbumFixture>,
    pub artists: Vec<ArtistFixture>,
}

impl PlayHistoryFixture {
    /// Create a playback event with one artist and an album with cover art
    pub fn new(track_id: &str, name: &str, played_at: &str) -> Self {
        Self {
            track_id: track_id.to_string(),
            name: name.to_string(),
            played_at: played_at.to_string(),
            album: Some(AlbumFixture::new("A1", "Music Has the Right to Children")),
            artists: vec![ArtistFixture::new("AR1", "Boards of Canada")],
        }
    }

    /// Replace the album
    pub fn on_album(mut self, id: &str, name: &str) -> Self {
        self.album = Some(AlbumFixture::new(id, name));
        self
    }

    /// Replace the artist list with a single primary artist
    pub fn by(mut self, id: &str, name: &str) -> Self {
        self.artists = vec![ArtistFixture::new(id, name)];
        self
    }

    /// Append a featured artist
    pub fn featuring(mut self, id: &str, name: &str) -> Self {
        self.artists.push(ArtistFixture::new(id, name));
        self
    }

    pub fn without_album(mut self) -> Self {
        self.album = None;
        self
    }

    pub fn without_artists(mut self) -> Self {
        self.artists.clear();
        self
    }

    pub fn without_album_images(mut self) -> Self {
        if let Some(album) = self.album.as_mut() {
            album.image_urls.clear();
        }
        self
    }

    /// Convert to JSON value
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "played_at": self.played_at,
            "context": null,
            "track": {
                "id": self.track_id,
                "name": self.name,
                "type": "track",
                "album": self.album.as_ref().map(AlbumFixture::to_json),
                "artists": self.artists.iter().map(ArtistFixture::to_json).collect::<Vec<_>>()
            }
        })
    }
}

/// Fixture for a simplified album
#[derive(Debug, Clone)]
pub struct AlbumFixture {
    pub id: String,
    pub name: String,
    pub image_urls: Vec<String>,
}

impl AlbumFixture {
    /// Create an album with a large and a small cover image
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            image_urls: vec![
                format!("https://i.scdn.co/image/{}-640", id),
                format!("https://i.scdn.co/image/{}-64", id),
            ],
        }
    }

    /// Convert to JSON value
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "id": self.id,
            "name": self.name,
            "album_type": "album",
            "images": self.image_urls.iter().map(|url| json!({
                "url": url,
                "width": 640,
                "height": 640
            })).collect::<Vec<_>>()
        })
    }
}

/// Fixture for a simplified artist
#[derive(Debug, Clone)]
pub struct ArtistFixture {
    pub id: String,
    pub name: String,
}

impl ArtistFixture {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    /// Convert to JSON value
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "id": self.id,
            "name": self.name,
            "type": "artist"
        })
    }
}
