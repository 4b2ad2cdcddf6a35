//! Spotify API response models
//!
//! Every field is optional: a partially populated payload still deserializes
//! and the normalizer decides what to do with the gaps.

use serde::{Deserialize, Serialize};

/// `GET /me/player/recently-played` response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecentlyPlayedResponse {
    #[serde(default)]
    pub items: Option<Vec<PlayHistoryItem>>,
}

/// One playback event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayHistoryItem {
    /// ISO-8601 timestamp of the playback
    #[serde(default)]
    pub played_at: Option<String>,
    #[serde(default)]
    pub track: Option<SimplifiedTrack>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimplifiedTrack {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub album: Option<SimplifiedAlbum>,
    #[serde(default)]
    pub artists: Option<Vec<SimplifiedArtist>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimplifiedAlbum {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub images: Option<Vec<Image>>,
}

/// Cover art; Spotify lists the widest image first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimplifiedArtist {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// `GET /audio-features/{id}` response (fields not consumed here are dropped)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AudioFeatures {
    #[serde(default)]
    pub id: Option<String>,
    /// Estimated tempo in beats per minute
    #[serde(default)]
    pub tempo: Option<f64>,
    /// Pitch class 0-11, or -1 when no key was detected
    #[serde(default)]
    pub key: Option<i64>,
}

/// Accounts service token response
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
}

/// Spotify API error envelope: `{"error": {"status": 401, "message": "..."}}`
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

/// The accounts service uses `{"error": "...", "error_description": "..."}` instead,
/// so `error` is accepted as either shape.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ErrorBody {
    Api { message: String },
    OAuth(String),
}
