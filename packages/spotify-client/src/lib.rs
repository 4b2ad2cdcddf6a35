//! Spotify Web API client for Encore
//!
//! This crate provides the provider side of the listening-history pipelines:
//! - OAuth2 refresh-token exchange
//! - Recently played tracks
//! - Per-track audio features (tempo, key)
//!
//! # Example
//!
//! ```rust,no_run
//! use encore_shared_config::{SecretBundle, SpotifyConfig, SpotifyCredentials};
//! use encore_spotify_client::TokenSession;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let credentials = SpotifyCredentials::from_secrets(&SecretBundle::from_env());
//! let mut session = TokenSession::connect(credentials, &SpotifyConfig::default())?;
//!
//! let recent = session.recently_played(10).await?;
//! for item in recent.items.unwrap_or_default() {
//!     println!("{:?}", item.played_at);
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod models;
mod session;

pub use client::SpotifyClient;
pub use error::{SpotifyError, SpotifyResult};
pub use models::{
    AudioFeatures, Image, PlayHistoryItem, RecentlyPlayedResponse, SimplifiedAlbum,
    SimplifiedArtist, SimplifiedTrack,
};
pub use session::TokenSession;
