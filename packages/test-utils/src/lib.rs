//! Shared test utilities for Encore workspace
//!
//! This crate provides a mock of the listening-history provider so the
//! client and pipeline suites can run without network access.
//!
//! # Mock Services
//!
//! - [`MockSpotifyServer`] - Mock Spotify accounts service and Web API
//!
//! # Example
//!
//! ```rust,ignore
//! use encore_test_utils::{MockSpotifyServer, PlayHistoryFixture};
//!
//! #[tokio::test]
//! async fn test_with_mocks() {
//!     let spotify = MockSpotifyServer::start().await;
//!     spotify.mock_token_refresh("fresh-token").await;
//!     spotify
//!         .mock_recently_played(10, vec![PlayHistoryFixture::new("T1", "Roygbiv", "2024-05-01T10:00:00Z")])
//!         .await;
//!
//!     // Use SpotifyConfig::with_url(spotify.url()) to configure your client
//! }
//! ```

mod spotify;

pub use spotify::{AlbumFixture, ArtistFixture, MockSpotifyServer, PlayHistoryFixture};
