//! Test fixtures for worker integration tests

use std::sync::Arc;

use encore_shared_config::SecretBundle;
use encore_test_utils::MockSpotifyServer;
use encore_worker::models::{AlbumRef, ArtistRef, ListenedTrack};
use encore_worker::store::MemoryGateway;
use encore_worker::{AppState, Config, JobContext};

pub const STALE_TOKEN: &str = "stale-token";
pub const FRESH_TOKEN: &str = "fresh-token";

/// Secret bundle as the scheduler would pass it
pub fn secrets() -> SecretBundle {
    [
        ("ACCESS_TOKEN", STALE_TOKEN),
        ("REFRESH_TOKEN", "refresh-token"),
        ("CLIENT_ID", "client-id"),
        ("CLIENT_SECRET", "client-secret"),
        ("MONGO_USER", "encore"),
        ("MONGO_PASS", "secret"),
        ("MONGO_DOMAIN", "localhost"),
    ]
    .into_iter()
    .collect()
}

pub fn context() -> JobContext {
    JobContext::new(secrets())
}

/// Worker state talking to `spotify` and storing into `gateway`
pub fn state(spotify: &MockSpotifyServer, gateway: &MemoryGateway) -> AppState {
    AppState::new(
        Config::for_testing(&spotify.url()),
        Arc::new(gateway.clone()),
    )
}

/// Stored playback event on the default Boards of Canada album
pub fn listened(id: &str, name: &str, date: &str) -> ListenedTrack {
    ListenedTrack {
        date: date.to_string(),
        id: id.to_string(),
        name: name.to_string(),
        album: Some(AlbumRef {
            id: Some("A1".to_string()),
            name: Some("Music Has the Right to Children".to_string()),
            image_url: Some("https://i.scdn.co/image/A1-640".to_string()),
        }),
        artist: Some(ArtistRef {
            id: Some("AR1".to_string()),
            name: Some("Boards of Canada".to_string()),
        }),
    }
}

/// Ten stored events: Roygbiv three times, seven singletons
pub fn roygbiv_history() -> Vec<ListenedTrack> {
    let mut tracks = vec![
        listened("T1", "Roygbiv", "2024-05-01T10:00:00.000Z"),
        listened("T1", "Roygbiv", "2024-05-02T10:00:00.000Z"),
        listened("T1", "Roygbiv", "2024-05-03T10:00:00.000Z"),
    ];
    tracks.extend((2..9).map(|n| {
        listened(
            &format!("T{}", n),
            &format!("Track {}", n),
            &format!("2024-05-01T1{}:30:00.000Z", n),
        )
    }));
    tracks
}
