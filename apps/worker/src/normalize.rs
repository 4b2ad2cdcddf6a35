//! Provider responses to canonical records
//!
//! None of these functions fail: missing pieces become `None` or an empty
//! sequence, and an unknown pitch class is passed through as a raw index.

use encore_spotify_client::{
    AudioFeatures, PlayHistoryItem, RecentlyPlayedResponse, SimplifiedAlbum, SimplifiedArtist,
};

use crate::models::{AlbumRef, ArtistRef, ListenedTrack, TrackKey};

/// Pitch class labels, index 0 = C
const KEY_LABELS: [&str; 12] = [
    "C", "C♯/D♭", "D", "D♯/E♭", "E", "F", "F♯/G♭", "G", "G♯/A♭", "A", "A♯/B♭", "B",
];

/// Audio features reduced to what the analysis output needs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackFeatures {
    pub id: Option<String>,
    pub bpm: Option<f64>,
    pub key: Option<TrackKey>,
}

/// Map a recently-played response to playback events, newest first
///
/// Items without a timestamp or track id are dropped; they cannot be stored
/// under the (`id`, `date`) identity.
pub fn listened_tracks(response: Option<&RecentlyPlayedResponse>) -> Vec<ListenedTrack> {
    let Some(items) = response.and_then(|r| r.items.as_ref()) else {
        return Vec::new();
    };

    items.iter().filter_map(listened_track).collect()
}

fn listened_track(item: &PlayHistoryItem) -> Option<ListenedTrack> {
    let track = item.track.as_ref();
    let (Some(date), Some(id)) = (
        item.played_at.clone(),
        track.and_then(|t| t.id.clone()),
    ) else {
        tracing::warn!(
            played_at = ?item.played_at,
            has_track = track.is_some(),
            "Skipping play history item without timestamp or track id"
        );
        return None;
    };
    let track = track?;

    Some(ListenedTrack {
        date,
        id,
        name: track.name.clone().unwrap_or_default(),
        album: album(track.album.as_ref()),
        artist: primary_artist(track.artists.as_deref()),
    })
}

/// Album name, id and first cover image
pub fn album(album: Option<&SimplifiedAlbum>) -> Option<AlbumRef> {
    let album = album?;
    Some(AlbumRef {
        id: album.id.clone(),
        name: album.name.clone(),
        image_url: album
            .images
            .as_ref()
            .and_then(|images| images.first())
            .and_then(|image| image.url.clone()),
    })
}

/// First listed artist; featured artists are discarded
pub fn primary_artist(artists: Option<&[SimplifiedArtist]>) -> Option<ArtistRef> {
    let main = artists?.first()?;
    Some(ArtistRef {
        id: main.id.clone(),
        name: main.name.clone(),
    })
}

/// Label for a pitch-class index, or the index itself outside `0..12`
pub fn key_of(index: i64) -> TrackKey {
    usize::try_from(index)
        .ok()
        .and_then(|i| KEY_LABELS.get(i))
        .map(|label| TrackKey::Label(label.to_string()))
        .unwrap_or(TrackKey::Raw(index))
}

/// [`key_of`] for an index that may be missing
pub fn key_of_index(index: Option<i64>) -> Option<TrackKey> {
    index.map(key_of)
}

pub fn track_features(features: &AudioFeatures) -> TrackFeatures {
    TrackFeatures {
        id: features.id.clone(),
        bpm: features.tempo,
        key: key_of_index(features.key),
    }
}
