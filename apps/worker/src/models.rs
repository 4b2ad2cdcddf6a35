//! Canonical listening-history records
//!
//! Field names follow the stored document shape (`camelCase`), so the same
//! types are written to the store and printed as pipeline output.

use serde::{Deserialize, Serialize};

/// One playback event
///
/// Uniquely identified by (`id`, `date`); the store rejects a second record
/// with the same pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenedTrack {
    /// Provider playback timestamp, kept as the opaque string it arrived as
    pub date: String,
    /// Provider track id
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<AlbumRef>,
    /// Primary artist only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<ArtistRef>,
}

impl ListenedTrack {
    /// Grouping key used by the analysis aggregation
    pub fn identity(&self) -> TrackIdentity {
        TrackIdentity {
            artist: self.artist.as_ref().and_then(|a| a.name.clone()),
            album: self.album.as_ref().and_then(|a| a.name.clone()),
            name: self.name.clone(),
            id: self.id.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// First cover image, if the provider listed any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtistRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Confirmation of one stored playback event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertedTrack {
    /// Store-assigned document id
    pub inserted_id: String,
    pub track: ListenedTrack,
}

/// (artist name, album name, track name, track id)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrackIdentity {
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub album: Option<String>,
    #[serde(default)]
    pub name: String,
    pub id: String,
}

/// Playback events grouped by [`TrackIdentity`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackAggregate {
    pub identity: TrackIdentity,
    /// Number of playback events in the group
    pub count: u32,
    /// Distinct playback timestamps, sorted
    pub unique_ids: Vec<String>,
    /// Earliest playback timestamp, used to break ties between equal counts
    pub first_played_at: String,
}

/// Human-readable key label, or the raw pitch-class index when it has no label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TrackKey {
    Label(String),
    Raw(i64),
}

/// Most repeated track, enriched with audio features
///
/// `id`, `bpm` and `key` come from the audio-feature lookup and are absent
/// when that lookup failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedTrack {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    pub amount_of_listens: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bpm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<TrackKey>,
}

impl EnrichedTrack {
    /// Identity and listen count from the aggregate, no audio features yet
    pub fn from_aggregate(aggregate: &TrackAggregate) -> Self {
        Self {
            id: None,
            name: aggregate.identity.name.clone(),
            artist: aggregate.identity.artist.clone(),
            album: aggregate.identity.album.clone(),
            amount_of_listens: aggregate.count,
            bpm: None,
            key: None,
        }
    }
}
