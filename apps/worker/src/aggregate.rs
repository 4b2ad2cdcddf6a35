//! Grouping playback events by track identity
//!
//! Ranking: `count` descending, then earliest first playback, then track id.
//! The MongoDB pipeline in `store::mongo` sorts by the same keys.
//!
//! Playback timestamps are compared as strings. That order is chronological
//! only while every timestamp carries the same fractional-second precision
//! (`"…:00Z"` sorts after `"…:00.123Z"`). The provider always writes
//! millisecond precision, so stored dates share one format.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use crate::models::{ListenedTrack, TrackAggregate, TrackIdentity};

/// Groups below this size are never analysis candidates
pub const MIN_REPEAT_COUNT: u32 = 2;

/// Group `tracks` by identity, keep groups with at least `min_count`
/// events and rank them
pub fn aggregate_repeated(tracks: &[ListenedTrack], min_count: u32) -> Vec<TrackAggregate> {
    let mut groups: HashMap<TrackIdentity, (u32, BTreeSet<String>)> = HashMap::new();

    for track in tracks {
        let (count, dates) = groups.entry(track.identity()).or_default();
        *count += 1;
        dates.insert(track.date.clone());
    }

    let mut aggregates: Vec<TrackAggregate> = groups
        .into_iter()
        .filter(|(_, (count, _))| *count >= min_count)
        .map(|(identity, (count, dates))| TrackAggregate {
            first_played_at: dates.iter().next().cloned().unwrap_or_default(),
            identity,
            count,
            unique_ids: dates.into_iter().collect(),
        })
        .collect();

    aggregates.sort_by(rank);
    aggregates
}

/// Ordering of aggregates, best first
pub fn rank(a: &TrackAggregate, b: &TrackAggregate) -> Ordering {
    b.count
        .cmp(&a.count)
        .then_with(|| a.first_played_at.cmp(&b.first_played_at))
        .then_with(|| a.identity.id.cmp(&b.identity.id))
        .then_with(|| a.identity.cmp(&b.identity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AlbumRef, ArtistRef};

    fn play(id: &str, name: &str, date: &str) -> ListenedTrack {
        ListenedTrack {
            date: date.to_string(),
            id: id.to_string(),
            name: name.to_string(),
            album: Some(AlbumRef {
                id: Some("A1".to_string()),
                name: Some("Album".to_string()),
                image_url: None,
            }),
            artist: Some(ArtistRef {
                id: Some("AR1".to_string()),
                name: Some("Artist".to_string()),
            }),
        }
    }

    fn plays(id: &str, count: usize, start_minute: usize) -> Vec<ListenedTrack> {
        (0..count)
            .map(|i| play(id, id, &format!("2024-05-01T10:{:02}:00.000Z", start_minute + i)))
            .collect()
    }

    #[test]
    fn test_singletons_are_excluded() {
        let tracks = vec![play("T1", "One", "2024-05-01T10:00:00.000Z")];
        assert!(aggregate_repeated(&tracks, MIN_REPEAT_COUNT).is_empty());
    }

    #[test]
    fn test_pairs_are_included() {
        let tracks = plays("T1", 2, 0);
        let result = aggregate_repeated(&tracks, MIN_REPEAT_COUNT);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].count, 2);
        assert_eq!(result[0].unique_ids.len(), 2);
    }

    #[test]
    fn test_ranking_with_tied_top_counts() {
        // counts [5, 5, 3, 2]; T5b started earlier than T5a
        let mut tracks = Vec::new();
        tracks.extend(plays("T5a", 5, 20));
        tracks.extend(plays("T5b", 5, 0));
        tracks.extend(plays("T3", 3, 40));
        tracks.extend(plays("T2", 2, 50));
        tracks.push(play("T1", "T1", "2024-05-01T11:00:00.000Z"));

        let result = aggregate_repeated(&tracks, MIN_REPEAT_COUNT);
        let counts: Vec<u32> = result.iter().map(|a| a.count).collect();
        assert_eq!(counts, vec![5, 5, 3, 2]);
        assert_eq!(result[0].identity.id, "T5b");
        assert_eq!(result[1].identity.id, "T5a");
    }

    #[test]
    fn test_tie_on_first_play_falls_back_to_id() {
        let mut tracks = plays("Tb", 2, 0);
        tracks.extend(plays("Ta", 2, 0));
        let result = aggregate_repeated(&tracks, MIN_REPEAT_COUNT);
        assert_eq!(result[0].identity.id, "Ta");
    }

    #[test]
    fn test_millisecond_timestamps_rank_chronologically() {
        let tracks = vec![
            play("Tlate", "Tlate", "2024-05-01T10:00:00.000Z"),
            play("Tlate", "Tlate", "2024-05-02T10:00:00.000Z"),
            play("Tearly", "Tearly", "2024-05-01T09:59:59.999Z"),
            play("Tearly", "Tearly", "2024-05-03T10:00:00.000Z"),
        ];
        let result = aggregate_repeated(&tracks, MIN_REPEAT_COUNT);
        assert_eq!(result[0].identity.id, "Tearly");
        assert_eq!(result[0].first_played_at, "2024-05-01T09:59:59.999Z");
    }

    #[test]
    fn test_same_id_different_metadata_groups_separately() {
        let mut tracks = plays("T1", 2, 0);
        let mut renamed = play("T1", "T1 (Remastered)", "2024-05-01T10:30:00.000Z");
        renamed.album = None;
        tracks.push(renamed);

        let result = aggregate_repeated(&tracks, 1);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].count, 2);
        assert_eq!(result[1].identity.album, None);
    }

    #[test]
    fn test_unique_ids_are_sorted_and_distinct() {
        let tracks = vec![
            play("T1", "One", "2024-05-01T10:05:00.000Z"),
            play("T1", "One", "2024-05-01T10:00:00.000Z"),
        ];
        let result = aggregate_repeated(&tracks, MIN_REPEAT_COUNT);
        assert_eq!(
            result[0].unique_ids,
            vec!["2024-05-01T10:00:00.000Z", "2024-05-01T10:05:00.000Z"]
        );
        assert_eq!(result[0].first_played_at, "2024-05-01T10:00:00.000Z");
    }
}
