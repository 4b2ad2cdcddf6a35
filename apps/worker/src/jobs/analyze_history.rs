//! Repeated-track analysis job
//!
//! Finds the most repeated track in the stored history and enriches it with
//! tempo and key from the provider's audio features.

use encore_shared_config::SpotifyCredentials;
use encore_spotify_client::TokenSession;
use tracing::instrument;

use crate::aggregate::MIN_REPEAT_COUNT;
use crate::context::{JobContext, JobOutput};
use crate::error::WorkerResult;
use crate::models::{EnrichedTrack, TrackAggregate};
use crate::normalize::{self, TrackFeatures};
use crate::AppState;

pub const JOB_NAME: &str = "analyze_history";

/// Execute the analysis job
///
/// Answers `None` when no track was played at least twice or the store
/// could not be read. A failed audio-feature lookup still yields the track
/// without `id`, `bpm` and `key`.
#[instrument(skip(state, context))]
pub async fn execute(state: &AppState, context: &JobContext) -> JobOutput<Option<EnrichedTrack>> {
    match run(state, context).await {
        Ok(track) => JobOutput::new(track),
        Err(e) => {
            e.log(JOB_NAME);
            JobOutput::new(None)
        }
    }
}

async fn run(state: &AppState, context: &JobContext) -> WorkerResult<Option<EnrichedTrack>> {
    let aggregates = repeated_tracks(state, context).await?;

    let Some(top) = aggregates.into_iter().next() else {
        tracing::info!("No track has been played more than once");
        return Ok(None);
    };

    tracing::info!(
        id = %top.identity.id,
        name = %top.identity.name,
        count = top.count,
        "Most repeated track found"
    );

    let mut track = EnrichedTrack::from_aggregate(&top);
    match audio_features(state, context, &top.identity.id).await {
        Ok(features) => apply_features(&mut track, features),
        Err(e) => e.log(JOB_NAME),
    }

    Ok(Some(track))
}

/// Ranked repeated-track groups; the store is closed before returning
async fn repeated_tracks(
    state: &AppState,
    context: &JobContext,
) -> WorkerResult<Vec<TrackAggregate>> {
    let store = state.gateway.open(&context.secrets).await?;

    let result = store.repeated_tracks(MIN_REPEAT_COUNT).await;
    store.close().await;

    Ok(result?)
}

async fn audio_features(
    state: &AppState,
    context: &JobContext,
    track_id: &str,
) -> WorkerResult<TrackFeatures> {
    let credentials = SpotifyCredentials::from_secrets(&context.secrets);
    let mut session = TokenSession::connect(credentials, &state.config.spotify)?;

    let features = session.audio_features(track_id).await?;
    Ok(normalize::track_features(&features))
}

fn apply_features(track: &mut EnrichedTrack, features: TrackFeatures) {
    track.id = features.id;
    track.bpm = features.bpm;
    track.key = features.key;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TrackIdentity, TrackKey};

    #[test]
    fn test_apply_features() {
        let aggregate = TrackAggregate {
            identity: TrackIdentity {
                artist: Some("Boards of Canada".to_string()),
                album: None,
                name: "Roygbiv".to_string(),
                id: "T1".to_string(),
            },
            count: 3,
            unique_ids: vec![],
            first_played_at: String::new(),
        };
        let mut track = EnrichedTrack::from_aggregate(&aggregate);
        apply_features(
            &mut track,
            TrackFeatures {
                id: Some("T1".to_string()),
                bpm: Some(100.2),
                key: Some(TrackKey::Raw(-1)),
            },
        );

        assert_eq!(track.id.as_deref(), Some("T1"));
        assert_eq!(track.bpm, Some(100.2));
        assert_eq!(track.key, Some(TrackKey::Raw(-1)));
        assert_eq!(track.amount_of_listens, 3);
        assert_eq!(track.album, None);
    }
}
