//! Listening-history ingestion job
//!
//! Pulls the most recent playback events from the provider and stores each
//! one. Already-stored events are rejected by the store's (`id`, `date`)
//! uniqueness constraint and left out of the result.

use encore_shared_config::SpotifyCredentials;
use encore_spotify_client::TokenSession;
use futures_util::stream::{self, StreamExt};
use tracing::instrument;

use crate::context::{JobContext, JobOutput};
use crate::error::WorkerResult;
use crate::models::{InsertedTrack, ListenedTrack};
use crate::normalize;
use crate::store::HistoryStore;
use crate::AppState;

pub const JOB_NAME: &str = "ingest_history";

/// Execute the ingestion job
///
/// Returns the newly stored events in provider order; empty when nothing new
/// was played or any stage failed.
#[instrument(skip(state, context))]
pub async fn execute(state: &AppState, context: &JobContext) -> JobOutput<Vec<InsertedTrack>> {
    match run(state, context).await {
        Ok(inserted) => {
            tracing::info!(inserted = inserted.len(), "Listening history ingested");
            JobOutput::new(inserted)
        }
        Err(e) => {
            e.log(JOB_NAME);
            JobOutput::new(Vec::new())
        }
    }
}

async fn run(state: &AppState, context: &JobContext) -> WorkerResult<Vec<InsertedTrack>> {
    let store = state.gateway.open(&context.secrets).await?;

    if let Err(e) = store.ensure_unique_index().await {
        tracing::warn!(
            error = %e,
            "Could not ensure unique (id, date) index, relying on an existing one"
        );
    }

    let result = ingest(state, context, store.as_ref()).await;
    store.close().await;

    result
}

async fn ingest(
    state: &AppState,
    context: &JobContext,
    store: &dyn HistoryStore,
) -> WorkerResult<Vec<InsertedTrack>> {
    let credentials = SpotifyCredentials::from_secrets(&context.secrets);
    let mut session = TokenSession::connect(credentials, &state.config.spotify)?;

    let response = session
        .recently_played(state.config.history_limit())
        .await?;
    let tracks = normalize::listened_tracks(Some(&response));

    if tracks.is_empty() {
        tracing::info!("Provider returned no playback events");
        return Ok(Vec::new());
    }

    tracing::debug!(events = tracks.len(), "Storing playback events");
    Ok(insert_all(store, &tracks, state.config.batch_size).await)
}

/// Insert every track with at most `concurrency` inserts in flight
///
/// A failed insert only drops its own record. Results keep input order.
pub async fn insert_all(
    store: &dyn HistoryStore,
    tracks: &[ListenedTrack],
    concurrency: usize,
) -> Vec<InsertedTrack> {
    let outcomes: Vec<_> = stream::iter(tracks)
        .map(|track| async move { (track, store.insert(track).await) })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut inserted = Vec::with_capacity(outcomes.len());
    let mut duplicates = 0usize;

    for (track, outcome) in outcomes {
        match outcome {
            Ok(record) => inserted.push(record),
            Err(e) if e.is_duplicate() => {
                duplicates += 1;
                tracing::debug!(id = %track.id, date = %track.date, "Playback event already stored");
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    id = %track.id,
                    date = %track.date,
                    "Failed to store playback event"
                );
            }
        }
    }

    if duplicates > 0 {
        tracing::info!(duplicates, "Skipped already stored playback events");
    }

    inserted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{HistoryStoreGateway, MemoryGateway};
    use encore_shared_config::SecretBundle;

    fn play(id: &str, date: &str) -> ListenedTrack {
        ListenedTrack {
            date: date.to_string(),
            id: id.to_string(),
            name: format!("Track {id}"),
            album: None,
            artist: None,
        }
    }

    #[tokio::test]
    async fn test_insert_all_keeps_order_and_skips_duplicates() {
        let gateway = MemoryGateway::with_tracks(vec![play("T2", "d2")]);
        let store = gateway.open(&SecretBundle::new()).await.unwrap();

        let tracks = vec![play("T1", "d1"), play("T2", "d2"), play("T3", "d3")];
        let inserted = insert_all(store.as_ref(), &tracks, 2).await;

        let ids: Vec<&str> = inserted.iter().map(|i| i.track.id.as_str()).collect();
        assert_eq!(ids, ["T1", "T3"]);
        assert_eq!(gateway.tracks().len(), 3);
    }

    #[tokio::test]
    async fn test_insert_all_within_one_batch() {
        let gateway = MemoryGateway::new();
        let store = gateway.open(&SecretBundle::new()).await.unwrap();

        // the same event twice in one response is stored once
        let tracks = vec![play("T1", "d1"), play("T1", "d1")];
        let inserted = insert_all(store.as_ref(), &tracks, 10).await;
        assert_eq!(inserted.len(), 1);
        assert_eq!(gateway.tracks().len(), 1);
    }

    #[tokio::test]
    async fn test_insert_all_zero_concurrency_still_runs() {
        let gateway = MemoryGateway::new();
        let store = gateway.open(&SecretBundle::new()).await.unwrap();
        let inserted = insert_all(store.as_ref(), &[play("T1", "d1")], 0).await;
        assert_eq!(inserted.len(), 1);
    }
}
