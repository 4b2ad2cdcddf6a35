//! Integration tests for the repeated-track analysis job

mod common;

use common::*;
use encore_test_utils::MockSpotifyServer;
use encore_worker::jobs::analyze_history;
use encore_worker::models::TrackKey;
use encore_worker::store::MemoryGateway;
use serde_json::json;
use tracing_test::traced_test;

#[tokio::test]
async fn test_most_repeated_track_is_enriched() {
    let spotify = MockSpotifyServer::start().await;
    spotify.mock_token_refresh(FRESH_TOKEN).await;
    spotify
        .mock_audio_features_for_token(FRESH_TOKEN, "T1", 100.2, 9)
        .await;
    let gateway = MemoryGateway::with_tracks(roygbiv_history());

    let output = analyze_history::execute(&state(&spotify, &gateway), &context()).await;

    assert_eq!(
        serde_json::to_value(&output).unwrap(),
        json!({
            "result": {
                "id": "T1",
                "name": "Roygbiv",
                "artist": "Boards of Canada",
                "album": "Music Has the Right to Children",
                "amountOfListens": 3,
                "bpm": 100.2,
                "key": "A"
            }
        })
    );
}

#[tokio::test]
async fn test_empty_history_makes_no_provider_call() {
    let spotify = MockSpotifyServer::start().await;
    spotify.mock_token_refresh(FRESH_TOKEN).await;
    spotify.mock_audio_features("T1", 100.2, 9).await;
    let gateway = MemoryGateway::new();

    let output = analyze_history::execute(&state(&spotify, &gateway), &context()).await;

    assert_eq!(output.result, None);
    assert_eq!(serde_json::to_value(&output).unwrap(), json!({ "result": {} }));
    assert_eq!(spotify.request_count("/v1/audio-features").await, 0);
    assert_eq!(spotify.request_count("/api/token").await, 0);
}

#[tokio::test]
async fn test_singletons_only_yield_empty_result() {
    let spotify = MockSpotifyServer::start().await;
    let gateway = MemoryGateway::with_tracks(vec![
        listened("T1", "Roygbiv", "2024-05-01T10:00:00.000Z"),
        listened("T2", "Aquarius", "2024-05-01T10:05:00.000Z"),
    ]);

    let output = analyze_history::execute(&state(&spotify, &gateway), &context()).await;

    assert_eq!(output.result, None);
    assert_eq!(spotify.request_count("/").await, 0);
}

#[tokio::test]
#[traced_test]
async fn test_feature_failure_returns_partial_track() {
    let spotify = MockSpotifyServer::start().await;
    spotify.mock_token_refresh(FRESH_TOKEN).await;
    spotify
        .mock_audio_features_failure("T1", 404, "analysis not found")
        .await;
    let gateway = MemoryGateway::with_tracks(roygbiv_history());

    let output = analyze_history::execute(&state(&spotify, &gateway), &context()).await;

    assert_eq!(
        serde_json::to_value(&output).unwrap(),
        json!({
            "result": {
                "name": "Roygbiv",
                "artist": "Boards of Canada",
                "album": "Music Has the Right to Children",
                "amountOfListens": 3
            }
        })
    );
    assert!(logs_contain("analysis not found"));
}

#[tokio::test]
async fn test_failed_refresh_uses_stale_token() {
    let spotify = MockSpotifyServer::start().await;
    spotify.mock_token_refresh_failure(400, "invalid_grant").await;
    spotify
        .mock_audio_features_for_token(STALE_TOKEN, "T1", 100.2, 9)
        .await;
    let gateway = MemoryGateway::with_tracks(roygbiv_history());

    let output = analyze_history::execute(&state(&spotify, &gateway), &context()).await;

    let track = output.result.unwrap();
    assert_eq!(track.bpm, Some(100.2));
    assert_eq!(track.key, Some(TrackKey::Label("A".to_string())));
}

#[tokio::test]
async fn test_unknown_key_index_passes_through() {
    let spotify = MockSpotifyServer::start().await;
    spotify.mock_token_refresh(FRESH_TOKEN).await;
    spotify.mock_audio_features("T1", 92.0, -1).await;
    let gateway = MemoryGateway::with_tracks(roygbiv_history());

    let output = analyze_history::execute(&state(&spotify, &gateway), &context()).await;

    let value = serde_json::to_value(&output).unwrap();
    assert_eq!(value["result"]["key"], json!(-1));
}

#[tokio::test]
async fn test_tied_counts_pick_earliest_first_play() {
    let spotify = MockSpotifyServer::start().await;
    spotify.mock_token_refresh(FRESH_TOKEN).await;
    spotify.mock_audio_features("T2", 120.0, 0).await;
    spotify.mock_audio_features("T1", 100.2, 9).await;
    let gateway = MemoryGateway::with_tracks(vec![
        listened("T1", "Roygbiv", "2024-05-02T10:00:00.000Z"),
        listened("T1", "Roygbiv", "2024-05-03T10:00:00.000Z"),
        listened("T2", "Aquarius", "2024-05-01T09:00:00.000Z"),
        listened("T2", "Aquarius", "2024-05-04T09:00:00.000Z"),
    ]);

    let output = analyze_history::execute(&state(&spotify, &gateway), &context()).await;

    let track = output.result.unwrap();
    assert_eq!(track.name, "Aquarius");
    assert_eq!(track.amount_of_listens, 2);
    assert_eq!(spotify.request_count("/v1/audio-features/T1").await, 0);
}

#[tokio::test]
#[traced_test]
async fn test_store_unreachable_returns_empty() {
    let spotify = MockSpotifyServer::start().await;
    let gateway = MemoryGateway::unreachable();

    let output = analyze_history::execute(&state(&spotify, &gateway), &context()).await;

    assert_eq!(output.result, None);
    assert_eq!(spotify.request_count("/").await, 0);
    assert!(logs_contain("history store unreachable"));
}

#[tokio::test]
#[traced_test]
async fn test_read_only_store_user_can_analyze() {
    let spotify = MockSpotifyServer::start().await;
    spotify.mock_token_refresh(FRESH_TOKEN).await;
    spotify.mock_audio_features("T1", 100.2, 9).await;
    let gateway = MemoryGateway::with_tracks(roygbiv_history()).read_only_indexes();

    let output = analyze_history::execute(&state(&spotify, &gateway), &context()).await;

    assert_eq!(output.result.unwrap().amount_of_listens, 3);
    assert!(!logs_contain("Could not ensure unique"));
}
