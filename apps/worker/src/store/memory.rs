//! In-process history store
//!
//! Keeps records in an `Arc<RwLock<Vec<_>>>` shared by the gateway and every
//! connection it opens, so a test can inspect what a job wrote. Locks recover
//! from poisoning with `unwrap_or_else(|e| e.into_inner())`.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use encore_shared_config::SecretBundle;
use uuid::Uuid;

use super::{HistoryStore, HistoryStoreGateway, StoreError, StoreResult};
use crate::aggregate::aggregate_repeated;
use crate::models::{InsertedTrack, ListenedTrack, TrackAggregate};

/// Gateway for the in-process store
#[derive(Debug, Clone, Default)]
pub struct MemoryGateway {
    tracks: Arc<RwLock<Vec<ListenedTrack>>>,
    unreachable: bool,
    read_only: bool,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gateway pre-populated with `tracks`
    ///
    /// Seed data is taken as-is; uniqueness is only enforced on insert.
    pub fn with_tracks(tracks: Vec<ListenedTrack>) -> Self {
        Self {
            tracks: Arc::new(RwLock::new(tracks)),
            ..Self::default()
        }
    }

    /// Gateway whose `open` always fails with [`StoreError::Connection`]
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    /// Connections from this gateway refuse index creation, like a store user
    /// without the `createIndex` privilege
    pub fn read_only_indexes(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Snapshot of every stored record, in insertion order
    pub fn tracks(&self) -> Vec<ListenedTrack> {
        self.tracks.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl HistoryStoreGateway for MemoryGateway {
    async fn open(&self, _secrets: &SecretBundle) -> StoreResult<Box<dyn HistoryStore>> {
        if self.unreachable {
            return Err(StoreError::Connection(
                "in-memory store marked unreachable".to_string(),
            ));
        }
        tracing::debug!("Opened in-memory history store");
        Ok(Box::new(MemoryTrackStore {
            tracks: Arc::clone(&self.tracks),
            read_only: self.read_only,
        }))
    }
}

/// Connection handed out by [`MemoryGateway`]
#[derive(Debug, Clone)]
pub struct MemoryTrackStore {
    tracks: Arc<RwLock<Vec<ListenedTrack>>>,
    read_only: bool,
}

#[async_trait]
impl HistoryStore for MemoryTrackStore {
    async fn insert(&self, track: &ListenedTrack) -> StoreResult<InsertedTrack> {
        let mut tracks = self.tracks.write().unwrap_or_else(|e| e.into_inner());
        if tracks
            .iter()
            .any(|stored| stored.id == track.id && stored.date == track.date)
        {
            return Err(StoreError::duplicate(track));
        }
        tracks.push(track.clone());

        Ok(InsertedTrack {
            inserted_id: Uuid::new_v4().to_string(),
            track: track.clone(),
        })
    }

    // uniqueness is checked on every insert
    async fn ensure_unique_index(&self) -> StoreResult<()> {
        if self.read_only {
            return Err(StoreError::Connection(
                "not authorized to create indexes".to_string(),
            ));
        }
        Ok(())
    }

    async fn repeated_tracks(&self, min_count: u32) -> StoreResult<Vec<TrackAggregate>> {
        let tracks = self.tracks.read().unwrap_or_else(|e| e.into_inner());
        Ok(aggregate_repeated(&tracks, min_count))
    }

    async fn close(&self) {}
}
