//! Listening-history persistence
//!
//! A [`HistoryStoreGateway`] opens one [`HistoryStore`] connection per job
//! run. Two backends exist: [`MongoGateway`] for the hosted document store
//! and [`MemoryGateway`] for local runs and tests.

mod memory;
mod mongo;

pub use memory::{MemoryGateway, MemoryTrackStore};
pub use mongo::{repeated_tracks_pipeline, MongoGateway, MongoTrackStore};

use async_trait::async_trait;
use encore_shared_config::{ConfigError, SecretBundle};
use thiserror::Error;

use crate::models::{InsertedTrack, ListenedTrack, TrackAggregate};

/// Errors raised by history store backends
#[derive(Error, Debug)]
pub enum StoreError {
    /// A record with the same (`id`, `date`) is already stored
    #[error("duplicate listened track: id={id} date={date}")]
    Duplicate { id: String, date: String },

    /// The store could not be reached or rejected the credentials
    #[error("history store unreachable: {0}")]
    Connection(String),

    /// Connection settings could not be assembled
    #[error("history store configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    /// A stored or aggregated document did not have the expected shape
    #[error("failed to decode stored document: {0}")]
    Decode(String),
}

impl StoreError {
    /// Create a duplicate-record error for `track`
    pub fn duplicate(track: &ListenedTrack) -> Self {
        Self::Duplicate {
            id: track.id.clone(),
            date: track.date.clone(),
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Opens connections to a history store
#[async_trait]
pub trait HistoryStoreGateway: Send + Sync {
    /// Connect using the store credentials in `secrets`
    async fn open(&self, secrets: &SecretBundle) -> StoreResult<Box<dyn HistoryStore>>;
}

/// An open connection to the listening-history collection
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Persist one playback event
    ///
    /// Fails with [`StoreError::Duplicate`] when the (`id`, `date`) pair is
    /// already stored.
    async fn insert(&self, track: &ListenedTrack) -> StoreResult<InsertedTrack>;

    /// Create the unique (`id`, `date`) index if it does not exist yet
    ///
    /// Only writers need it. Callers treat a failure as non-fatal since the
    /// index may already be provisioned under credentials that cannot
    /// create indexes.
    async fn ensure_unique_index(&self) -> StoreResult<()>;

    /// Tracks with at least `min_count` playback events, best ranked first
    async fn repeated_tracks(&self, min_count: u32) -> StoreResult<Vec<TrackAggregate>>;

    /// Release the connection. Errors are logged, not returned.
    async fn close(&self);
}
