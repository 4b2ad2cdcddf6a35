//! Encore worker
//!
//! Two externally triggered jobs over a user's listening history:
//!
//! - [`jobs::ingest_history`] copies recently played tracks from Spotify into
//!   the history store, one document per playback event.
//! - [`jobs::analyze_history`] finds the most repeated track and looks up its
//!   tempo and key.
//!
//! Each job takes the shared [`AppState`] and a per-invocation
//! [`JobContext`], and always answers with a [`JobOutput`].

use std::sync::Arc;

pub mod aggregate;
pub mod config;
pub mod context;
pub mod error;
pub mod jobs;
pub mod models;
pub mod normalize;
pub mod store;

pub use config::{Config, StoreBackend};
pub use context::{JobContext, JobOutput};
pub use error::{WorkerError, WorkerResult};

use store::{HistoryStoreGateway, MemoryGateway, MongoGateway};

/// State shared by every job run in this process
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub gateway: Arc<dyn HistoryStoreGateway>,
}

impl AppState {
    pub fn new(config: Config, gateway: Arc<dyn HistoryStoreGateway>) -> Self {
        Self { config, gateway }
    }

    /// State with the store backend selected by `config.store_backend`
    pub fn from_config(config: Config) -> Self {
        let gateway: Arc<dyn HistoryStoreGateway> = match config.store_backend {
            StoreBackend::Mongo => Arc::new(MongoGateway::new(config.store.clone())),
            StoreBackend::Memory => Arc::new(MemoryGateway::new()),
        };
        Self::new(config, gateway)
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
