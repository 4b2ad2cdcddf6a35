//! Error handling for the Encore worker
//!
//! Pipelines never surface these to their caller: each stage chain returns a
//! [`WorkerResult`], and the job entry point logs the error and substitutes
//! the empty result.

use encore_spotify_client::SpotifyError;
use thiserror::Error;

use crate::store::StoreError;

/// Main worker error type
#[derive(Error, Debug)]
pub enum WorkerError {
    /// A provider call failed after retries
    #[error("provider call failed: {0}")]
    Provider(#[from] SpotifyError),

    /// The history store could not be opened or queried
    #[error("history store error: {0}")]
    Store(#[from] StoreError),
}

impl WorkerError {
    /// Check if a later run could succeed without operator action
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Provider(e) => e.is_retryable(),
            Self::Store(StoreError::Connection(_)) | Self::Store(StoreError::Mongo(_)) => true,
            _ => false,
        }
    }

    /// Get a severity level for logging
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Store(StoreError::Configuration(_)) => ErrorSeverity::Critical,

            Self::Store(StoreError::Duplicate { .. }) => ErrorSeverity::Info,

            Self::Store(_) => ErrorSeverity::Error,

            Self::Provider(SpotifyError::Api { status, .. }) if *status < 500 => {
                ErrorSeverity::Error
            }
            Self::Provider(_) => ErrorSeverity::Warning,
        }
    }

    /// Pipeline stage the error came from
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Provider(_) => "provider",
            Self::Store(_) => "history_store",
        }
    }

    /// Log the error with appropriate severity
    pub fn log(&self, job: &'static str) {
        let stage = self.stage();
        match self.severity() {
            ErrorSeverity::Critical => {
                tracing::error!(
                    error = %self,
                    job,
                    stage,
                    retryable = self.is_retryable(),
                    "Critical worker error"
                );
            }
            ErrorSeverity::Error => {
                tracing::error!(
                    error = %self,
                    job,
                    stage,
                    retryable = self.is_retryable(),
                    "Worker error"
                );
            }
            ErrorSeverity::Warning => {
                tracing::warn!(
                    error = %self,
                    job,
                    stage,
                    retryable = self.is_retryable(),
                    "Worker warning"
                );
            }
            ErrorSeverity::Info => {
                tracing::info!(
                    error = %self,
                    job,
                    stage,
                    retryable = self.is_retryable(),
                    "Worker info"
                );
            }
        }
    }
}

/// Error severity levels for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Critical,
    Error,
    Warning,
    Info,
}

/// Result type alias for worker operations
pub type WorkerResult<T> = Result<T, WorkerError>;
