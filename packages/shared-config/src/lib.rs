//! Shared configuration types for Encore services
//!
//! This crate provides the secret bundle handed to every pipeline run, the
//! credential records resolved from it, and the configuration for the
//! listening-history provider and the history store.

mod error;
mod secrets;
mod spotify;
mod store;

pub use error::{ConfigError, ConfigResult};
pub use secrets::{MongoCredentials, SecretBundle, SpotifyCredentials, KNOWN_SECRETS};
pub use spotify::SpotifyConfig;
pub use store::HistoryStoreConfig;

use std::env;

/// Helper function to get an optional environment variable with a default
pub fn get_env_or_default(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Helper function to parse an environment variable into a specific type
pub fn parse_env<T>(name: &str, default: T) -> ConfigResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) => val
            .parse()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), format!("{}", e))),
        Err(_) => Ok(default),
    }
}
