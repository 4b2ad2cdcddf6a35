//! Secret bundle and the credential records resolved from it

use std::collections::HashMap;
use std::env;
use std::fmt;

use serde::Deserialize;

/// Secret names a pipeline run may read
pub const KNOWN_SECRETS: [&str; 7] = [
    "ACCESS_TOKEN",
    "REFRESH_TOKEN",
    "CLIENT_ID",
    "CLIENT_SECRET",
    "MONGO_USER",
    "MONGO_PASS",
    "MONGO_DOMAIN",
];

/// Opaque mapping of secret name to value, as supplied by the trigger
#[derive(Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct SecretBundle {
    values: HashMap<String, String>,
}

impl SecretBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect every known secret that is present in the process environment
    pub fn from_env() -> Self {
        let values = KNOWN_SECRETS
            .iter()
            .filter_map(|name| env::var(name).ok().map(|v| (name.to_string(), v)))
            .collect();
        Self { values }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Value of `name`, or an empty string when the secret is absent
    fn get_or_empty(&self, name: &str) -> String {
        self.get(name).unwrap_or_default().to_string()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for SecretBundle
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl fmt::Debug for SecretBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.values.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("SecretBundle")
            .field("names", &names)
            .field("values", &"[REDACTED]")
            .finish()
    }
}

/// OAuth2 credentials for the listening-history provider
///
/// Missing secrets resolve to empty strings; they surface later as a failed
/// refresh or a rejected provider call.
#[derive(Clone, Default)]
pub struct SpotifyCredentials {
    pub access_token: String,
    pub refresh_token: String,
    pub client_id: String,
    pub client_secret: String,
}

impl SpotifyCredentials {
    pub fn from_secrets(secrets: &SecretBundle) -> Self {
        Self {
            access_token: secrets.get_or_empty("ACCESS_TOKEN"),
            refresh_token: secrets.get_or_empty("REFRESH_TOKEN"),
            client_id: secrets.get_or_empty("CLIENT_ID"),
            client_secret: secrets.get_or_empty("CLIENT_SECRET"),
        }
    }
}

impl fmt::Debug for SpotifyCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpotifyCredentials")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Login for the history store
#[derive(Clone, Default)]
pub struct MongoCredentials {
    pub user: String,
    pub password: String,
    pub domain: String,
}

impl MongoCredentials {
    pub fn from_secrets(secrets: &SecretBundle) -> Self {
        Self {
            user: secrets.get_or_empty("MONGO_USER"),
            password: secrets.get_or_empty("MONGO_PASS"),
            domain: secrets.get_or_empty("MONGO_DOMAIN"),
        }
    }
}

impl fmt::Debug for MongoCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MongoCredentials")
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("domain", &self.domain)
            .finish()
    }
}
