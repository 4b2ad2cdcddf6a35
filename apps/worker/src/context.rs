//! Job invocation contract
//!
//! Every job receives a [`JobContext`] carrying the secret bundle and answers
//! with a [`JobOutput`] wrapping its result.

use encore_shared_config::SecretBundle;
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};

/// Per-invocation inputs
#[derive(Debug, Clone, Default)]
pub struct JobContext {
    pub secrets: SecretBundle,
}

impl JobContext {
    pub fn new(secrets: SecretBundle) -> Self {
        Self { secrets }
    }

    /// Context built from the process environment
    pub fn from_env() -> Self {
        Self::new(SecretBundle::from_env())
    }
}

/// `{ "result": ... }` envelope returned by every job
#[derive(Debug, Clone, PartialEq)]
pub struct JobOutput<T> {
    pub result: T,
}

impl<T> JobOutput<T> {
    pub fn new(result: T) -> Self {
        Self { result }
    }
}

/// How a job result is written inside the envelope
pub trait JobResultValue {
    fn serialize_result<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error>;
}

impl<T: Serialize> JobResultValue for Vec<T> {
    fn serialize_result<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.serialize(serializer)
    }
}

/// A missing result is written as an empty object, not `null`
impl<T: Serialize> JobResultValue for Option<T> {
    fn serialize_result<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Some(value) => value.serialize(serializer),
            None => serializer.serialize_map(Some(0))?.end(),
        }
    }
}

struct ResultField<'a, T>(&'a T);

impl<T: JobResultValue> Serialize for ResultField<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize_result(serializer)
    }
}

impl<T: JobResultValue> Serialize for JobOutput<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("JobOutput", 1)?;
        state.serialize_field("result", &ResultField(&self.result))?;
        state.end()
    }
}
