//! Common test utilities for worker integration tests
//!
//! The provider is mocked with `encore_test_utils::MockSpotifyServer`; the
//! history store is the in-memory backend.

#![allow(unused_imports)]
#![allow(dead_code)]

pub mod fixtures;

pub use fixtures::*;
