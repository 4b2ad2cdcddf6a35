//! Job definitions and handlers
//!
//! Both jobs run once per external trigger:
//! - Listening-history ingestion from the provider into the history store
//! - Repeated-track analysis with audio-feature enrichment
//!
//! A job never fails toward its caller. Errors are logged and the job answers
//! with its empty result.

pub mod analyze_history;
pub mod ingest_history;
