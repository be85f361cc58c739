//! Infrastructure implementations.
//!
//! Process-level concerns around the pure engine: configuration, result
//! caching, and log correlation.

pub mod cache;
pub mod config;
pub mod correlation;
