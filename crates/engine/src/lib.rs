//! Trench odds engine library.
//!
//! HTTP service around the `trenchodds-domain` probability engine.
//!
//! ## Structure
//!
//! - `use_cases/` - Computation orchestration (blocking pool, caching)
//! - `infrastructure/` - Configuration, result cache, correlation ids
//! - `api/` - HTTP entry points
//! - `app` - Application composition

pub mod api;
pub mod app;
pub mod infrastructure;
pub mod use_cases;

pub use app::App;
