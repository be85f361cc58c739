//! Application state and composition.

use crate::infrastructure::config::EngineConfig;
use crate::use_cases;

/// Main application state.
///
/// Passed to HTTP handlers via Axum state.
pub struct App {
    pub use_cases: UseCases,
}

/// Container for all use cases.
pub struct UseCases {
    pub probability: use_cases::ProbabilityUseCases,
}

impl App {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            use_cases: UseCases {
                probability: use_cases::ProbabilityUseCases::from_config(config),
            },
        }
    }
}
