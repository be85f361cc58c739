//! Correlation IDs tying a computation's log lines to its error response.

use std::fmt;

use uuid::Uuid;

/// Identifier attached to one probability computation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Short format (first 8 characters) for log lines.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }

    /// Span that every log line of the computation is recorded under.
    pub fn span(&self, operation: &'static str) -> tracing::Span {
        tracing::info_span!("computation", operation, correlation_id = %self.short())
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
