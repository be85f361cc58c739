//! Unified error types for the domain layer
//!
//! Every engine operation either returns a fully normalized result or one of
//! these errors. No partial results are ever produced.

use thiserror::Error;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Out-of-range or inconsistent input (negative roll counts, a dice pool
    /// smaller than the keep count, malformed injury tables, ...)
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Input is valid but would exceed a configured computation cap
    #[error("Resource limit exceeded: {what} of {requested} exceeds the maximum of {max}")]
    ResourceLimitExceeded {
        what: &'static str,
        requested: u64,
        max: u64,
    },

    /// A produced distribution broke the sum-to-one invariant.
    ///
    /// This always indicates a defect in the engine, never bad user input.
    #[error("Internal invariant violated: {0}")]
    InternalInvariantViolation(String),
}

impl DomainError {
    /// Creates an invalid parameter error for rejected user input.
    ///
    /// # Example
    /// ```ignore
    /// if num_rolls == 0 {
    ///     return Err(DomainError::invalid_parameter("num_rolls must be at least 1"));
    /// }
    /// ```
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    /// Create a resource limit error
    pub fn resource_limit(what: &'static str, requested: u64, max: u64) -> Self {
        Self::ResourceLimitExceeded {
            what,
            requested,
            max,
        }
    }

    /// Create an internal invariant violation
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InternalInvariantViolation(msg.into())
    }

    /// Whether the caller is at fault (as opposed to an engine defect).
    pub fn is_caller_error(&self) -> bool {
        !matches!(self, Self::InternalInvariantViolation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_parameter_error() {
        let err = DomainError::invalid_parameter("num_rolls must be at least 1");
        assert!(matches!(err, DomainError::InvalidParameter(_)));
        assert_eq!(
            err.to_string(),
            "Invalid parameter: num_rolls must be at least 1"
        );
        assert!(err.is_caller_error());
    }

    #[test]
    fn test_resource_limit_error() {
        let err = DomainError::resource_limit("dice pool", 12, 8);
        assert!(matches!(err, DomainError::ResourceLimitExceeded { .. }));
        assert_eq!(
            err.to_string(),
            "Resource limit exceeded: dice pool of 12 exceeds the maximum of 8"
        );
        assert!(err.is_caller_error());
    }

    #[test]
    fn test_invariant_error_is_not_caller_error() {
        let err = DomainError::invariant("success distribution sums to 0.9");
        assert!(!err.is_caller_error());
        assert!(err.to_string().contains("sums to 0.9"));
    }
}
