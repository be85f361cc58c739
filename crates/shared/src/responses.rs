//! Response types for the probability endpoints

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use trenchodds_domain::{Distribution, DomainError, HitDistribution, InjuryOutcome};

// =============================================================================
// Distributions
// =============================================================================

/// Kept-dice total -> probability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollDistributionResponse {
    pub distribution: BTreeMap<i32, f64>,
}

impl From<&Distribution<i32>> for RollDistributionResponse {
    fn from(dist: &Distribution<i32>) -> Self {
        Self {
            distribution: dist.as_map().clone(),
        }
    }
}

/// Hit count -> probability, serialized with stringified hit counts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessDistributionResponse {
    pub success_distribution: BTreeMap<u32, f64>,
}

impl From<&HitDistribution> for SuccessDistributionResponse {
    fn from(dist: &HitDistribution) -> Self {
        Self {
            success_distribution: dist.as_map().clone(),
        }
    }
}

/// Parallel arrays ready for charting
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BloodMarkerSeries {
    pub markers: Vec<u32>,
    pub probabilities: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InjuryOutcomeResponse {
    pub blood_marker_distribution: BloodMarkerSeries,
    pub out_of_action_probability: f64,
}

impl From<&InjuryOutcome> for InjuryOutcomeResponse {
    fn from(outcome: &InjuryOutcome) -> Self {
        let (markers, probabilities) = outcome.blood_marker_distribution().into_iter().unzip();
        Self {
            blood_marker_distribution: BloodMarkerSeries {
                markers,
                probabilities,
            },
            out_of_action_probability: outcome.out_of_action_probability(),
        }
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Error classification codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // === Client Errors (4xx) ===
    /// Request body could not be parsed
    BadRequest,
    /// Request parsed but a parameter is out of range
    ValidationError,
    /// Request would exceed a configured computation cap
    ResourceLimitExceeded,

    // === Server Errors (5xx) ===
    /// Engine defect; the correlation id identifies the log entry
    InternalError,

    /// Unknown variant for forward compatibility
    #[serde(other)]
    Unknown,
}

impl From<&DomainError> for ErrorCode {
    fn from(err: &DomainError) -> Self {
        match err {
            DomainError::InvalidParameter(_) => ErrorCode::ValidationError,
            DomainError::ResourceLimitExceeded { .. } => ErrorCode::ResourceLimitExceeded,
            DomainError::InternalInvariantViolation(_) => ErrorCode::InternalError,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            correlation_id: None,
        }
    }

    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }
}
