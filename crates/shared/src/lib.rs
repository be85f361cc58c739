//! Trench odds protocol - wire types for the probability API
//!
//! This crate contains the JSON shapes exchanged with clients:
//! - Request DTOs and their validated conversion into domain parameters
//! - Response DTOs built from domain distributions
//! - Error payloads
//!
//! # Design Principles
//!
//! 1. **No math** - every number is computed by `trenchodds-domain`
//! 2. **Reject, never coerce** - malformed input becomes a `DomainError`
//! 3. **Stable shapes** - distributions are string-keyed JSON maps or parallel arrays

pub mod requests;
pub mod responses;

pub use requests::{
    InjuryOutcomeRequest, InjuryParamsData, RollDistributionRequest, SuccessDistributionRequest,
};
pub use responses::{
    BloodMarkerSeries, ErrorCode, ErrorResponse, InjuryOutcomeResponse, RollDistributionResponse,
    SuccessDistributionResponse,
};
