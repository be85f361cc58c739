//! Request types for the probability endpoints
//!
//! Field names and defaults match the public web API: omitted roll fields
//! fall back to a plain 2d6 roll against 7, made once.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use trenchodds_domain::{
    Distribution, DomainError, HitDistribution, InjuryParameters, InjuryTable, ResolutionMode,
    RollParameters, RollShape,
};

fn default_threshold() -> i32 {
    RollParameters::default().threshold
}

fn default_num_rolls() -> i64 {
    i64::from(RollParameters::default().num_rolls)
}

/// Raw kept-dice distribution for a single roll
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollDistributionRequest {
    #[serde(default)]
    pub modified_dice: i32,
    #[serde(default)]
    pub extra_d6: bool,
    #[serde(default)]
    pub flat_modifier: i32,
}

impl From<RollDistributionRequest> for RollShape {
    fn from(req: RollDistributionRequest) -> Self {
        RollShape::new(req.modified_dice, req.extra_d6, req.flat_modifier)
    }
}

/// Hit distribution over `num_rolls` rolls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessDistributionRequest {
    #[serde(default)]
    pub modified_dice: i32,
    #[serde(default)]
    pub extra_d6: bool,
    #[serde(default)]
    pub flat_modifier: i32,
    #[serde(default = "default_threshold")]
    pub threshold: i32,
    /// Signed on the wire so negative counts get a descriptive rejection
    #[serde(default = "default_num_rolls")]
    pub num_rolls: i64,
}

impl Default for SuccessDistributionRequest {
    fn default() -> Self {
        Self {
            modified_dice: 0,
            extra_d6: false,
            flat_modifier: 0,
            threshold: default_threshold(),
            num_rolls: default_num_rolls(),
        }
    }
}

impl TryFrom<SuccessDistributionRequest> for RollParameters {
    type Error = DomainError;

    fn try_from(req: SuccessDistributionRequest) -> Result<Self, Self::Error> {
        if req.num_rolls < 1 {
            return Err(DomainError::invalid_parameter(format!(
                "num_rolls must be at least 1, got {}",
                req.num_rolls
            )));
        }
        let num_rolls = u32::try_from(req.num_rolls).map_err(|_| {
            DomainError::invalid_parameter(format!("num_rolls {} is out of range", req.num_rolls))
        })?;

        let params = RollParameters {
            modified_dice: req.modified_dice,
            extra_d6: req.extra_d6,
            flat_modifier: req.flat_modifier,
            threshold: req.threshold,
            num_rolls,
        };
        params.validate()?;
        Ok(params)
    }
}

/// Injury roll parameters as sent by clients
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjuryParamsData {
    #[serde(default)]
    pub modified_dice: i32,
    #[serde(default)]
    pub extra_d6: bool,
    #[serde(default)]
    pub flat_modifier: i32,
}

impl From<InjuryParamsData> for InjuryParameters {
    fn from(data: InjuryParamsData) -> Self {
        InjuryParameters {
            modified_dice: data.modified_dice,
            extra_d6: data.extra_d6,
            flat_modifier: data.flat_modifier,
        }
    }
}

/// Injury outcome for a previously computed hit distribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InjuryOutcomeRequest {
    /// Hit count -> probability; JSON object keys are the stringified counts
    pub hit_distribution: BTreeMap<u32, f64>,
    #[serde(default)]
    pub injury_params: InjuryParamsData,
    /// Overrides the server's configured injury table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub injury_table: Option<InjuryTable>,
    #[serde(default)]
    pub resolution: ResolutionMode,
}

impl InjuryOutcomeRequest {
    /// Validate the supplied hit distribution.
    pub fn hit_distribution(&self) -> Result<HitDistribution, DomainError> {
        Distribution::from_masses(self.hit_distribution.iter().map(|(k, p)| (*k, *p)))
    }

    pub fn injury_parameters(&self) -> InjuryParameters {
        self.injury_params.into()
    }
}
