//! Per-hit injury resolution
//!
//! An injury roll uses the same pool rules as a hit roll. Its modified total
//! is looked up in the injury table instead of being compared to a threshold.

use super::dice::DiceMechanic;
use crate::distribution::Distribution;
use crate::error::DomainError;
use crate::value_objects::{EngineLimits, InjuryEffect, InjuryParameters, InjuryTable};

/// Tally key for injury distributions: finite markers or the out-of-action
/// sentinel
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InjuryResult {
    Markers(u32),
    OutOfAction,
}

impl InjuryResult {
    pub fn markers(&self) -> Option<u32> {
        match self {
            Self::Markers(markers) => Some(*markers),
            Self::OutOfAction => None,
        }
    }

    pub fn is_out_of_action(&self) -> bool {
        matches!(self, Self::OutOfAction)
    }
}

/// Resolves single injury rolls against a validated injury table
#[derive(Debug, Clone)]
pub struct InjuryMechanic<'a> {
    dice: DiceMechanic,
    table: &'a InjuryTable,
}

impl<'a> InjuryMechanic<'a> {
    pub fn new(limits: EngineLimits, table: &'a InjuryTable) -> Result<Self, DomainError> {
        table.validate()?;
        Ok(Self {
            dice: DiceMechanic::new(limits),
            table,
        })
    }

    pub fn limits(&self) -> &EngineLimits {
        self.dice.limits()
    }

    /// Distribution of table effects for one injury roll.
    ///
    /// A target that is already downed rolls with one extra advantage die.
    pub fn effect_distribution(
        &self,
        params: &InjuryParameters,
        already_downed: bool,
    ) -> Result<Distribution<InjuryEffect>, DomainError> {
        let shape = if already_downed {
            params.shape().with_extra_advantage()?
        } else {
            params.shape()
        };
        self.dice
            .kept_dice_distribution(&shape)?
            .map_keys("injury effect", |total| self.table.effect_for(total))
    }

    /// Blood markers (or out of action) inflicted by one hit.
    pub fn per_hit_outcome(
        &self,
        params: &InjuryParameters,
    ) -> Result<Distribution<InjuryResult>, DomainError> {
        self.effect_distribution(params, false)?
            .map_keys("per-hit injury", |effect| self.result_of(effect, false))
    }

    /// Same as [`Self::per_hit_outcome`] for a target that is already downed.
    pub fn per_hit_outcome_while_downed(
        &self,
        params: &InjuryParameters,
    ) -> Result<Distribution<InjuryResult>, DomainError> {
        self.effect_distribution(params, true)?
            .map_keys("per-hit injury", |effect| self.result_of(effect, true))
    }

    pub(crate) fn result_of(&self, effect: InjuryEffect, already_downed: bool) -> InjuryResult {
        match effect {
            InjuryEffect::NoEffect => InjuryResult::Markers(0),
            InjuryEffect::BloodMarkers { markers } => InjuryResult::Markers(markers),
            InjuryEffect::Downed if already_downed => {
                InjuryResult::Markers(self.table.downed_repeat_markers)
            }
            InjuryEffect::Downed => InjuryResult::Markers(self.table.downed_markers),
            InjuryEffect::OutOfAction => InjuryResult::OutOfAction,
        }
    }
}
