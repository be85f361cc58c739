//! Dice roll parameter value objects
//!
//! A roll is 2d6 by default. `modified_dice` adds dice for advantage (keep the
//! best two) or disadvantage (keep the worst two), and `extra_d6` throws one
//! more die into the pool before the keep rule applies.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Dice in an unmodified roll
pub const BASE_DICE: u32 = 2;

/// Dice kept from the pool after advantage or disadvantage
pub const KEEP_COUNT: u32 = 2;

/// Which end of the sorted pool survives the keep rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeepRule {
    /// Advantage or baseline: sum the highest dice
    Highest,
    /// Disadvantage: sum the lowest dice
    Lowest,
}

/// The dice actually thrown for a roll and how many of them count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DicePool {
    total_dice: u32,
    keep_count: u32,
    keep_rule: KeepRule,
}

impl DicePool {
    /// Create a pool, rejecting pools that cannot supply `keep_count` dice.
    pub fn new(total_dice: u32, keep_count: u32, keep_rule: KeepRule) -> Result<Self, DomainError> {
        if keep_count == 0 {
            return Err(DomainError::invalid_parameter(
                "keep count must be at least 1",
            ));
        }
        if total_dice < keep_count {
            return Err(DomainError::invalid_parameter(format!(
                "dice pool of {total_dice} is smaller than the {keep_count} dice that must be kept"
            )));
        }
        Ok(Self {
            total_dice,
            keep_count,
            keep_rule,
        })
    }

    pub fn total_dice(&self) -> u32 {
        self.total_dice
    }

    pub fn keep_count(&self) -> u32 {
        self.keep_count
    }

    pub fn keep_rule(&self) -> KeepRule {
        self.keep_rule
    }

    /// True when every die is kept, so the pool is a plain sum.
    pub fn keeps_all(&self) -> bool {
        self.total_dice == self.keep_count
    }
}

/// Dice-pool shape shared by hit rolls and injury rolls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RollShape {
    /// Positive: advantage dice. Negative: disadvantage dice.
    pub modified_dice: i32,
    /// Add one more die to the pool before keeping
    pub extra_d6: bool,
    /// Added to the kept total
    pub flat_modifier: i32,
}

impl RollShape {
    pub fn new(modified_dice: i32, extra_d6: bool, flat_modifier: i32) -> Self {
        Self {
            modified_dice,
            extra_d6,
            flat_modifier,
        }
    }

    /// Resolve the advantage/disadvantage rules into a concrete pool.
    pub fn pool(&self) -> Result<DicePool, DomainError> {
        let total = u64::from(BASE_DICE)
            + u64::from(self.modified_dice.unsigned_abs())
            + u64::from(self.extra_d6);
        let total_dice = u32::try_from(total)
            .map_err(|_| DomainError::resource_limit("dice pool", total, u64::from(u32::MAX)))?;
        let keep_rule = if self.modified_dice >= 0 {
            KeepRule::Highest
        } else {
            KeepRule::Lowest
        };
        DicePool::new(total_dice, KEEP_COUNT, keep_rule)
    }

    /// The same roll with one more advantage die.
    pub fn with_extra_advantage(&self) -> Result<Self, DomainError> {
        let modified_dice = self.modified_dice.checked_add(1).ok_or_else(|| {
            DomainError::invalid_parameter("modified_dice overflows when adding advantage")
        })?;
        Ok(Self {
            modified_dice,
            ..*self
        })
    }
}

/// Parameters of a hit roll repeated `num_rolls` times
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RollParameters {
    pub modified_dice: i32,
    pub extra_d6: bool,
    pub flat_modifier: i32,
    /// A modified total at or above this is a hit
    pub threshold: i32,
    pub num_rolls: u32,
}

impl RollParameters {
    pub fn shape(&self) -> RollShape {
        RollShape::new(self.modified_dice, self.extra_d6, self.flat_modifier)
    }

    /// Reject parameter sets no roll can be made from.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.num_rolls == 0 {
            return Err(DomainError::invalid_parameter(
                "num_rolls must be at least 1",
            ));
        }
        self.shape().pool().map(|_| ())
    }
}

impl Default for RollParameters {
    fn default() -> Self {
        Self {
            modified_dice: 0,
            extra_d6: false,
            flat_modifier: 0,
            threshold: 7,
            num_rolls: 1,
        }
    }
}

/// Parameters of the injury roll made for every hit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InjuryParameters {
    pub modified_dice: i32,
    pub extra_d6: bool,
    pub flat_modifier: i32,
}

impl InjuryParameters {
    pub fn shape(&self) -> RollShape {
        RollShape::new(self.modified_dice, self.extra_d6, self.flat_modifier)
    }
}
