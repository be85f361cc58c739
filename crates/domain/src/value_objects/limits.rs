//! Computation caps guarding against pathological input
//!
//! Keep-best/worst pools are resolved by enumerating every ordered outcome,
//! which costs `6^total_dice`. Roll counts drive the size of every hit and
//! injury table. Custom injury tables with large, uneven marker counts can
//! make the running injury tally grow with every hit, so its size is capped
//! as well.

use serde::{Deserialize, Serialize};

use super::dice::{DicePool, KEEP_COUNT};
use crate::error::DomainError;

/// Largest pool any configuration may allow (6^10 ordered outcomes).
pub const HARD_MAX_POOL_SIZE: u32 = 10;

/// Largest roll count any configuration may allow.
pub const HARD_MAX_NUM_ROLLS: u32 = 1_000;

/// Default cap on distinct running tallies in one injury resolution.
pub const DEFAULT_MAX_INJURY_TALLY: u32 = 4_096;

/// Largest injury tally cap any configuration may allow.
pub const HARD_MAX_INJURY_TALLY: u32 = 65_536;

fn default_max_injury_tally() -> u32 {
    DEFAULT_MAX_INJURY_TALLY
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineLimits {
    /// Dice thrown in a single roll, after advantage and extra dice
    pub max_pool_size: u32,
    /// Rolls in a success distribution, and hits in an injury resolution
    pub max_num_rolls: u32,
    /// Distinct (markers, downed) states tracked while resolving injuries
    #[serde(default = "default_max_injury_tally")]
    pub max_injury_tally: u32,
}

impl Default for EngineLimits {
    fn default() -> Self {
        Self {
            max_pool_size: 8,
            max_num_rolls: 100,
            max_injury_tally: DEFAULT_MAX_INJURY_TALLY,
        }
    }
}

impl EngineLimits {
    pub fn new(max_pool_size: u32, max_num_rolls: u32) -> Result<Self, DomainError> {
        if !(KEEP_COUNT..=HARD_MAX_POOL_SIZE).contains(&max_pool_size) {
            return Err(DomainError::invalid_parameter(format!(
                "max pool size must be between {KEEP_COUNT} and {HARD_MAX_POOL_SIZE}, got {max_pool_size}"
            )));
        }
        if !(1..=HARD_MAX_NUM_ROLLS).contains(&max_num_rolls) {
            return Err(DomainError::invalid_parameter(format!(
                "max roll count must be between 1 and {HARD_MAX_NUM_ROLLS}, got {max_num_rolls}"
            )));
        }
        Ok(Self {
            max_pool_size,
            max_num_rolls,
            max_injury_tally: DEFAULT_MAX_INJURY_TALLY,
        })
    }

    /// Replace the injury tally cap.
    pub fn with_max_injury_tally(self, max_injury_tally: u32) -> Result<Self, DomainError> {
        if !(1..=HARD_MAX_INJURY_TALLY).contains(&max_injury_tally) {
            return Err(DomainError::invalid_parameter(format!(
                "max injury tally must be between 1 and {HARD_MAX_INJURY_TALLY}, got {max_injury_tally}"
            )));
        }
        Ok(Self {
            max_injury_tally,
            ..self
        })
    }

    pub fn check_pool(&self, pool: &DicePool) -> Result<(), DomainError> {
        if pool.total_dice() > self.max_pool_size {
            return Err(DomainError::resource_limit(
                "dice pool",
                u64::from(pool.total_dice()),
                u64::from(self.max_pool_size),
            ));
        }
        Ok(())
    }

    pub fn check_num_rolls(&self, num_rolls: u32) -> Result<(), DomainError> {
        if num_rolls > self.max_num_rolls {
            return Err(DomainError::resource_limit(
                "roll count",
                u64::from(num_rolls),
                u64::from(self.max_num_rolls),
            ));
        }
        Ok(())
    }

    pub fn check_injury_tally(&self, entries: usize) -> Result<(), DomainError> {
        if entries > self.max_injury_tally as usize {
            return Err(DomainError::resource_limit(
                "injury tally",
                entries as u64,
                u64::from(self.max_injury_tally),
            ));
        }
        Ok(())
    }
}
