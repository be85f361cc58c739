//! Single-roll dice mechanics
//!
//! Plain pools are summed by convolving single d6 distributions. Pools that
//! keep only the best or worst dice are resolved by enumerating every ordered
//! outcome and counting kept sums in integers, so the result is exact.

use std::collections::BTreeMap;

use crate::distribution::{Distribution, DIE_FACES};
use crate::error::DomainError;
use crate::value_objects::{
    DicePool, EngineLimits, KeepRule, RollParameters, RollShape, HARD_MAX_POOL_SIZE,
};

/// Builds roll distributions within the configured limits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiceMechanic {
    limits: EngineLimits,
}

impl DiceMechanic {
    pub fn new(limits: EngineLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &EngineLimits {
        &self.limits
    }

    /// Exact distribution of the sum of `pool_size` fair d6.
    pub fn roll_distribution(&self, pool_size: u32) -> Result<Distribution<i32>, DomainError> {
        if pool_size == 0 {
            return Err(DomainError::invalid_parameter(
                "pool size must be at least 1",
            ));
        }
        if pool_size > self.limits.max_pool_size {
            return Err(DomainError::resource_limit(
                "dice pool",
                u64::from(pool_size),
                u64::from(self.limits.max_pool_size),
            ));
        }

        let die = Distribution::d6();
        let mut sum = die.clone();
        for _ in 1..pool_size {
            sum = sum.convolve(&die)?;
        }
        Ok(sum)
    }

    /// Distribution of the kept dice total with the flat modifier applied.
    pub fn kept_dice_distribution(&self, shape: &RollShape) -> Result<Distribution<i32>, DomainError> {
        let pool = shape.pool()?;
        self.limits.check_pool(&pool)?;

        let kept = if pool.keeps_all() {
            self.roll_distribution(pool.total_dice())?
        } else {
            enumerate_kept_sums(&pool)?
        };
        kept.shift(shape.flat_modifier)
    }

    /// Probability that one roll meets or beats `params.threshold`.
    pub fn hit_probability(&self, params: &RollParameters) -> Result<f64, DomainError> {
        let rolls = self.kept_dice_distribution(&params.shape())?;
        Ok(rolls.mass_at_least(params.threshold))
    }
}

fn enumerate_kept_sums(pool: &DicePool) -> Result<Distribution<i32>, DomainError> {
    let dice = pool.total_dice() as usize;
    let keep = pool.keep_count() as usize;
    if pool.total_dice() > HARD_MAX_POOL_SIZE {
        return Err(DomainError::resource_limit(
            "dice pool",
            u64::from(pool.total_dice()),
            u64::from(HARD_MAX_POOL_SIZE),
        ));
    }
    let outcomes = (DIE_FACES as u64).pow(pool.total_dice());

    let mut counts: BTreeMap<i32, u64> = BTreeMap::new();
    let mut faces = vec![1i32; dice];
    let mut sorted = Vec::with_capacity(dice);
    loop {
        sorted.clear();
        sorted.extend_from_slice(&faces);
        sorted.sort_unstable();
        let kept: i32 = match pool.keep_rule() {
            KeepRule::Highest => sorted[dice - keep..].iter().sum(),
            KeepRule::Lowest => sorted[..keep].iter().sum(),
        };
        *counts.entry(kept).or_insert(0) += 1;

        if !advance(&mut faces) {
            break;
        }
    }

    let masses = counts
        .into_iter()
        .map(|(sum, count)| (sum, count as f64 / outcomes as f64))
        .collect();
    Distribution::normalized(masses, "kept dice")
}

/// Step the odometer of die faces; false once every outcome was visited.
fn advance(faces: &mut [i32]) -> bool {
    for face in faces.iter_mut() {
        if *face < DIE_FACES {
            *face += 1;
            return true;
        }
        *face = 1;
    }
    false
}
