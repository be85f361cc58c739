//! Exact discrete probability distributions
//!
//! A [`Distribution`] is an exhaustive, fully materialized mapping from an
//! outcome key to its probability. Outcome ranges in this engine are small
//! (dice sums of a few dozen, hit counts up to the roll cap), so every key is
//! stored explicitly and nothing is sampled.

use std::collections::BTreeMap;
use std::ops::Add;

use crate::error::DomainError;

/// Maximum deviation of a distribution's total mass from 1.
pub const PROBABILITY_TOLERANCE: f64 = 1e-9;

/// Number of faces on every die the engine rolls.
pub const DIE_FACES: i32 = 6;

/// Immutable discrete distribution whose probabilities sum to 1.
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution<K: Ord> {
    masses: BTreeMap<K, f64>,
}

impl<K: Ord + Copy> Distribution<K> {
    /// Distribution with all mass on `key`.
    pub fn point(key: K) -> Self {
        Self {
            masses: BTreeMap::from([(key, 1.0)]),
        }
    }

    /// Build a distribution from caller-supplied masses.
    ///
    /// Rejects empty input, negative or non-finite masses, and totals that
    /// deviate from 1 by more than [`PROBABILITY_TOLERANCE`]. Duplicate keys
    /// are summed.
    pub fn from_masses(masses: impl IntoIterator<Item = (K, f64)>) -> Result<Self, DomainError> {
        let mut collected: BTreeMap<K, f64> = BTreeMap::new();
        for (key, mass) in masses {
            if !mass.is_finite() || mass < 0.0 {
                return Err(DomainError::invalid_parameter(format!(
                    "probabilities must be finite and non-negative, got {mass}"
                )));
            }
            *collected.entry(key).or_insert(0.0) += mass;
        }
        if collected.is_empty() {
            return Err(DomainError::invalid_parameter(
                "distribution must contain at least one outcome",
            ));
        }

        let total: f64 = collected.values().sum();
        if (total - 1.0).abs() > PROBABILITY_TOLERANCE {
            return Err(DomainError::invalid_parameter(format!(
                "probabilities must sum to 1, got {total}"
            )));
        }
        Ok(Self::rescaled(collected, total))
    }

    /// Validate and renormalize masses produced by the engine itself.
    ///
    /// A total outside tolerance means the math is wrong, so this reports an
    /// internal invariant violation rather than a parameter error.
    pub(crate) fn normalized(masses: BTreeMap<K, f64>, stage: &str) -> Result<Self, DomainError> {
        if masses.is_empty() {
            return Err(DomainError::invariant(format!(
                "{stage} distribution has no outcomes"
            )));
        }
        if masses.values().any(|p| !p.is_finite() || *p < 0.0) {
            return Err(DomainError::invariant(format!(
                "{stage} distribution contains a negative or non-finite probability"
            )));
        }

        let total: f64 = masses.values().sum();
        if (total - 1.0).abs() > PROBABILITY_TOLERANCE {
            return Err(DomainError::invariant(format!(
                "{stage} distribution sums to {total}"
            )));
        }
        Ok(Self::rescaled(masses, total))
    }

    fn rescaled(masses: BTreeMap<K, f64>, total: f64) -> Self {
        Self {
            masses: masses.into_iter().map(|(k, p)| (k, p / total)).collect(),
        }
    }

    /// Probability of `key` (0 for keys outside the support).
    pub fn probability(&self, key: &K) -> f64 {
        self.masses.get(key).copied().unwrap_or(0.0)
    }

    /// Outcomes in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (K, f64)> + '_ {
        self.masses.iter().map(|(k, p)| (*k, *p))
    }

    pub fn as_map(&self) -> &BTreeMap<K, f64> {
        &self.masses
    }

    pub fn len(&self) -> usize {
        self.masses.len()
    }

    /// Always false for a constructed distribution.
    pub fn is_empty(&self) -> bool {
        self.masses.is_empty()
    }

    pub fn min_key(&self) -> Option<K> {
        self.masses.keys().next().copied()
    }

    pub fn max_key(&self) -> Option<K> {
        self.masses.keys().next_back().copied()
    }

    pub fn total(&self) -> f64 {
        self.masses.values().sum()
    }

    /// Relabel outcomes, merging the mass of keys that map to the same label.
    pub fn map_keys<J: Ord + Copy>(
        &self,
        stage: &str,
        f: impl Fn(K) -> J,
    ) -> Result<Distribution<J>, DomainError> {
        let mut mapped: BTreeMap<J, f64> = BTreeMap::new();
        for (key, mass) in self.iter() {
            *mapped.entry(f(key)).or_insert(0.0) += mass;
        }
        Distribution::normalized(mapped, stage)
    }
}

impl<K: Ord + Copy + Add<Output = K>> Distribution<K> {
    /// Distribution of the sum of independent draws from `self` and `other`.
    pub fn convolve(&self, other: &Self) -> Result<Self, DomainError> {
        let mut sums: BTreeMap<K, f64> = BTreeMap::new();
        for (a, pa) in self.iter() {
            for (b, pb) in other.iter() {
                *sums.entry(a + b).or_insert(0.0) += pa * pb;
            }
        }
        Distribution::normalized(sums, "convolution")
    }
}

impl Distribution<i32> {
    /// A single fair six-sided die.
    pub fn d6() -> Self {
        let face = 1.0 / f64::from(DIE_FACES);
        Self {
            masses: (1..=DIE_FACES).map(|f| (f, face)).collect(),
        }
    }

    /// Shift every outcome by a flat modifier.
    pub fn shift(&self, offset: i32) -> Result<Self, DomainError> {
        let mut shifted = BTreeMap::new();
        for (key, mass) in self.iter() {
            let moved = key.checked_add(offset).ok_or_else(|| {
                DomainError::invalid_parameter(format!(
                    "flat modifier {offset} overflows the roll total {key}"
                ))
            })?;
            shifted.insert(moved, mass);
        }
        Ok(Self { masses: shifted })
    }

    /// Probability that an outcome meets or exceeds `threshold`.
    pub fn mass_at_least(&self, threshold: i32) -> f64 {
        self.masses
            .range(threshold..)
            .map(|(_, p)| p)
            .sum::<f64>()
            .min(1.0)
    }
}
