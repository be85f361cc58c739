//! Number of hits across repeated independent rolls

use std::collections::BTreeMap;

use super::dice::DiceMechanic;
use crate::distribution::{Distribution, PROBABILITY_TOLERANCE};
use crate::error::DomainError;
use crate::value_objects::{EngineLimits, RollParameters};

/// Distribution over hit counts, keyed `0..=num_rolls`
pub type HitDistribution = Distribution<u32>;

/// Composes the single-roll hit probability over `num_rolls` rolls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SuccessDistribution {
    dice: DiceMechanic,
}

impl SuccessDistribution {
    pub fn new(limits: EngineLimits) -> Self {
        Self {
            dice: DiceMechanic::new(limits),
        }
    }

    pub fn compute(&self, params: &RollParameters) -> Result<HitDistribution, DomainError> {
        params.validate()?;
        self.dice.limits().check_num_rolls(params.num_rolls)?;
        let p = self.dice.hit_probability(params)?;
        binomial(params.num_rolls, p)
    }
}

/// Binomial(`trials`, `p`) evaluated in log space.
///
/// `ln C(n, k)` is carried forward incrementally, so large roll counts never
/// form factorials. Rounding drift within [`PROBABILITY_TOLERANCE`] of the
/// unit interval is clamped away.
pub fn binomial(trials: u32, p: f64) -> Result<HitDistribution, DomainError> {
    let slack = -PROBABILITY_TOLERANCE..=1.0 + PROBABILITY_TOLERANCE;
    if !p.is_finite() || !slack.contains(&p) {
        return Err(DomainError::invariant(format!(
            "hit probability {p} is outside [0, 1]"
        )));
    }
    let p = p.clamp(0.0, 1.0);

    let mut masses: BTreeMap<u32, f64> = (0..=trials).map(|k| (k, 0.0)).collect();
    if p == 0.0 {
        masses.insert(0, 1.0);
        return Distribution::normalized(masses, "success");
    }
    if p == 1.0 {
        masses.insert(trials, 1.0);
        return Distribution::normalized(masses, "success");
    }

    let ln_p = p.ln();
    let ln_q = (-p).ln_1p();
    let n = f64::from(trials);
    let mut ln_choose = 0.0;
    for k in 0..=trials {
        let k_f = f64::from(k);
        if k > 0 {
            ln_choose += (n - k_f + 1.0).ln() - k_f.ln();
        }
        let ln_mass = ln_choose + k_f * ln_p + (n - k_f) * ln_q;
        masses.insert(k, ln_mass.exp());
    }
    Distribution::normalized(masses, "success")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::RollParameters;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_single_roll_is_bernoulli() {
        let dist = SuccessDistribution::default()
            .compute(&RollParameters::default())
            .unwrap();
        assert_eq!(dist.len(), 2);
        assert_close(dist.probability(&0), 15.0 / 36.0);
        assert_close(dist.probability(&1), 21.0 / 36.0);
    }

    #[test]
    fn test_binomial_matches_closed_form() {
        let dist = binomial(4, 0.25).unwrap();
        assert_close(dist.probability(&0), 0.75f64.powi(4));
        assert_close(dist.probability(&1), 4.0 * 0.25 * 0.75f64.powi(3));
        assert_close(dist.probability(&2), 6.0 * 0.0625 * 0.5625);
        assert_close(dist.probability(&4), 0.25f64.powi(4));
    }

    #[test]
    fn test_binomial_is_stable_for_many_rolls() {
        let dist = binomial(1_000, 0.3).unwrap();
        assert_close(dist.total(), 1.0);
        assert!(dist.iter().all(|(_, p)| p.is_finite() && p >= 0.0));
        let mean: f64 = dist.iter().map(|(k, p)| f64::from(k) * p).sum();
        assert!((mean - 300.0).abs() < 1e-6);
    }

    #[test]
    fn test_certain_outcomes_are_fully_materialized() {
        let never = binomial(3, 0.0).unwrap();
        assert_eq!(never.len(), 4);
        assert_eq!(never.probability(&0), 1.0);

        let always = binomial(3, 1.0).unwrap();
        assert_eq!(always.probability(&3), 1.0);
        assert_eq!(always.probability(&1), 0.0);
    }

    #[test]
    fn test_unreachable_threshold_never_hits() {
        let params = RollParameters {
            threshold: 13,
            num_rolls: 5,
            ..RollParameters::default()
        };
        let dist = SuccessDistribution::default().compute(&params).unwrap();
        assert_eq!(dist.probability(&0), 1.0);
    }

    #[test]
    fn test_zero_rolls_is_invalid() {
        let params = RollParameters {
            num_rolls: 0,
            ..RollParameters::default()
        };
        let err = SuccessDistribution::default().compute(&params).unwrap_err();
        assert!(matches!(err, DomainError::InvalidParameter(_)));
    }

    #[test]
    fn test_roll_count_limit() {
        let limits = EngineLimits::new(8, 10).unwrap();
        let params = RollParameters {
            num_rolls: 11,
            ..RollParameters::default()
        };
        let err = SuccessDistribution::new(limits).compute(&params).unwrap_err();
        assert!(matches!(err, DomainError::ResourceLimitExceeded { .. }));
    }

    #[test]
    fn test_invalid_probability_is_an_internal_defect() {
        assert!(matches!(
            binomial(2, 1.5),
            Err(DomainError::InternalInvariantViolation(_))
        ));
        assert!(binomial(2, -1e-6).is_err());
    }

    #[test]
    fn test_rounding_past_one_is_clamped() {
        let always = binomial(2, 1.0 + f64::EPSILON).unwrap();
        assert_eq!(always.probability(&2), 1.0);
        let never = binomial(2, -f64::EPSILON).unwrap();
        assert_eq!(never.probability(&0), 1.0);
    }

    #[test]
    fn test_threshold_below_whole_support_always_hits() {
        // Worst two of six d6 never total below 2.
        let cases = (-4..=4).map(|flat_modifier| (flat_modifier, -2)).chain([(0, 0), (0, 2)]);
        for (flat_modifier, threshold) in cases {
            let params = RollParameters {
                modified_dice: -3,
                extra_d6: true,
                flat_modifier,
                threshold,
                num_rolls: 1,
            };
            let dist = SuccessDistribution::default().compute(&params).unwrap();
            assert_eq!(dist.len(), 2);
            assert_close(dist.probability(&0), 0.0);
            assert_close(dist.probability(&1), 1.0);
        }
    }
}
