//! Property-based checks across the whole mechanics pipeline.

use proptest::prelude::*;

use super::{DiceMechanic, InjuryMechanic, InjuryOutcome, ResolutionMode, SuccessDistribution};
use crate::distribution::PROBABILITY_TOLERANCE;
use crate::value_objects::{EngineLimits, InjuryParameters, InjuryTable, RollParameters};

fn roll_params_strategy() -> impl Strategy<Value = RollParameters> {
    (-3..=3i32, any::<bool>(), -4..=4i32, -2..=16i32, 1..=40u32).prop_map(
        |(modified_dice, extra_d6, flat_modifier, threshold, num_rolls)| RollParameters {
            modified_dice,
            extra_d6,
            flat_modifier,
            threshold,
            num_rolls,
        },
    )
}

fn injury_params_strategy() -> impl Strategy<Value = InjuryParameters> {
    (-2..=2i32, any::<bool>(), -3..=3i32).prop_map(|(modified_dice, extra_d6, flat_modifier)| {
        InjuryParameters {
            modified_dice,
            extra_d6,
            flat_modifier,
        }
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // Success distributions are exhaustive over 0..=num_rolls and sum to 1
    #[test]
    fn success_distribution_sums_to_one(params in roll_params_strategy()) {
        let dist = SuccessDistribution::default().compute(&params).unwrap();
        prop_assert!((dist.total() - 1.0).abs() <= PROBABILITY_TOLERANCE);
        prop_assert_eq!(dist.len(), params.num_rolls as usize + 1);
    }

    // A bigger flat modifier never lowers the hit chance
    #[test]
    fn flat_modifier_is_monotonic(params in roll_params_strategy()) {
        let dice = DiceMechanic::default();
        let bumped = RollParameters { flat_modifier: params.flat_modifier + 1, ..params };
        let p = dice.hit_probability(&params).unwrap();
        let p_bumped = dice.hit_probability(&bumped).unwrap();
        prop_assert!(p_bumped >= p - 1e-12, "p={p} bumped={p_bumped}");
    }

    // Advantage never hurts, disadvantage never helps
    #[test]
    fn advantage_brackets_baseline(
        extra_d6 in any::<bool>(),
        flat_modifier in -4..=4i32,
        threshold in -2..=16i32,
    ) {
        let dice = DiceMechanic::default();
        let at = |modified_dice| RollParameters {
            modified_dice,
            extra_d6,
            flat_modifier,
            threshold,
            num_rolls: 1,
        };
        let base = dice.hit_probability(&at(0)).unwrap();
        prop_assert!(dice.hit_probability(&at(1)).unwrap() >= base - 1e-12);
        prop_assert!(dice.hit_probability(&at(-1)).unwrap() <= base + 1e-12);
    }

    // No hidden state: identical inputs give bit-identical outputs
    #[test]
    fn computations_are_idempotent(
        params in roll_params_strategy(),
        injury in injury_params_strategy(),
    ) {
        let success = SuccessDistribution::default();
        let first = success.compute(&params).unwrap();
        let second = success.compute(&params).unwrap();
        prop_assert_eq!(&first, &second);

        let table = InjuryTable::trench_crusade();
        let mechanic = InjuryMechanic::new(EngineLimits::default(), &table).unwrap();
        let a = InjuryOutcome::compute(&first, &injury, &mechanic, ResolutionMode::Independent).unwrap();
        let b = InjuryOutcome::compute(&second, &injury, &mechanic, ResolutionMode::Independent).unwrap();
        prop_assert_eq!(a, b);
    }

    // Markers and out of action partition the whole probability space
    #[test]
    fn injury_outcome_is_normalized(
        params in roll_params_strategy(),
        injury in injury_params_strategy(),
        escalating in any::<bool>(),
    ) {
        let hits = SuccessDistribution::default().compute(&params).unwrap();
        let table = InjuryTable::trench_crusade();
        let mechanic = InjuryMechanic::new(EngineLimits::default(), &table).unwrap();
        let mode = if escalating { ResolutionMode::Escalating } else { ResolutionMode::Independent };
        let outcome = InjuryOutcome::compute(&hits, &injury, &mechanic, mode).unwrap();

        let ooa = outcome.out_of_action_probability();
        let markers: f64 = outcome.blood_marker_distribution().values().sum();
        prop_assert!((0.0..=1.0).contains(&ooa));
        prop_assert!((markers + ooa - 1.0).abs() <= PROBABILITY_TOLERANCE);
    }
}
