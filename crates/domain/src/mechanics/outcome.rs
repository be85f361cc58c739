//! Total injury across every landed hit
//!
//! For each hit count `k` the per-hit outcome is convolved with itself `k`
//! times and the results are mixed by the hit distribution. Out of action
//! dominates: a branch in which any hit rolled out of action is out of action,
//! whatever markers the other hits carried.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::injury::{InjuryMechanic, InjuryResult};
use super::success::HitDistribution;
use crate::distribution::Distribution;
use crate::error::DomainError;
use crate::value_objects::{InjuryEffect, InjuryParameters};

/// How successive hits on the same target interact
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMode {
    /// Every hit draws from the same per-hit outcome
    #[default]
    Independent,
    /// A downed target rolls later injuries with an extra advantage die and
    /// takes repeat markers on further downed results
    Escalating,
}

/// Final injury tally for a hit distribution
#[derive(Debug, Clone, PartialEq)]
pub struct InjuryOutcome {
    tallies: Distribution<InjuryResult>,
}

impl InjuryOutcome {
    pub fn compute(
        hit_distribution: &HitDistribution,
        params: &InjuryParameters,
        mechanic: &InjuryMechanic<'_>,
        mode: ResolutionMode,
    ) -> Result<Self, DomainError> {
        let max_hits = hit_distribution.max_key().unwrap_or(0);
        mechanic.limits().check_num_rolls(max_hits)?;

        let conditionals = match mode {
            ResolutionMode::Independent => independent_tallies(hit_distribution, params, mechanic)?,
            ResolutionMode::Escalating => escalating_tallies(hit_distribution, params, mechanic)?,
        };

        let mut mixed: BTreeMap<InjuryResult, f64> = BTreeMap::new();
        for (hits, weight) in hit_distribution.iter() {
            let Some(tally) = conditionals.get(&hits) else {
                return Err(DomainError::invariant(format!(
                    "no injury tally computed for {hits} hits"
                )));
            };
            for (result, mass) in tally {
                *mixed.entry(*result).or_insert(0.0) += weight * mass;
            }
        }

        Ok(Self {
            tallies: Distribution::normalized(mixed, "injury outcome")?,
        })
    }

    /// Joint probability of ending with exactly `m` markers and still in
    /// action, for every reachable `m`.
    ///
    /// Together with [`Self::out_of_action_probability`] these sum to 1.
    pub fn blood_marker_distribution(&self) -> BTreeMap<u32, f64> {
        self.tallies
            .iter()
            .filter_map(|(result, mass)| result.markers().map(|m| (m, mass)))
            .collect()
    }

    pub fn out_of_action_probability(&self) -> f64 {
        self.tallies.probability(&InjuryResult::OutOfAction)
    }

    pub fn tallies(&self) -> &Distribution<InjuryResult> {
        &self.tallies
    }
}

type Tally = BTreeMap<InjuryResult, f64>;

/// Conditional tallies for each hit count present in `hits`.
///
/// The in-action part is carried as a sub-probability `markers -> mass`
/// convolved once per extra hit; its missing mass is exactly
/// `1 - (1 - q)^k`, the chance at least one of `k` hits was out of action.
fn independent_tallies(
    hits: &HitDistribution,
    params: &InjuryParameters,
    mechanic: &InjuryMechanic<'_>,
) -> Result<BTreeMap<u32, Tally>, DomainError> {
    let per_hit = mechanic.per_hit_outcome(params)?;
    let q = per_hit.probability(&InjuryResult::OutOfAction);
    let finite: Vec<(u32, f64)> = per_hit
        .iter()
        .filter_map(|(result, mass)| result.markers().map(|m| (m, mass)))
        .collect();

    let max_hits = hits.max_key().unwrap_or(0);
    let mut in_action: BTreeMap<u32, f64> = BTreeMap::from([(0, 1.0)]);
    let mut tallies = BTreeMap::new();
    for k in 0..=max_hits {
        if k > 0 {
            let mut next: BTreeMap<u32, f64> = BTreeMap::new();
            for (&total, &mass) in &in_action {
                for &(markers, p) in &finite {
                    *next.entry(total.saturating_add(markers)).or_insert(0.0) += mass * p;
                }
            }
            mechanic.limits().check_injury_tally(next.len())?;
            in_action = next;
        }

        if hits.as_map().contains_key(&k) {
            let exponent = i32::try_from(k).map_err(|_| {
                DomainError::resource_limit("hit count", u64::from(k), i32::MAX as u64)
            })?;
            let mut tally: Tally = in_action
                .iter()
                .map(|(m, p)| (InjuryResult::Markers(*m), *p))
                .collect();
            tally.insert(InjuryResult::OutOfAction, 1.0 - (1.0 - q).powi(exponent));
            tallies.insert(k, tally);
        }
    }
    Ok(tallies)
}

/// Conditional tallies tracking whether the target has been downed.
fn escalating_tallies(
    hits: &HitDistribution,
    params: &InjuryParameters,
    mechanic: &InjuryMechanic<'_>,
) -> Result<BTreeMap<u32, Tally>, DomainError> {
    let fresh = mechanic.effect_distribution(params, false)?;
    let downed = mechanic.effect_distribution(params, true)?;

    let max_hits = hits.max_key().unwrap_or(0);
    // (markers, downed) -> mass, for branches still in action
    let mut states: BTreeMap<(u32, bool), f64> = BTreeMap::from([((0, false), 1.0)]);
    let mut out_of_action = 0.0;
    let mut tallies = BTreeMap::new();
    for k in 0..=max_hits {
        if k > 0 {
            let mut next: BTreeMap<(u32, bool), f64> = BTreeMap::new();
            for (&(total, is_downed), &mass) in &states {
                let effects = if is_downed { &downed } else { &fresh };
                for (effect, p) in effects.iter() {
                    let reached = match mechanic.result_of(effect, is_downed) {
                        InjuryResult::OutOfAction => {
                            out_of_action += mass * p;
                            continue;
                        }
                        InjuryResult::Markers(markers) => total.saturating_add(markers),
                    };
                    let now_downed = is_downed || effect == InjuryEffect::Downed;
                    *next.entry((reached, now_downed)).or_insert(0.0) += mass * p;
                }
            }
            mechanic.limits().check_injury_tally(next.len())?;
            states = next;
        }

        if hits.as_map().contains_key(&k) {
            let mut tally: Tally = BTreeMap::new();
            for (&(markers, _), &mass) in &states {
                *tally.entry(InjuryResult::Markers(markers)).or_insert(0.0) += mass;
            }
            tally.insert(InjuryResult::OutOfAction, out_of_action);
            tallies.insert(k, tally);
        }
    }
    Ok(tallies)
}
