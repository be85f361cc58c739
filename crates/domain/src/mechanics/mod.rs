//! Probability mechanics, composed in one direction:
//!
//! parameters -> [`DiceMechanic`] -> [`SuccessDistribution`] -> (with
//! [`InjuryMechanic`]) -> [`InjuryOutcome`]
//!
//! Every stage is a pure function of its inputs and can be invoked on its own.

mod dice;
mod injury;
mod outcome;
mod success;

#[cfg(test)]
mod properties;

pub use dice::DiceMechanic;
pub use injury::{InjuryMechanic, InjuryResult};
pub use outcome::{InjuryOutcome, ResolutionMode};
pub use success::{binomial, HitDistribution, SuccessDistribution};
