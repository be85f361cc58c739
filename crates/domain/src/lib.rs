//! Trench odds domain: exact dice and injury probabilities.
//!
//! Pure, synchronous and stateless. Callers pass explicit parameter structs
//! and receive fully normalized distributions or a [`DomainError`].

pub mod distribution;
pub mod error;
pub mod mechanics;
pub mod value_objects;

pub use distribution::{Distribution, DIE_FACES, PROBABILITY_TOLERANCE};
pub use error::DomainError;
pub use mechanics::{
    binomial, DiceMechanic, HitDistribution, InjuryMechanic, InjuryOutcome, InjuryResult,
    ResolutionMode, SuccessDistribution,
};
pub use value_objects::{
    DicePool, EngineLimits, InjuryBand, InjuryEffect, InjuryParameters, InjuryTable, KeepRule,
    RollParameters, RollShape,
};
