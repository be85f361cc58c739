//! Value objects - Immutable objects defined by their attributes

mod dice;
mod injury_table;
mod limits;

pub use dice::{
    DicePool, InjuryParameters, KeepRule, RollParameters, RollShape, BASE_DICE, KEEP_COUNT,
};
pub use injury_table::{InjuryBand, InjuryEffect, InjuryTable, MAX_MARKERS_PER_HIT};
pub use limits::{
    EngineLimits, DEFAULT_MAX_INJURY_TALLY, HARD_MAX_INJURY_TALLY, HARD_MAX_NUM_ROLLS,
    HARD_MAX_POOL_SIZE,
};
