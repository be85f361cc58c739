//! Injury table: maps a modified injury-roll total to its effect
//!
//! The table is data, not code. Rule revisions ship as a new table (with a
//! bumped `version`) and the convolution logic never changes.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Upper bound on markers a single table entry may inflict.
pub const MAX_MARKERS_PER_HIT: u32 = 1_000;

/// What one injury roll does to the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InjuryEffect {
    NoEffect,
    BloodMarkers { markers: u32 },
    /// Knocked down; inflicts `downed_markers`, or `downed_repeat_markers`
    /// when the target is already downed
    Downed,
    OutOfAction,
}

/// Effect applied to every total from `min_total` up to the next band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InjuryBand {
    pub min_total: i32,
    pub effect: InjuryEffect,
}

impl InjuryBand {
    pub fn new(min_total: i32, effect: InjuryEffect) -> Self {
        Self { min_total, effect }
    }
}

fn default_downed_markers() -> u32 {
    1
}

fn default_downed_repeat_markers() -> u32 {
    2
}

/// Versioned roll-total to injury-effect lookup
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InjuryTable {
    pub name: String,
    pub version: u32,
    /// Strictly ascending by `min_total`. Totals below the first band use it.
    pub bands: Vec<InjuryBand>,
    #[serde(default = "default_downed_markers")]
    pub downed_markers: u32,
    #[serde(default = "default_downed_repeat_markers")]
    pub downed_repeat_markers: u32,
}

impl Default for InjuryTable {
    fn default() -> Self {
        Self::trench_crusade()
    }
}

impl InjuryTable {
    /// Standard Trench Crusade injury chart (2d6).
    ///
    /// - 1 or less: no effect
    /// - 2-6: one blood marker
    /// - 7-8: downed
    /// - 9+: out of action
    pub fn trench_crusade() -> Self {
        Self {
            name: "trench_crusade".to_string(),
            version: 1,
            bands: vec![
                InjuryBand::new(i32::MIN, InjuryEffect::NoEffect),
                InjuryBand::new(2, InjuryEffect::BloodMarkers { markers: 1 }),
                InjuryBand::new(7, InjuryEffect::Downed),
                InjuryBand::new(9, InjuryEffect::OutOfAction),
            ],
            downed_markers: default_downed_markers(),
            downed_repeat_markers: default_downed_repeat_markers(),
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.bands.is_empty() {
            return Err(DomainError::invalid_parameter(format!(
                "injury table '{}' has no bands",
                self.name
            )));
        }
        if let Some(pair) = self
            .bands
            .windows(2)
            .find(|pair| pair[0].min_total >= pair[1].min_total)
        {
            return Err(DomainError::invalid_parameter(format!(
                "injury table '{}' bands must be strictly ascending, found {} before {}",
                self.name, pair[0].min_total, pair[1].min_total
            )));
        }

        let band_markers = self.bands.iter().filter_map(|band| match band.effect {
            InjuryEffect::BloodMarkers { markers } => Some(markers),
            _ => None,
        });
        let too_many = band_markers
            .chain([self.downed_markers, self.downed_repeat_markers])
            .find(|markers| *markers > MAX_MARKERS_PER_HIT);
        if let Some(markers) = too_many {
            return Err(DomainError::invalid_parameter(format!(
                "injury table '{}' inflicts {markers} markers per hit, maximum is {MAX_MARKERS_PER_HIT}",
                self.name
            )));
        }
        Ok(())
    }

    /// Effect of a modified injury total.
    pub fn effect_for(&self, total: i32) -> InjuryEffect {
        self.bands
            .iter()
            .rev()
            .find(|band| band.min_total <= total)
            .or_else(|| self.bands.first())
            .map(|band| band.effect)
            .unwrap_or(InjuryEffect::NoEffect)
    }
}
