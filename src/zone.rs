use serde::{Deserialize, Serialize};
use strum::{Display, EnumCount, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::error::DatasetError;

// ================================================================================================
// Scheduling Alphabet
// ================================================================================================

/// Policy stance active over a calendar period, as understood by the scheduler.
///
/// The string form (`init`, `summer`, ...) is the prefix of every per-zone key in
/// a [`crate::schedule::ParameterTable`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
    IntoStaticStr,
    EnumCount,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PolicyZone {
    /// Pre-intervention behaviour.
    Init,
    /// Relaxed summer regime.
    Summer,
    Yellow,
    Orange,
    /// Full lockdown.
    Red,
}

impl PolicyZone {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// Parameter key of `suffix` in this zone, e.g. `red_work_contacts`.
    pub fn key(&self, suffix: &str) -> String {
        format!("{}_{suffix}", self.as_str())
    }
}

// ================================================================================================
// Feature Alphabet
// ================================================================================================

/// Colour-coded restriction tier used to label dataset records.
///
/// Not to be confused with [`PolicyZone`]: this alphabet is what the surrogate
/// model sees as one-hot features.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
    IntoStaticStr,
    EnumCount,
)]
pub enum ColorZone {
    #[strum(serialize = "W")]
    #[serde(rename = "W")]
    White,
    #[strum(serialize = "Y")]
    #[serde(rename = "Y")]
    Yellow,
    #[strum(serialize = "O")]
    #[serde(rename = "O")]
    Orange,
    #[strum(serialize = "R")]
    #[serde(rename = "R")]
    Red,
}

impl ColorZone {
    pub fn parse(label: &str) -> Result<Self, DatasetError> {
        label
            .parse()
            .map_err(|_| DatasetError::UnknownZoneLabel(label.to_string()))
    }

    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// Position of the set bit in [`ColorZone::one_hot`].
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn one_hot(&self) -> [f64; ColorZone::COUNT] {
        let mut encoding = [0.0; ColorZone::COUNT];
        encoding[self.index()] = 1.0;
        encoding
    }

    /// Scheduler stance enforced while this tier is active.
    pub fn policy_zone(&self) -> PolicyZone {
        match self {
            ColorZone::White => PolicyZone::Init,
            ColorZone::Yellow => PolicyZone::Yellow,
            ColorZone::Orange => PolicyZone::Orange,
            ColorZone::Red => PolicyZone::Red,
        }
    }

    pub fn labels() -> impl Iterator<Item = &'static str> {
        ColorZone::iter().map(|z| z.as_str())
    }
}
