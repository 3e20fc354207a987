use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::{
    error::{IoError, ScheduleError, SurrogateResult},
    schedule::{Layer, Quantity},
    zone::PolicyZone,
};

// ================================================================================================
// Registry
// ================================================================================================

/// Where a per-zone value comes from when its explicit key is absent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoneDefault {
    /// A fixed fallback value.
    Value(f64),
    /// The zone-independent key (e.g. `work_contacts`). Required: resolution fails
    /// if neither the explicit nor the shared key is present.
    Shared(&'static str),
    /// The zone-independent key, else a fixed fallback value.
    SharedOr(&'static str, f64),
}

/// Season of the fixed three-point schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Season {
    Init,
    Summer,
    Winter,
}

impl Season {
    pub const ALL: [Season; 3] = [Season::Init, Season::Summer, Season::Winter];

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Init => "init",
            Season::Summer => "summer",
            Season::Winter => "winter",
        }
    }

    pub fn key(&self, suffix: &str) -> String {
        format!("{}_{suffix}", self.as_str())
    }
}

impl Quantity {
    /// Fallback of a period-mapped quantity in `zone`; `None` for seasonal quantities.
    pub fn zone_default(&self, zone: PolicyZone) -> Option<ZoneDefault> {
        use PolicyZone::*;
        use ZoneDefault::*;

        let default = match (self, zone) {
            (Quantity::WorkContacts, Red) => Shared("work_contacts"),
            (Quantity::WorkContacts, _) => Value(1.0),

            (Quantity::SchoolContacts, Init) => Value(1.0),
            (Quantity::SchoolContacts, Summer | Red) => Value(0.0),
            (Quantity::SchoolContacts, Yellow | Orange) => Shared("school_contacts"),

            (Quantity::CasualContacts, Init | Summer) => Value(1.0),
            (Quantity::CasualContacts, Yellow | Orange) => Shared("casual_contacts"),
            (Quantity::CasualContacts, Red) => Value(0.0),

            (Quantity::Imports, Red) => Value(0.0),
            (Quantity::Imports, _) => SharedOr("init_imports", 0.0),

            _ => return None,
        };
        Some(default)
    }

    /// Default of the `init_` season value; `None` when it is required.
    pub fn seasonal_default(&self) -> Option<f64> {
        match self {
            Quantity::Beta => None,
            _ => Some(1.0),
        }
    }
}

/// Every key a [`ParameterTable`] understands.
pub fn recognized_keys() -> BTreeSet<String> {
    let mut keys = BTreeSet::new();
    for quantity in Quantity::PERIOD_MAPPED {
        keys.insert(quantity.suffix().to_string());
        for zone in PolicyZone::iter() {
            keys.insert(zone.key(quantity.suffix()));
        }
    }
    for quantity in Quantity::SEASONAL {
        for season in Season::ALL {
            keys.insert(season.key(quantity.suffix()));
        }
    }
    for layer in Layer::iter() {
        keys.insert(format!("{}_trace_prob", layer.key_prefix()));
        keys.insert(format!("{}_trace_time", layer.key_prefix()));
    }
    keys.insert("trace_prob".to_string());
    keys.insert("trace_time".to_string());
    keys
}

// ================================================================================================
// Parameter Table
// ================================================================================================

/// Named scalar parameters driving the scheduler.
///
/// Keys are either zone-prefixed (`red_work_contacts`), season-prefixed
/// (`summer_beta`), or zone-independent fallbacks (`work_contacts`). Values are
/// validated once when the table is built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct ParameterTable {
    values: BTreeMap<String, f64>,
}

impl ParameterTable {
    /// # Errors
    /// [`ScheduleError::NonFiniteParameter`] if any value is NaN or infinite.
    pub fn new(values: BTreeMap<String, f64>) -> SurrogateResult<Self> {
        if let Some((key, value)) = values.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ScheduleError::NonFiniteParameter {
                key: key.clone(),
                value: *value,
            }
            .into());
        }

        let recognized = recognized_keys();
        for key in values.keys().filter(|k| !recognized.contains(*k)) {
            tracing::warn!(key = %key, "Unrecognized scheduler parameter is ignored");
        }

        Ok(Self { values })
    }

    /// [`ParameterTable::new`] over `(key, value)` pairs; later duplicates win.
    pub fn from_pairs<K: Into<String>>(
        pairs: impl IntoIterator<Item = (K, f64)>,
    ) -> SurrogateResult<Self> {
        Self::new(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn from_json_str(json: &str) -> SurrogateResult<Self> {
        let values: BTreeMap<String, f64> = serde_json::from_str(json).map_err(IoError::Json)?;
        Self::new(values)
    }

    /// Returns a copy with `key` set to `value`.
    pub fn with(mut self, key: impl Into<String>, value: f64) -> SurrogateResult<Self> {
        let key = key.into();
        if !value.is_finite() {
            return Err(ScheduleError::NonFiniteParameter { key, value }.into());
        }
        self.values.insert(key, value);
        Ok(self)
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Resolves a period-mapped `quantity` in `zone`: the explicit
    /// `{zone}_{suffix}` key first, then the registry fallback.
    ///
    /// # Errors
    /// [`ScheduleError::MissingRequiredParameter`] when the fallback is a required
    /// shared key that is absent too.
    pub fn resolve_zone(&self, quantity: Quantity, zone: PolicyZone) -> SurrogateResult<f64> {
        let key = zone.key(quantity.suffix());
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }

        match quantity.zone_default(zone) {
            Some(ZoneDefault::Value(v)) => Ok(v),
            Some(ZoneDefault::SharedOr(shared, v)) => Ok(self.get(shared).unwrap_or(v)),
            Some(ZoneDefault::Shared(shared)) => self.get(shared).ok_or_else(|| {
                ScheduleError::MissingRequiredParameter {
                    quantity: quantity.to_string(),
                    zone: zone.to_string(),
                    key,
                }
                .into()
            }),
            None => Err(ScheduleError::MissingRequiredParameter {
                quantity: quantity.to_string(),
                zone: zone.to_string(),
                key,
            }
            .into()),
        }
    }

    /// Resolves the `[init, summer, winter]` values of a seasonal quantity.
    ///
    /// Summer and winter fall back to the resolved init value. Returns `None`
    /// when the init value is required and absent.
    pub fn resolve_seasons(&self, quantity: Quantity) -> Option<[f64; 3]> {
        let suffix = quantity.suffix();
        let init = self
            .get(&Season::Init.key(suffix))
            .or_else(|| quantity.seasonal_default())?;
        let summer = self.get(&Season::Summer.key(suffix)).unwrap_or(init);
        let winter = self.get(&Season::Winter.key(suffix)).unwrap_or(init);
        Some([init, summer, winter])
    }
}

impl TryFrom<BTreeMap<String, f64>> for ParameterTable {
    type Error = String;

    fn try_from(values: BTreeMap<String, f64>) -> Result<Self, Self::Error> {
        ParameterTable::new(values).map_err(|e| e.to_string())
    }
}

impl From<ParameterTable> for BTreeMap<String, f64> {
    fn from(table: ParameterTable) -> Self {
        table.values
    }
}
