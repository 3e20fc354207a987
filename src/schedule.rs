pub mod grid;
pub mod parameters;
pub mod period;
pub mod preset;
pub mod scheduler;
pub mod statics;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumCount, EnumIter, EnumString, IntoStaticStr};

use crate::calendar::DayOffset;

pub use parameters::ParameterTable;
pub use period::PeriodMap;
pub use scheduler::{PolicyScheduler, SchedulerConfig, SeasonalCalendar, build_schedule};
pub use statics::{ContactTracing, DailyTests, LayerValues, QuarantinePolicy, TestingPolicy};

// ================================================================================================
// Quantities & Targets
// ================================================================================================

/// Contact layer of the simulated population.
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
)]
pub enum Layer {
    #[strum(serialize = "h")]
    #[serde(rename = "h")]
    Household,
    #[strum(serialize = "s")]
    #[serde(rename = "s")]
    School,
    #[strum(serialize = "w")]
    #[serde(rename = "w")]
    Work,
    #[strum(serialize = "c")]
    #[serde(rename = "c")]
    Casual,
}

impl Layer {
    pub fn code(&self) -> &'static str {
        self.into()
    }

    /// Prefix of the layer's contact-tracing keys, e.g. `household_trace_prob`.
    pub fn key_prefix(&self) -> &'static str {
        match self {
            Layer::Household => "household",
            Layer::School => "school",
            Layer::Work => "work",
            Layer::Casual => "casual",
        }
    }
}

/// How the simulator should apply a [`Schedule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    /// Multiplies the contacts of one layer (edge clipping).
    ContactLayer(Layer),
    /// Overwrites a named simulation parameter.
    Parameter(Quantity),
}

/// Time-varying quantity emitted by the scheduler.
///
/// The `Display` form is the simulator-facing name, [`Quantity::suffix`] the
/// key fragment used in a [`ParameterTable`].
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
pub enum Quantity {
    WorkContacts,
    SchoolContacts,
    CasualContacts,
    #[strum(serialize = "n_imports")]
    #[serde(rename = "n_imports")]
    Imports,
    Beta,
    #[strum(serialize = "rel_symp_prob")]
    #[serde(rename = "rel_symp_prob")]
    SymptomaticProb,
    #[strum(serialize = "rel_severe_prob")]
    #[serde(rename = "rel_severe_prob")]
    SevereProb,
    #[strum(serialize = "rel_crit_prob")]
    #[serde(rename = "rel_crit_prob")]
    CriticalProb,
    #[strum(serialize = "rel_death_prob")]
    #[serde(rename = "rel_death_prob")]
    DeathProb,
}

impl Quantity {
    pub const PERIOD_MAPPED: [Quantity; 4] = [
        Quantity::WorkContacts,
        Quantity::SchoolContacts,
        Quantity::CasualContacts,
        Quantity::Imports,
    ];

    pub const SEASONAL: [Quantity; 5] = [
        Quantity::Beta,
        Quantity::SymptomaticProb,
        Quantity::SevereProb,
        Quantity::CriticalProb,
        Quantity::DeathProb,
    ];

    pub fn name(&self) -> &'static str {
        self.into()
    }

    /// Key fragment appended to a zone or season prefix.
    pub fn suffix(&self) -> &'static str {
        match self {
            Quantity::WorkContacts => "work_contacts",
            Quantity::SchoolContacts => "school_contacts",
            Quantity::CasualContacts => "casual_contacts",
            Quantity::Imports => "imports",
            Quantity::Beta => "beta",
            Quantity::SymptomaticProb => "symp",
            Quantity::SevereProb => "sev",
            Quantity::CriticalProb => "crit",
            Quantity::DeathProb => "death",
        }
    }

    /// Seasonal quantities step on fixed seasonal boundaries instead of the period map.
    pub fn is_seasonal(&self) -> bool {
        Self::SEASONAL.contains(self)
    }

    pub fn target(&self) -> Target {
        match self {
            Quantity::WorkContacts => Target::ContactLayer(Layer::Work),
            Quantity::SchoolContacts => Target::ContactLayer(Layer::School),
            Quantity::CasualContacts => Target::ContactLayer(Layer::Casual),
            other => Target::Parameter(*other),
        }
    }
}

// ================================================================================================
// Schedules
// ================================================================================================

/// Step of a piecewise-constant signal: `value` holds from `offset` until the next point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChangePoint {
    pub offset: DayOffset,
    pub value: f64,
}

impl From<(i64, f64)> for ChangePoint {
    fn from((offset, value): (i64, f64)) -> Self {
        Self {
            offset: DayOffset(offset),
            value,
        }
    }
}

/// Ordered change-points of one quantity. Offsets are strictly increasing and
/// values finite; deserialization enforces both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSchedule", into = "RawSchedule")]
pub struct Schedule {
    quantity: Quantity,
    points: Vec<ChangePoint>,
}

#[derive(Serialize, Deserialize)]
struct RawSchedule {
    quantity: Quantity,
    points: Vec<ChangePoint>,
}

impl TryFrom<RawSchedule> for Schedule {
    type Error = String;

    fn try_from(raw: RawSchedule) -> Result<Self, Self::Error> {
        if let Some(w) = raw.points.windows(2).find(|w| w[0].offset >= w[1].offset) {
            return Err(format!(
                "change-points of '{}' must have strictly increasing offsets, got {} then {}",
                raw.quantity, w[0].offset, w[1].offset
            ));
        }
        if let Some(p) = raw.points.iter().find(|p| !p.value.is_finite()) {
            return Err(format!(
                "change-point of '{}' at day {} has non-finite value {}",
                raw.quantity, p.offset, p.value
            ));
        }
        Ok(Self {
            quantity: raw.quantity,
            points: raw.points,
        })
    }
}

impl From<Schedule> for RawSchedule {
    fn from(schedule: Schedule) -> Self {
        Self {
            quantity: schedule.quantity,
            points: schedule.points,
        }
    }
}

impl Schedule {
    pub(crate) fn new(quantity: Quantity, points: Vec<ChangePoint>) -> Self {
        debug_assert!(points.windows(2).all(|w| w[0].offset < w[1].offset));
        Self { quantity, points }
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    pub fn target(&self) -> Target {
        self.quantity.target()
    }

    pub fn points(&self) -> &[ChangePoint] {
        &self.points
    }

    pub fn days(&self) -> Vec<i64> {
        self.points.iter().map(|p| p.offset.0).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// A single change-point degenerates to a constant signal.
    pub fn is_constant(&self) -> bool {
        self.points.windows(2).all(|w| w[0].value == w[1].value)
    }

    /// Value in force on `day`, or `None` before the first change-point.
    pub fn value_at(&self, day: DayOffset) -> Option<f64> {
        let idx = self.points.partition_point(|p| p.offset <= day);
        idx.checked_sub(1).map(|i| self.points[i].value)
    }
}

/// Everything the scheduler hands to the external simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSet {
    schedules: BTreeMap<Quantity, Schedule>,
    contact_tracing: ContactTracing,
    testing: TestingPolicy,
}

impl ScheduleSet {
    pub(crate) fn new(
        schedules: BTreeMap<Quantity, Schedule>,
        contact_tracing: ContactTracing,
        testing: TestingPolicy,
    ) -> Self {
        Self {
            schedules,
            contact_tracing,
            testing,
        }
    }

    pub fn get(&self, quantity: Quantity) -> Option<&Schedule> {
        self.schedules.get(&quantity)
    }

    pub fn contains(&self, quantity: Quantity) -> bool {
        self.schedules.contains_key(&quantity)
    }

    /// Schedules in stable quantity order.
    pub fn schedules(&self) -> impl Iterator<Item = &Schedule> {
        self.schedules.values()
    }

    pub fn quantities(&self) -> impl Iterator<Item = Quantity> + '_ {
        self.schedules.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.schedules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schedules.is_empty()
    }

    pub fn contact_tracing(&self) -> &ContactTracing {
        &self.contact_tracing
    }

    pub fn testing(&self) -> &TestingPolicy {
        &self.testing
    }
}
