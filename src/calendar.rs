use std::fmt;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{
    error::{CalendarError, SurrogateResult},
    impl_from_primitive, impl_shift_primitive,
};

/// Date format accepted by [`CalendarEpoch::parse_offset`] and [`parse_date`].
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Signed number of whole days since a [`CalendarEpoch`].
///
/// After the calendar boundary every schedule and window is expressed in day
/// offsets, never in dates.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct DayOffset(pub i64);
impl_from_primitive!(DayOffset, i64);
impl_shift_primitive!(DayOffset, i64);

impl DayOffset {
    pub const ZERO: DayOffset = DayOffset(0);

    pub fn days(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for DayOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The date that marks day 0.
///
/// Immutable once built; both the scheduler and the dataset builders take it
/// as an argument instead of reading a process-wide constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalendarEpoch(NaiveDate);

impl Default for CalendarEpoch {
    /// First day of the regional outbreak series, 2020-02-24.
    fn default() -> Self {
        Self(ymd(2020, 2, 24))
    }
}

impl From<NaiveDate> for CalendarEpoch {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl CalendarEpoch {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn parse(date: &str) -> SurrogateResult<Self> {
        parse_date(date).map(Self)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Whole days from the epoch to `date`; negative for dates before it.
    pub fn offset(&self, date: NaiveDate) -> DayOffset {
        offset(date, *self)
    }

    /// Parses a `YYYY-MM-DD` string and converts it to a day offset.
    pub fn parse_offset(&self, date: &str) -> SurrogateResult<DayOffset> {
        parse_date(date).map(|d| self.offset(d))
    }

    /// Inverse of [`CalendarEpoch::offset`].
    pub fn date_at(&self, offset: DayOffset) -> SurrogateResult<NaiveDate> {
        Duration::try_days(offset.0)
            .and_then(|delta| self.0.checked_add_signed(delta))
            .ok_or_else(|| CalendarError::OffsetOutOfRange(offset.0).into())
    }
}

/// `days_between(date, epoch)`. Total over any pair of dates.
pub fn offset(date: NaiveDate, epoch: CalendarEpoch) -> DayOffset {
    DayOffset(date.signed_duration_since(epoch.0).num_days())
}

pub fn parse_date(date: &str) -> SurrogateResult<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), DATE_FORMAT)
        .map_err(|_| CalendarError::InvalidDate(date.to_string()).into())
}

/// Builds a date from literal components that are known to be valid.
pub(crate) fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("calendar literal must be a valid date")
}
