use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{
    calendar::{CalendarEpoch, DayOffset},
    error::{ScheduleError, SurrogateResult},
    zone::PolicyZone,
};

/// Ordered `day offset -> zone` assignments.
///
/// Each zone is active from its offset until the next key, the last one
/// indefinitely. Keys are strictly increasing and the map always covers day 0:
/// when the first explicit period starts after day 0, an implicit
/// [`PolicyZone::Init`] period is inserted at day 0.
///
/// Backed by a sorted `SmallVec`, since real period maps hold a handful of
/// entries.
///
/// # Examples
///
/// ```rust
/// # use epi_surrogate::schedule::PeriodMap;
/// # use epi_surrogate::zone::PolicyZone;
/// let map = PeriodMap::from_days([(84, PolicyZone::Summer), (13, PolicyZone::Red)]).unwrap();
/// let offsets: Vec<i64> = map.offsets().map(|o| o.days()).collect();
/// assert_eq!(offsets, vec![0, 13, 84]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<(DayOffset, PolicyZone)>", into = "Vec<(DayOffset, PolicyZone)>")]
pub struct PeriodMap {
    inner: SmallVec<[(DayOffset, PolicyZone); 16]>,
}

impl PeriodMap {
    /// An empty map: the scheduler emits no time-varying schedules for it.
    pub fn empty() -> Self {
        Self {
            inner: SmallVec::new(),
        }
    }

    /// Builds a map from unordered entries.
    ///
    /// # Errors
    /// [`ScheduleError::DuplicateOffset`] if two entries share a start offset.
    pub fn from_entries<I>(entries: I) -> SurrogateResult<Self>
    where
        I: IntoIterator<Item = (DayOffset, PolicyZone)>,
    {
        let mut inner: SmallVec<[(DayOffset, PolicyZone); 16]> = entries.into_iter().collect();
        inner.sort_by_key(|(offset, _)| *offset);

        if let Some(w) = inner.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(ScheduleError::DuplicateOffset(w[0].0.days()).into());
        }

        if let Some(&(first, _)) = inner.first()
            && first > DayOffset::ZERO
        {
            inner.insert(0, (DayOffset::ZERO, PolicyZone::Init));
        }

        Ok(Self { inner })
    }

    /// Same as [`PeriodMap::from_entries`] with plain day counts.
    pub fn from_days<I>(entries: I) -> SurrogateResult<Self>
    where
        I: IntoIterator<Item = (i64, PolicyZone)>,
    {
        Self::from_entries(
            entries
                .into_iter()
                .map(|(days, zone)| (DayOffset(days), zone)),
        )
    }

    /// Builds a map from calendar dates relative to `epoch`.
    pub fn from_dates<I>(epoch: CalendarEpoch, entries: I) -> SurrogateResult<Self>
    where
        I: IntoIterator<Item = (NaiveDate, PolicyZone)>,
    {
        Self::from_entries(
            entries
                .into_iter()
                .map(|(date, zone)| (epoch.offset(date), zone)),
        )
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Entries in ascending offset order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (DayOffset, PolicyZone)> + '_ {
        self.inner.iter().copied()
    }

    #[inline]
    pub fn offsets(&self) -> impl Iterator<Item = DayOffset> + '_ {
        self.inner.iter().map(|(offset, _)| *offset)
    }

    /// Distinct zones in order of first appearance.
    pub fn zones(&self) -> Vec<PolicyZone> {
        let mut zones: Vec<PolicyZone> = Vec::with_capacity(self.inner.len());
        for (_, zone) in &self.inner {
            if !zones.contains(zone) {
                zones.push(*zone);
            }
        }
        zones
    }

    pub fn contains_zone(&self, zone: PolicyZone) -> bool {
        self.inner.iter().any(|(_, z)| *z == zone)
    }

    /// Zone active on `day`, or `None` before the first period.
    pub fn zone_at(&self, day: DayOffset) -> Option<PolicyZone> {
        let idx = self.inner.partition_point(|(offset, _)| *offset <= day);
        idx.checked_sub(1).map(|i| self.inner[i].1)
    }
}

impl TryFrom<Vec<(DayOffset, PolicyZone)>> for PeriodMap {
    type Error = String;

    fn try_from(entries: Vec<(DayOffset, PolicyZone)>) -> Result<Self, Self::Error> {
        PeriodMap::from_entries(entries).map_err(|e| e.to_string())
    }
}

impl From<PeriodMap> for Vec<(DayOffset, PolicyZone)> {
    fn from(map: PeriodMap) -> Self {
        map.inner.into_vec()
    }
}
