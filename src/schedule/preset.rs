//! Ready-made period maps for calibration and sampling runs.

use itertools::Itertools;

use crate::{
    calendar::{CalendarEpoch, DayOffset, ymd},
    error::{ScheduleError, SurrogateResult},
    schedule::period::PeriodMap,
    zone::{ColorZone, PolicyZone},
};

/// The observed regional policy sequence, used to calibrate the simulator
/// against real data.
pub fn calibration(epoch: CalendarEpoch) -> SurrogateResult<PeriodMap> {
    use PolicyZone::*;

    PeriodMap::from_dates(
        epoch,
        [
            (ymd(2020, 2, 24), Init),
            (ymd(2020, 3, 8), Red),
            (ymd(2020, 5, 18), Summer),
            (ymd(2020, 11, 8), Yellow),
            (ymd(2020, 11, 15), Orange),
            (ymd(2020, 12, 10), Yellow),
            (ymd(2020, 12, 21), Orange),
            (ymd(2021, 2, 1), Yellow),
            (ymd(2021, 2, 21), Orange),
            (ymd(2021, 3, 1), Red),
        ],
    )
}

/// Start of the synthetic part of a sampling run.
pub fn sampling_start() -> chrono::NaiveDate {
    ymd(2020, 11, 1)
}

/// The historical spring sequence followed by one synthetic period per entry of
/// `zones`, starting on 2020-11-01 and switching every `interval` days.
///
/// # Errors
/// [`ScheduleError::InvalidSampling`] if `interval` is not positive or a period
/// start overflows the day range.
pub fn sampling(
    epoch: CalendarEpoch,
    zones: &[ColorZone],
    interval: i64,
) -> SurrogateResult<PeriodMap> {
    if interval <= 0 {
        return Err(ScheduleError::InvalidSampling(format!(
            "interval must be positive, got {interval}"
        ))
        .into());
    }

    let start = epoch.offset(sampling_start());
    let historical = [
        (DayOffset::ZERO, PolicyZone::Init),
        (epoch.offset(ymd(2020, 3, 8)), PolicyZone::Red),
        (epoch.offset(ymd(2020, 5, 18)), PolicyZone::Summer),
    ];
    let synthetic = zones
        .iter()
        .enumerate()
        .map(|(i, zone)| {
            let offset = i64::try_from(i)
                .ok()
                .and_then(|i| interval.checked_mul(i))
                .and_then(|shift| start.days().checked_add(shift))
                .ok_or_else(|| {
                    ScheduleError::InvalidSampling(format!(
                        "period {i} with interval {interval} overflows the day range"
                    ))
                })?;
            Ok((DayOffset(offset), zone.policy_zone()))
        })
        .collect::<Result<Vec<_>, ScheduleError>>()?;

    PeriodMap::from_entries(historical.into_iter().chain(synthetic))
}

/// Every sequence of length `0..=num_levels` over `alphabet`, shortest first and
/// lexicographic (in alphabet order) within one length.
///
/// With the four colour zones and `num_levels = 2` this is the empty sequence,
/// 4 single-zone sequences and 16 two-zone sequences.
pub fn incremental_levels<T: Clone>(num_levels: usize, alphabet: &[T]) -> Vec<Vec<T>> {
    let mut sequences = vec![Vec::new()];
    for length in 1..=num_levels {
        sequences.extend(
            std::iter::repeat_n(alphabet.iter().cloned(), length).multi_cartesian_product(),
        );
    }
    sequences
}
