use chrono::NaiveDate;
use polars::prelude::{Column, DataFrame};

use crate::{
    calendar::{CalendarEpoch, DayOffset},
    dataset::record::{TimeSeriesRecord, read_f64},
    error::{DatasetError, SurrogateResult},
    zone::ColorZone,
};

pub const SEVERE_COL: &str = "n_severe";
pub const CRITICAL_COL: &str = "n_critical";
pub const DIAGNOSES_COL: &str = "cum_diagnoses";
pub const DEATHS_COL: &str = "cum_deaths";
pub const TESTS_COL: &str = "new_tests";

/// Canonical daily columns, in output order.
pub const DAILY_COLUMNS: [&str; 5] = [
    SEVERE_COL,
    CRITICAL_COL,
    DIAGNOSES_COL,
    DEATHS_COL,
    TESTS_COL,
];

// ================================================================================================
// Preparation
// ================================================================================================

/// Normalizes a table of observed daily counts.
///
/// `new_tests` arrives cumulative and is turned into daily differences, the
/// first day keeping its own value. Every column is then divided by
/// `scaling_factor` and clipped below at 0. Only the [`DAILY_COLUMNS`] are
/// kept.
///
/// # Errors
/// - [`DatasetError::InvalidScalingFactor`] unless `scaling_factor` is finite and positive.
/// - [`DatasetError::MissingColumn`] / [`DatasetError::MissingValue`] on incomplete input.
#[tracing::instrument(skip_all, fields(rows = frame.height(), scaling_factor = scaling_factor))]
pub fn prepare_daily(frame: &DataFrame, scaling_factor: f64) -> SurrogateResult<DataFrame> {
    if !(scaling_factor.is_finite() && scaling_factor > 0.0) {
        return Err(DatasetError::InvalidScalingFactor(scaling_factor).into());
    }

    let columns = DAILY_COLUMNS
        .iter()
        .map(|&name| {
            let mut values = read_f64(frame, name)?;
            if name == TESTS_COL {
                values = daily_differences(&values);
            }
            let values: Vec<f64> = values
                .into_iter()
                .map(|v| (v / scaling_factor).max(0.0))
                .collect();
            Ok(Column::new(name.into(), values))
        })
        .collect::<Result<Vec<_>, DatasetError>>()?;

    Ok(DataFrame::new(columns)?)
}

fn daily_differences(cumulative: &[f64]) -> Vec<f64> {
    cumulative
        .first()
        .copied()
        .into_iter()
        .chain(cumulative.windows(2).map(|pair| pair[1] - pair[0]))
        .collect()
}

// ================================================================================================
// Daily Table
// ================================================================================================

/// Observed counts on consecutive days starting at `start`.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyTable {
    start: NaiveDate,
    severe: Vec<f64>,
    critical: Vec<f64>,
    cum_diagnoses: Vec<f64>,
    cum_deaths: Vec<f64>,
    tests: Vec<f64>,
}

impl DailyTable {
    /// Reads the [`DAILY_COLUMNS`] of `frame`; row `i` is day `start + i`.
    pub fn from_frame(frame: &DataFrame, start: NaiveDate) -> SurrogateResult<Self> {
        Ok(Self {
            start,
            severe: read_f64(frame, SEVERE_COL)?,
            critical: read_f64(frame, CRITICAL_COL)?,
            cum_diagnoses: read_f64(frame, DIAGNOSES_COL)?,
            cum_deaths: read_f64(frame, DEATHS_COL)?,
            tests: read_f64(frame, TESTS_COL)?,
        })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn len(&self) -> usize {
        self.severe.len()
    }

    pub fn is_empty(&self) -> bool {
        self.severe.is_empty()
    }

    pub fn tests(&self) -> &[f64] {
        &self.tests
    }

    fn hosp(&self, row: usize) -> f64 {
        self.severe[row] + self.critical[row]
    }

    /// `[hosp, diag, dead]` of `row`, with diag and dead as increases over `row - 1`.
    fn day(&self, row: usize) -> [f64; 3] {
        [
            self.hosp(row),
            self.cum_diagnoses[row] - self.cum_diagnoses[row - 1],
            self.cum_deaths[row] - self.cum_deaths[row - 1],
        ]
    }
}

// ================================================================================================
// Real Samples
// ================================================================================================

/// Cuts one record around every zone change but the last.
///
/// A change at offset `o` takes rows `[o - time_interval - 1, o + time_interval)`.
/// The first row only seeds the day-over-day increases, so each record spans
/// `2 * time_interval` days. The first record starts from the white zone; later
/// ones start from the zone of the preceding change.
///
/// # Errors
/// [`DatasetError::WindowOutOfRange`] if a window does not fit inside the table.
#[tracing::instrument(skip_all, fields(days = table.len(), changes = zone_changes.len(), time_interval = time_interval))]
pub fn real_samples(
    table: &DailyTable,
    epoch: CalendarEpoch,
    zone_changes: &[(NaiveDate, ColorZone)],
    time_interval: usize,
) -> SurrogateResult<Vec<TimeSeriesRecord>> {
    let table_start = epoch.offset(table.start());
    let half = time_interval as i64;
    let mut previous = ColorZone::White;
    let mut records = Vec::with_capacity(zone_changes.len().saturating_sub(1));

    for &(date, zone) in zone_changes.iter().take(zone_changes.len().saturating_sub(1)) {
        let DayOffset(row) = epoch.offset(date) - table_start.days();
        let (start, end) = (row - half - 1, row + half);
        if start < 0 || end > table.len() as i64 {
            return Err(DatasetError::WindowOutOfRange {
                start,
                end,
                len: table.len(),
            }
            .into());
        }

        let values = ((start + 1) as usize..end as usize)
            .flat_map(|r| table.day(r))
            .collect();
        records.push(TimeSeriesRecord::from_zones(values, previous, zone));
        previous = zone;
    }

    tracing::debug!(records = records.len(), "Cut real samples");
    Ok(records)
}
