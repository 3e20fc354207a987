use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    calendar::{CalendarEpoch, DayOffset, ymd},
    error::{ScheduleError, SurrogateResult},
    schedule::{
        ChangePoint, Quantity, Schedule, ScheduleSet,
        parameters::ParameterTable,
        period::PeriodMap,
        statics::{ContactTracing, TestingPolicy},
    },
    zone::PolicyZone,
};

// ================================================================================================
// Configuration
// ================================================================================================

/// Boundaries of the three-point seasonal schedules (init, summer, winter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonalCalendar {
    pub summer_start: NaiveDate,
    pub winter_start: NaiveDate,
}

impl Default for SeasonalCalendar {
    fn default() -> Self {
        Self {
            summer_start: ymd(2020, 5, 18),
            winter_start: ymd(2020, 10, 1),
        }
    }
}

impl SeasonalCalendar {
    pub fn new(summer_start: NaiveDate, winter_start: NaiveDate) -> Self {
        Self {
            summer_start,
            winter_start,
        }
    }

    /// Change-point offsets `[0, summer, winter]`.
    ///
    /// # Errors
    /// [`ScheduleError::InvalidSeasons`] unless `0 < summer < winter`.
    pub fn offsets(&self, epoch: CalendarEpoch) -> SurrogateResult<[DayOffset; 3]> {
        let summer = epoch.offset(self.summer_start);
        let winter = epoch.offset(self.winter_start);

        if summer <= DayOffset::ZERO || winter <= summer {
            return Err(ScheduleError::InvalidSeasons(format!(
                "expected 0 < summer ({summer}) < winter ({winter}) relative to epoch {}",
                epoch.date()
            ))
            .into());
        }

        Ok([DayOffset::ZERO, summer, winter])
    }
}

/// Everything the scheduler needs besides the period map and the parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub epoch: CalendarEpoch,
    pub seasons: SeasonalCalendar,
    pub testing: TestingPolicy,
}

impl SchedulerConfig {
    pub fn with_epoch(self, epoch: CalendarEpoch) -> Self {
        Self { epoch, ..self }
    }

    pub fn with_seasons(self, seasons: SeasonalCalendar) -> Self {
        Self { seasons, ..self }
    }

    pub fn with_testing(self, testing: TestingPolicy) -> Self {
        Self { testing, ..self }
    }
}

// ================================================================================================
// Scheduler
// ================================================================================================

/// Turns a [`PeriodMap`] and a [`ParameterTable`] into the piecewise-constant
/// controls of the simulator.
///
/// Calibration and sampling runs are the same component with different period
/// maps (see [`crate::schedule::preset`]).
#[derive(Debug, Clone, Default)]
pub struct PolicyScheduler {
    config: SchedulerConfig,
}

impl PolicyScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Builds every schedule for one simulation run.
    ///
    /// Period-mapped quantities substitute the resolved per-zone value at each
    /// period start. Seasonal quantities use the three seasonal change-points and
    /// are omitted when their `init_` value is required and absent. An empty
    /// period map yields no schedules at all. Contact tracing and testing are
    /// always part of the result.
    ///
    /// # Errors
    /// - [`ScheduleError::MissingRequiredParameter`] if a required value does not
    ///   resolve for a zone present in `period_map`.
    /// - [`ScheduleError::InvalidSeasons`] if the seasonal boundaries are out of order.
    #[tracing::instrument(skip_all, fields(periods = period_map.len(), parameters = table.len()))]
    pub fn build_schedule(
        &self,
        period_map: &PeriodMap,
        table: &ParameterTable,
    ) -> SurrogateResult<ScheduleSet> {
        let mut schedules = BTreeMap::new();

        if !period_map.is_empty() {
            let zones = period_map.zones();
            for quantity in Quantity::PERIOD_MAPPED {
                let schedule = substitute(quantity, period_map, &zones, table)?;
                schedules.insert(quantity, schedule);
            }

            let offsets = self.config.seasons.offsets(self.config.epoch)?;
            for quantity in Quantity::SEASONAL {
                match table.resolve_seasons(quantity) {
                    Some(values) => {
                        let points = offsets
                            .iter()
                            .zip(values)
                            .map(|(&offset, value)| ChangePoint { offset, value })
                            .collect();
                        schedules.insert(quantity, Schedule::new(quantity, points));
                    }
                    None => tracing::warn!(
                        quantity = %quantity,
                        key = %format!("init_{}", quantity.suffix()),
                        "Seasonal schedule omitted: initial value not provided"
                    ),
                }
            }
        }

        for schedule in schedules.values() {
            tracing::debug!(
                quantity = %schedule.quantity(),
                days = ?schedule.days(),
                values = ?schedule.values(),
                "Resolved schedule"
            );
        }

        Ok(ScheduleSet::new(
            schedules,
            ContactTracing::resolve(table),
            self.config.testing.clone(),
        ))
    }
}

/// [`PolicyScheduler::build_schedule`] with the default configuration.
pub fn build_schedule(
    period_map: &PeriodMap,
    table: &ParameterTable,
) -> SurrogateResult<ScheduleSet> {
    PolicyScheduler::default().build_schedule(period_map, table)
}

fn substitute(
    quantity: Quantity,
    period_map: &PeriodMap,
    zones: &[PolicyZone],
    table: &ParameterTable,
) -> SurrogateResult<Schedule> {
    let resolved = zones
        .iter()
        .map(|&zone| table.resolve_zone(quantity, zone).map(|value| (zone, value)))
        .collect::<SurrogateResult<BTreeMap<_, _>>>()?;

    let points = period_map
        .iter()
        .map(|(offset, zone)| ChangePoint {
            offset,
            value: resolved[&zone],
        })
        .collect();

    Ok(Schedule::new(quantity, points))
}
