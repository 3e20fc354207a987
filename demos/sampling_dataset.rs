use std::{path::Path, time::Instant};

use anyhow::{Context, Result};
use epi_surrogate::{prelude::*, schedule::preset::incremental_levels};
use tracing::info;
use tracing_subscriber::EnvFilter;

const WINDOW_HALF_LENGTH: usize = 21;

fn main() -> Result<()> {
    init_tracing();

    let start = Instant::now();
    let epoch = CalendarEpoch::default();
    let parameters = parameters()?;

    let designs = incremental_levels(2, &[ColorZone::Yellow, ColorZone::Orange, ColorZone::Red]);
    let mut records = Vec::new();
    for zones in designs.iter().filter(|zones| !zones.is_empty()) {
        let map = preset::sampling(epoch, zones, WINDOW_HALF_LENGTH as i64)?;
        let schedules = build_schedule(&map, &parameters)
            .with_context(|| format!("Failed to schedule design {zones:?}"))?;
        records.extend(toy_records(&schedules, &map, epoch)?);
    }
    info!(records = records.len(), "Synthesized records");

    let config = DatasetConfig::default().with_seed(42);
    let data = process_dataset(&records, &config)?;
    let scalers = data.scalers.context("Scaling is enabled by default")?;

    let out = Path::new("demos/output");
    scalers.features.write(out.join("feature_scaler.json"), SerdeFormat::Json)?;
    scalers.labels.write(out.join("label_scaler.json"), SerdeFormat::Json)?;

    println!("\n--- Sampling Dataset ---");
    println!("Designs:          {}", designs.len() - 1);
    println!("Training rows:    {}", data.train.len());
    println!(
        "Validation rows:  {}",
        data.validation.as_ref().map_or(0, Split::len)
    );
    println!("Features per row: {}", data.feature_names.len());
    println!("Elapsed:          {:?}", start.elapsed());

    Ok(())
}

// ================================================================================================
// Tracing Configuration
// ================================================================================================

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(env_filter)
        .with_span_events(tracing_subscriber::fmt::format::FmtSpan::NONE)
        .with_current_span(true)
        .with_thread_ids(true)
        .init();
}

// ================================================================================================
// Helper Functions
// ================================================================================================

fn parameters() -> Result<ParameterTable> {
    let table = ParameterTable::from_json_str(
        r#"{
            "red_work_contacts": 0.3,
            "work_contacts": 0.6,
            "school_contacts": 0.5,
            "casual_contacts": 0.4,
            "init_imports": 2.0,
            "init_beta": 0.05,
            "summer_beta": 0.03,
            "winter_beta": 0.06,
            "trace_prob": 0.6,
            "trace_time": 2.0
        }"#,
    )?;
    Ok(table)
}

/// Stand-in for the simulator: incidence grows or shrinks with the work-contact
/// level in force, and every synthetic switch is cut into one record.
fn toy_records(
    schedules: &ScheduleSet,
    map: &PeriodMap,
    epoch: CalendarEpoch,
) -> Result<Vec<TimeSeriesRecord>> {
    let work = schedules
        .get(Quantity::WorkContacts)
        .context("Work contacts are always scheduled")?;
    let beta = schedules.get(Quantity::Beta).context("init_beta is set")?;
    let synthetic_start = epoch.offset(preset::sampling_start());

    let entries: Vec<_> = map.iter().collect();
    let mut records = Vec::new();
    for pair in entries.windows(2) {
        let ((_, before), (switch, after)) = (pair[0], pair[1]);
        if switch < synthetic_start {
            continue;
        }

        let mut infected = 100.0;
        let mut values = Vec::with_capacity(6 * WINDOW_HALF_LENGTH);
        for day in -(WINDOW_HALF_LENGTH as i64)..WINDOW_HALF_LENGTH as i64 {
            let today = switch + day;
            let contacts = work.value_at(today).unwrap_or(1.0);
            let rate = beta.value_at(today).unwrap_or(0.05) * 5.0 * contacts - 0.15;
            infected *= 1.0 + rate;
            values.extend([0.05 * infected, 0.3 * infected, 0.01 * infected]);
        }

        records.push(TimeSeriesRecord::new(
            values,
            zone_label(before),
            zone_label(after),
        ));
    }
    Ok(records)
}

fn zone_label(zone: PolicyZone) -> &'static str {
    match zone {
        PolicyZone::Yellow => "Y",
        PolicyZone::Orange => "O",
        PolicyZone::Red => "R",
        _ => "W",
    }
}
