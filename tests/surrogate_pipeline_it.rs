use epi_surrogate::{io, prelude::*};
use ndarray::{Array2, Axis, array};

mod common;

// ================================================================================================
// Schedules
// ================================================================================================

#[test]
fn lockdown_then_summer_schedule() {
    let map = PeriodMap::from_days([
        (0, PolicyZone::Init),
        (13, PolicyZone::Red),
        (84, PolicyZone::Summer),
    ])
    .unwrap();
    let table = ParameterTable::from_json_str(
        r#"{"red_work_contacts": 0.2, "summer_work_contacts": 1.0, "init_work_contacts": 1.0}"#,
    )
    .unwrap();

    let set = build_schedule(&map, &table).unwrap();
    let work = set.get(Quantity::WorkContacts).unwrap();
    assert_eq!(work.days(), vec![0, 13, 84]);
    assert_eq!(work.values(), vec![1.0, 0.2, 1.0]);
    assert_eq!(work.target(), Target::ContactLayer(Layer::Work));
}

#[test]
fn sampling_design_schedules_every_quantity() {
    let epoch = CalendarEpoch::default();
    let map = preset::sampling(epoch, &[ColorZone::Yellow, ColorZone::Red], 14).unwrap();
    let offsets: Vec<i64> = map.offsets().map(|o| o.days()).collect();
    assert_eq!(offsets, vec![0, 13, 84, 251, 265]);

    let set = build_schedule(&map, &common::full_parameters()).unwrap();
    for quantity in Quantity::PERIOD_MAPPED {
        assert_eq!(set.get(quantity).unwrap().days(), offsets, "{quantity}");
    }
    assert_eq!(
        set.get(Quantity::WorkContacts).unwrap().values(),
        vec![1.0, 0.2, 1.0, 1.0, 0.2]
    );
    assert_eq!(
        set.get(Quantity::Beta).unwrap().values(),
        vec![0.05, 0.03, 0.06]
    );
    assert_eq!(
        set.get(Quantity::SchoolContacts).unwrap().values(),
        vec![1.0, 0.0, 0.0, 0.5, 0.0]
    );
    assert_eq!(set.contact_tracing().trace_probs.work, 0.7);
}

#[test]
fn parameter_grid_builds_one_schedule_per_point() -> anyhow::Result<()> {
    let map = PeriodMap::from_days([(0, PolicyZone::Init), (30, PolicyZone::Red)])?;
    let grid = cartesian_product(
        &common::full_parameters(),
        &[("red_work_contacts", vec![0.1, 0.3]), ("init_imports", vec![0.0, 5.0])],
    )?;
    assert_eq!(grid.len(), 4);

    let red_values: Vec<f64> = grid
        .iter()
        .map(|table| build_schedule(&map, table))
        .collect::<SurrogateResult<Vec<_>>>()?
        .iter()
        .map(|set| set.get(Quantity::WorkContacts).unwrap().values()[1])
        .collect();
    assert_eq!(red_values, vec![0.1, 0.1, 0.3, 0.3]);
    Ok(())
}

#[test]
fn schedule_set_survives_a_file_round_trip() -> anyhow::Result<()> {
    let map = preset::calibration(CalendarEpoch::default())?;
    let set = build_schedule(&map, &common::full_parameters())?;

    for format in [SerdeFormat::Postcard, SerdeFormat::Json] {
        let path = common::temp_path(&format!("schedule.{format}"));
        io::write(&set, &path, format)?;
        let back: ScheduleSet = io::read(&path, format)?;
        assert_eq!(back, set);
        std::fs::remove_file(&path)?;
    }
    Ok(())
}

// ================================================================================================
// Feature Extraction
// ================================================================================================

#[test]
fn constant_record_gives_flat_features() {
    let record = TimeSeriesRecord::new(vec![1.0; 120], "W", "R");
    let (features, labels) = extract(&record, 7, 20).unwrap();

    assert_eq!(features.len(), 50);
    assert!(features.iter().take(42).all(|&v| v == 1.0));
    assert_eq!(
        features.iter().skip(42).copied().collect::<Vec<_>>(),
        vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0]
    );
    assert_eq!(labels.to_vec(), vec![1.0, 0.0, 0.0]);
}

#[test]
fn rolling_window_equal_to_half_keeps_one_smoothed_day() {
    let record = common::ramp_records(1, 4).remove(0);
    let (features, _) = extract(&record, 4, 4).unwrap();
    // Mean of days 0..4 of each quantity: (1 + 2 + 3 + 4) / 4 scaled by q + 1.
    assert_eq!(features.slice(ndarray::s![..3]).to_vec(), vec![2.5, 5.0, 7.5]);
    assert_eq!(features.len(), 3 + 8);
}

#[test]
fn feature_length_follows_the_window() {
    for (w, r) in [(5, 1), (5, 5), (10, 3), (21, 7)] {
        let window = WindowSpec::new(w, r).unwrap();
        let extractor = FeatureExtractor::new(window, LabelMode::TotalIncrease).unwrap();
        let record = common::ramp_records(1, w).remove(0);
        let (features, labels) = extractor.extract(&record).unwrap();
        assert_eq!(features.len(), 3 * (w - r + 1) + 8);
        assert_eq!(features.len(), extractor.feature_names().len());
        assert_eq!(labels.len(), 3);
    }
}

#[test]
fn record_tables_feed_the_extractor() -> anyhow::Result<()> {
    let records = common::ramp_records(6, 3);
    let frame = records_to_frame(&records, 3)?;
    let back = records_from_frame(&frame, 3)?;
    assert_eq!(back, records);

    let extractor = FeatureExtractor::new(WindowSpec::new(3, 2)?, LabelMode::DailySum)?;
    let matrix = extractor.extract_batch(&back, BatchPolicy::Abort)?;
    assert_eq!(matrix.features().dim(), (6, 3 * 2 + 8));
    Ok(())
}

// ================================================================================================
// Scaling
// ================================================================================================

#[test]
fn minmax_scaler_maps_columns_to_unit_interval() {
    let matrix = array![[0.0, 10.0], [5.0, 20.0], [10.0, 30.0]];
    let scaler = Scaler::fit(&matrix, &ScalingMethod::MinMax.into()).unwrap();
    assert_eq!(scaler.translation(), &[0.0, 10.0]);
    assert_eq!(scaler.scale(), &[10.0, 20.0]);

    let scaled = scaler.transform(&matrix).unwrap();
    assert_eq!(scaled, array![[0.0, 0.0], [0.5, 0.5], [1.0, 1.0]]);

    let restored = scaler.inverse_transform(&scaled).unwrap();
    for (a, b) in restored.iter().zip(matrix.iter()) {
        assert!((a - b).abs() < 1e-12);
    }
}

#[test]
fn inverse_transform_restores_standardized_input() {
    let matrix: Array2<f64> = Array2::from_shape_fn((8, 3), |(i, j)| (i * i + j) as f64);
    let scaler = Scaler::fit(&matrix, &ScalingMethod::Standardize.into()).unwrap();
    let once = scaler.transform(&matrix).unwrap();
    let back = scaler
        .inverse_transform(&scaler.transform(&scaler.inverse_transform(&once).unwrap()).unwrap())
        .unwrap();
    for (a, b) in back.iter().zip(matrix.iter()) {
        assert!((a - b).abs() < 1e-9);
    }
}

// ================================================================================================
// End-to-End
// ================================================================================================

#[test]
fn observed_series_become_scaled_training_rows() -> anyhow::Result<()> {
    use polars::df;

    let days = 60;
    let frame = df!(
        "n_severe" => (0..days).map(|i| (i * 3) as f64).collect::<Vec<_>>(),
        "n_critical" => (0..days).map(|i| i as f64).collect::<Vec<_>>(),
        "cum_diagnoses" => (0..days).map(|i| (i * i * i) as f64).collect::<Vec<_>>(),
        "cum_deaths" => (0..days).map(|i| (i * i * i) as f64 / 20.0).collect::<Vec<_>>(),
        "new_tests" => (0..days).map(|i| (i * 100) as f64).collect::<Vec<_>>(),
    )?;
    let daily = prepare_daily(&frame, 2.0)?;
    let epoch = CalendarEpoch::default();
    let table = DailyTable::from_frame(&daily, epoch.date())?;

    let changes: Vec<_> = [10, 20, 30, 40, 50]
        .iter()
        .zip([ColorZone::Yellow, ColorZone::Orange, ColorZone::Red, ColorZone::Yellow, ColorZone::White])
        .map(|(&day, zone)| (epoch.date_at(DayOffset(day)).unwrap(), zone))
        .collect();
    let records = real_samples(&table, epoch, &changes, 5)?;
    assert_eq!(records.len(), 4);
    assert_eq!(records[2].init_zone(), "O");

    let config = DatasetConfig::default()
        .with_window(WindowSpec::new(5, 2)?)
        .with_val_split(Some(0.25))
        .with_seed(7);
    let data = process_dataset(&records, &config)?;

    assert_eq!(data.train.len(), 3);
    assert_eq!(data.validation.as_ref().map(|v| v.len()), Some(1));
    let labels = &data.train.labels;
    for column in labels.axis_iter(Axis(1)) {
        assert!(column.iter().all(|&v| (-1e-12..=1.0 + 1e-12).contains(&v)));
    }

    let scalers = data.scalers.expect("scaling is on by default");
    let path = common::temp_path("labels.json");
    scalers.labels.write(&path, SerdeFormat::Json)?;
    assert_eq!(Scaler::read(&path, SerdeFormat::Json)?, scalers.labels);
    std::fs::remove_file(&path)?;
    Ok(())
}
