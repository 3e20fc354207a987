use ndarray::ArrayView2;
use polars::prelude::{Column, DataFrame, DataType};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumCount, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::{
    error::{DatasetError, SurrogateResult},
    zone::ColorZone,
};

pub const INIT_ZONE_COL: &str = "init_zone";
pub const ACTUATED_ZONE_COL: &str = "actuated_zone";

// ================================================================================================
// Tracked Quantities
// ================================================================================================

/// The three daily series of a record, in payload order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
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
pub enum TrackedQuantity {
    /// People in hospital (severe plus critical).
    Hosp,
    /// New diagnoses.
    Diag,
    /// New deaths.
    Dead,
}

impl TrackedQuantity {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// Column of this quantity at `day`, e.g. `diag_12`.
    pub fn column(&self, day: usize) -> String {
        format!("{}_{day}", self.as_str())
    }

    /// Position inside one day's `[hosp, diag, dead]` triple.
    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// Payload columns of a record table, interleaved per day:
/// `hosp_0, diag_0, dead_0, hosp_1, ...`.
pub fn column_names(window_half_length: usize) -> Vec<String> {
    (0..2 * window_half_length)
        .flat_map(|day| TrackedQuantity::iter().map(move |q| q.column(day)))
        .collect()
}

// ================================================================================================
// Record
// ================================================================================================

/// One row of a derived dataset: `2 * window_half_length` days of
/// `[hosp, diag, dead]` triples plus the zone before and after the switch.
///
/// Zone labels are kept as given and validated on extraction, so a batch can
/// report an unknown label for the row that carries it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesRecord {
    values: Vec<f64>,
    init_zone: String,
    actuated_zone: String,
}

impl TimeSeriesRecord {
    pub fn new(
        values: Vec<f64>,
        init_zone: impl Into<String>,
        actuated_zone: impl Into<String>,
    ) -> Self {
        Self {
            values,
            init_zone: init_zone.into(),
            actuated_zone: actuated_zone.into(),
        }
    }

    pub fn from_zones(values: Vec<f64>, init_zone: ColorZone, actuated_zone: ColorZone) -> Self {
        Self::new(values, init_zone.as_str(), actuated_zone.as_str())
    }

    /// Payload length of a record spanning `2 * window_half_length` days.
    pub fn expected_len(window_half_length: usize) -> usize {
        TrackedQuantity::COUNT * 2 * window_half_length
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn init_zone(&self) -> &str {
        &self.init_zone
    }

    pub fn actuated_zone(&self) -> &str {
        &self.actuated_zone
    }

    /// Parses both zone labels.
    pub fn zones(&self) -> Result<(ColorZone, ColorZone), DatasetError> {
        Ok((
            ColorZone::parse(&self.init_zone)?,
            ColorZone::parse(&self.actuated_zone)?,
        ))
    }

    /// The payload as a `(2 * window_half_length, 3)` view, one row per day.
    ///
    /// # Errors
    /// [`DatasetError::MalformedRecord`] if the payload length does not match.
    pub fn days(&self, window_half_length: usize) -> Result<ArrayView2<'_, f64>, DatasetError> {
        let expected = Self::expected_len(window_half_length);
        if self.values.len() != expected {
            return Err(DatasetError::MalformedRecord {
                expected,
                actual: self.values.len(),
            });
        }

        ArrayView2::from_shape((2 * window_half_length, TrackedQuantity::COUNT), &self.values)
            .map_err(|_| DatasetError::MalformedRecord {
                expected,
                actual: self.values.len(),
            })
    }
}

// ================================================================================================
// Frame Conversion
// ================================================================================================

/// Reads records from a table with the [`column_names`] payload columns and
/// string `init_zone` / `actuated_zone` columns. Other columns are ignored.
///
/// # Errors
/// - [`DatasetError::MissingColumn`] if a required column is absent.
/// - [`DatasetError::MissingValue`] on a null cell.
pub fn records_from_frame(
    frame: &DataFrame,
    window_half_length: usize,
) -> SurrogateResult<Vec<TimeSeriesRecord>> {
    let height = frame.height();
    let names = column_names(window_half_length);

    let columns = names
        .iter()
        .map(|name| read_f64(frame, name))
        .collect::<Result<Vec<_>, _>>()?;
    let init_zones = read_str(frame, INIT_ZONE_COL)?;
    let actuated_zones = read_str(frame, ACTUATED_ZONE_COL)?;

    let records = (0..height)
        .map(|row| {
            let values = columns.iter().map(|col| col[row]).collect();
            TimeSeriesRecord::new(
                values,
                init_zones[row].clone(),
                actuated_zones[row].clone(),
            )
        })
        .collect();

    Ok(records)
}

/// Inverse of [`records_from_frame`].
///
/// # Errors
/// [`DatasetError::MalformedRecord`] if a record does not span `2 * window_half_length` days.
pub fn records_to_frame(
    records: &[TimeSeriesRecord],
    window_half_length: usize,
) -> SurrogateResult<DataFrame> {
    let expected = TimeSeriesRecord::expected_len(window_half_length);
    if let Some(bad) = records.iter().find(|r| r.values.len() != expected) {
        return Err(DatasetError::MalformedRecord {
            expected,
            actual: bad.values.len(),
        }
        .into());
    }

    let mut columns: Vec<Column> = column_names(window_half_length)
        .into_iter()
        .enumerate()
        .map(|(j, name)| {
            let values: Vec<f64> = records.iter().map(|r| r.values[j]).collect();
            Column::new(name.into(), values)
        })
        .collect();

    let init: Vec<&str> = records.iter().map(|r| r.init_zone.as_str()).collect();
    let actuated: Vec<&str> = records.iter().map(|r| r.actuated_zone.as_str()).collect();
    columns.push(Column::new(INIT_ZONE_COL.into(), init));
    columns.push(Column::new(ACTUATED_ZONE_COL.into(), actuated));

    Ok(DataFrame::new(columns)?)
}

pub(crate) fn read_f64(frame: &DataFrame, name: &str) -> Result<Vec<f64>, DatasetError> {
    let column = frame
        .column(name)
        .map_err(|_| DatasetError::MissingColumn(name.to_string()))?
        .cast(&DataType::Float64)?;

    column
        .f64()?
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            value.ok_or_else(|| DatasetError::MissingValue {
                column: name.to_string(),
                row,
            })
        })
        .collect()
}

fn read_str(frame: &DataFrame, name: &str) -> Result<Vec<String>, DatasetError> {
    let column = frame
        .column(name)
        .map_err(|_| DatasetError::MissingColumn(name.to_string()))?;

    column
        .str()?
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            value
                .map(str::to_string)
                .ok_or_else(|| DatasetError::MissingValue {
                    column: name.to_string(),
                    row,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    fn ramp_record(window_half_length: usize) -> TimeSeriesRecord {
        let values = (0..TimeSeriesRecord::expected_len(window_half_length))
            .map(|v| v as f64)
            .collect();
        TimeSeriesRecord::from_zones(values, ColorZone::White, ColorZone::Red)
    }

    #[test]
    fn column_names_interleave_per_day() {
        let names = column_names(1);
        assert_eq!(
            names,
            ["hosp_0", "diag_0", "dead_0", "hosp_1", "diag_1", "dead_1"]
        );
    }

    #[test]
    fn days_view_has_one_row_per_day() {
        let record = ramp_record(2);
        let days = record.days(2).unwrap();
        assert_eq!(days.dim(), (4, 3));
        assert_eq!(days[[0, TrackedQuantity::Dead.index()]], 2.0);
        assert_eq!(days[[3, TrackedQuantity::Hosp.index()]], 9.0);
    }

    #[test]
    fn wrong_length_is_malformed() {
        let record = TimeSeriesRecord::new(vec![1.0; 10], "W", "R");
        let err = record.days(2).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::MalformedRecord {
                expected: 12,
                actual: 10
            }
        ));
    }

    #[test]
    fn zones_are_validated_lazily() {
        let record = TimeSeriesRecord::new(vec![0.0; 6], "W", "X");
        assert_eq!(record.actuated_zone(), "X");
        assert!(matches!(
            record.zones(),
            Err(DatasetError::UnknownZoneLabel(ref l)) if l == "X"
        ));
    }

    // ============================================================================================
    // Frame Conversion
    // ============================================================================================

    #[test]
    fn frame_round_trip_keeps_rows() {
        let records = vec![ramp_record(2), TimeSeriesRecord::new(vec![1.0; 12], "Y", "O")];
        let frame = records_to_frame(&records, 2).unwrap();
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.width(), 12 + 2);

        let back = records_from_frame(&frame, 2).unwrap();
        assert_eq!(back, records);
    }

    #[test]
    fn integer_columns_are_cast() {
        let frame = df!(
            "hosp_0" => [1i64], "diag_0" => [2i64], "dead_0" => [3i64],
            "hosp_1" => [4i64], "diag_1" => [5i64], "dead_1" => [6i64],
            "init_zone" => ["W"], "actuated_zone" => ["R"],
        )
        .unwrap();
        let records = records_from_frame(&frame, 1).unwrap();
        assert_eq!(records[0].values(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn missing_column_is_reported() {
        let frame = df!("hosp_0" => [1.0], "init_zone" => ["W"]).unwrap();
        let err = records_from_frame(&frame, 1).unwrap_err();
        assert_eq!(err.to_string(), "Missing column 'diag_0'");
    }

    #[test]
    fn null_cell_is_reported() {
        let frame = df!(
            "hosp_0" => [Some(1.0), None], "diag_0" => [1.0, 1.0], "dead_0" => [1.0, 1.0],
            "hosp_1" => [1.0, 1.0], "diag_1" => [1.0, 1.0], "dead_1" => [1.0, 1.0],
            "init_zone" => ["W", "W"], "actuated_zone" => ["R", "R"],
        )
        .unwrap();
        let err = records_from_frame(&frame, 1).unwrap_err();
        assert_eq!(err.to_string(), "Missing value in column 'hosp_0' at row 1");
    }
}
