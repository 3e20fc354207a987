use ndarray::{Array1, ArrayView1, s};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumCount, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::{
    dataset::record::{TimeSeriesRecord, TrackedQuantity},
    error::{DatasetError, SurrogateResult},
    zone::ColorZone,
};

/// Smoothed input half followed by `one_hot(init_zone)` and `one_hot(actuated_zone)`.
pub type FeatureVector = Array1<f64>;

/// Summary statistics of the output half.
pub type LabelVector = Array1<f64>;

/// Number of one-hot columns appended to every feature vector.
pub const ZONE_FEATURES: usize = 2 * ColorZone::COUNT;

// ================================================================================================
// Window
// ================================================================================================

/// Shape of a record window.
///
/// A record spans `2 * window_half_length` days: the first half feeds the
/// features, the second half the labels. The input half is smoothed with a
/// trailing mean over `rolling_days` days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowSpec {
    pub window_half_length: usize,
    pub rolling_days: usize,
}

impl Default for WindowSpec {
    fn default() -> Self {
        Self {
            window_half_length: 21,
            rolling_days: 7,
        }
    }
}

impl WindowSpec {
    /// # Errors
    /// [`DatasetError::InvalidWindow`] unless `1 <= rolling_days <= window_half_length`.
    pub fn new(window_half_length: usize, rolling_days: usize) -> SurrogateResult<Self> {
        let window = Self {
            window_half_length,
            rolling_days,
        };
        window.validate()?;
        Ok(window)
    }

    pub fn validate(&self) -> Result<(), DatasetError> {
        if self.rolling_days == 0 {
            return Err(DatasetError::InvalidWindow(
                "rolling_days must be at least 1".to_string(),
            ));
        }
        if self.rolling_days > self.window_half_length {
            return Err(DatasetError::InvalidWindow(format!(
                "rolling_days ({}) exceeds window_half_length ({})",
                self.rolling_days, self.window_half_length
            )));
        }
        Ok(())
    }

    pub fn with_window_half_length(self, window_half_length: usize) -> Self {
        Self {
            window_half_length,
            ..self
        }
    }

    pub fn with_rolling_days(self, rolling_days: usize) -> Self {
        Self {
            rolling_days,
            ..self
        }
    }

    /// Payload length of a record.
    pub fn record_len(&self) -> usize {
        TimeSeriesRecord::expected_len(self.window_half_length)
    }

    /// Days left per quantity after smoothing.
    pub fn smoothed_days(&self) -> usize {
        self.window_half_length - self.rolling_days + 1
    }

    /// Number of smoothed feature columns, all quantities together.
    pub fn smoothed_len(&self) -> usize {
        TrackedQuantity::COUNT * self.smoothed_days()
    }
}

// ================================================================================================
// Label Modes
// ================================================================================================

/// Reduction of the output half to a label vector.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
    IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LabelMode {
    /// `[max hosp, diag last - first, dead last - first]` over the output half.
    #[default]
    TotalIncrease,
    /// `[max hosp, sum diag, sum dead]` over the output half.
    DailySum,
    /// `[max hosp, dead on the last output day - dead on the last input day]`.
    DeathDelta,
}

impl LabelMode {
    pub fn count(&self) -> usize {
        self.names().len()
    }

    pub fn names(&self) -> &'static [&'static str] {
        match self {
            LabelMode::TotalIncrease => &["hosp_peak", "diag_increase", "dead_increase"],
            LabelMode::DailySum => &["hosp_peak", "diag_total", "dead_total"],
            LabelMode::DeathDelta => &["hosp_peak", "dead_delta"],
        }
    }

    pub fn all() -> impl Iterator<Item = LabelMode> {
        LabelMode::iter()
    }
}

// ================================================================================================
// Extractor
// ================================================================================================

/// Turns [`TimeSeriesRecord`]s into fixed-length feature and label vectors.
///
/// Extraction is a pure function of the record, so batches are processed row
/// by row in parallel (see [`FeatureExtractor::extract_batch`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeatureExtractor {
    window: WindowSpec,
    label_mode: LabelMode,
}

impl FeatureExtractor {
    pub fn new(window: WindowSpec, label_mode: LabelMode) -> SurrogateResult<Self> {
        window.validate()?;
        Ok(Self { window, label_mode })
    }

    pub fn window(&self) -> WindowSpec {
        self.window
    }

    pub fn label_mode(&self) -> LabelMode {
        self.label_mode
    }

    /// `3 * (window_half_length - rolling_days + 1) + 8`.
    pub fn feature_len(&self) -> usize {
        self.window.smoothed_len() + ZONE_FEATURES
    }

    pub fn label_len(&self) -> usize {
        self.label_mode.count()
    }

    /// Feature columns in vector order: `hosp_avg_0.., diag_avg_0.., dead_avg_0..`,
    /// then `init_zone_W..R` and `actuated_zone_W..R`.
    pub fn feature_names(&self) -> Vec<String> {
        let smoothed = TrackedQuantity::iter().flat_map(|q| {
            (0..self.window.smoothed_days()).map(move |day| format!("{q}_avg_{day}"))
        });
        let zones = ["init_zone", "actuated_zone"]
            .into_iter()
            .flat_map(|prefix| ColorZone::labels().map(move |label| format!("{prefix}_{label}")));
        smoothed.chain(zones).collect()
    }

    pub fn label_names(&self) -> Vec<String> {
        self.label_mode
            .names()
            .iter()
            .map(|name| name.to_string())
            .collect()
    }

    /// Extracts one record.
    ///
    /// # Errors
    /// - [`DatasetError::MalformedRecord`] if the payload length is not `6 * window_half_length`.
    /// - [`DatasetError::UnknownZoneLabel`] if a zone label is outside `W, Y, O, R`.
    pub fn extract(
        &self,
        record: &TimeSeriesRecord,
    ) -> Result<(FeatureVector, LabelVector), DatasetError> {
        let half = self.window.window_half_length;
        let days = record.days(half)?;
        let (init_zone, actuated_zone) = record.zones()?;

        let input = days.slice(s![..half, ..]);
        let output = days.slice(s![half.., ..]);

        let mut features = Vec::with_capacity(self.feature_len());
        for column in input.columns() {
            features.extend(trailing_mean(column, self.window.rolling_days));
        }
        features.extend(init_zone.one_hot());
        features.extend(actuated_zone.one_hot());

        let hosp = output.column(TrackedQuantity::Hosp.index());
        let diag = output.column(TrackedQuantity::Diag.index());
        let dead = output.column(TrackedQuantity::Dead.index());
        let peak = hosp.fold(f64::NEG_INFINITY, |acc, &v| acc.max(v));

        let labels = match self.label_mode {
            LabelMode::TotalIncrease => vec![peak, increase(diag), increase(dead)],
            LabelMode::DailySum => vec![peak, diag.sum(), dead.sum()],
            LabelMode::DeathDelta => {
                let dead_all = days.column(TrackedQuantity::Dead.index());
                vec![peak, dead_all[2 * half - 1] - dead_all[half - 1]]
            }
        };

        Ok((Array1::from(features), Array1::from(labels)))
    }
}

/// Extracts one record with the default [`LabelMode`].
pub fn extract(
    record: &TimeSeriesRecord,
    rolling_days: usize,
    window_half_length: usize,
) -> SurrogateResult<(FeatureVector, LabelVector)> {
    let window = WindowSpec::new(window_half_length, rolling_days)?;
    let extractor = FeatureExtractor::new(window, LabelMode::default())?;
    Ok(extractor.extract(record)?)
}

/// Trailing mean over `width` days; days without a full window are dropped.
fn trailing_mean(series: ArrayView1<'_, f64>, width: usize) -> Vec<f64> {
    series
        .windows(width)
        .into_iter()
        .map(|window| window.sum() / width as f64)
        .collect()
}

fn increase(series: ArrayView1<'_, f64>) -> f64 {
    match (series.first(), series.last()) {
        (Some(first), Some(last)) => last - first,
        _ => 0.0,
    }
}
