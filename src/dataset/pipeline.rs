use ndarray::{Array2, Axis};
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

use crate::{
    dataset::{
        batch::{BatchPolicy, SkippedRecord},
        extractor::{FeatureExtractor, LabelMode, WindowSpec},
        record::TimeSeriesRecord,
    },
    error::{DatasetError, SurrogateResult},
    scaler::{DegenerateScalePolicy, Scaler, ScalingMethod, ScalingMethods},
};

// ================================================================================================
// Configuration
// ================================================================================================

/// End-to-end dataset preparation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub window: WindowSpec,
    pub label_mode: LabelMode,
    /// Fraction of rows held out for validation; `None` keeps every row for training.
    pub val_split: Option<f64>,
    /// Fit scalers on the training split and apply them to both splits.
    pub scale: bool,
    /// Seed of the shuffle behind the train/validation split.
    pub seed: u64,
    pub batch_policy: BatchPolicy,
    pub degenerate: DegenerateScalePolicy,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            window: WindowSpec::default(),
            label_mode: LabelMode::default(),
            val_split: Some(0.2),
            scale: true,
            seed: 0,
            batch_policy: BatchPolicy::default(),
            degenerate: DegenerateScalePolicy::default(),
        }
    }
}

impl DatasetConfig {
    pub fn with_window(self, window: WindowSpec) -> Self {
        Self { window, ..self }
    }

    pub fn with_label_mode(self, label_mode: LabelMode) -> Self {
        Self { label_mode, ..self }
    }

    pub fn with_val_split(self, val_split: Option<f64>) -> Self {
        Self { val_split, ..self }
    }

    pub fn with_scale(self, scale: bool) -> Self {
        Self { scale, ..self }
    }

    pub fn with_seed(self, seed: u64) -> Self {
        Self { seed, ..self }
    }

    pub fn with_batch_policy(self, batch_policy: BatchPolicy) -> Self {
        Self {
            batch_policy,
            ..self
        }
    }

    pub fn with_degenerate(self, degenerate: DegenerateScalePolicy) -> Self {
        Self { degenerate, ..self }
    }
}

// ================================================================================================
// Output
// ================================================================================================

/// Feature and label rows of one split.
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub features: Array2<f64>,
    pub labels: Array2<f64>,
    /// Source record index of every row.
    pub rows: Vec<usize>,
}

impl Split {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn select(features: &Array2<f64>, labels: &Array2<f64>, rows: &[usize], idx: &[usize]) -> Self {
        Self {
            features: features.select(Axis(0), idx),
            labels: labels.select(Axis(0), idx),
            rows: idx.iter().map(|&i| rows[i]).collect(),
        }
    }
}

/// Scalers fit on the training split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetScalers {
    pub features: Scaler,
    pub labels: Scaler,
}

#[derive(Debug)]
pub struct ProcessedDataset {
    pub train: Split,
    pub validation: Option<Split>,
    pub scalers: Option<DatasetScalers>,
    pub skipped: Vec<SkippedRecord>,
    pub feature_names: Vec<String>,
    pub label_names: Vec<String>,
}

// ================================================================================================
// Pipeline
// ================================================================================================

/// Extracts, splits and scales a set of records.
///
/// The split shuffles row indices with a seeded RNG and holds out the first
/// `ceil(val_split * n)` of them. Smoothed feature columns are standardized,
/// one-hot columns are left as is, and labels are min-max scaled. Scalers only
/// see the training split.
///
/// # Errors
/// - [`DatasetError::InvalidSplit`] if `val_split` is outside `(0, 1)` or leaves
///   a split empty.
/// - Any extraction error under [`BatchPolicy::Abort`].
/// - Any fitting error of the scalers, e.g. a degenerate scale.
#[tracing::instrument(skip_all, fields(records = records.len()))]
pub fn process_dataset(
    records: &[TimeSeriesRecord],
    config: &DatasetConfig,
) -> SurrogateResult<ProcessedDataset> {
    let extractor = FeatureExtractor::new(config.window, config.label_mode)?;
    let matrix = extractor.extract_batch(records, config.batch_policy)?;
    let feature_names = matrix.feature_names().to_vec();
    let label_names = matrix.label_names().to_vec();

    let n = matrix.len();
    let (train_idx, val_idx) = split_indices(n, config.val_split, config.seed)?;

    let (mut train, mut validation) = {
        let features = matrix.features();
        let labels = matrix.labels();
        let rows = matrix.rows();
        (
            Split::select(features, labels, rows, &train_idx),
            val_idx.map(|idx| Split::select(features, labels, rows, &idx)),
        )
    };

    let scalers = if config.scale {
        let smoothed = extractor.window().smoothed_len();
        let feature_methods = ScalingMethods::PerColumn(
            (0..extractor.feature_len())
                .map(|j| {
                    if j < smoothed {
                        ScalingMethod::Standardize
                    } else {
                        ScalingMethod::Identity
                    }
                })
                .collect(),
        );
        let scalers = DatasetScalers {
            features: Scaler::fit_with(&train.features, &feature_methods, config.degenerate)?,
            labels: Scaler::fit_with(
                &train.labels,
                &ScalingMethod::MinMax.into(),
                config.degenerate,
            )?,
        };

        train.features = scalers.features.transform(&train.features)?;
        train.labels = scalers.labels.transform(&train.labels)?;
        if let Some(split) = validation.as_mut() {
            split.features = scalers.features.transform(&split.features)?;
            split.labels = scalers.labels.transform(&split.labels)?;
        }
        Some(scalers)
    } else {
        None
    };

    tracing::debug!(
        train = train.len(),
        validation = validation.as_ref().map_or(0, Split::len),
        scaled = scalers.is_some(),
        "Processed dataset"
    );

    let skipped = matrix.into_skipped();
    Ok(ProcessedDataset {
        train,
        validation,
        scalers,
        skipped,
        feature_names,
        label_names,
    })
}

/// Train and validation positions into a batch of `n` rows.
///
/// Without a split every row trains, in order.
fn split_indices(
    n: usize,
    val_split: Option<f64>,
    seed: u64,
) -> Result<(Vec<usize>, Option<Vec<usize>>), DatasetError> {
    let Some(p) = val_split else {
        return Ok(((0..n).collect(), None));
    };

    if !(p > 0.0 && p < 1.0) {
        return Err(DatasetError::InvalidSplit(format!(
            "val_split must be in (0, 1), got {p}"
        )));
    }

    let n_val = (p * n as f64).ceil() as usize;
    if n_val == 0 || n_val >= n {
        return Err(DatasetError::InvalidSplit(format!(
            "{n} rows cannot be split with val_split {p}"
        )));
    }

    let mut permutation: Vec<usize> = (0..n).collect();
    permutation.shuffle(&mut StdRng::seed_from_u64(seed));
    let train = permutation.split_off(n_val);
    Ok((train, Some(permutation)))
}
