use ndarray::{Array2, ArrayView1, Axis};
use polars::prelude::{Column, DataFrame};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    dataset::{
        extractor::{FeatureExtractor, FeatureVector, LabelVector},
        record::TimeSeriesRecord,
    },
    error::{DatasetError, SurrogateResult, SystemError},
};

/// What a batch does with a record that fails extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BatchPolicy {
    /// Fail the whole batch on the first bad row.
    #[default]
    Abort,
    /// Drop bad rows and report them in [`FeatureMatrix::skipped`].
    SkipInvalid,
}

/// A record dropped under [`BatchPolicy::SkipInvalid`].
#[derive(Debug)]
pub struct SkippedRecord {
    pub row: usize,
    pub error: DatasetError,
}

/// Stacked features and labels of a batch, one row per extracted record.
#[derive(Debug)]
pub struct FeatureMatrix {
    features: Array2<f64>,
    labels: Array2<f64>,
    rows: Vec<usize>,
    skipped: Vec<SkippedRecord>,
    feature_names: Vec<String>,
    label_names: Vec<String>,
}

impl FeatureMatrix {
    pub fn features(&self) -> &Array2<f64> {
        &self.features
    }

    pub fn labels(&self) -> &Array2<f64> {
        &self.labels
    }

    /// Source index of every matrix row, ascending.
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    pub fn skipped(&self) -> &[SkippedRecord] {
        &self.skipped
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn label_names(&self) -> &[String] {
        &self.label_names
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn into_parts(self) -> (Array2<f64>, Array2<f64>) {
        (self.features, self.labels)
    }

    pub fn into_skipped(self) -> Vec<SkippedRecord> {
        self.skipped
    }

    /// Exports `(features, labels)` as data frames named after
    /// [`FeatureExtractor::feature_names`] and [`FeatureExtractor::label_names`].
    pub fn to_frames(&self) -> SurrogateResult<(DataFrame, DataFrame)> {
        Ok((
            to_frame(&self.features, &self.feature_names)?,
            to_frame(&self.labels, &self.label_names)?,
        ))
    }
}

fn to_frame(matrix: &Array2<f64>, names: &[String]) -> SurrogateResult<DataFrame> {
    let columns = matrix
        .axis_iter(Axis(1))
        .zip(names)
        .map(|(values, name)| Column::new(name.as_str().into(), values.to_vec()))
        .collect();
    Ok(DataFrame::new(columns)?)
}

impl FeatureExtractor {
    /// Extracts every record in parallel and stacks the results in input order.
    ///
    /// # Errors
    /// Under [`BatchPolicy::Abort`], [`DatasetError::Record`] wrapping the error of
    /// the lowest failing row.
    #[tracing::instrument(skip_all, fields(records = records.len(), policy = ?policy))]
    pub fn extract_batch(
        &self,
        records: &[TimeSeriesRecord],
        policy: BatchPolicy,
    ) -> SurrogateResult<FeatureMatrix> {
        let results: Vec<Result<(FeatureVector, LabelVector), DatasetError>> =
            records.par_iter().map(|record| self.extract(record)).collect();

        let mut extracted = Vec::with_capacity(results.len());
        let mut rows = Vec::with_capacity(results.len());
        let mut skipped = Vec::new();

        for (row, result) in results.into_iter().enumerate() {
            match result {
                Ok(pair) => {
                    rows.push(row);
                    extracted.push(pair);
                }
                Err(error) => match policy {
                    BatchPolicy::Abort => {
                        return Err(DatasetError::Record {
                            row,
                            source: Box::new(error),
                        }
                        .into());
                    }
                    BatchPolicy::SkipInvalid => {
                        tracing::warn!(row, error = %error, "Skipping invalid record");
                        skipped.push(SkippedRecord { row, error });
                    }
                },
            }
        }

        let features = stack(
            extracted.iter().map(|(f, _)| f.view()),
            extracted.len(),
            self.feature_len(),
        )?;
        let labels = stack(
            extracted.iter().map(|(_, l)| l.view()),
            extracted.len(),
            self.label_len(),
        )?;

        tracing::debug!(
            rows = rows.len(),
            skipped = skipped.len(),
            "Extracted feature matrix"
        );

        Ok(FeatureMatrix {
            features,
            labels,
            rows,
            skipped,
            feature_names: self.feature_names(),
            label_names: self.label_names(),
        })
    }
}

fn stack<'a>(
    vectors: impl Iterator<Item = ArrayView1<'a, f64>>,
    n_rows: usize,
    n_cols: usize,
) -> SurrogateResult<Array2<f64>> {
    let flat: Vec<f64> = vectors.flat_map(|v| v.to_vec()).collect();
    Array2::from_shape_vec((n_rows, n_cols), flat).map_err(|e| {
        SystemError::InvariantViolation(format!("extracted vectors do not stack: {e}")).into()
    })
}
