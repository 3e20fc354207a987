use std::{fmt, path::Path, str::FromStr};

use ndarray::{Array1, Array2, ArrayBase, ArrayView1, Data, Ix1, Ix2};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ScalerError, SurrogateResult},
    io::{self, SerdeFormat},
};

// ================================================================================================
// Methods
// ================================================================================================

/// Per-column normalization rule.
///
/// Parses from the aliases `std`/`standardize`, `minmax`/`norm`/`normalize`,
/// `zeromax`/`zero`/`max`, `none`/`identity` and explicit bounds `(lo, hi)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ScalingMethod {
    /// Translate by the mean, scale by the sample standard deviation.
    Standardize,
    /// Translate by the minimum, scale by `max - min`.
    MinMax,
    /// No translation, scale by the maximum.
    ZeroMax,
    /// Translate by `lo`, scale by `hi - lo`.
    Bounds(f64, f64),
    /// Leave the column untouched.
    Identity,
}

impl FromStr for ScalingMethod {
    type Err = ScalerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        let method = match normalized.as_str() {
            "std" | "standardize" => Self::Standardize,
            "minmax" | "norm" | "normalize" => Self::MinMax,
            "zeromax" | "zero" | "max" => Self::ZeroMax,
            "none" | "identity" => Self::Identity,
            other => parse_bounds(other)
                .ok_or_else(|| ScalerError::UnsupportedScalingMethod(s.to_string()))?,
        };
        Ok(method)
    }
}

fn parse_bounds(s: &str) -> Option<ScalingMethod> {
    let (lo, hi) = s
        .strip_prefix('(')?
        .strip_suffix(')')?
        .split_once(',')?;
    let lo: f64 = lo.trim().parse().ok()?;
    let hi: f64 = hi.trim().parse().ok()?;
    Some(ScalingMethod::Bounds(lo, hi))
}

impl fmt::Display for ScalingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standardize => write!(f, "std"),
            Self::MinMax => write!(f, "minmax"),
            Self::ZeroMax => write!(f, "zeromax"),
            Self::Bounds(lo, hi) => write!(f, "({lo},{hi})"),
            Self::Identity => write!(f, "none"),
        }
    }
}

impl TryFrom<String> for ScalingMethod {
    type Error = ScalerError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ScalingMethod> for String {
    fn from(method: ScalingMethod) -> Self {
        method.to_string()
    }
}

/// Scaling rules for a whole matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScalingMethods {
    /// The same rule for every column.
    Uniform(ScalingMethod),
    /// One rule per column.
    PerColumn(Vec<ScalingMethod>),
}

impl Default for ScalingMethods {
    fn default() -> Self {
        Self::Uniform(ScalingMethod::Standardize)
    }
}

impl From<ScalingMethod> for ScalingMethods {
    fn from(method: ScalingMethod) -> Self {
        Self::Uniform(method)
    }
}

impl From<Vec<ScalingMethod>> for ScalingMethods {
    fn from(methods: Vec<ScalingMethod>) -> Self {
        Self::PerColumn(methods)
    }
}

impl ScalingMethods {
    fn resolve(&self, n_cols: usize) -> Result<Vec<ScalingMethod>, ScalerError> {
        match self {
            Self::Uniform(method) => Ok(vec![*method; n_cols]),
            Self::PerColumn(methods) if methods.len() == n_cols => Ok(methods.clone()),
            Self::PerColumn(methods) => Err(ScalerError::DimensionMismatch {
                expected: methods.len(),
                actual: n_cols,
            }),
        }
    }
}

/// What `fit` does when a column yields a zero or non-finite scale.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum DegenerateScalePolicy {
    /// Fail with [`ScalerError::DegenerateScale`].
    #[default]
    Fail,
    /// Raise finite scales below the given epsilon (in absolute value) to it,
    /// keeping their sign. The epsilon must be finite and positive.
    /// Non-finite scales still fail.
    Floor(f64),
}

impl DegenerateScalePolicy {
    /// # Errors
    /// [`ScalerError::InvalidFloor`] if a `Floor` epsilon is not finite and positive.
    pub fn validate(&self) -> Result<(), ScalerError> {
        match *self {
            Self::Floor(eps) if !(eps.is_finite() && eps > 0.0) => {
                Err(ScalerError::InvalidFloor(eps))
            }
            _ => Ok(()),
        }
    }
}

// ================================================================================================
// Scaler
// ================================================================================================

/// Frozen per-column affine map `x -> (x - translation) / scale`.
///
/// Fit once on a training matrix, then shared by reference: every method
/// besides `fit` only reads the frozen parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scaler {
    translation: Vec<f64>,
    scale: Vec<f64>,
}

impl Scaler {
    /// Builds a scaler from known parameters.
    ///
    /// # Errors
    /// - [`ScalerError::DimensionMismatch`] if the vectors differ in length.
    /// - [`ScalerError::DegenerateScale`] if a scale is zero or non-finite.
    pub fn new(translation: Vec<f64>, scale: Vec<f64>) -> SurrogateResult<Self> {
        if translation.len() != scale.len() {
            return Err(ScalerError::DimensionMismatch {
                expected: translation.len(),
                actual: scale.len(),
            }
            .into());
        }
        if let Some((column, &s)) = scale
            .iter()
            .enumerate()
            .find(|(_, s)| **s == 0.0 || !s.is_finite())
        {
            return Err(ScalerError::DegenerateScale {
                column,
                method: "explicit".to_string(),
                scale: s,
            }
            .into());
        }
        Ok(Self { translation, scale })
    }

    /// Fits one `(translation, scale)` pair per column, failing on degenerate scales.
    pub fn fit<S: Data<Elem = f64>>(
        matrix: &ArrayBase<S, Ix2>,
        methods: &ScalingMethods,
    ) -> SurrogateResult<Self> {
        Self::fit_with(matrix, methods, DegenerateScalePolicy::Fail)
    }

    /// # Errors
    /// - [`ScalerError::EmptyMatrix`] if `matrix` has no rows.
    /// - [`ScalerError::DimensionMismatch`] if per-column methods do not match the width.
    /// - [`ScalerError::InvalidFloor`] if `policy` floors at a non-positive epsilon.
    /// - [`ScalerError::DegenerateScale`] per `policy`.
    #[tracing::instrument(skip_all, fields(rows = matrix.nrows(), cols = matrix.ncols()))]
    pub fn fit_with<S: Data<Elem = f64>>(
        matrix: &ArrayBase<S, Ix2>,
        methods: &ScalingMethods,
        policy: DegenerateScalePolicy,
    ) -> SurrogateResult<Self> {
        policy.validate()?;
        if matrix.nrows() == 0 {
            return Err(ScalerError::EmptyMatrix.into());
        }
        let methods = methods.resolve(matrix.ncols())?;

        let mut translation = Vec::with_capacity(methods.len());
        let mut scale = Vec::with_capacity(methods.len());

        for (column, (values, method)) in matrix.columns().into_iter().zip(methods).enumerate() {
            let (t, s) = column_params(values, method);
            translation.push(t);
            scale.push(guard_scale(column, method, s, policy)?);
        }

        tracing::debug!(?translation, ?scale, "Fitted scaler");
        Ok(Self { translation, scale })
    }

    pub fn dim(&self) -> usize {
        self.scale.len()
    }

    pub fn translation(&self) -> &[f64] {
        &self.translation
    }

    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    /// `(x - translation) / scale`, column by column.
    pub fn transform<S: Data<Elem = f64>>(
        &self,
        matrix: &ArrayBase<S, Ix2>,
    ) -> SurrogateResult<Array2<f64>> {
        self.check_width(matrix.ncols())?;
        let mut out = matrix.to_owned();
        for mut row in out.rows_mut() {
            for ((x, t), s) in row.iter_mut().zip(&self.translation).zip(&self.scale) {
                *x = (*x - t) / s;
            }
        }
        Ok(out)
    }

    /// `x * scale + translation`, the exact inverse of [`Scaler::transform`].
    pub fn inverse_transform<S: Data<Elem = f64>>(
        &self,
        matrix: &ArrayBase<S, Ix2>,
    ) -> SurrogateResult<Array2<f64>> {
        self.check_width(matrix.ncols())?;
        let mut out = matrix.to_owned();
        for mut row in out.rows_mut() {
            for ((x, t), s) in row.iter_mut().zip(&self.translation).zip(&self.scale) {
                *x = *x * s + t;
            }
        }
        Ok(out)
    }

    /// [`Scaler::transform`] for a single vector, e.g. at inference time.
    pub fn transform_row<S: Data<Elem = f64>>(
        &self,
        row: &ArrayBase<S, Ix1>,
    ) -> SurrogateResult<Array1<f64>> {
        self.check_width(row.len())?;
        Ok(row
            .iter()
            .zip(&self.translation)
            .zip(&self.scale)
            .map(|((x, t), s)| (x - t) / s)
            .collect())
    }

    /// [`Scaler::inverse_transform`] for a single vector.
    pub fn inverse_transform_row<S: Data<Elem = f64>>(
        &self,
        row: &ArrayBase<S, Ix1>,
    ) -> SurrogateResult<Array1<f64>> {
        self.check_width(row.len())?;
        Ok(row
            .iter()
            .zip(&self.translation)
            .zip(&self.scale)
            .map(|((x, t), s)| x * s + t)
            .collect())
    }

    fn check_width(&self, actual: usize) -> Result<(), ScalerError> {
        if actual != self.dim() {
            return Err(ScalerError::DimensionMismatch {
                expected: self.dim(),
                actual,
            });
        }
        Ok(())
    }

    // ============================================================================================
    // Persistence
    // ============================================================================================

    pub fn to_bytes(&self) -> SurrogateResult<Vec<u8>> {
        SerdeFormat::Postcard.encode(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> SurrogateResult<Self> {
        let raw: Self = SerdeFormat::Postcard.decode(bytes)?;
        Self::new(raw.translation, raw.scale)
    }

    pub fn to_json(&self) -> SurrogateResult<String> {
        let bytes = SerdeFormat::Json.encode(self)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn from_json(json: &str) -> SurrogateResult<Self> {
        let raw: Self = SerdeFormat::Json.decode(json.as_bytes())?;
        Self::new(raw.translation, raw.scale)
    }

    pub fn write(&self, path: impl AsRef<Path>, format: SerdeFormat) -> SurrogateResult<()> {
        io::write(self, path, format)
    }

    /// Reads a scaler written by [`Scaler::write`] and revalidates its parameters.
    pub fn read(path: impl AsRef<Path>, format: SerdeFormat) -> SurrogateResult<Self> {
        let raw: Self = io::read(path, format)?;
        Self::new(raw.translation, raw.scale)
    }
}

fn column_params(values: ArrayView1<'_, f64>, method: ScalingMethod) -> (f64, f64) {
    match method {
        ScalingMethod::Standardize => {
            let mean = values.mean().unwrap_or(0.0);
            // One row has no sample deviation; report it as a zero scale.
            let std = if values.len() > 1 { values.std(1.0) } else { 0.0 };
            (mean, std)
        }
        ScalingMethod::MinMax => {
            let min = values.fold(f64::INFINITY, |acc, &x| acc.min(x));
            let max = values.fold(f64::NEG_INFINITY, |acc, &x| acc.max(x));
            (min, max - min)
        }
        ScalingMethod::ZeroMax => {
            let max = values.fold(f64::NEG_INFINITY, |acc, &x| acc.max(x));
            (0.0, max)
        }
        ScalingMethod::Bounds(lo, hi) => (lo, hi - lo),
        ScalingMethod::Identity => (0.0, 1.0),
    }
}

fn guard_scale(
    column: usize,
    method: ScalingMethod,
    scale: f64,
    policy: DegenerateScalePolicy,
) -> Result<f64, ScalerError> {
    let degenerate = || ScalerError::DegenerateScale {
        column,
        method: method.to_string(),
        scale,
    };

    if !scale.is_finite() {
        return Err(degenerate());
    }
    match policy {
        DegenerateScalePolicy::Fail if scale == 0.0 => Err(degenerate()),
        DegenerateScalePolicy::Floor(eps) if scale.abs() < eps => {
            tracing::warn!(column, method = %method, scale, eps, "Flooring degenerate scale");
            Ok(if scale == 0.0 { eps } else { eps.copysign(scale) })
        }
        _ => Ok(scale),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SurrogateError;
    use ndarray::array;

    const EPS: f64 = 1e-9;

    fn assert_close(a: &Array2<f64>, b: &Array2<f64>) {
        assert_eq!(a.dim(), b.dim());
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < EPS, "{x} != {y}");
        }
    }

    // ============================================================================================
    // Method Parsing
    // ============================================================================================

    #[test]
    fn aliases_parse_to_the_same_method() {
        for alias in ["std", "standardize", " STD "] {
            assert_eq!(alias.parse::<ScalingMethod>().unwrap(), ScalingMethod::Standardize);
        }
        for alias in ["minmax", "norm", "normalize"] {
            assert_eq!(alias.parse::<ScalingMethod>().unwrap(), ScalingMethod::MinMax);
        }
        for alias in ["zeromax", "zero", "max"] {
            assert_eq!(alias.parse::<ScalingMethod>().unwrap(), ScalingMethod::ZeroMax);
        }
        assert_eq!("none".parse::<ScalingMethod>().unwrap(), ScalingMethod::Identity);
        assert_eq!(
            "(0, 100)".parse::<ScalingMethod>().unwrap(),
            ScalingMethod::Bounds(0.0, 100.0)
        );
    }

    #[test]
    fn unknown_method_is_unsupported() {
        for bad in ["robust", "(1,)", "(a,b)", ""] {
            let err = bad.parse::<ScalingMethod>().unwrap_err();
            assert!(matches!(err, ScalerError::UnsupportedScalingMethod(ref m) if m == bad));
        }
    }

    #[test]
    fn methods_serialize_as_strings() {
        let methods = ScalingMethods::PerColumn(vec![
            ScalingMethod::Standardize,
            ScalingMethod::Bounds(-1.0, 1.0),
        ]);
        let json = serde_json::to_string(&methods).unwrap();
        assert_eq!(json, r#"{"PerColumn":["std","(-1,1)"]}"#);
        let back: ScalingMethods = serde_json::from_str(&json).unwrap();
        assert_eq!(back, methods);
        assert!(serde_json::from_str::<ScalingMethod>(r#""robust""#).is_err());
    }

    // ============================================================================================
    // Fitting
    // ============================================================================================

    #[test]
    fn minmax_scenario() {
        let data = array![[1.0], [2.0], [3.0], [4.0], [5.0]];
        let scaler = Scaler::fit(&data, &ScalingMethod::MinMax.into()).unwrap();
        assert_eq!(scaler.translation(), &[1.0]);
        assert_eq!(scaler.scale(), &[4.0]);

        let out = scaler.transform(&array![[1.0], [3.0], [5.0]]).unwrap();
        assert_eq!(out, array![[0.0], [0.5], [1.0]]);
    }

    #[test]
    fn standardize_uses_sample_deviation() {
        let data = array![[2.0], [4.0], [4.0], [4.0], [5.0], [5.0], [7.0], [9.0]];
        let scaler = Scaler::fit(&data, &ScalingMethods::default()).unwrap();
        assert!((scaler.translation()[0] - 5.0).abs() < EPS);
        assert!((scaler.scale()[0] - (32.0f64 / 7.0).sqrt()).abs() < EPS);
    }

    #[test]
    fn per_column_methods() {
        let data = array![[1.0, 10.0, 5.0, 3.0], [3.0, 20.0, 6.0, 4.0]];
        let methods = ScalingMethods::PerColumn(vec![
            ScalingMethod::ZeroMax,
            ScalingMethod::Bounds(0.0, 40.0),
            ScalingMethod::Identity,
            ScalingMethod::MinMax,
        ]);
        let scaler = Scaler::fit(&data, &methods).unwrap();
        assert_eq!(scaler.translation(), &[0.0, 0.0, 0.0, 3.0]);
        assert_eq!(scaler.scale(), &[3.0, 40.0, 1.0, 1.0]);
    }

    #[test]
    fn per_column_length_must_match() {
        let data = array![[1.0, 2.0]];
        let err = Scaler::fit(&data, &vec![ScalingMethod::Identity].into()).unwrap_err();
        assert!(matches!(
            err,
            SurrogateError::Scaler(ScalerError::DimensionMismatch { expected: 1, actual: 2 })
        ));
    }

    #[test]
    fn empty_matrix_cannot_be_fit() {
        let data = Array2::<f64>::zeros((0, 3));
        let err = Scaler::fit(&data, &ScalingMethods::default()).unwrap_err();
        assert!(matches!(err, SurrogateError::Scaler(ScalerError::EmptyMatrix)));
    }

    // ============================================================================================
    // Degenerate Scales
    // ============================================================================================

    #[test]
    fn constant_column_fails_by_default() {
        let data = array![[1.0, 3.0], [2.0, 3.0], [3.0, 3.0]];
        let err = Scaler::fit(&data, &ScalingMethods::default()).unwrap_err();
        match err {
            SurrogateError::Scaler(ScalerError::DegenerateScale {
                column,
                method,
                scale,
            }) => {
                assert_eq!(column, 1);
                assert_eq!(method, "std");
                assert_eq!(scale, 0.0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn floor_policy_keeps_outputs_finite() {
        let data = array![[1.0, 3.0], [2.0, 3.0], [3.0, 3.0]];
        let scaler = Scaler::fit_with(
            &data,
            &ScalingMethod::MinMax.into(),
            DegenerateScalePolicy::Floor(1e-8),
        )
        .unwrap();
        assert_eq!(scaler.scale()[1], 1e-8);
        let out = scaler.transform(&data).unwrap();
        assert!(out.iter().all(|x| x.is_finite()));
        assert_eq!(out[[0, 1]], 0.0);
    }

    #[test]
    fn floor_needs_a_positive_epsilon() {
        let data = array![[3.0], [3.0], [3.0]];
        for eps in [0.0, -1e-6, f64::NAN, f64::INFINITY] {
            let err = Scaler::fit_with(
                &data,
                &ScalingMethod::MinMax.into(),
                DegenerateScalePolicy::Floor(eps),
            )
            .unwrap_err();
            assert!(
                matches!(err, SurrogateError::Scaler(ScalerError::InvalidFloor(_))),
                "{eps}"
            );
        }
    }

    #[test]
    fn floor_keeps_the_sign_of_small_negative_scales() {
        let data = array![[-1e-12], [-2e-12]];
        let scaler = Scaler::fit_with(
            &data,
            &ScalingMethod::ZeroMax.into(),
            DegenerateScalePolicy::Floor(1e-6),
        )
        .unwrap();
        assert_eq!(scaler.scale(), &[-1e-6]);
        assert!(scaler.transform(&data).unwrap()[[0, 0]] > 0.0);
    }

    #[test]
    fn single_row_standardize_is_degenerate() {
        let data = array![[4.0]];
        assert!(Scaler::fit(&data, &ScalingMethods::default()).is_err());
    }

    #[test]
    fn non_finite_scale_is_never_floored() {
        let data = array![[f64::NAN], [1.0]];
        let err = Scaler::fit_with(
            &data,
            &ScalingMethod::Standardize.into(),
            DegenerateScalePolicy::Floor(1e-8),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SurrogateError::Scaler(ScalerError::DegenerateScale { .. })
        ));
    }

    // ============================================================================================
    // Transforms
    // ============================================================================================

    #[test]
    fn round_trip_recovers_input() {
        let train = array![[1.0, -4.0, 0.2], [2.5, 8.0, 0.4], [7.0, 1.0, 0.9]];
        let unseen = array![[10.0, -20.0, 3.0], [0.0, 0.0, 0.0]];
        for method in [
            ScalingMethod::Standardize,
            ScalingMethod::MinMax,
            ScalingMethod::ZeroMax,
            ScalingMethod::Bounds(-5.0, 5.0),
            ScalingMethod::Identity,
        ] {
            let scaler = Scaler::fit(&train, &method.into()).unwrap();
            let back = scaler
                .inverse_transform(&scaler.transform(&unseen).unwrap())
                .unwrap();
            assert_close(&back, &unseen);
        }
    }

    #[test]
    fn transform_is_idempotent_per_call() {
        let data = array![[1.0, 2.0], [3.0, 5.0], [4.0, 11.0]];
        let scaler = Scaler::fit(&data, &ScalingMethods::default()).unwrap();
        let first = scaler.transform(&data).unwrap();
        let second = scaler.transform(&data).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn row_transform_matches_matrix_transform() {
        let data = array![[1.0, 2.0], [3.0, 5.0], [4.0, 11.0]];
        let scaler = Scaler::fit(&data, &ScalingMethod::MinMax.into()).unwrap();
        let matrix = scaler.transform(&data).unwrap();
        let row = scaler.transform_row(&data.row(1)).unwrap();
        assert_eq!(row, matrix.row(1));
        let back = scaler.inverse_transform_row(&row).unwrap();
        for (x, y) in back.iter().zip(data.row(1)) {
            assert!((x - y).abs() < EPS);
        }
    }

    #[test]
    fn width_mismatch_is_rejected() {
        let scaler = Scaler::new(vec![0.0, 0.0], vec![1.0, 1.0]).unwrap();
        let err = scaler.transform(&array![[1.0, 2.0, 3.0]]).unwrap_err();
        assert!(matches!(
            err,
            SurrogateError::Scaler(ScalerError::DimensionMismatch { expected: 2, actual: 3 })
        ));
        assert!(scaler.transform_row(&array![1.0]).is_err());
    }

    // ============================================================================================
    // Persistence
    // ============================================================================================

    #[test]
    fn bytes_and_json_round_trip() {
        let scaler = Scaler::new(vec![1.0, -2.5], vec![4.0, 0.5]).unwrap();
        assert_eq!(Scaler::from_bytes(&scaler.to_bytes().unwrap()).unwrap(), scaler);
        assert_eq!(Scaler::from_json(&scaler.to_json().unwrap()).unwrap(), scaler);
    }

    #[test]
    fn loading_rejects_degenerate_parameters() {
        let json = r#"{"translation":[0.0],"scale":[0.0]}"#;
        assert!(Scaler::from_json(json).is_err());
    }
}
