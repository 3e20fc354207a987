use thiserror::Error;

pub type SurrogateResult<T> = Result<T, SurrogateError>;

#[derive(Debug, Error)]
pub enum SurrogateError {
    #[error(transparent)]
    Calendar(#[from] CalendarError),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Scaler(#[from] ScalerError),

    #[error(transparent)]
    Io(#[from] IoError),

    #[error(transparent)]
    System(#[from] SystemError),
}

/// Errors raised while converting calendar dates to day offsets.
#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("Invalid calendar date '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("Day offset {0} is outside the representable calendar range")]
    OffsetOutOfRange(i64),
}

/// Errors raised by the policy scheduler and its inputs.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("Missing required parameter '{key}' for quantity '{quantity}' in zone '{zone}'")]
    MissingRequiredParameter {
        quantity: String,
        zone: String,
        key: String,
    },

    #[error("Duplicate period start at day offset {0}")]
    DuplicateOffset(i64),

    #[error("Parameter '{key}' must be finite, got {value}")]
    NonFiniteParameter { key: String, value: f64 },

    #[error("Invalid seasonal calendar: {0}")]
    InvalidSeasons(String),

    #[error("Invalid sampling design: {0}")]
    InvalidSampling(String),
}

/// Errors raised while turning time series into feature and label vectors.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Unknown zone label '{0}' (expected one of W, Y, O, R)")]
    UnknownZoneLabel(String),

    #[error("Malformed record: expected {expected} values, got {actual}")]
    MalformedRecord { expected: usize, actual: usize },

    #[error("Invalid window: {0}")]
    InvalidWindow(String),

    #[error("Record {row} rejected: {source}")]
    Record {
        row: usize,
        #[source]
        source: Box<DatasetError>,
    },

    #[error("Missing column '{0}'")]
    MissingColumn(String),

    #[error("Missing value in column '{column}' at row {row}")]
    MissingValue { column: String, row: usize },

    #[error("Window [{start}, {end}) exceeds the {len} available days")]
    WindowOutOfRange { start: i64, end: i64, len: usize },

    #[error("Scaling factor must be finite and positive, got {0}")]
    InvalidScalingFactor(f64),

    #[error("Invalid train/validation split: {0}")]
    InvalidSplit(String),

    #[error("Data frame error: {0}")]
    DataFrame(String),
}

/// Errors raised while fitting or applying affine scalers.
#[derive(Debug, Error)]
pub enum ScalerError {
    #[error("Scaling method '{0}' is not supported")]
    UnsupportedScalingMethod(String),

    #[error("Degenerate scale {scale} for column {column} (method {method})")]
    DegenerateScale {
        column: usize,
        method: String,
        scale: f64,
    },

    #[error("Dimension mismatch: expected {expected} columns, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Degenerate-scale floor must be finite and positive, got {0}")]
    InvalidFloor(f64),

    #[error("Cannot fit a scaler on an empty matrix")]
    EmptyMatrix,
}

/// Errors related to file I/O and serialization.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("IO operation failed")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization failed")]
    Json(#[from] serde_json::Error),

    #[error("Binary encoding failed")]
    Encoding(#[from] postcard::Error),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),
}

/// Errors related to internal invariants.
#[derive(Debug, Error)]
pub enum SystemError {
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

impl From<polars::error::PolarsError> for DatasetError {
    fn from(e: polars::error::PolarsError) -> Self {
        DatasetError::DataFrame(e.to_string())
    }
}

impl From<polars::error::PolarsError> for SurrogateError {
    fn from(e: polars::error::PolarsError) -> Self {
        DatasetError::from(e).into()
    }
}
