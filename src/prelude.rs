// 1. Calendar & Zones
pub use crate::calendar::{CalendarEpoch, DayOffset};
pub use crate::zone::{ColorZone, PolicyZone};

// 2. Schedules
pub use crate::schedule::{
    ChangePoint, ContactTracing, DailyTests, Layer, LayerValues, ParameterTable, PeriodMap,
    PolicyScheduler, QuarantinePolicy, Quantity, Schedule, ScheduleSet, SchedulerConfig,
    SeasonalCalendar, Target, TestingPolicy, build_schedule, grid::cartesian_product, preset,
};

// 3. Datasets
pub use crate::dataset::{
    BatchPolicy, DailyTable, DatasetConfig, DatasetScalers, FeatureExtractor, FeatureMatrix,
    LabelMode, ProcessedDataset, Split, TimeSeriesRecord, TrackedQuantity, WindowSpec, extract,
    prepare_daily, process_dataset, real_samples, records_from_frame, records_to_frame,
};

// 4. Scaling
pub use crate::scaler::{DegenerateScalePolicy, Scaler, ScalingMethod, ScalingMethods};

// 5. Errors
pub use crate::error::{
    CalendarError, DatasetError, IoError, ScalerError, ScheduleError, SurrogateError,
    SurrogateResult, SystemError,
};

// 6. Persistence
pub use crate::io::SerdeFormat;
