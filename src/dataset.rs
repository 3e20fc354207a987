pub mod batch;
pub mod daily;
pub mod extractor;
pub mod pipeline;
pub mod record;

pub use batch::{BatchPolicy, FeatureMatrix, SkippedRecord};
pub use daily::{DailyTable, prepare_daily, real_samples};
pub use extractor::{FeatureExtractor, FeatureVector, LabelMode, LabelVector, WindowSpec, extract};
pub use pipeline::{DatasetConfig, DatasetScalers, ProcessedDataset, Split, process_dataset};
pub use record::{TimeSeriesRecord, TrackedQuantity, records_from_frame, records_to_frame};
