//! View model: shape loaded artifacts into what each page shows.

pub mod instances;
pub mod landing;
pub mod metrics;
pub mod runs;
pub mod tables;

pub use instances::{InstanceSet, PredictionContext};
pub use metrics::MetricJudgements;
pub use tables::SortOrder;
