pub mod cluster;
pub mod event;
pub mod frequency;
pub mod linear;
pub mod prediction;
pub mod training_run;

pub use cluster::{ClusterModel, ClusterRun, ClusterSample, ClusterSummary, GeoPoint};
pub use event::{CleanedEvent, RawEvent};
pub use frequency::YearFrequency;
pub use linear::{LinearModel, MetricSplit, ModelMetadata, PerformanceMetrics};
pub use prediction::{ModelInfo, YearPrediction, YearValidation};
pub use training_run::TrainingRun;
