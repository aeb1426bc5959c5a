pub mod fitter;
pub mod kmeans;
pub mod metadata;
pub mod regression;

pub use fitter::{cluster_events, train_model, TrainingReport, TrainingSource};
pub use metadata::{read_metadata, write_metadata};
pub use regression::{fit_linear, score};
