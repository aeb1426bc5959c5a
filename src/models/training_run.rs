use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{LinearModel, PerformanceMetrics};

/// One persisted fit in the model store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingRun {
    pub id: String,
    pub trained_at: DateTime<Utc>,
    pub model: LinearModel,
    pub metrics: PerformanceMetrics,
    pub sample_count: u64,
    pub first_year: i32,
    pub last_year: i32,
}
