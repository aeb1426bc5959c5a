use serde::{Deserialize, Serialize};

use super::ModelMetadata;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearPrediction {
    pub year: i32,
    pub predicted_earthquakes: u64,
}

/// Outcome of checking user-supplied year input. Never an error: callers
/// decide how to present an invalid or out-of-range year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearValidation {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub warning: bool,
    /// Parsed year when the input was numeric.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub model_type: String,
    pub r2_score: f64,
    pub equation: String,
    pub interpretation: String,
    pub variance_explained: String,
    pub full_info: ModelMetadata,
}
