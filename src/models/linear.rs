//! Fitted trend line and the metadata persisted next to it.
//!
//! The metadata file is the hand-off to the exporter and the predictor, so its
//! field names are snake_case on disk:
//!
//! ```json
//! { "model_type": "LinearRegression", "training_date": "2025-10-19",
//!   "features": ["year"], "target": "earthquake_count",
//!   "model_coefficients": { "intercept": -4567900.18, "slope": 2325.57 },
//!   "performance_metrics": { "r2_score": 0.81, "rmse": 14346.3, "mae": 8824.0 } }
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const MODEL_TYPE: &str = "LinearRegression";
pub const FEATURE_NAME: &str = "year";
pub const TARGET_NAME: &str = "earthquake_count";

/// Largest forecast either side reports: `Number.MAX_SAFE_INTEGER` in the
/// exported module, so counts stay exact integers there too.
pub const MAX_FORECAST: u64 = (1 << 53) - 1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub intercept: f64,
    pub slope: f64,
}

impl LinearModel {
    pub fn new(slope: f64, intercept: f64) -> Self {
        Self { intercept, slope }
    }

    /// Unclamped line value `slope * year + intercept`.
    pub fn evaluate(&self, year: f64) -> f64 {
        self.slope * year + self.intercept
    }

    /// Forecast count for `year`:
    /// `min(MAX_FORECAST, round(max(0, slope * year + intercept)))`.
    ///
    /// Rounding is half away from zero, which for the non-negative clamped
    /// value matches `Math.round` in the exported JavaScript module.
    pub fn predict_count(&self, year: i32) -> u64 {
        let value = self.evaluate(f64::from(year));
        if value.is_nan() || value <= 0.0 {
            return 0;
        }
        let rounded = value.round();
        if rounded >= MAX_FORECAST as f64 {
            return MAX_FORECAST;
        }
        rounded as u64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricSplit {
    #[default]
    Training,
    Holdout,
}

impl MetricSplit {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricSplit::Training => "training",
            MetricSplit::Holdout => "holdout",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub r2_score: f64,
    pub rmse: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mse: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mae: Option<f64>,
    #[serde(default)]
    pub evaluation: MetricSplit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_type: String,
    pub training_date: NaiveDate,
    pub features: Vec<String>,
    pub target: String,
    pub model_coefficients: LinearModel,
    pub performance_metrics: PerformanceMetrics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_instructions: Option<String>,
    /// Training run in the model store these coefficients came from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
}

impl ModelMetadata {
    pub fn new(
        model: LinearModel,
        metrics: PerformanceMetrics,
        training_date: NaiveDate,
        run_id: Option<String>,
    ) -> Self {
        Self {
            model_type: MODEL_TYPE.into(),
            training_date,
            features: vec![FEATURE_NAME.into()],
            target: TARGET_NAME.into(),
            model_coefficients: model,
            performance_metrics: metrics,
            usage_instructions: Some(
                "Run `quaketrend predict` or load the exported earthquake_model.js".into(),
            ),
            run_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prediction_is_clamped_and_rounded() {
        let model = LinearModel::new(2.5, -4900.0);
        // 2.5 * 2025 - 4900 = 162.5, rounds up
        assert_eq!(model.predict_count(2025), 163);
        // 2.5 * 1900 - 4900 = -150
        assert_eq!(model.predict_count(1900), 0);
    }

    #[test]
    fn negative_slope_never_goes_below_zero() {
        let model = LinearModel::new(-1000.0, 10.0);
        for year in [-5000, 0, 1, 1900, 2025, 9999] {
            assert_eq!(model.predict_count(year), 0, "year {year}");
        }
    }

    #[test]
    fn huge_forecasts_stop_at_the_shared_ceiling() {
        let model = LinearModel::new(1e300, 0.0);
        assert_eq!(model.predict_count(2025), MAX_FORECAST);
        assert_eq!(LinearModel::new(f64::INFINITY, 0.0).predict_count(1), MAX_FORECAST);

        let just_below = LinearModel::new(0.0, (MAX_FORECAST - 1) as f64);
        assert_eq!(just_below.predict_count(2025), MAX_FORECAST - 1);
    }

    #[test]
    fn metadata_uses_snake_case_keys() {
        let metrics = PerformanceMetrics {
            r2_score: 0.8,
            rmse: 12.0,
            mse: Some(144.0),
            mae: None,
            evaluation: MetricSplit::Training,
        };
        let date = NaiveDate::from_ymd_opt(2025, 10, 19).unwrap();
        let metadata = ModelMetadata::new(LinearModel::new(2.0, -100.0), metrics, date, None);

        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["model_type"], "LinearRegression");
        assert_eq!(json["training_date"], "2025-10-19");
        assert_eq!(json["features"][0], "year");
        assert_eq!(json["target"], "earthquake_count");
        assert_eq!(json["model_coefficients"]["slope"], 2.0);
        assert_eq!(json["performance_metrics"]["r2_score"], 0.8);
        assert!(json["performance_metrics"].get("mae").is_none());
        assert!(json.get("run_id").is_none());
    }

    #[test]
    fn metadata_without_optional_fields_parses() {
        let json = r#"{
            "model_type": "LinearRegression",
            "training_date": "2025-10-19",
            "features": ["date"],
            "target": "earthquake_count",
            "performance_metrics": { "r2_score": 0.8155, "rmse": 14346.3 },
            "model_coefficients": { "intercept": -4567900.18550383, "slope": 2325.5791789432333 }
        }"#;

        let metadata: ModelMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(metadata.performance_metrics.evaluation, MetricSplit::Training);
        assert_eq!(metadata.performance_metrics.mae, None);
        assert_eq!(metadata.run_id, None);
        assert_eq!(metadata.model_coefficients.slope, 2325.5791789432333);
    }
}
