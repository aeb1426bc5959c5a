//! Forecasts from a persisted training run.

pub mod validation;

use std::path::Path;

use anyhow::Result;

use crate::config::PipelineConfig;
use crate::db::Database;
use crate::error::ForecastError;
use crate::{log_debug, log_warn};
use crate::models::{LinearModel, ModelInfo, ModelMetadata, YearPrediction, YearValidation};
use crate::training::read_metadata;

pub use validation::{validate_year, validate_year_value};

const ENABLE_LOGS: bool = true;

/// Longest range [`Predictor::predict_year_range`] will materialise. The
/// exported module enforces the same limit.
pub const MAX_RANGE_YEARS: i64 = 10_000;

pub struct Predictor {
    model: LinearModel,
    metadata: ModelMetadata,
}

impl Predictor {
    /// Load the persisted model and its metadata. Either artifact missing or
    /// unreadable is an error; the store is never created here.
    pub fn load(config: &PipelineConfig) -> Result<Self> {
        Self::load_from(&config.model_db, &config.metadata_json)
    }

    pub fn load_from(model_db: &Path, metadata_path: &Path) -> Result<Self> {
        let metadata = read_metadata(metadata_path)?;
        let db = Database::open_existing(model_db.to_path_buf())?;

        let run = match metadata.run_id.as_deref() {
            Some(run_id) => match db.get_training_run(run_id)? {
                Some(run) => run,
                None => {
                    return Err(ForecastError::load(
                        "persisted model",
                        model_db,
                        format!("training run {run_id} named in metadata is not in the store"),
                    )
                    .into())
                }
            },
            None => db.latest_training_run()?.ok_or_else(|| {
                ForecastError::load("persisted model", model_db, "store holds no training runs")
            })?,
        };

        if run.model != metadata.model_coefficients {
            log_warn!(
                "Metadata coefficients differ from stored run {}; using the stored model",
                run.id
            );
        }

        log_debug!(
            "Loaded training run {} from {}",
            run.id,
            db.path().display()
        );
        Ok(Self::from_parts(run.model, metadata))
    }

    pub fn from_parts(model: LinearModel, metadata: ModelMetadata) -> Self {
        Self { model, metadata }
    }

    pub fn model(&self) -> LinearModel {
        self.model
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    pub fn predict_single_year(&self, year: i32) -> u64 {
        self.model.predict_count(year)
    }

    pub fn predict_multiple_years(&self, years: &[i32]) -> Vec<u64> {
        years
            .iter()
            .map(|&year| self.predict_single_year(year))
            .collect()
    }

    /// Same as [`Self::predict_multiple_years`], paired with the input years.
    pub fn predict_year_predictions(&self, years: &[i32]) -> Vec<YearPrediction> {
        years
            .iter()
            .map(|&year| YearPrediction {
                year,
                predicted_earthquakes: self.predict_single_year(year),
            })
            .collect()
    }

    /// Every year in `start..=end`, in order. Ranges longer than
    /// [`MAX_RANGE_YEARS`] are refused before anything is allocated.
    pub fn predict_year_range(&self, start: i32, end: i32) -> Result<Vec<YearPrediction>, ForecastError> {
        if start > end {
            return Err(ForecastError::InvalidRange { start, end });
        }
        if i64::from(end) - i64::from(start) + 1 > MAX_RANGE_YEARS {
            return Err(ForecastError::RangeTooLong {
                start,
                end,
                max: MAX_RANGE_YEARS,
            });
        }

        Ok((start..=end)
            .map(|year| YearPrediction {
                year,
                predicted_earthquakes: self.predict_single_year(year),
            })
            .collect())
    }

    pub fn validate_year(&self, input: &str) -> YearValidation {
        validate_year(input)
    }

    pub fn model_info(&self) -> ModelInfo {
        let r2_score = self.metadata.performance_metrics.r2_score;
        ModelInfo {
            model_type: "Linear Regression".into(),
            r2_score,
            equation: equation(&self.model),
            interpretation: interpretation(&self.model),
            variance_explained: format!("{:.1}%", r2_score * 100.0),
            full_info: self.metadata.clone(),
        }
    }
}

pub fn equation(model: &LinearModel) -> String {
    format!(
        "earthquakes = {:.2} × year + {:.2}",
        model.slope, model.intercept
    )
}

pub fn interpretation(model: &LinearModel) -> String {
    let direction = if model.slope >= 0.0 {
        "increases"
    } else {
        "decreases"
    };
    format!(
        "Earthquake frequency {direction} by ~{} events per year",
        model.slope.abs().round()
    )
}
