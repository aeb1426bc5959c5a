use std::{fs, path::Path};

use anyhow::{Context, Result};

use crate::error::ForecastError;
use crate::models::ModelMetadata;

pub fn write_metadata(path: &Path, metadata: &ModelMetadata) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let serialized = serde_json::to_string_pretty(metadata)?;
    fs::write(path, serialized)
        .with_context(|| format!("failed to write model metadata to {}", path.display()))
}

/// Read the metadata written by a training run. A missing file is
/// `MissingFile`; unreadable or malformed contents are `Load`.
pub fn read_metadata(path: &Path) -> Result<ModelMetadata> {
    if !path.is_file() {
        return Err(ForecastError::missing("model metadata", path).into());
    }

    let contents = fs::read_to_string(path)
        .map_err(|err| ForecastError::load("model metadata", path, err))?;
    let metadata: ModelMetadata = serde_json::from_str(&contents)
        .map_err(|err| ForecastError::load("model metadata", path, err))?;

    let coefficients = metadata.model_coefficients;
    if !coefficients.slope.is_finite() || !coefficients.intercept.is_finite() {
        return Err(ForecastError::load(
            "model metadata",
            path,
            "coefficients must be finite numbers",
        )
        .into());
    }

    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LinearModel, MetricSplit, PerformanceMetrics};
    use chrono::NaiveDate;

    fn sample() -> ModelMetadata {
        ModelMetadata::new(
            LinearModel::new(2.5, -4900.0),
            PerformanceMetrics {
                r2_score: 0.5,
                rmse: 1.0,
                mse: Some(1.0),
                mae: Some(0.8),
                evaluation: MetricSplit::Training,
            },
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            Some("run-7".into()),
        )
    }

    #[test]
    fn written_metadata_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/model_info.json");
        write_metadata(&path, &sample()).unwrap();
        assert_eq!(read_metadata(&path).unwrap(), sample());
    }

    #[test]
    fn missing_and_malformed_files_are_distinguished() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model_info.json");

        let missing = read_metadata(&path).unwrap_err();
        assert!(matches!(
            missing.downcast_ref::<ForecastError>(),
            Some(ForecastError::MissingFile { .. })
        ));

        fs::write(&path, r#"{ "model_type": "LinearRegression" }"#).unwrap();
        let malformed = read_metadata(&path).unwrap_err();
        assert!(matches!(
            malformed.downcast_ref::<ForecastError>(),
            Some(ForecastError::Load { .. })
        ));
    }
}
